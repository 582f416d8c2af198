//! bc-stats
//!
//! Scrapes Battlecode team and scrimmage records into compressed snapshots,
//! publishes them as static files and materializes them into a local cache for
//! the statistics views.

mod cache;
mod config;
mod dashboard;
mod db;
mod errors;
mod models;
mod queue;
mod store;
mod sync;
mod upstream;

use std::path::PathBuf;

use axum::{routing::get, Router};
use clap::{Parser, Subcommand, ValueEnum};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cache::CacheSync;
use config::Config;
use dashboard::{Dashboard, Eligibility};
use db::CacheRepository;
use errors::AppError;
use models::{Scrimmage, Team};
use sync::{EarlyExit, SyncContext};
use upstream::PageFetcher;

#[derive(Debug, Parser)]
#[command(name = "bc-stats", version, about = "Battlecode statistics scraper and cache")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scrape the upstream API and publish snapshots into the data directory
    Scrape {
        /// Only scrape one collection
        #[arg(long, value_enum)]
        only: Option<Collection>,
    },
    /// Serve the data directory over HTTP
    Serve,
    /// Refresh the local cache from the published snapshots
    Pull {
        /// Drop the local cache first
        #[arg(long)]
        force: bool,
    },
    /// Refresh the local cache and print statistics
    Stats {
        /// Eligibility categories to include (default: all)
        #[arg(long = "eligibility", value_name = "CATEGORY")]
        eligibilities: Vec<Eligibility>,
        /// Number of teams in the rating table
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Show details for one team
        #[arg(long)]
        team: Option<i64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Collection {
    Teams,
    Scrimmages,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run(cli.command, &config).await {
        tracing::error!("{}", err);
        return Err(err.into());
    }

    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<(), AppError> {
    match command {
        Command::Scrape { only } => scrape(config, only).await,
        Command::Serve => serve(config).await,
        Command::Pull { force } => {
            let cache = open_cache(config).await?;
            if force {
                cache.clear().await?;
            }
            let cache = CacheSync::new(http_client()?, &config.publish_url, cache);
            let teams = cache.sync::<Team>().await?;
            let scrimmages = cache.sync::<Scrimmage>().await?;
            println!(
                "teams: {} records ({:?}, published {})",
                teams.snapshot.len(),
                teams.source,
                format_marker(teams.timestamp)
            );
            println!(
                "scrimmages: {} records ({:?}, published {})",
                scrimmages.snapshot.len(),
                scrimmages.source,
                format_marker(scrimmages.timestamp)
            );
            Ok(())
        }
        Command::Stats {
            eligibilities,
            top,
            team,
        } => {
            let cache = CacheSync::new(http_client()?, &config.publish_url, open_cache(config).await?);
            let teams = cache.sync::<Team>().await?;
            let scrimmages = cache.sync::<Scrimmage>().await?;

            let selected = if eligibilities.is_empty() {
                Eligibility::ALL.to_vec()
            } else {
                eligibilities
            };
            let dashboard = Dashboard::new(&teams.snapshot, &scrimmages.snapshot, &selected);

            println!("Teams updated {}", format_marker(teams.timestamp));
            println!("Scrimmages updated {}", format_marker(scrimmages.timestamp));
            match team {
                Some(team_id) => print_team(&dashboard, team_id),
                None => print_overview(&dashboard, top),
            }
        }
    }
}

async fn scrape(config: &Config, only: Option<Collection>) -> Result<(), AppError> {
    let ctx = SyncContext::from_config(config, PageFetcher::new(http_client()?));

    if only != Some(Collection::Scrimmages) {
        let report = sync::sync_teams(&ctx).await?;
        tracing::info!(
            "Teams: {} pages, {} teams, marker {} ({})",
            report.page_count,
            report.teams,
            report.published.timestamp,
            if report.published.changed { "changed" } else { "unchanged" }
        );
    }

    if only != Some(Collection::Teams) {
        let report = sync::sync_scrimmages(&ctx, EarlyExit::default()).await?;
        tracing::info!(
            "Scrimmages: {}/{} pages, {} changed, {} total ({} unresolved), marker {}",
            report.last_enqueued_page,
            report.page_count,
            report.changed_records,
            report.scrimmages,
            report.unresolved,
            report.published.timestamp
        );
    }

    Ok(())
}

async fn serve(config: &Config) -> Result<(), AppError> {
    tracing::info!("Serving {:?}", config.data_dir);

    let app = create_router(config.data_dir.clone());
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the router publishing the snapshot files in `data_dir`.
pub fn create_router(data_dir: PathBuf) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .fallback_service(ServeDir::new(data_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

fn http_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .user_agent(concat!("bc-stats/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

async fn open_cache(config: &Config) -> Result<CacheRepository, AppError> {
    let pool = db::init_database(&config.cache_path).await?;
    Ok(CacheRepository::new(pool, &config.cache_namespace))
}

fn format_marker(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn print_overview(dashboard: &Dashboard, top: usize) -> Result<(), AppError> {
    let selected: Vec<&str> = dashboard.selected().iter().map(|e| e.as_str()).collect();
    println!("Eligibility: {}", selected.join(", "));

    let scrims = dashboard.scrimmage_statistics();
    println!();
    println!("Scrimmages played           {:>8}", scrims.scrimmages);
    println!("Ranked scrimmages played    {:>8}", scrims.ranked_scrimmages);
    println!("Unranked scrimmages played  {:>8}", scrims.unranked_scrimmages);
    println!("Matches played              {:>8}", scrims.matches);
    println!("Ranked matches played       {:>8}", scrims.ranked_matches);
    println!("Unranked matches played     {:>8}", scrims.unranked_matches);

    for (label, filter) in [("all teams", None), ("with submission", Some(true))] {
        let teams = dashboard.team_statistics(filter);
        println!();
        println!("Teams ({}): {}, average size {:.2}", label, teams.teams, teams.average_size);
        for (size, count) in &teams.teams_by_size {
            println!("  {}-person teams {:>6}", size, count);
        }
    }

    println!();
    println!("Top {} by rating", top);
    for (i, ranked) in dashboard.top_rated(top).iter().enumerate() {
        println!(
            "{:>4}. {:<32} {:>8.1}  (#{})",
            i + 1,
            ranked.team.name,
            ranked.team.profile.rating,
            ranked.team.id
        );
    }

    Ok(())
}

fn print_team(dashboard: &Dashboard, team_id: i64) -> Result<(), AppError> {
    let ranked = dashboard
        .team(team_id)
        .ok_or_else(|| AppError::Config(format!("No team with id {}", team_id)))?;
    let team = &ranked.team;
    let yes_no = |b: bool| if b { "Yes" } else { "No" };

    println!();
    println!("Name                   {}", team.name);
    println!("Status                 {}", team.status.as_str());
    println!("Auto-accept ranked     {}", yes_no(team.profile.auto_accept_ranked));
    println!("Auto-accept unranked   {}", yes_no(team.profile.auto_accept_unranked));
    println!("Has active submission  {}", yes_no(team.has_active_submission));
    let categories: Vec<&str> = ranked.eligibilities.iter().map(|e| e.as_str()).collect();
    println!("Eligibility            {}", categories.join(", "));
    println!("Rating                 {:.1}", team.profile.rating);

    if let Some(ranks) = dashboard.team_ranks(team_id) {
        println!("Global rank            {}", ranks.global);
        for (eligibility, rank) in ranks.by_eligibility {
            println!("{:<22} {}", format!("{} rank", eligibility), rank);
        }
    }

    println!();
    println!("Members");
    for member in &team.members {
        let staff = if member.is_staff { " [staff]" } else { "" };
        println!("  {}{} ({})", member.username, staff, member.profile.school);
    }

    let history = dashboard.rating_history(team_id);
    println!();
    println!(
        "Rating history ({} completed scrimmages after warm-up)",
        history.len()
    );
    for (at, rating) in history.iter().rev().take(10).rev() {
        println!("  {}  {:>8.1}", at.format("%Y-%m-%d %H:%M"), rating);
    }

    Ok(())
}
