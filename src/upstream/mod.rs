//! Client for the paginated competition API.

mod client;

pub use client::*;

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Page size used by the upstream API. Not configurable from our side.
pub const PAGE_SIZE: u64 = 10;

/// One page of a paginated collection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of items across all pages
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Number of pages needed to hold `count` items.
pub fn page_count(count: u64) -> u32 {
    count.div_ceil(PAGE_SIZE) as u32
}

/// URL builders for the collections we scrape.
#[derive(Debug, Clone)]
pub struct Endpoints {
    api_base: String,
    episode: String,
}

impl Endpoints {
    pub fn new(api_base: &str, episode: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            episode: episode.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_base, &config.episode)
    }

    pub fn team_page(&self, page: u32) -> String {
        format!(
            "{}/team/{}/t/?format=json&ordering=pk&page={}",
            self.api_base, self.episode, page
        )
    }

    /// Scrimmages come back newest-first.
    pub fn scrimmage_page(&self, page: u32) -> String {
        format!(
            "{}/compete/{}/match/?format=json&page={}",
            self.api_base, self.episode, page
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(11), 2);
        assert_eq!(page_count(95), 10);
    }

    #[test]
    fn test_endpoint_urls() {
        let endpoints = Endpoints::new("https://api.battlecode.org/api/", "bc24");

        assert_eq!(
            endpoints.team_page(3),
            "https://api.battlecode.org/api/team/bc24/t/?format=json&ordering=pk&page=3"
        );
        assert_eq!(
            endpoints.scrimmage_page(1),
            "https://api.battlecode.org/api/compete/bc24/match/?format=json&page=1"
        );
    }

    #[test]
    fn test_page_envelope_parses_nulls() {
        let page: Page<u32> = serde_json::from_str(
            r#"{"count": 2, "next": null, "previous": null, "results": [1, 2]}"#,
        )
        .unwrap();

        assert_eq!(page.count, 2);
        assert!(page.next.is_none());
        assert_eq!(page.results, vec![1, 2]);
    }
}
