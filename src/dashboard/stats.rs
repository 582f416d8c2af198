//! Aggregates shown on the dashboard.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use super::{Dashboard, Eligibility, RankedTeam};
use crate::models::{Scrimmage, ScrimmageStatus};

/// Ratings right after a team's first scrimmage are still settling.
const RATING_WARMUP_HOURS: i64 = 24;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrimmageStatistics {
    pub scrimmages: usize,
    pub ranked_scrimmages: usize,
    pub unranked_scrimmages: usize,
    pub matches: usize,
    pub ranked_matches: usize,
    pub unranked_matches: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamStatistics {
    pub teams: usize,
    pub average_size: f64,
    /// Number of teams per member count
    pub teams_by_size: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRanks {
    pub global: usize,
    pub by_eligibility: Vec<(Eligibility, usize)>,
}

fn is_played(scrimmage: &Scrimmage) -> bool {
    scrimmage.status == ScrimmageStatus::Completed && scrimmage.maps.is_some()
}

impl Dashboard {
    /// Counts over the filtered, completed scrimmages. Each map is one match.
    pub fn scrimmage_statistics(&self) -> ScrimmageStatistics {
        let mut stats = ScrimmageStatistics::default();

        for scrimmage in self.filtered_scrimmages().filter(|s| is_played(s)) {
            let matches = scrimmage.map_count();
            stats.scrimmages += 1;
            stats.matches += matches;

            if scrimmage.is_ranked {
                stats.ranked_scrimmages += 1;
                stats.ranked_matches += matches;
            } else {
                stats.unranked_scrimmages += 1;
                stats.unranked_matches += matches;
            }
        }

        stats
    }

    /// Team size distribution, optionally only over teams with or without an
    /// active submission.
    pub fn team_statistics(&self, has_submission: Option<bool>) -> TeamStatistics {
        let mut stats = TeamStatistics::default();
        let mut members = 0;

        for ranked in self.filtered_teams() {
            if has_submission.is_some_and(|wanted| ranked.team.has_active_submission != wanted) {
                continue;
            }

            let size = ranked.team.members.len();
            stats.teams += 1;
            members += size;
            *stats.teams_by_size.entry(size).or_default() += 1;
        }

        if stats.teams > 0 {
            stats.average_size = members as f64 / stats.teams as f64;
        }
        stats
    }

    /// Filtered teams by rating, highest first.
    pub fn top_rated(&self, limit: usize) -> Vec<&RankedTeam> {
        let mut teams: Vec<&RankedTeam> = self.filtered_teams().collect();
        teams.sort_by(|a, b| b.team.profile.rating.total_cmp(&a.team.profile.rating));
        teams.truncate(limit);
        teams
    }

    /// Rank of a team among all teams, globally and within each of its
    /// eligibility categories.
    pub fn team_ranks(&self, team_id: i64) -> Option<TeamRanks> {
        let target = self.team(team_id)?;

        let mut global = 1;
        let mut per_category: BTreeMap<Eligibility, usize> =
            Eligibility::ALL.iter().map(|e| (*e, 1)).collect();

        let mut sorted: Vec<&RankedTeam> = self.teams.iter().collect();
        sorted.sort_by(|a, b| b.team.profile.rating.total_cmp(&a.team.profile.rating));

        for ranked in sorted {
            if ranked.team.id == team_id {
                break;
            }
            global += 1;
            for eligibility in &ranked.eligibilities {
                *per_category.entry(*eligibility).or_default() += 1;
            }
        }

        Some(TeamRanks {
            global,
            by_eligibility: target
                .eligibilities
                .iter()
                .map(|e| (*e, per_category[e]))
                .collect(),
        })
    }

    /// Post-match ratings of a team over its completed scrimmages, leaving out
    /// the first day after its first one.
    pub fn rating_history(&self, team_id: i64) -> Vec<(DateTime<Utc>, f64)> {
        let mut first: Option<DateTime<Utc>> = None;
        let mut history = Vec::new();

        for scrimmage in self.scrimmages_of(team_id) {
            if scrimmage.status != ScrimmageStatus::Completed {
                continue;
            }
            let Some(created) = scrimmage.created_at() else {
                continue;
            };

            let start = *first.get_or_insert(created);
            if created - start <= Duration::hours(RATING_WARMUP_HOURS) {
                continue;
            }

            if let Some(participant) = scrimmage.participant(team_id) {
                history.push((created, participant.rating));
            }
        }

        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{queued_scrimmage, scrimmage, team};
    use crate::models::{Scrimmage, Snapshot, Team};

    fn dashboard() -> Dashboard {
        let teams: Snapshot<Team> = [
            team(1, "One", 1600.0, &[1, 3], 2),
            team(2, "Two", 1700.0, &[1], 1),
            team(3, "Three", 1650.0, &[1, 3, 4], 3),
            team(4, "Four", 1500.0, &[], 2),
        ]
        .into_iter()
        .collect();

        let scrimmages: Snapshot<Scrimmage> = [
            scrimmage(1, "2024-01-10T00:00:00Z", (1, 2), (1510.0, 1690.0), &["a", "b", "c"], true),
            scrimmage(2, "2024-01-10T12:00:00Z", (1, 3), (1520.0, 1640.0), &["a"], false),
            scrimmage(3, "2024-01-11T06:00:00Z", (1, 4), (1530.0, 1490.0), &["a", "b"], false),
            scrimmage(4, "2024-01-12T00:00:00Z", (2, 1), (1700.0, 1600.0), &["d"], true),
            queued_scrimmage(5, "2024-01-13T00:00:00Z"),
        ]
        .into_iter()
        .collect();

        Dashboard::new(&teams, &scrimmages, &Eligibility::ALL)
    }

    #[test]
    fn test_scrimmage_statistics() {
        let stats = dashboard().scrimmage_statistics();

        assert_eq!(
            stats,
            ScrimmageStatistics {
                scrimmages: 4,
                ranked_scrimmages: 2,
                unranked_scrimmages: 2,
                matches: 7,
                ranked_matches: 4,
                unranked_matches: 3,
            }
        );
    }

    #[test]
    fn test_team_statistics() {
        let stats = dashboard().team_statistics(None);

        assert_eq!(stats.teams, 4);
        assert_eq!(stats.average_size, 2.0);
        assert_eq!(stats.teams_by_size.get(&2), Some(&2));
        assert_eq!(stats.teams_by_size.get(&1), Some(&1));
        assert_eq!(stats.teams_by_size.get(&3), Some(&1));

        assert_eq!(dashboard().team_statistics(Some(false)).teams, 0);
    }

    #[test]
    fn test_top_rated() {
        let dashboard = dashboard();
        let ids: Vec<_> = dashboard.top_rated(3).iter().map(|t| t.team.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_team_ranks() {
        let ranks = dashboard().team_ranks(1).unwrap();

        // Ahead of team 1: Two (International) and Three (US, MIT Newbie)
        assert_eq!(ranks.global, 3);
        assert_eq!(ranks.by_eligibility, vec![(Eligibility::Us, 2)]);

        assert!(dashboard().team_ranks(42).is_none());
    }

    #[test]
    fn test_rating_history_skips_warmup() {
        let history = dashboard().rating_history(1);

        let ratings: Vec<_> = history.iter().map(|(_, r)| *r).collect();
        assert_eq!(ratings, vec![1530.0, 1600.0]);
    }
}
