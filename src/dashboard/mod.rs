//! Dashboard views over materialized snapshots.
//!
//! Everything here is a fold or a sort over the in-memory data; nothing touches
//! the network or the disk.

mod eligibility;
pub mod stats;

pub use eligibility::*;

use std::collections::{HashMap, HashSet};

use crate::models::{Scrimmage, Snapshot, Team};

/// A team together with its derived eligibility categories.
#[derive(Debug, Clone)]
pub struct RankedTeam {
    pub team: Team,
    pub eligibilities: Vec<Eligibility>,
}

/// Sorted, grouped and filtered views of the team and scrimmage snapshots.
#[derive(Debug, Clone)]
pub struct Dashboard {
    /// All teams, sorted by case-insensitive name
    teams: Vec<RankedTeam>,
    /// All scrimmages, oldest first
    scrimmages: Vec<Scrimmage>,
    /// Indices into `scrimmages` per participating team, oldest first
    scrimmages_by_team: HashMap<i64, Vec<usize>>,
    selected: Vec<Eligibility>,
    filtered_teams: Vec<usize>,
    filtered_scrimmages: Vec<usize>,
}

impl Dashboard {
    pub fn new(
        teams: &Snapshot<Team>,
        scrimmages: &Snapshot<Scrimmage>,
        selected: &[Eligibility],
    ) -> Self {
        let mut teams: Vec<RankedTeam> = teams
            .values()
            .map(|team| RankedTeam {
                eligibilities: Eligibility::of(team),
                team: team.clone(),
            })
            .collect();
        teams.sort_by_cached_key(|t| t.team.name.to_lowercase());

        let mut scrimmages: Vec<Scrimmage> = scrimmages.values().cloned().collect();
        // Unparseable timestamps sort first, among themselves by raw text.
        scrimmages.sort_by_cached_key(|s| (s.created_at(), s.created.clone()));

        let mut scrimmages_by_team: HashMap<i64, Vec<usize>> = HashMap::new();
        for (index, scrimmage) in scrimmages.iter().enumerate() {
            for participant in scrimmage.participants.iter().flatten() {
                scrimmages_by_team
                    .entry(participant.team)
                    .or_default()
                    .push(index);
            }
        }

        let mut dashboard = Self {
            teams,
            scrimmages,
            scrimmages_by_team,
            selected: Vec::new(),
            filtered_teams: Vec::new(),
            filtered_scrimmages: Vec::new(),
        };
        dashboard.select(selected);
        dashboard
    }

    /// Restrict the filtered views to teams in any of `selected`, and to
    /// scrimmages in which at least one such team took part.
    pub fn select(&mut self, selected: &[Eligibility]) {
        self.selected = selected.to_vec();

        self.filtered_teams = self
            .teams
            .iter()
            .enumerate()
            .filter(|(_, t)| t.eligibilities.iter().any(|e| selected.contains(e)))
            .map(|(i, _)| i)
            .collect();

        let team_ids: HashSet<i64> = self
            .filtered_teams
            .iter()
            .map(|&i| self.teams[i].team.id)
            .collect();

        self.filtered_scrimmages = self
            .scrimmages
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                s.participants
                    .iter()
                    .flatten()
                    .any(|p| team_ids.contains(&p.team))
            })
            .map(|(i, _)| i)
            .collect();
    }

    pub fn selected(&self) -> &[Eligibility] {
        &self.selected
    }

    pub fn teams(&self) -> &[RankedTeam] {
        &self.teams
    }

    pub fn team(&self, team_id: i64) -> Option<&RankedTeam> {
        self.teams.iter().find(|t| t.team.id == team_id)
    }

    pub fn filtered_teams(&self) -> impl Iterator<Item = &RankedTeam> {
        self.filtered_teams.iter().map(|&i| &self.teams[i])
    }

    pub fn filtered_scrimmages(&self) -> impl Iterator<Item = &Scrimmage> {
        self.filtered_scrimmages.iter().map(|&i| &self.scrimmages[i])
    }

    /// Scrimmages `team_id` took part in, oldest first.
    pub fn scrimmages_of(&self, team_id: i64) -> impl Iterator<Item = &Scrimmage> {
        self.scrimmages_by_team
            .get(&team_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.scrimmages[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{queued_scrimmage, scrimmage, team};

    fn sample() -> (Snapshot<Team>, Snapshot<Scrimmage>) {
        let teams = [
            team(1, "zeta", 1600.0, &[1, 3], 2),
            team(2, "Alpha", 1700.0, &[1], 1),
            team(3, "beta", 1400.0, &[2], 3),
            team(4, "Gamma", 1500.0, &[], 4),
        ]
        .into_iter()
        .collect();

        let scrimmages = [
            scrimmage(30, "2024-01-12T00:00:00Z", (1, 2), (1600.0, 1700.0), &["a", "b"], true),
            scrimmage(10, "2024-01-10T00:00:00Z", (3, 4), (1400.0, 1500.0), &["a"], false),
            scrimmage(20, "2024-01-11T00:00:00Z", (1, 4), (1590.0, 1510.0), &["c"], false),
            queued_scrimmage(40, "2024-01-13T00:00:00Z"),
        ]
        .into_iter()
        .collect();

        (teams, scrimmages)
    }

    #[test]
    fn test_teams_sorted_case_insensitively() {
        let (teams, scrimmages) = sample();
        let dashboard = Dashboard::new(&teams, &scrimmages, &Eligibility::ALL);

        let names: Vec<_> = dashboard.teams().iter().map(|t| t.team.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "Gamma", "zeta"]);
    }

    #[test]
    fn test_scrimmages_grouped_oldest_first() {
        let (teams, scrimmages) = sample();
        let dashboard = Dashboard::new(&teams, &scrimmages, &Eligibility::ALL);

        let ids: Vec<_> = dashboard.scrimmages_of(1).map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["20", "30"]);
        assert_eq!(dashboard.scrimmages_of(99).count(), 0);
    }

    #[test]
    fn test_mixed_timestamps_sort_consistently() {
        let (teams, _) = sample();
        let scrimmages: Snapshot<Scrimmage> = [
            scrimmage(1, "2024-01-12T00:00:00Z", (1, 2), (1600.0, 1700.0), &["a"], true),
            scrimmage(2, "sometime", (1, 2), (1600.0, 1700.0), &["a"], true),
            scrimmage(3, "2024-01-10T00:00:00Z", (1, 2), (1600.0, 1700.0), &["a"], true),
            scrimmage(4, "2024-01-11T00:00:00+05:00", (1, 2), (1600.0, 1700.0), &["a"], true),
            scrimmage(5, "another time", (1, 2), (1600.0, 1700.0), &["a"], true),
        ]
        .into_iter()
        .collect();

        let dashboard = Dashboard::new(&teams, &scrimmages, &Eligibility::ALL);

        let ids: Vec<_> = dashboard.scrimmages_of(1).map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["5", "2", "3", "4", "1"]);
    }

    #[test]
    fn test_filter_by_eligibility() {
        let (teams, scrimmages) = sample();
        let mut dashboard = Dashboard::new(&teams, &scrimmages, &[Eligibility::HighSchool]);

        let ids: Vec<_> = dashboard.filtered_teams().map(|t| t.team.id).collect();
        assert_eq!(ids, vec![3]);
        let scrims: Vec<_> = dashboard.filtered_scrimmages().map(|s| s.id.to_string()).collect();
        assert_eq!(scrims, vec!["10"]);

        dashboard.select(&[Eligibility::Us, Eligibility::NonStudent]);
        let ids: Vec<_> = dashboard.filtered_teams().map(|t| t.team.id).collect();
        assert_eq!(ids, vec![4, 1]);
        assert_eq!(dashboard.filtered_scrimmages().count(), 3);
        assert_eq!(dashboard.selected(), &[Eligibility::Us, Eligibility::NonStudent]);
    }
}
