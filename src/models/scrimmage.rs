//! Scrimmage model matching the upstream match endpoint.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Keyed;

/// Scrimmage identifier. The upstream has sent both numbers and strings here,
/// so the wire form is kept as-is and only the key is normalised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum ScrimmageId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ScrimmageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrimmageId::Number(n) => write!(f, "{}", n),
            ScrimmageId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScrimmageStatus {
    #[serde(rename = "NEW")]
    Created,
    #[serde(rename = "QUE")]
    Queued,
    #[serde(rename = "RUN")]
    Running,
    #[serde(rename = "TRY")]
    Retry,
    #[serde(rename = "OK!")]
    Completed,
    #[serde(rename = "ERR")]
    Errored,
    #[serde(rename = "CAN")]
    Cancelled,
}

impl ScrimmageStatus {
    /// Terminal scrimmages never change again upstream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScrimmageStatus::Completed | ScrimmageStatus::Errored | ScrimmageStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TournamentRound {
    pub id: i64,
    pub tournament: String,
    pub external_id: i64,
    pub name: String,
    pub maps: Option<Vec<String>>,
    /// 0 hidden, 1 participants released, 2 results released
    pub release_status: u8,
    pub display_order: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrimmageParticipant {
    pub team: i64,
    pub teamname: String,
    pub submission: Option<Value>,
    #[serde(rename = "match")]
    pub match_id: i64,
    pub player_index: i64,
    pub score: Option<i64>,
    pub rating: f64,
    pub old_rating: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A scrimmage between two teams, possibly spanning several maps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scrimmage {
    pub id: ScrimmageId,
    pub status: ScrimmageStatus,
    pub episode: String,
    pub tournament_round: Option<TournamentRound>,
    pub participants: Option<Vec<ScrimmageParticipant>>,
    pub maps: Option<Vec<String>>,
    pub alternate_order: bool,
    pub created: String,
    pub is_ranked: bool,
    pub replay_url: Option<String>,
    /// Upstream fields not modelled above, passed through verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Scrimmage {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn participant(&self, team_id: i64) -> Option<&ScrimmageParticipant> {
        self.participants
            .as_ref()
            .and_then(|ps| ps.iter().find(|p| p.team == team_id))
    }

    pub fn map_count(&self) -> usize {
        self.maps.as_ref().map_or(0, Vec::len)
    }
}

impl Keyed for Scrimmage {
    fn key(&self) -> String {
        self.id.to_string()
    }
}
