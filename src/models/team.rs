//! Team model matching the upstream team endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Keyed;

/// Eligibility codes carried in `TeamProfile::eligible_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileEligibility {
    Student,
    HighSchool,
    Us,
    Newbie,
}

impl ProfileEligibility {
    pub fn code(&self) -> u8 {
        match self {
            ProfileEligibility::Student => 1,
            ProfileEligibility::HighSchool => 2,
            ProfileEligibility::Us => 3,
            ProfileEligibility::Newbie => 4,
        }
    }
}

/// Team visibility status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TeamStatus {
    #[serde(rename = "R")]
    Regular,
    #[serde(rename = "X")]
    Inactive,
    #[serde(rename = "S")]
    Staff,
    #[serde(rename = "O")]
    Invisible,
}

impl TeamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamStatus::Regular => "Regular",
            TeamStatus::Inactive => "Inactive",
            TeamStatus::Staff => "Staff",
            TeamStatus::Invisible => "Invisible",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamProfile {
    pub quote: String,
    pub biography: String,
    pub has_avatar: bool,
    pub avatar_url: Option<String>,
    pub rating: f64,
    pub auto_accept_ranked: bool,
    pub auto_accept_unranked: bool,
    pub eligible_for: Vec<u8>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TeamProfile {
    pub fn is_eligible_for(&self, eligibility: ProfileEligibility) -> bool {
        self.eligible_for.contains(&eligibility.code())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamMemberProfile {
    pub school: String,
    pub biography: String,
    pub avatar_url: Option<String>,
    pub has_avatar: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamMember {
    pub id: i64,
    pub profile: TeamMemberProfile,
    pub username: String,
    pub is_staff: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A competing team. Replaced wholesale on every sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: i64,
    pub profile: TeamProfile,
    pub episode: String,
    pub name: String,
    pub members: Vec<TeamMember>,
    pub status: TeamStatus,
    pub has_active_submission: bool,
    /// Upstream fields not modelled above, passed through verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Keyed for Team {
    fn key(&self) -> String {
        self.id.to_string()
    }
}
