//! Eligibility categories shown on the dashboard.

use std::fmt;
use std::str::FromStr;

use crate::models::{ProfileEligibility, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Eligibility {
    Us,
    International,
    MitNewbie,
    HighSchool,
    NonStudent,
}

impl Eligibility {
    pub const ALL: [Eligibility; 5] = [
        Eligibility::Us,
        Eligibility::International,
        Eligibility::MitNewbie,
        Eligibility::HighSchool,
        Eligibility::NonStudent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Eligibility::Us => "US",
            Eligibility::International => "International",
            Eligibility::MitNewbie => "MIT Newbie",
            Eligibility::HighSchool => "High School",
            Eligibility::NonStudent => "Non-student",
        }
    }

    /// Categories a team falls into, derived from its profile flags.
    pub fn of(team: &Team) -> Vec<Eligibility> {
        let profile = &team.profile;
        let student = profile.is_eligible_for(ProfileEligibility::Student);
        let high_school = profile.is_eligible_for(ProfileEligibility::HighSchool);
        let us = profile.is_eligible_for(ProfileEligibility::Us);
        let newbie = profile.is_eligible_for(ProfileEligibility::Newbie);

        let mut eligibilities = Vec::new();
        if student && !high_school && us {
            eligibilities.push(Eligibility::Us);
        }
        if student && !high_school && !us {
            eligibilities.push(Eligibility::International);
        }
        if student && newbie {
            eligibilities.push(Eligibility::MitNewbie);
        }
        if high_school {
            eligibilities.push(Eligibility::HighSchool);
        }
        if eligibilities.is_empty() {
            eligibilities.push(Eligibility::NonStudent);
        }
        eligibilities
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Eligibility {
    type Err = String;

    /// Accepts the display name or a compact form (`us`, `mit-newbie`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "us" => Ok(Eligibility::Us),
            "international" => Ok(Eligibility::International),
            "mitnewbie" => Ok(Eligibility::MitNewbie),
            "highschool" => Ok(Eligibility::HighSchool),
            "nonstudent" => Ok(Eligibility::NonStudent),
            _ => Err(format!("Unknown eligibility: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::team;

    #[test]
    fn test_us_student_newbie() {
        let t = team(1, "A", 1500.0, &[1, 3, 4], 1);
        assert_eq!(Eligibility::of(&t), vec![Eligibility::Us, Eligibility::MitNewbie]);
    }

    #[test]
    fn test_international_student() {
        let t = team(1, "A", 1500.0, &[1], 1);
        assert_eq!(Eligibility::of(&t), vec![Eligibility::International]);
    }

    #[test]
    fn test_high_school_is_not_us_or_international() {
        let t = team(1, "A", 1500.0, &[1, 2, 3], 1);
        assert_eq!(Eligibility::of(&t), vec![Eligibility::HighSchool]);
    }

    #[test]
    fn test_no_flags_is_non_student() {
        let t = team(1, "A", 1500.0, &[], 1);
        assert_eq!(Eligibility::of(&t), vec![Eligibility::NonStudent]);

        // Newbie without student status grants nothing
        let t = team(1, "A", 1500.0, &[4], 1);
        assert_eq!(Eligibility::of(&t), vec![Eligibility::NonStudent]);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("MIT Newbie".parse::<Eligibility>(), Ok(Eligibility::MitNewbie));
        assert_eq!("non-student".parse::<Eligibility>(), Ok(Eligibility::NonStudent));
        assert_eq!("US".parse::<Eligibility>(), Ok(Eligibility::Us));
        assert!("martian".parse::<Eligibility>().is_err());
    }
}
