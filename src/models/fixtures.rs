//! Record builders shared by the unit and integration tests.

use serde_json::json;

use super::{Scrimmage, Team};

pub fn team(id: i64, name: &str, rating: f64, eligible_for: &[u8], members: usize) -> Team {
    let members: Vec<_> = (0..members)
        .map(|i| {
            json!({
                "id": id * 100 + i as i64,
                "profile": {
                    "school": "MIT",
                    "biography": "",
                    "avatar_url": null,
                    "has_avatar": false
                },
                "username": format!("{}-member-{}", name, i),
                "is_staff": false
            })
        })
        .collect();

    serde_json::from_value(json!({
        "id": id,
        "profile": {
            "quote": "",
            "biography": "",
            "has_avatar": false,
            "avatar_url": null,
            "rating": rating,
            "auto_accept_ranked": true,
            "auto_accept_unranked": false,
            "eligible_for": eligible_for
        },
        "episode": "bc24",
        "name": name,
        "members": members,
        "status": "R",
        "has_active_submission": true
    }))
    .expect("valid team fixture")
}

/// A completed two-sided scrimmage; `ratings` are the post-match ratings.
pub fn scrimmage(
    id: i64,
    created: &str,
    teams: (i64, i64),
    ratings: (f64, f64),
    maps: &[&str],
    is_ranked: bool,
) -> Scrimmage {
    serde_json::from_value(json!({
        "id": id,
        "status": "OK!",
        "episode": "bc24",
        "tournament_round": null,
        "participants": [
            {
                "team": teams.0,
                "teamname": format!("team-{}", teams.0),
                "submission": null,
                "match": id,
                "player_index": 0,
                "score": 2,
                "rating": ratings.0,
                "old_rating": ratings.0 - 1.0
            },
            {
                "team": teams.1,
                "teamname": format!("team-{}", teams.1),
                "submission": null,
                "match": id,
                "player_index": 1,
                "score": 1,
                "rating": ratings.1,
                "old_rating": ratings.1 + 1.0
            }
        ],
        "maps": maps,
        "alternate_order": false,
        "created": created,
        "is_ranked": is_ranked,
        "replay_url": null
    }))
    .expect("valid scrimmage fixture")
}

/// A scrimmage that has not been picked up by a runner yet.
pub fn queued_scrimmage(id: i64, created: &str) -> Scrimmage {
    serde_json::from_value(json!({
        "id": id,
        "status": "QUE",
        "episode": "bc24",
        "tournament_round": null,
        "participants": null,
        "maps": null,
        "alternate_order": true,
        "created": created,
        "is_ranked": false,
        "replay_url": null
    }))
    .expect("valid scrimmage fixture")
}
