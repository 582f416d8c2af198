//! Data models for team and scrimmage records.
//!
//! Field names match the upstream JSON exactly so records round-trip unchanged,
//! `null` included.

mod kind;
mod scrimmage;
mod snapshot;
mod team;

pub use kind::*;
pub use scrimmage::*;
pub use snapshot::*;
pub use team::*;

#[cfg(test)]
pub(crate) mod fixtures;
