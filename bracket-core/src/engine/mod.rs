//! The bracket engine.
//!
//! - [`builder`] turns a roster into the round-1 matches.
//! - [`store`] holds the authoritative match state of one tournament.
//! - [`progression`] finalizes matches and advances winners.
//!
//! The engine is synchronous and owns no locks; the
//! [`BracketService`](crate::service::BracketService) serializes access per
//! tournament.

pub mod builder;
pub mod layout;
pub mod progression;
pub mod store;

pub use builder::{Round1Matches, build};
pub use layout::{BracketLayout, ParentPosition};
pub use progression::{Changeset, Finish, Progression, ReportOutcome};
pub use store::MatchStore;
