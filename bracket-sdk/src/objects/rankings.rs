//! Ranking board response types.

use serde::{Deserialize, Serialize};

/// Accumulated ranking points of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub participant_id: String,
    pub points: u64,
    pub tournaments_played: u32,
    pub titles: u32,
}
