//! Bracket and match request/response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Match status for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Completed,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Contents of one side of a match.
///
/// ```json
/// {"kind":"empty"}
/// {"kind":"bye"}
/// {"kind":"participant","id":"alice"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotView {
    Empty,
    Bye,
    Participant { id: String },
}

/// A single match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub match_id: u32,
    pub tournament_id: Uuid,
    pub round: u32,
    /// Position of the match inside its round, starting at 0.
    pub slot: u32,
    pub player1: SlotView,
    pub player2: SlotView,
    pub status: MatchStatus,
    pub winner: Option<String>,
    /// Opaque handle of the result evidence (e.g. an uploaded screenshot).
    pub evidence: Option<String>,
}

/// All matches of one round, ordered by slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResponse {
    pub round: u32,
    pub matches: Vec<MatchResponse>,
}

/// The bracket of a tournament, partitioned by round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketResponse {
    pub tournament_id: Uuid,
    /// Total number of rounds once the bracket is fully played.
    pub total_rounds: u32,
    /// Rounds that currently hold at least one match.
    pub rounds: Vec<RoundResponse>,
    pub finished: bool,
    pub champion: Option<String>,
}

/// Request body for `POST /tournaments/{id}/matches/{match_id}/report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportResultRequest {
    pub winner_id: String,
    #[serde(default)]
    pub evidence: Option<String>,
}
