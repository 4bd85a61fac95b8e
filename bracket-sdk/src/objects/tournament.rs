//! Tournament registry request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bracket format of a tournament.
///
/// Only single elimination is supported; any other value fails to
/// deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TournamentFormat {
    #[default]
    SingleElimination,
}

impl std::fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentFormat::SingleElimination => write!(f, "single-elimination"),
        }
    }
}

/// Request body for `POST /tournaments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTournamentRequest {
    #[serde(default)]
    pub format: TournamentFormat,
    pub max_participants: u32,
    /// Opaque handle of the user creating the tournament.
    pub created_by: String,
}

/// Request body for joining or leaving a tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterChangeRequest {
    pub participant_id: String,
}

/// A tournament as seen by API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentResponse {
    pub tournament_id: Uuid,
    pub format: TournamentFormat,
    pub max_participants: u32,
    pub created_by: String,
    /// Participants in arrival order.
    pub participants: Vec<String>,
    /// `true` once the bracket has been generated; joins and leaves are
    /// rejected afterwards.
    pub roster_locked: bool,
    pub finished: bool,
    pub champion: Option<String>,
    pub runner_up: Option<String>,
}
