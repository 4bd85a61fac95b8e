//! Event payloads delivered to notification webhooks and WebSocket clients.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signature::Signature;

/// A bracket event as it travels over the wire.
///
/// Internally tagged on `event_type`:
///
/// ```json
/// {"event_type":"match_completed","tournament_id":"…","match_id":3,"round":2,"winner_id":"alice","timestamp":1700000000}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventPayload {
    BracketGenerated {
        tournament_id: Uuid,
        participants: Vec<String>,
        timestamp: i64,
    },
    MatchCompleted {
        tournament_id: Uuid,
        match_id: u32,
        round: u32,
        winner_id: String,
        timestamp: i64,
    },
    TournamentFinished {
        tournament_id: Uuid,
        champion_id: String,
        runner_up_id: Option<String>,
        timestamp: i64,
    },
}

impl EventPayload {
    /// Tournament the event belongs to.
    pub fn tournament_id(&self) -> Uuid {
        match self {
            EventPayload::BracketGenerated { tournament_id, .. }
            | EventPayload::MatchCompleted { tournament_id, .. }
            | EventPayload::TournamentFinished { tournament_id, .. } => *tournament_id,
        }
    }
}

impl Signature for EventPayload {}
