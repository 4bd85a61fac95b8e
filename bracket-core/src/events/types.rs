//! Event type definitions.
//!
//! Events are ephemeral and carry identifiers rather than full match data;
//! consumers that need more re-read the bracket from the service.

use crate::entities::{MatchId, ParticipantId, TournamentId};
use bracket_sdk::objects::EventPayload;

/// Domain events emitted by the bracket engine.
///
/// Per tournament, events are published in causal order: a
/// `TournamentFinished` always follows the `MatchCompleted` of the final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BracketEvent {
    /// The bracket was generated and the roster frozen.
    BracketGenerated {
        tournament_id: TournamentId,
        participants: Vec<ParticipantId>,
    },
    /// A reported result completed a match. Bye walkovers do not emit this.
    MatchCompleted {
        tournament_id: TournamentId,
        match_id: MatchId,
        round: u32,
        winner_id: ParticipantId,
    },
    /// The final was decided.
    TournamentFinished {
        tournament_id: TournamentId,
        champion_id: ParticipantId,
        runner_up_id: Option<ParticipantId>,
    },
}

impl BracketEvent {
    pub fn tournament_id(&self) -> TournamentId {
        match self {
            BracketEvent::BracketGenerated { tournament_id, .. }
            | BracketEvent::MatchCompleted { tournament_id, .. }
            | BracketEvent::TournamentFinished { tournament_id, .. } => *tournament_id,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BracketEvent::BracketGenerated { .. } => "bracket_generated",
            BracketEvent::MatchCompleted { .. } => "match_completed",
            BracketEvent::TournamentFinished { .. } => "tournament_finished",
        }
    }

    /// Wire representation stamped with `timestamp` (unix seconds).
    pub fn to_payload(&self, timestamp: i64) -> EventPayload {
        match self {
            BracketEvent::BracketGenerated {
                tournament_id,
                participants,
            } => EventPayload::BracketGenerated {
                tournament_id: tournament_id.0,
                participants: participants.iter().map(ToString::to_string).collect(),
                timestamp,
            },
            BracketEvent::MatchCompleted {
                tournament_id,
                match_id,
                round,
                winner_id,
            } => EventPayload::MatchCompleted {
                tournament_id: tournament_id.0,
                match_id: match_id.0,
                round: *round,
                winner_id: winner_id.to_string(),
                timestamp,
            },
            BracketEvent::TournamentFinished {
                tournament_id,
                champion_id,
                runner_up_id,
            } => EventPayload::TournamentFinished {
                tournament_id: tournament_id.0,
                champion_id: champion_id.to_string(),
                runner_up_id: runner_up_id.as_ref().map(ToString::to_string),
                timestamp,
            },
        }
    }
}

impl std::fmt::Display for BracketEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.tournament_id())
    }
}
