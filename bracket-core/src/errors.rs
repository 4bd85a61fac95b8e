//! Error taxonomy of the bracket engine.
//!
//! Every variant is recoverable by the caller: it rejects a single request
//! and leaves the tournament state untouched.

use crate::entities::{MatchId, ParticipantId, TournamentId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    /// Fewer than two participants joined before generation.
    #[error("at least 2 participants are required, got {count}")]
    InsufficientParticipants { count: usize },

    /// The roster does not fit in a bracket.
    #[error("roster of {count} participants is too large for a bracket")]
    RosterTooLarge { count: usize },

    /// A bracket already exists for the tournament.
    #[error("bracket already generated for tournament {0}")]
    AlreadyGenerated(TournamentId),

    /// No bracket has been generated for the tournament yet.
    #[error("bracket not generated for tournament {0}")]
    BracketNotGenerated(TournamentId),

    #[error("tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    /// The match already has a different recorded winner.
    ///
    /// Reports repeating the recorded winner never produce this error.
    #[error("match {match_id} already completed with winner {recorded}, reported {reported}")]
    MatchAlreadyCompleted {
        match_id: MatchId,
        recorded: ParticipantId,
        reported: ParticipantId,
    },

    /// The reported winner does not occupy either slot of the match.
    #[error("{winner} is not a participant of match {match_id}")]
    InvalidWinner {
        match_id: MatchId,
        winner: ParticipantId,
    },

    /// At least one slot still waits for its feeder match.
    #[error("match {0} is still waiting for its participants")]
    MatchNotReady(MatchId),

    #[error("{0} already joined the tournament")]
    AlreadyJoined(ParticipantId),

    #[error("{0} is not part of the tournament")]
    NotJoined(ParticipantId),

    #[error("tournament is full ({max} participants)")]
    TournamentFull { max: u32 },

    /// The roster is frozen because the bracket has been generated.
    #[error("roster is locked once the bracket is generated")]
    RosterLocked,

    #[error("max participants must be between 2 and {limit}, got {requested}")]
    InvalidMaxParticipants { requested: u32, limit: u32 },

    /// The tournament lock could not be acquired in time.
    #[error("timed out waiting for tournament {0}")]
    Timeout(TournamentId),

    /// An internal fault aborted the request. State was not modified.
    #[error("internal error: {0}")]
    Internal(String),
}
