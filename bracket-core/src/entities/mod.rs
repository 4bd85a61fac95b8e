//! Domain entities: identifiers, tournaments, rosters and matches.

mod bracket;
mod matches;
mod roster;
mod tournament;

pub use bracket::{Bracket, Round};
pub use matches::{Match, MatchStatus, Slot};
pub use roster::Roster;
pub use tournament::{NewTournament, Tournament};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TournamentId(pub Uuid);

impl TournamentId {
    /// Generate a fresh, time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for TournamentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for TournamentId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Opaque handle of a participant, issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(CompactString);

impl ParticipantId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(CompactString::new(id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(CompactString::from(value))
    }
}

/// Positional identity of a match within its tournament.
///
/// Matches are numbered from 1 in round-major order over the complete
/// elimination tree, so an id never depends on the order results arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u32);

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle of the evidence attached to a result (e.g. an uploaded
/// screenshot).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceRef(CompactString);

impl EvidenceRef {
    pub fn new(handle: impl AsRef<str>) -> Self {
        Self(CompactString::new(handle))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}
