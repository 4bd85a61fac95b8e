use super::{ParticipantId, Roster, TournamentId};
use bracket_sdk::objects::{TournamentFormat, TournamentResponse};
use serde::{Deserialize, Serialize};

/// Parameters for creating a tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTournament {
    pub format: TournamentFormat,
    pub max_participants: u32,
    pub created_by: ParticipantId,
}

/// A tournament as tracked by the engine.
///
/// Display metadata (name, game, banner) lives with an external
/// collaborator; the engine only keeps what drives the bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub format: TournamentFormat,
    pub max_participants: u32,
    pub created_by: ParticipantId,
    pub roster: Roster,
    pub finished: bool,
    pub champion: Option<ParticipantId>,
    pub runner_up: Option<ParticipantId>,
}

impl Tournament {
    pub fn new(id: TournamentId, new: NewTournament) -> Self {
        Self {
            id,
            format: new.format,
            max_participants: new.max_participants,
            created_by: new.created_by,
            roster: Roster::new(),
            finished: false,
            champion: None,
            runner_up: None,
        }
    }

    /// Record the outcome of the final. Only the first call has an effect.
    pub(crate) fn finish(&mut self, champion: ParticipantId, runner_up: Option<ParticipantId>) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.champion = Some(champion);
        self.runner_up = runner_up;
    }
}

impl From<&Tournament> for TournamentResponse {
    fn from(value: &Tournament) -> Self {
        TournamentResponse {
            tournament_id: value.id.0,
            format: value.format,
            max_participants: value.max_participants,
            created_by: value.created_by.to_string(),
            participants: value
                .roster
                .as_slice()
                .iter()
                .map(ToString::to_string)
                .collect(),
            roster_locked: value.roster.is_locked(),
            finished: value.finished,
            champion: value.champion.as_ref().map(ToString::to_string),
            runner_up: value.runner_up.as_ref().map(ToString::to_string),
        }
    }
}
