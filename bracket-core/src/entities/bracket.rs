use super::{Match, ParticipantId, TournamentId};
use bracket_sdk::objects::{BracketResponse, MatchResponse, RoundResponse};

/// All matches of one round, ordered by slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub number: u32,
    pub matches: Vec<Match>,
}

/// Read-only view of a tournament's bracket, partitioned by round.
///
/// Later rounds only appear once a feeder match has produced a winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bracket {
    pub tournament_id: TournamentId,
    pub total_rounds: u32,
    pub rounds: Vec<Round>,
    pub finished: bool,
    pub champion: Option<ParticipantId>,
}

impl Bracket {
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.iter().flat_map(|round| round.matches.iter())
    }

    pub fn round(&self, number: u32) -> Option<&Round> {
        self.rounds.iter().find(|round| round.number == number)
    }
}

impl From<&Bracket> for BracketResponse {
    fn from(value: &Bracket) -> Self {
        BracketResponse {
            tournament_id: value.tournament_id.0,
            total_rounds: value.total_rounds,
            rounds: value
                .rounds
                .iter()
                .map(|round| RoundResponse {
                    round: round.number,
                    matches: round.matches.iter().map(MatchResponse::from).collect(),
                })
                .collect(),
            finished: value.finished,
            champion: value.champion.as_ref().map(ToString::to_string),
        }
    }
}
