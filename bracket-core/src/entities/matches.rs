use super::{EvidenceRef, MatchId, ParticipantId, TournamentId};
use bracket_sdk::objects::{MatchResponse, MatchStatus as SdkMatchStatus, SlotView};
use serde::{Deserialize, Serialize};

/// One side of a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Slot {
    /// Waiting for the winner of a feeder match.
    #[default]
    Empty,
    /// No opponent; the other side advances without playing.
    Bye,
    Participant(ParticipantId),
}

impl Slot {
    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            Slot::Participant(id) => Some(id),
            Slot::Empty | Slot::Bye => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

impl From<&Slot> for SlotView {
    fn from(value: &Slot) -> Self {
        match value {
            Slot::Empty => SlotView::Empty,
            Slot::Bye => SlotView::Bye,
            Slot::Participant(id) => SlotView::Participant {
                id: id.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Completed,
}

impl From<MatchStatus> for SdkMatchStatus {
    fn from(value: MatchStatus) -> Self {
        match value {
            MatchStatus::Pending => SdkMatchStatus::Pending,
            MatchStatus::Completed => SdkMatchStatus::Completed,
        }
    }
}

/// A single match of a bracket.
///
/// `winner` is set if and only if `status` is [`MatchStatus::Completed`],
/// and it always names one of the two participant slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// 1-based round number.
    pub round: u32,
    /// 0-based position inside the round.
    pub slot: u32,
    pub slots: [Slot; 2],
    pub status: MatchStatus,
    pub winner: Option<ParticipantId>,
    pub evidence: Option<EvidenceRef>,
}

impl Match {
    /// A pending match with both slots empty.
    pub fn pending(id: MatchId, tournament_id: TournamentId, round: u32, slot: u32) -> Self {
        Self {
            id,
            tournament_id,
            round,
            slot,
            slots: [Slot::Empty, Slot::Empty],
            status: MatchStatus::Pending,
            winner: None,
            evidence: None,
        }
    }

    pub fn player1(&self) -> &Slot {
        &self.slots[0]
    }

    pub fn player2(&self) -> &Slot {
        &self.slots[1]
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// `true` once neither slot waits for a feeder match.
    pub fn is_ready(&self) -> bool {
        self.slots.iter().all(|slot| !slot.is_empty())
    }

    /// `true` for a walkover created by a bye.
    pub fn is_bye(&self) -> bool {
        self.slots.iter().any(|slot| matches!(slot, Slot::Bye))
    }

    /// `true` when both sides hold a participant.
    pub fn is_contested(&self) -> bool {
        self.slots.iter().all(|slot| slot.participant().is_some())
    }

    pub fn has_participant(&self, participant: &ParticipantId) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.participant() == Some(participant))
    }

    /// The participant that lost a completed, contested match.
    pub fn loser(&self) -> Option<&ParticipantId> {
        let winner = self.winner.as_ref()?;
        self.slots
            .iter()
            .filter_map(Slot::participant)
            .find(|id| *id != winner)
    }
}

impl From<&Match> for MatchResponse {
    fn from(value: &Match) -> Self {
        MatchResponse {
            match_id: value.id.0,
            tournament_id: value.tournament_id.0,
            round: value.round,
            slot: value.slot,
            player1: value.player1().into(),
            player2: value.player2().into(),
            status: value.status.into(),
            winner: value.winner.as_ref().map(ToString::to_string),
            evidence: value.evidence.as_ref().map(|e| e.as_str().to_string()),
        }
    }
}
