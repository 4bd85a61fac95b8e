use crate::entities::MatchId;
use crate::errors::BracketError;
use serde::{Deserialize, Serialize};

/// Shape of a single-elimination tree with `size` padded positions.
///
/// `size` is a power of two. Round `r` holds `size >> r` matches; the final
/// is round `log2(size)`. Matches are numbered from 1 in round-major order,
/// so round 1 holds ids `1..=size/2` and the final is `size - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BracketLayout {
    size: u32,
}

/// Where the winner of a match goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentPosition {
    pub round: u32,
    pub slot: u32,
    /// 0 for the first player slot, 1 for the second.
    pub side: usize,
}

impl BracketLayout {
    /// Layout for a roster of `count` participants.
    pub fn for_participants(count: usize) -> Result<Self, BracketError> {
        if count < 2 {
            return Err(BracketError::InsufficientParticipants { count });
        }
        let size = u32::try_from(count)
            .ok()
            .and_then(u32::checked_next_power_of_two)
            .ok_or(BracketError::RosterTooLarge { count })?;
        Ok(Self { size })
    }

    /// Number of padded positions (smallest power of two holding the roster).
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn total_rounds(&self) -> u32 {
        self.size.trailing_zeros()
    }

    pub fn matches_in_round(&self, round: u32) -> u32 {
        if round == 0 || round > self.total_rounds() {
            return 0;
        }
        self.size >> round
    }

    /// Total number of match positions in the tree.
    pub fn total_matches(&self) -> u32 {
        self.size - 1
    }

    pub fn match_id(&self, round: u32, slot: u32) -> MatchId {
        // Rounds before `round` hold size/2 + size/4 + ... = size - (size >> (round - 1)).
        let offset = self.size - (self.size >> (round - 1));
        MatchId(offset + slot + 1)
    }

    /// Inverse of [`match_id`](Self::match_id).
    pub fn position(&self, id: MatchId) -> Option<(u32, u32)> {
        if id.0 == 0 || id.0 > self.total_matches() {
            return None;
        }
        let mut index = id.0 - 1;
        for round in 1..=self.total_rounds() {
            let in_round = self.matches_in_round(round);
            if index < in_round {
                return Some((round, index));
            }
            index -= in_round;
        }
        None
    }

    /// The slot the winner of `(round, slot)` fills, or `None` for the final.
    pub fn parent(&self, round: u32, slot: u32) -> Option<ParentPosition> {
        if round >= self.total_rounds() {
            return None;
        }
        Some(ParentPosition {
            round: round + 1,
            slot: slot / 2,
            side: (slot % 2) as usize,
        })
    }
}

impl TryFrom<u32> for BracketLayout {
    type Error = String;

    fn try_from(size: u32) -> Result<Self, Self::Error> {
        if size < 2 || !size.is_power_of_two() {
            return Err(format!("bracket size must be a power of two >= 2, got {size}"));
        }
        Ok(Self { size })
    }
}

impl From<BracketLayout> for u32 {
    fn from(value: BracketLayout) -> Self {
        value.size
    }
}
