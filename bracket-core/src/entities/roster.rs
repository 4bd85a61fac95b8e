use super::ParticipantId;
use crate::errors::BracketError;
use serde::{Deserialize, Serialize};

/// Ordered set of entrants of a tournament.
///
/// Arrival order is the seeding order. The roster is frozen by
/// [`lock`](Roster::lock) when the bracket is generated; every change after
/// that fails with [`BracketError::RosterLocked`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    participants: Vec<ParticipantId>,
    locked: bool,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, participant: ParticipantId, max: u32) -> Result<(), BracketError> {
        if self.locked {
            return Err(BracketError::RosterLocked);
        }
        if self.contains(&participant) {
            return Err(BracketError::AlreadyJoined(participant));
        }
        if self.participants.len() >= max as usize {
            return Err(BracketError::TournamentFull { max });
        }
        self.participants.push(participant);
        Ok(())
    }

    pub fn leave(&mut self, participant: &ParticipantId) -> Result<(), BracketError> {
        if self.locked {
            return Err(BracketError::RosterLocked);
        }
        let Some(index) = self.participants.iter().position(|p| p == participant) else {
            return Err(BracketError::NotJoined(participant.clone()));
        };
        // `remove` keeps arrival order for everyone behind the leaver.
        self.participants.remove(index);
        Ok(())
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn as_slice(&self) -> &[ParticipantId] {
        &self.participants
    }
}
