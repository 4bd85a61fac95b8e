//! Round-1 construction.
//!
//! Pairing policy: with `P` padded positions and `byes = P - n`, the first
//! `P/2 - byes` matches pair consecutive participants in arrival order, and
//! each of the trailing `byes` matches holds the next participant against a
//! [`Slot::Bye`]. Since `byes < P/2`, a match never holds two byes.
//!
//! Bye matches are emitted already completed with the lone participant as
//! winner; [`Progression::seed`](super::Progression::seed) then advances them
//! exactly like reported results.

use super::layout::BracketLayout;
use crate::entities::{Match, MatchStatus, ParticipantId, Slot, TournamentId};
use crate::errors::BracketError;

/// Output of [`build`]: the layout and every round-1 match in slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round1Matches {
    pub layout: BracketLayout,
    pub matches: Vec<Match>,
}

/// Build the round-1 matches for `participants`, seeded in arrival order.
///
/// Deterministic: the same roster always yields the same matches.
pub fn build(
    tournament_id: TournamentId,
    participants: &[ParticipantId],
) -> Result<Round1Matches, BracketError> {
    let layout = BracketLayout::for_participants(participants.len())?;
    let slots = layout.matches_in_round(1) as usize;
    let byes = layout.size() as usize - participants.len();
    let contested = slots - byes;

    let mut entrants = participants.iter().cloned();
    let mut matches = Vec::with_capacity(slots);

    for slot in 0..slots {
        let id = layout.match_id(1, slot as u32);
        let mut m = Match::pending(id, tournament_id, 1, slot as u32);

        let first = entrants.next().ok_or_else(|| {
            BracketError::Internal(format!("roster exhausted while seeding slot {slot}"))
        })?;
        if slot < contested {
            let second = entrants.next().ok_or_else(|| {
                BracketError::Internal(format!("roster exhausted while seeding slot {slot}"))
            })?;
            m.slots = [Slot::Participant(first), Slot::Participant(second)];
        } else {
            m.slots = [Slot::Participant(first.clone()), Slot::Bye];
            m.status = MatchStatus::Completed;
            m.winner = Some(first);
        }
        matches.push(m);
    }

    Ok(Round1Matches { layout, matches })
}
