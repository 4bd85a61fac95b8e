//! Result reporting and winner advancement.
//!
//! A [`Progression`] stages every change over a read-only [`MatchStore`]
//! and hands back a [`Changeset`]. Nothing reaches the store until the
//! caller commits the changeset, so a rejected report leaves it untouched.

use super::builder::Round1Matches;
use super::layout::BracketLayout;
use super::store::MatchStore;
use crate::entities::{EvidenceRef, Match, MatchId, MatchStatus, ParticipantId, Slot, TournamentId};
use crate::errors::BracketError;
use crate::events::BracketEvent;
use std::collections::BTreeMap;
use tracing::debug;

/// Outcome of the final match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finish {
    pub champion: ParticipantId,
    pub runner_up: Option<ParticipantId>,
}

/// Staged mutations produced by one engine operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    pub matches: Vec<Match>,
    pub events: Vec<BracketEvent>,
    pub finish: Option<Finish>,
}

impl Changeset {
    /// Write the staged matches into `store`.
    pub fn apply(&self, store: &mut MatchStore) {
        for m in &self.matches {
            store.upsert(m.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The match was completed by this report.
    Completed(Match),
    /// The match already had the reported winner; nothing was staged.
    Replayed(Match),
}

impl ReportOutcome {
    pub fn into_match(self) -> Match {
        match self {
            ReportOutcome::Completed(m) | ReportOutcome::Replayed(m) => m,
        }
    }
}

/// Per-operation state machine over one tournament's matches.
pub struct Progression<'a> {
    tournament_id: TournamentId,
    layout: BracketLayout,
    store: &'a MatchStore,
    staged: BTreeMap<MatchId, Match>,
    events: Vec<BracketEvent>,
    finish: Option<Finish>,
}

impl<'a> Progression<'a> {
    pub fn new(tournament_id: TournamentId, layout: BracketLayout, store: &'a MatchStore) -> Self {
        Self {
            tournament_id,
            layout,
            store,
            staged: BTreeMap::new(),
            events: Vec::new(),
            finish: None,
        }
    }

    /// Stage the round-1 matches and cascade every bye walkover.
    pub fn seed(mut self, round1: Round1Matches) -> Result<Changeset, BracketError> {
        for m in &round1.matches {
            self.stage(m.clone());
        }
        for m in round1.matches.iter().filter(|m| m.is_completed()) {
            debug!(tournament_id = %self.tournament_id, match_id = %m.id, "Advancing bye walkover");
            self.advance(m)?;
        }
        Ok(self.into_changeset())
    }

    /// Record `winner` as the winner of `match_id` and advance it.
    ///
    /// Checks run in this order: the match exists, it is not already
    /// completed (a repeat of the recorded winner is a replay, any other
    /// winner a conflict), both slots are filled, the winner occupies one
    /// of them.
    pub fn report(
        &mut self,
        match_id: MatchId,
        winner: ParticipantId,
        evidence: Option<EvidenceRef>,
    ) -> Result<ReportOutcome, BracketError> {
        let mut m = self
            .get(match_id)
            .cloned()
            .ok_or(BracketError::MatchNotFound(match_id))?;

        if m.is_completed() {
            return match m.winner.clone() {
                Some(recorded) if recorded == winner => Ok(ReportOutcome::Replayed(m)),
                Some(recorded) => Err(BracketError::MatchAlreadyCompleted {
                    match_id,
                    recorded,
                    reported: winner,
                }),
                None => Err(BracketError::Internal(format!(
                    "completed match {match_id} has no winner"
                ))),
            };
        }
        if !m.is_ready() {
            return Err(BracketError::MatchNotReady(match_id));
        }
        if !m.has_participant(&winner) {
            return Err(BracketError::InvalidWinner { match_id, winner });
        }

        if evidence.is_some() {
            m.evidence = evidence;
        }
        m.status = MatchStatus::Completed;
        m.winner = Some(winner.clone());
        self.stage(m.clone());
        self.events.push(BracketEvent::MatchCompleted {
            tournament_id: self.tournament_id,
            match_id,
            round: m.round,
            winner_id: winner,
        });
        self.advance(&m)?;
        Ok(ReportOutcome::Completed(m))
    }

    pub fn into_changeset(self) -> Changeset {
        Changeset {
            matches: self.staged.into_values().collect(),
            events: self.events,
            finish: self.finish,
        }
    }

    fn get(&self, id: MatchId) -> Option<&Match> {
        self.staged.get(&id).or_else(|| self.store.get(id))
    }

    fn stage(&mut self, m: Match) {
        self.staged.insert(m.id, m);
    }

    /// Move the winner of a completed match into its parent slot, creating
    /// the parent on first use, or finish the tournament after the final.
    fn advance(&mut self, completed: &Match) -> Result<(), BracketError> {
        let winner = completed.winner.clone().ok_or_else(|| {
            BracketError::Internal(format!("match {} completed without winner", completed.id))
        })?;

        let Some(parent) = self.layout.parent(completed.round, completed.slot) else {
            let runner_up = completed.loser().cloned();
            self.events.push(BracketEvent::TournamentFinished {
                tournament_id: self.tournament_id,
                champion_id: winner.clone(),
                runner_up_id: runner_up.clone(),
            });
            self.finish = Some(Finish {
                champion: winner,
                runner_up,
            });
            return Ok(());
        };

        let parent_id = self.layout.match_id(parent.round, parent.slot);
        let mut parent_match = self.get(parent_id).cloned().unwrap_or_else(|| {
            Match::pending(parent_id, self.tournament_id, parent.round, parent.slot)
        });
        if !parent_match.slots[parent.side].is_empty() {
            return Err(BracketError::Internal(format!(
                "slot {} of match {parent_id} is already filled",
                parent.side
            )));
        }
        parent_match.slots[parent.side] = Slot::Participant(winner);
        self.stage(parent_match);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::builder::build;

    fn tid() -> TournamentId {
        TournamentId(uuid::Uuid::nil())
    }

    fn generate(ids: &[&str]) -> (BracketLayout, MatchStore) {
        let participants: Vec<ParticipantId> = ids.iter().map(|id| (*id).into()).collect();
        let round1 = build(tid(), &participants).unwrap();
        let layout = round1.layout;
        let mut store = MatchStore::new();
        let changes = Progression::new(tid(), layout, &store).seed(round1).unwrap();
        changes.apply(&mut store);
        (layout, store)
    }

    fn report(
        layout: BracketLayout,
        store: &mut MatchStore,
        id: u32,
        winner: &str,
    ) -> Result<(ReportOutcome, Changeset), BracketError> {
        let mut progression = Progression::new(tid(), layout, store);
        let outcome = progression.report(MatchId(id), winner.into(), None)?;
        let changes = progression.into_changeset();
        changes.apply(store);
        Ok((outcome, changes))
    }

    #[test]
    fn test_four_player_scenario() {
        let (layout, mut store) = generate(&["A", "B", "C", "D"]);
        assert_eq!(store.len(), 2);

        let (_, changes) = report(layout, &mut store, 1, "A").unwrap();
        assert!(changes.finish.is_none());
        let final_match = store.get(MatchId(3)).unwrap();
        assert_eq!(final_match.slots, [Slot::Participant("A".into()), Slot::Empty]);
        assert_eq!(final_match.status, MatchStatus::Pending);

        report(layout, &mut store, 2, "C").unwrap();
        let final_match = store.get(MatchId(3)).unwrap();
        assert_eq!(
            final_match.slots,
            [Slot::Participant("A".into()), Slot::Participant("C".into())]
        );
        assert_eq!(final_match.status, MatchStatus::Pending);

        let (_, changes) = report(layout, &mut store, 3, "A").unwrap();
        assert_eq!(
            changes.finish,
            Some(Finish {
                champion: "A".into(),
                runner_up: Some("C".into()),
            })
        );
        assert!(matches!(
            changes.events.as_slice(),
            [
                BracketEvent::MatchCompleted { .. },
                BracketEvent::TournamentFinished { .. }
            ]
        ));
    }

    #[test]
    fn test_three_player_bye_cascades_into_final() {
        let (_, store) = generate(&["A", "B", "C"]);
        let bye = store.get(MatchId(2)).unwrap();
        assert_eq!(bye.status, MatchStatus::Completed);
        assert_eq!(bye.winner, Some("C".into()));
        let final_match = store.get(MatchId(3)).unwrap();
        assert_eq!(final_match.slots, [Slot::Empty, Slot::Participant("C".into())]);
    }

    #[test]
    fn test_two_byes_fill_same_parent() {
        let (_, store) = generate(&["A", "B", "C", "D", "E"]);
        // Slots 2 and 3 of round 1 (ids 3 and 4) are byes for D and E.
        let parent = store.get(MatchId(6)).unwrap();
        assert_eq!(
            parent.slots,
            [Slot::Participant("D".into()), Slot::Participant("E".into())]
        );
        assert_eq!(parent.status, MatchStatus::Pending);
    }

    #[test]
    fn test_replay_and_conflict() {
        let (layout, mut store) = generate(&["A", "B"]);
        report(layout, &mut store, 1, "A").unwrap();
        let before = store.clone();

        let (outcome, changes) = report(layout, &mut store, 1, "A").unwrap();
        assert!(matches!(outcome, ReportOutcome::Replayed(_)));
        assert_eq!(changes, Changeset::default());
        assert_eq!(store, before);

        let err = report(layout, &mut store, 1, "B").unwrap_err();
        assert_eq!(
            err,
            BracketError::MatchAlreadyCompleted {
                match_id: MatchId(1),
                recorded: "A".into(),
                reported: "B".into(),
            }
        );
        assert_eq!(store, before);
    }

    #[test]
    fn test_invalid_winner_does_not_mutate() {
        let (layout, mut store) = generate(&["A", "B", "C", "D"]);
        let before = store.clone();
        let err = report(layout, &mut store, 1, "C").unwrap_err();
        assert_eq!(
            err,
            BracketError::InvalidWinner {
                match_id: MatchId(1),
                winner: "C".into(),
            }
        );
        assert_eq!(store, before);
    }

    #[test]
    fn test_not_ready_and_not_found() {
        let (layout, mut store) = generate(&["A", "B", "C", "D"]);
        report(layout, &mut store, 1, "A").unwrap();
        assert_eq!(
            report(layout, &mut store, 3, "A").unwrap_err(),
            BracketError::MatchNotReady(MatchId(3))
        );
        assert_eq!(
            report(layout, &mut store, 9, "A").unwrap_err(),
            BracketError::MatchNotFound(MatchId(9))
        );
    }

    #[test]
    fn test_evidence_is_attached() {
        let (layout, mut store) = generate(&["A", "B"]);
        let mut progression = Progression::new(tid(), layout, &store);
        let outcome = progression
            .report(MatchId(1), "B".into(), Some(EvidenceRef::new("uploads/match_1.png")))
            .unwrap();
        progression.into_changeset().apply(&mut store);
        let m = outcome.into_match();
        assert_eq!(m.evidence, Some(EvidenceRef::new("uploads/match_1.png")));
        assert_eq!(store.get(MatchId(1)).unwrap().evidence, m.evidence);
    }

    /// Plays a full bracket, always advancing the first slot.
    fn play_out(ids: &[&str]) -> (MatchStore, Finish) {
        let (layout, mut store) = generate(ids);
        let mut finish = None;
        loop {
            let next = store
                .list()
                .find(|m| !m.is_completed() && m.is_ready())
                .map(|m| (m.id, m.slots[0].participant().cloned()));
            let Some((id, Some(winner))) = next else { break };
            let (_, changes) = report(layout, &mut store, id.0, winner.as_str()).unwrap();
            if changes.finish.is_some() {
                finish = changes.finish;
            }
        }
        (store, finish.unwrap())
    }

    #[test]
    fn test_match_counts_for_every_roster_size() {
        for n in 2..=33usize {
            let ids: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let (store, finish) = play_out(&refs);
            let layout = BracketLayout::for_participants(n).unwrap();

            assert_eq!(store.len() as u32, layout.total_matches(), "n={n}");
            assert_eq!(store.list().filter(|m| m.is_contested()).count(), n - 1, "n={n}");
            assert_eq!(store.list().filter(|m| m.is_bye()).count(), layout.size() as usize - n);
            assert!(store.list().all(Match::is_completed));
            assert_eq!(finish.champion, ParticipantId::from("p0"));
        }
    }
}
