use crate::entities::{Match, MatchId};
use std::collections::BTreeMap;

/// Authoritative match state of one tournament.
///
/// A plain keyed container: matches are addressed by their stable
/// [`MatchId`] and never removed. Iteration follows id order, which is
/// round-major. Only the progression engine writes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchStore {
    matches: BTreeMap<MatchId, Match>,
}

impl MatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: MatchId) -> Option<&Match> {
        self.matches.get(&id)
    }

    pub(crate) fn upsert(&mut self, m: Match) {
        self.matches.insert(m.id, m);
    }

    pub fn list_by_round(&self, round: u32) -> impl Iterator<Item = &Match> {
        self.matches.values().filter(move |m| m.round == round)
    }

    /// All matches in round-major order.
    pub fn list(&self) -> impl DoubleEndedIterator<Item = &Match> {
        self.matches.values()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TournamentId;

    #[test]
    fn test_upsert_replaces_by_id() {
        let tid = TournamentId(uuid::Uuid::nil());
        let mut store = MatchStore::new();
        store.upsert(Match::pending(MatchId(3), tid, 2, 0));
        store.upsert(Match::pending(MatchId(1), tid, 1, 0));
        store.upsert(Match::pending(MatchId(2), tid, 1, 1));

        let mut updated = Match::pending(MatchId(1), tid, 1, 0);
        updated.evidence = Some(crate::entities::EvidenceRef::new("shot.png"));
        store.upsert(updated.clone());

        assert_eq!(store.len(), 3);
        assert_eq!(store.get(MatchId(1)), Some(&updated));
        let ids: Vec<u32> = store.list().map(|m| m.id.0).collect();
        assert_eq!(ids, [1, 2, 3]);
        let round1: Vec<u32> = store.list_by_round(1).map(|m| m.id.0).collect();
        assert_eq!(round1, [1, 2]);
    }
}
