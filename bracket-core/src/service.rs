//! Bracket service.
//!
//! Wraps the builder, the match store and the progression engine behind the
//! operations invoked by the API layer. Each tournament is its own
//! mutual-exclusion domain: operations on one tournament are serialized,
//! operations on different tournaments run in parallel.
//!
//! Every mutation is computed as a staged [`Changeset`] inside
//! `catch_unwind` and only committed once it succeeded, so a failing or
//! panicking request never leaves a tournament half-updated.

use crate::config::EngineConfig;
use crate::engine::{BracketLayout, Changeset, MatchStore, Progression, ReportOutcome, build};
use crate::entities::{
    Bracket, EvidenceRef, Match, MatchId, NewTournament, ParticipantId, Round, Tournament,
    TournamentId,
};
use crate::errors::BracketError;
use crate::events::{BracketEvent, BracketEventReceiver, EventPublisher};
use crate::persistence::{BracketRecord, PersistenceError, Snapshot, TournamentRecord};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

/// State guarded by one tournament's lock.
struct TournamentState {
    tournament: Tournament,
    bracket: Option<BracketState>,
}

struct BracketState {
    layout: BracketLayout,
    store: MatchStore,
}

impl TournamentState {
    fn bracket_view(&self) -> Option<Bracket> {
        let bracket = self.bracket.as_ref()?;
        let rounds = (1..=bracket.layout.total_rounds())
            .map(|number| Round {
                number,
                matches: bracket.store.list_by_round(number).cloned().collect(),
            })
            .filter(|round| !round.matches.is_empty())
            .collect();
        Some(Bracket {
            tournament_id: self.tournament.id,
            total_rounds: bracket.layout.total_rounds(),
            rounds,
            finished: self.tournament.finished,
            champion: self.tournament.champion.clone(),
        })
    }

    /// Events that describe this tournament's current state, in causal
    /// order. Bye walkovers are skipped like they are at publication time.
    fn history(&self) -> Vec<BracketEvent> {
        let Some(bracket) = &self.bracket else {
            return Vec::new();
        };
        let tournament_id = self.tournament.id;
        let mut events = vec![BracketEvent::BracketGenerated {
            tournament_id,
            participants: self.tournament.roster.as_slice().to_vec(),
        }];
        // Match ids grow with the round, so id order is completion-safe.
        events.extend(
            bracket
                .store
                .list()
                .filter(|m| m.is_completed() && !m.is_bye())
                .filter_map(|m| {
                    Some(BracketEvent::MatchCompleted {
                        tournament_id,
                        match_id: m.id,
                        round: m.round,
                        winner_id: m.winner.clone()?,
                    })
                }),
        );
        if let Some(champion) = &self.tournament.champion {
            events.push(BracketEvent::TournamentFinished {
                tournament_id,
                champion_id: champion.clone(),
                runner_up_id: self.tournament.runner_up.clone(),
            });
        }
        events
    }

    fn commit(&mut self, changes: &Changeset) -> Result<(), BracketError> {
        let bracket = self
            .bracket
            .as_mut()
            .ok_or(BracketError::BracketNotGenerated(self.tournament.id))?;
        changes.apply(&mut bracket.store);
        if let Some(finish) = &changes.finish {
            self.tournament
                .finish(finish.champion.clone(), finish.runner_up.clone());
        }
        Ok(())
    }
}

type TournamentEntry = Arc<Mutex<TournamentState>>;

/// Cloneable handle to the bracket service. Everything is behind `Arc`.
#[derive(Clone)]
pub struct BracketService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    tournaments: RwLock<HashMap<TournamentId, TournamentEntry>>,
    events: EventPublisher,
    config: EngineConfig,
    /// Bumped by every successful mutation.
    revision: AtomicU64,
}

impl BracketService {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_tournaments(config, HashMap::new())
    }

    fn with_tournaments(
        config: EngineConfig,
        tournaments: HashMap<TournamentId, TournamentEntry>,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                tournaments: RwLock::new(tournaments),
                events: EventPublisher::new(config.event_buffer),
                config,
                revision: AtomicU64::new(0),
            }),
        }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> BracketEventReceiver {
        self.inner.events.subscribe()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Counter of committed mutations. Unchanged revision means unchanged
    /// state.
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::Acquire)
    }

    fn bump_revision(&self) {
        self.inner.revision.fetch_add(1, Ordering::AcqRel);
    }

    // -- Tournament registry ---------------------------------------------

    #[tracing::instrument(skip_all, err, fields(created_by = %new.created_by))]
    pub async fn create_tournament(&self, new: NewTournament) -> Result<Tournament, BracketError> {
        let limit = self.inner.config.max_participants_limit;
        if new.max_participants < 2 || new.max_participants > limit {
            return Err(BracketError::InvalidMaxParticipants {
                requested: new.max_participants,
                limit,
            });
        }

        let tournament = Tournament::new(TournamentId::generate(), new);
        let state = TournamentState {
            tournament: tournament.clone(),
            bracket: None,
        };
        self.inner
            .tournaments
            .write()
            .await
            .insert(tournament.id, Arc::new(Mutex::new(state)));
        self.bump_revision();

        info!(tournament_id = %tournament.id, format = %tournament.format, "Tournament created");
        Ok(tournament)
    }

    pub async fn tournament(&self, tournament_id: TournamentId) -> Result<Tournament, BracketError> {
        let state = self.lock(tournament_id).await?;
        Ok(state.tournament.clone())
    }

    /// All tournaments, ordered by id (creation order).
    pub async fn list_tournaments(&self) -> Vec<Tournament> {
        let entries: Vec<TournamentEntry> =
            self.inner.tournaments.read().await.values().cloned().collect();
        let mut tournaments = Vec::with_capacity(entries.len());
        for entry in entries {
            tournaments.push(entry.lock().await.tournament.clone());
        }
        tournaments.sort_by_key(|t| t.id);
        tournaments
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn join(
        &self,
        tournament_id: TournamentId,
        participant: ParticipantId,
    ) -> Result<Tournament, BracketError> {
        let mut state = self.lock(tournament_id).await?;
        let max = state.tournament.max_participants;
        state.tournament.roster.join(participant.clone(), max)?;
        self.bump_revision();
        debug!(%participant, roster = state.tournament.roster.len(), "Participant joined");
        Ok(state.tournament.clone())
    }

    /// Remove a participant. Rejected with `RosterLocked` once the bracket
    /// exists.
    #[tracing::instrument(skip(self), err)]
    pub async fn leave(
        &self,
        tournament_id: TournamentId,
        participant: ParticipantId,
    ) -> Result<Tournament, BracketError> {
        let mut state = self.lock(tournament_id).await?;
        state.tournament.roster.leave(&participant)?;
        self.bump_revision();
        debug!(%participant, roster = state.tournament.roster.len(), "Participant left");
        Ok(state.tournament.clone())
    }

    // -- Bracket operations ----------------------------------------------

    /// Freeze the roster and build the bracket.
    ///
    /// Bye walkovers are resolved before this returns, so their results are
    /// already visible in the returned bracket. Fails with
    /// `AlreadyGenerated` on every call after the first.
    #[tracing::instrument(skip(self), err)]
    pub async fn generate(&self, tournament_id: TournamentId) -> Result<Bracket, BracketError> {
        let mut state = self.lock(tournament_id).await?;
        if state.bracket.is_some() {
            return Err(BracketError::AlreadyGenerated(tournament_id));
        }

        let participants = state.tournament.roster.as_slice().to_vec();
        let (layout, changes) = guarded(|| {
            let round1 = build(tournament_id, &participants)?;
            let layout = round1.layout;
            let empty = MatchStore::new();
            let changes = Progression::new(tournament_id, layout, &empty).seed(round1)?;
            Ok((layout, changes))
        })?;

        state.tournament.roster.lock();
        state.bracket = Some(BracketState {
            layout,
            store: MatchStore::new(),
        });
        state.commit(&changes)?;
        self.bump_revision();

        self.inner.events.publish(BracketEvent::BracketGenerated {
            tournament_id,
            participants: participants.clone(),
        });
        for event in changes.events {
            self.inner.events.publish(event);
        }

        info!(
            participants = participants.len(),
            size = layout.size(),
            rounds = layout.total_rounds(),
            "Bracket generated"
        );
        state
            .bracket_view()
            .ok_or(BracketError::BracketNotGenerated(tournament_id))
    }

    /// Record the winner of a match and advance it.
    ///
    /// Repeating a report with the already-recorded winner succeeds without
    /// changing anything; a different winner fails with
    /// `MatchAlreadyCompleted`. `evidence` is attached to the match before
    /// it is completed.
    #[tracing::instrument(skip(self, evidence), err)]
    pub async fn report_result(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        winner: ParticipantId,
        evidence: Option<EvidenceRef>,
    ) -> Result<Match, BracketError> {
        let mut state = self.lock(tournament_id).await?;
        let bracket = state
            .bracket
            .as_ref()
            .ok_or(BracketError::BracketNotGenerated(tournament_id))?;

        let (outcome, changes) = guarded(|| {
            let mut progression = Progression::new(tournament_id, bracket.layout, &bracket.store);
            let outcome = progression.report(match_id, winner, evidence)?;
            Ok((outcome, progression.into_changeset()))
        })?;

        state.commit(&changes)?;
        for event in changes.events {
            self.inner.events.publish(event);
        }

        match outcome {
            ReportOutcome::Completed(m) => {
                self.bump_revision();
                info!(round = m.round, finished = state.tournament.finished, "Result recorded");
                Ok(m)
            }
            ReportOutcome::Replayed(m) => {
                debug!("Result already recorded, replay ignored");
                Ok(m)
            }
        }
    }

    pub async fn bracket(&self, tournament_id: TournamentId) -> Result<Bracket, BracketError> {
        let state = self.lock(tournament_id).await?;
        state
            .bracket_view()
            .ok_or(BracketError::BracketNotGenerated(tournament_id))
    }

    /// Every match a participant has been placed in, across tournaments.
    ///
    /// Newest tournament first; inside a tournament later rounds come
    /// first.
    pub async fn matches_of(&self, participant: &ParticipantId) -> Vec<Match> {
        let entries = self.entries().await;
        let mut found = Vec::new();
        for (_, entry) in entries.iter().rev() {
            let state = entry.lock().await;
            if let Some(bracket) = &state.bracket {
                found.extend(
                    bracket
                        .store
                        .list()
                        .rev()
                        .filter(|m| m.has_participant(participant))
                        .cloned(),
                );
            }
        }
        found
    }

    /// Rebuild the event stream every tournament has produced so far.
    ///
    /// Consumers that fell behind the broadcast channel use this to recover
    /// what they missed. Per tournament the order matches publication order.
    pub async fn event_history(&self) -> Vec<BracketEvent> {
        let mut events = Vec::new();
        for (_, entry) in self.entries().await {
            events.extend(entry.lock().await.history());
        }
        events
    }

    // -- Persistence -----------------------------------------------------

    /// Capture the logical state of every tournament.
    pub async fn snapshot(&self) -> Snapshot {
        let entries: Vec<TournamentEntry> =
            self.inner.tournaments.read().await.values().cloned().collect();
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let state = entry.lock().await;
            records.push(TournamentRecord {
                tournament: state.tournament.clone(),
                bracket: state.bracket.as_ref().map(|b| BracketRecord {
                    layout: b.layout,
                    matches: b.store.list().cloned().collect(),
                }),
            });
        }
        records.sort_by_key(|r| r.tournament.id);
        Snapshot::new(records)
    }

    /// Rebuild a service from a snapshot taken by [`snapshot`](Self::snapshot).
    pub fn restore(config: EngineConfig, snapshot: Snapshot) -> Result<Self, PersistenceError> {
        snapshot.validate()?;
        let tournaments = snapshot
            .tournaments
            .into_iter()
            .map(|record| {
                let bracket = record.bracket.map(|b| {
                    let mut store = MatchStore::new();
                    for m in b.matches {
                        store.upsert(m);
                    }
                    BracketState {
                        layout: b.layout,
                        store,
                    }
                });
                let id = record.tournament.id;
                let state = TournamentState {
                    tournament: record.tournament,
                    bracket,
                };
                (id, Arc::new(Mutex::new(state)))
            })
            .collect::<HashMap<_, _>>();
        info!(tournaments = tournaments.len(), "Restored bracket state from snapshot");
        Ok(Self::with_tournaments(config, tournaments))
    }

    // -- Private helpers -------------------------------------------------

    /// Registry entries ordered by id, cloned out of the registry lock.
    async fn entries(&self) -> Vec<(TournamentId, TournamentEntry)> {
        let mut entries: Vec<_> = self
            .inner
            .tournaments
            .read()
            .await
            .iter()
            .map(|(id, entry)| (*id, entry.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Acquire the lock of one tournament, bounded by `lock_timeout`.
    async fn lock(
        &self,
        tournament_id: TournamentId,
    ) -> Result<OwnedMutexGuard<TournamentState>, BracketError> {
        let entry = self
            .inner
            .tournaments
            .read()
            .await
            .get(&tournament_id)
            .cloned()
            .ok_or(BracketError::TournamentNotFound(tournament_id))?;

        tokio::time::timeout(self.inner.config.lock_timeout, entry.lock_owned())
            .await
            .map_err(|_| {
                warn!(%tournament_id, "Timed out waiting for tournament lock");
                BracketError::Timeout(tournament_id)
            })
    }
}

/// Run a staged engine computation, turning a panic into
/// [`BracketError::Internal`].
fn guarded<T>(f: impl FnOnce() -> Result<T, BracketError>) -> Result<T, BracketError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "engine panicked".to_string());
        tracing::error!(%reason, "Bracket operation panicked, state left untouched");
        Err(BracketError::Internal(reason))
    })
}
