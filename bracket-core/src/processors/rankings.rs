//! RankingBoard processor.
//!
//! Awards ranking points from the event stream:
//! - every participant of a generated bracket gets [`PARTICIPATION_POINTS`]
//! - the champion gets [`CHAMPION_POINTS`], the runner-up [`RUNNER_UP_POINTS`]
//!
//! Each (tournament, event kind) pair is applied at most once, so a
//! duplicated delivery never awards points twice.

use crate::entities::{ParticipantId, Tournament, TournamentId};
use crate::events::{BracketEvent, BracketEventReceiver};
use bracket_sdk::objects::RankingEntry;
use kanau::processor::Processor;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

pub const PARTICIPATION_POINTS: u64 = 5;
pub const CHAMPION_POINTS: u64 = 50;
pub const RUNNER_UP_POINTS: u64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Standing {
    points: u64,
    tournaments_played: u32,
    titles: u32,
}

#[derive(Default)]
struct Board {
    standings: HashMap<ParticipantId, Standing>,
    applied: HashSet<(TournamentId, &'static str)>,
}

/// Running point totals per participant.
#[derive(Default)]
pub struct RankingBoard {
    board: RwLock<Board>,
}

impl RankingBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current standings, highest points first, ties broken by participant id.
    pub async fn standings(&self) -> Vec<RankingEntry> {
        let board = self.board.read().await;
        let mut entries: Vec<RankingEntry> = board
            .standings
            .iter()
            .map(|(id, s)| RankingEntry {
                participant_id: id.to_string(),
                points: s.points,
                tournaments_played: s.tournaments_played,
                titles: s.titles,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.participant_id.cmp(&b.participant_id))
        });
        entries
    }

    /// Replay the outcome of already-known tournaments, e.g. after a
    /// snapshot restore.
    pub async fn replay(&self, tournaments: &[Tournament]) {
        for tournament in tournaments.iter().filter(|t| t.roster.is_locked()) {
            let _ = self
                .process(BracketEvent::BracketGenerated {
                    tournament_id: tournament.id,
                    participants: tournament.roster.as_slice().to_vec(),
                })
                .await;
            if let Some(champion) = &tournament.champion {
                let _ = self
                    .process(BracketEvent::TournamentFinished {
                        tournament_id: tournament.id,
                        champion_id: champion.clone(),
                        runner_up_id: tournament.runner_up.clone(),
                    })
                    .await;
            }
        }
    }

    /// Run until shutdown is signaled or the channel closes.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>, mut event_rx: BracketEventReceiver) {
        info!("RankingBoard started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("RankingBoard received shutdown signal");
                        break;
                    }
                }

                result = event_rx.recv() => match result {
                    Ok(event) => {
                        let _ = self.process(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "RankingBoard lagged behind, points may be missing");
                    }
                    Err(RecvError::Closed) => {
                        info!("BracketEvent channel closed");
                        break;
                    }
                },
            }
        }

        info!("RankingBoard shutdown complete");
    }
}

impl Processor<BracketEvent> for RankingBoard {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, event: BracketEvent) -> Result<(), Infallible> {
        let mut board = self.board.write().await;
        if !board.applied.insert((event.tournament_id(), event.kind())) {
            debug!(%event, "Ranking already applied, skipping");
            return Ok(());
        }

        match event {
            BracketEvent::BracketGenerated { participants, .. } => {
                for participant in participants {
                    let standing = board.standings.entry(participant).or_default();
                    standing.points += PARTICIPATION_POINTS;
                    standing.tournaments_played += 1;
                }
            }
            BracketEvent::TournamentFinished {
                champion_id,
                runner_up_id,
                ..
            } => {
                let champion = board.standings.entry(champion_id).or_default();
                champion.points += CHAMPION_POINTS;
                champion.titles += 1;
                if let Some(runner_up) = runner_up_id {
                    board.standings.entry(runner_up).or_default().points += RUNNER_UP_POINTS;
                }
            }
            BracketEvent::MatchCompleted { .. } => {}
        }
        Ok(())
    }
}
