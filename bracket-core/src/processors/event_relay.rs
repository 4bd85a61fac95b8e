//! EventRelay processor.
//!
//! The EventRelay is responsible for:
//! - Receiving `BracketEvent`s from the broadcast channel
//! - Converting them to signed-wire `EventPayload`s
//! - Handing each payload to a [`Notifier`], retrying with exponential
//!   backoff (2^0 to 2^11 seconds) until it is accepted
//!
//! Events are delivered one at a time in publication order. A failing
//! event blocks the ones behind it, so a receiver sees every tournament's
//! events in causal order. When the relay falls behind the broadcast
//! channel it rebuilds the missed events from [`BracketService`] state.
//! Only shutdown abandons an undelivered event.

use super::notifier::Notifier;
use crate::entities::{MatchId, TournamentId};
use crate::events::{BracketEvent, BracketEventReceiver};
use crate::service::BracketService;
use kanau::processor::Processor;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// Maximum backoff exponent (2^11 = 2048 seconds).
const MAX_RETRY_COUNT: u32 = 11;

/// What has already reached the notifier, per tournament.
#[derive(Debug, Default)]
struct Delivered {
    generated: bool,
    matches: HashSet<MatchId>,
    finished: bool,
}

impl Delivered {
    fn contains(&self, event: &BracketEvent) -> bool {
        if self.finished {
            return true;
        }
        match event {
            BracketEvent::BracketGenerated { .. } => self.generated,
            BracketEvent::MatchCompleted { match_id, .. } => self.matches.contains(match_id),
            BracketEvent::TournamentFinished { .. } => false,
        }
    }

    fn record(&mut self, event: &BracketEvent) {
        match event {
            BracketEvent::BracketGenerated { .. } => self.generated = true,
            BracketEvent::MatchCompleted { match_id, .. } => {
                self.matches.insert(*match_id);
            }
            BracketEvent::TournamentFinished { .. } => {
                // Nothing follows a finish.
                self.finished = true;
                self.matches = HashSet::new();
            }
        }
    }
}

/// EventRelay forwards bracket events to a notifier.
pub struct EventRelay {
    notifier: Arc<dyn Notifier>,
    service: BracketService,
    delivered: Mutex<HashMap<TournamentId, Delivered>>,
}

impl EventRelay {
    pub fn new(notifier: Arc<dyn Notifier>, service: BracketService) -> Self {
        Self {
            notifier,
            service,
            delivered: Mutex::new(HashMap::new()),
        }
    }

    /// Run the EventRelay until shutdown is signaled or the channel closes.
    pub async fn run(
        self,
        mut shutdown_rx: watch::Receiver<bool>,
        mut event_rx: BracketEventReceiver,
    ) {
        info!("EventRelay started");

        loop {
            let pending = tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("EventRelay received shutdown signal");
                        break;
                    }
                    continue;
                }

                result = event_rx.recv() => match result {
                    Ok(event) => {
                        debug!(%event, "Received BracketEvent");
                        vec![event]
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "EventRelay lagged behind, rebuilding events from bracket state");
                        self.service.event_history().await
                    }
                    Err(RecvError::Closed) => {
                        info!("BracketEvent channel closed");
                        break;
                    }
                },
            };

            for event in pending {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.wait_for(|stop| *stop) => {
                        warn!(%event, "EventRelay shut down before delivery, event dropped");
                        info!("EventRelay shutdown complete");
                        return;
                    }

                    _ = self.process(event.clone()) => {}
                }
            }
        }

        info!("EventRelay shutdown complete");
    }

    async fn is_delivered(&self, event: &BracketEvent) -> bool {
        self.delivered
            .lock()
            .await
            .get(&event.tournament_id())
            .is_some_and(|delivered| delivered.contains(event))
    }

    async fn mark_delivered(&self, event: &BracketEvent) {
        self.delivered
            .lock()
            .await
            .entry(event.tournament_id())
            .or_default()
            .record(event);
    }
}

impl Processor<BracketEvent> for EventRelay {
    type Output = ();
    type Error = Infallible;

    /// Deliver one event, retrying until the notifier accepts it. Events
    /// that already reached the notifier are skipped.
    #[tracing::instrument(skip_all, name = "relay_event", fields(tournament_id = %event.tournament_id(), kind = event.kind()))]
    async fn process(&self, event: BracketEvent) -> Result<(), Infallible> {
        if self.is_delivered(&event).await {
            debug!("Event already delivered, skipping");
            return Ok(());
        }

        let payload = event.to_payload(time::OffsetDateTime::now_utc().unix_timestamp());
        let mut attempt = 0;
        loop {
            match self.notifier.notify(&payload).await {
                Ok(()) => {
                    if attempt > 0 {
                        info!(attempt, "Event delivered after retry");
                    }
                    break;
                }
                Err(e) => {
                    let delay = calculate_retry_delay(attempt);
                    warn!(error = %e, attempt, ?delay, "Event delivery failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }

        self.mark_delivered(&event).await;
        Ok(())
    }
}

/// Calculate the next retry delay based on retry count.
///
/// Uses exponential backoff: 2^retry_count seconds.
pub fn calculate_retry_delay(retry_count: u32) -> std::time::Duration {
    let seconds = 2u64.pow(retry_count.min(MAX_RETRY_COUNT));
    std::time::Duration::from_secs(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::entities::NewTournament;
    use crate::processors::NotifyError;
    use async_trait::async_trait;
    use bracket_sdk::objects::{EventPayload, TournamentFormat};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Records payloads, failing the first `failures` calls.
    #[derive(Default)]
    struct RecordingNotifier {
        failures: AtomicU32,
        delivered: Mutex<Vec<EventPayload>>,
    }

    impl RecordingNotifier {
        fn failing(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                failures: AtomicU32::new(failures),
                ..Default::default()
            })
        }

        /// `event_type` of every delivered payload, with the match id for
        /// completions.
        async fn delivered(&self) -> Vec<String> {
            self.delivered
                .lock()
                .await
                .iter()
                .map(|p| match p {
                    EventPayload::BracketGenerated { .. } => "generated".to_string(),
                    EventPayload::MatchCompleted { match_id, .. } => format!("match {match_id}"),
                    EventPayload::TournamentFinished { .. } => "finished".to_string(),
                })
                .collect()
        }

        async fn wait_for(&self, count: usize) {
            for _ in 0..10_000 {
                if self.delivered.lock().await.len() >= count {
                    break;
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            assert!(
                self.delivered.lock().await.len() >= count,
                "notifier never received {count} events"
            );
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, payload: &EventPayload) -> Result<(), NotifyError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(NotifyError::DeliveryFailed {
                    url: "http://test.invalid".to_string(),
                    status: 503,
                    body: String::new(),
                });
            }
            self.delivered.lock().await.push(payload.clone());
            Ok(())
        }
    }

    /// Play a four-player tournament to the end: generated, matches 1 to 3,
    /// finished.
    async fn play_out(service: &BracketService) -> TournamentId {
        let tournament = service
            .create_tournament(NewTournament {
                format: TournamentFormat::SingleElimination,
                max_participants: 4,
                created_by: "organizer".into(),
            })
            .await
            .unwrap();
        for id in ["A", "B", "C", "D"] {
            service.join(tournament.id, id.into()).await.unwrap();
        }
        service.generate(tournament.id).await.unwrap();
        for (match_id, winner) in [(1, "A"), (2, "C"), (3, "A")] {
            service
                .report_result(tournament.id, MatchId(match_id), winner.into(), None)
                .await
                .unwrap();
        }
        tournament.id
    }

    const PLAYED_OUT: [&str; 5] = ["generated", "match 1", "match 2", "match 3", "finished"];

    #[test]
    fn test_retry_delay_calculation() {
        assert_eq!(calculate_retry_delay(0), std::time::Duration::from_secs(1));
        assert_eq!(calculate_retry_delay(1), std::time::Duration::from_secs(2));
        assert_eq!(calculate_retry_delay(2), std::time::Duration::from_secs(4));
        assert_eq!(
            calculate_retry_delay(11),
            std::time::Duration::from_secs(2048)
        );
        // Max capped at 11
        assert_eq!(
            calculate_retry_delay(100),
            std::time::Duration::from_secs(2048)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_retries_until_delivered() {
        let notifier = RecordingNotifier::failing(2);
        let relay = EventRelay::new(notifier.clone(), BracketService::new(EngineConfig::default()));
        let event = BracketEvent::MatchCompleted {
            tournament_id: TournamentId(uuid::Uuid::nil()),
            match_id: MatchId(1),
            round: 1,
            winner_id: "alice".into(),
        };

        relay.process(event.clone()).await.unwrap();
        relay.process(event).await.unwrap();
        assert_eq!(notifier.delivered().await, ["match 1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_outage_delays_but_keeps_order() {
        // 1 + 2 + ... + 512 seconds of backoff before the first success.
        let notifier = RecordingNotifier::failing(10);
        let service = BracketService::new(EngineConfig::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let relay = EventRelay::new(notifier.clone(), service.clone());
        let handle = tokio::spawn(relay.run(shutdown_rx, service.subscribe()));

        play_out(&service).await;
        notifier.wait_for(PLAYED_OUT.len()).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(notifier.delivered().await, PLAYED_OUT);
        assert_eq!(notifier.failures.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lagged_relay_rebuilds_missed_events() {
        let notifier = RecordingNotifier::failing(0);
        let service = BracketService::new(EngineConfig {
            event_buffer: 2,
            ..EngineConfig::default()
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let event_rx = service.subscribe();

        // Five events into a two-slot buffer before the relay reads any.
        play_out(&service).await;
        let relay = EventRelay::new(notifier.clone(), service.clone());
        let handle = tokio::spawn(relay.run(shutdown_rx, event_rx));

        notifier.wait_for(PLAYED_OUT.len()).await;
        // Let the relay drain the two buffered events it already delivered.
        tokio::time::sleep(Duration::from_secs(5)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(notifier.delivered().await, PLAYED_OUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_pending_delivery() {
        let notifier = RecordingNotifier::failing(u32::MAX);
        let service = BracketService::new(EngineConfig::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let relay = EventRelay::new(notifier.clone(), service.clone());
        let handle = tokio::spawn(relay.run(shutdown_rx, service.subscribe()));

        play_out(&service).await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(notifier.delivered().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_forwards_in_order_and_stops_on_shutdown() {
        let notifier = RecordingNotifier::failing(0);
        let service = BracketService::new(EngineConfig::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let event_rx = service.subscribe();
        play_out(&service).await;

        let handle = tokio::spawn(EventRelay::new(notifier.clone(), service).run(shutdown_rx, event_rx));
        while notifier.delivered.lock().await.len() < PLAYED_OUT.len() {
            tokio::task::yield_now().await;
        }
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(notifier.delivered().await, PLAYED_OUT);
    }
}
