//! Event channel factory and publisher handle.
//!
//! Events fan out over a `tokio::sync::broadcast` channel. Publishing never
//! waits on receivers, so a slow consumer can lag (and lose events) but can
//! never stall bracket mutation.

use super::types::BracketEvent;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default buffer size for the event channel.
///
/// Receivers that fall further behind than this observe
/// `RecvError::Lagged` and skip ahead.
pub const DEFAULT_CHANNEL_BUFFER: usize = 1024;

/// Receiver handle for bracket events.
pub type BracketEventReceiver = broadcast::Receiver<BracketEvent>;

/// Publishing side of the event channel.
#[derive(Clone)]
pub struct EventPublisher {
    tx: broadcast::Sender<BracketEvent>,
}

impl EventPublisher {
    /// Create a publisher with a channel of `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to every current subscriber.
    ///
    /// Fire-and-forget: an event published while nobody listens is dropped.
    pub fn publish(&self, event: BracketEvent) {
        trace!(%event, "Publishing event");
        if self.tx.send(event).is_err() {
            debug!("No event subscribers, event dropped");
        }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> BracketEventReceiver {
        self.tx.subscribe()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_BUFFER)
    }
}

/// Create a new event channel.
///
/// Returns the publisher and a first receiver. More receivers can be
/// created with [`EventPublisher::subscribe`].
pub fn event_channel(capacity: usize) -> (EventPublisher, BracketEventReceiver) {
    let publisher = EventPublisher::new(capacity);
    let rx = publisher.subscribe();
    (publisher, rx)
}
