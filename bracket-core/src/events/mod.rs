//! Event system.
//!
//! # Event Flow
//!
//! 1. `BracketService` publishes `BracketEvent`s on the broadcast channel
//!    while it still holds the tournament lock (non-blocking).
//! 2. `EventRelay` forwards each event to a `Notifier` with retries.
//! 3. `RankingBoard` awards ranking points.
//! 4. The server's WebSocket handler forwards events of one tournament.

pub mod channels;
pub mod types;

pub use channels::{BracketEventReceiver, DEFAULT_CHANNEL_BUFFER, EventPublisher, event_channel};

pub use types::BracketEvent;
