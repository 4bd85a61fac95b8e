//! Event processors.
//!
//! Each processor consumes the broadcast stream of `BracketEvent`s on its
//! own task and stops on the shutdown signal:
//!
//! - `EventRelay`: forwards events to a `Notifier` with retries
//! - `RankingBoard`: awards ranking points
//!
//! `SnapshotWriter` runs next to them on a timer rather than on events.

pub mod event_relay;
pub mod notifier;
pub mod rankings;
pub mod snapshot_writer;

pub use event_relay::{EventRelay, calculate_retry_delay};
pub use notifier::{Notifier, NotifyError, WebhookNotifier};
pub use rankings::RankingBoard;
pub use snapshot_writer::SnapshotWriter;
