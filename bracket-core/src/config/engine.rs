//! Engine configuration.

use std::time::Duration;

/// Limits applied by the [`BracketService`](crate::service::BracketService).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Longest time a request waits for its tournament's lock.
    pub lock_timeout: Duration,
    /// Upper bound for `max_participants` when creating a tournament.
    pub max_participants_limit: u32,
    /// Capacity of the event broadcast channel.
    pub event_buffer: usize,
}

impl EngineConfig {
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_MAX_PARTICIPANTS_LIMIT: u32 = 1024;
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
            max_participants_limit: Self::DEFAULT_MAX_PARTICIPANTS_LIMIT,
            event_buffer: crate::events::DEFAULT_CHANNEL_BUFFER,
        }
    }
}
