//! Application state shared across all request handlers.

use bracket_core::BracketService;
use bracket_core::config::{ConfigStore, NotifierConfig};
use bracket_core::processors::RankingBoard;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub service: BracketService,
    pub rankings: Arc<RankingBoard>,
    /// Webhook targets (can be reloaded via SIGHUP).
    pub notifier_config: ConfigStore<NotifierConfig>,
}

impl AppState {
    pub fn new(
        service: BracketService,
        rankings: Arc<RankingBoard>,
        notifier_config: ConfigStore<NotifierConfig>,
    ) -> Self {
        Self {
            service,
            rankings,
            notifier_config,
        }
    }
}
