//! Runtime configuration types.
//!
//! Engine and notifier settings are defined in `bracket-core::config`;
//! the server-only sections live here.

pub use bracket_core::config::{EngineConfig, NotifierConfig};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_interval: Duration,
}
