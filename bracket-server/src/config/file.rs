//! TOML file configuration structures.
//!
//! These structs directly map to the `bracket-config.toml` file format.
//! Every section except `[server]` may be omitted.

use bracket_core::processors::SnapshotWriter;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Engine limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long a request waits for its tournament's lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Largest `max_participants` a tournament may be created with.
    #[serde(default = "default_max_participants_limit")]
    pub max_participants_limit: u32,
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_max_participants_limit() -> u32 {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            max_participants_limit: default_max_participants_limit(),
        }
    }
}

/// Event webhook delivery. Reloaded on SIGHUP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub webhook_urls: Vec<Url>,
    /// Shared secret used to sign webhook bodies.
    #[serde(default)]
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Snapshot file restored at startup, rewritten while running and at
    /// shutdown. Unset keeps all state in memory only.
    pub snapshot_path: Option<PathBuf>,
    /// Seconds between snapshot writes. Idle periods write nothing.
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,
}

fn default_snapshot_interval_secs() -> u64 {
    SnapshotWriter::DEFAULT_INTERVAL.as_secs()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            snapshot_interval_secs: default_snapshot_interval_secs(),
        }
    }
}
