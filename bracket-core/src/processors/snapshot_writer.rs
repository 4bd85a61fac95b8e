//! SnapshotWriter processor.
//!
//! Periodically writes the service state to the snapshot file so that a
//! crash loses at most one interval of changes. A tick only writes when the
//! service revision moved since the last successful write. A final write
//! happens on shutdown.

use crate::service::BracketService;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

pub struct SnapshotWriter {
    service: BracketService,
    path: PathBuf,
    interval: Duration,
    /// Revision of the last successful write.
    written: Option<u64>,
}

impl SnapshotWriter {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

    pub fn new(service: BracketService, path: PathBuf, interval: Duration) -> Self {
        Self {
            service,
            path,
            interval,
            written: None,
        }
    }

    /// Mark the current state as already on disk, e.g. right after a restore.
    pub fn assume_written(mut self) -> Self {
        self.written = Some(self.service.revision());
        self
    }

    /// Write a snapshot if anything changed since the last write.
    ///
    /// Returns whether a file was written. Failures are logged and retried
    /// on the next call.
    pub async fn write_if_changed(&mut self) -> bool {
        // Read the revision first: a mutation racing with the snapshot is
        // picked up again by the next call.
        let revision = self.service.revision();
        if self.written == Some(revision) {
            return false;
        }
        match self.service.snapshot().await.save(&self.path).await {
            Ok(()) => {
                debug!(revision, path = %self.path.display(), "Snapshot saved");
                self.written = Some(revision);
                true
            }
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "Failed to save snapshot");
                false
            }
        }
    }

    /// Run until shutdown is signaled, then write once more.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(interval = ?self.interval, path = %self.path.display(), "SnapshotWriter started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("SnapshotWriter received shutdown signal");
                        break;
                    }
                }

                _ = tokio::time::sleep(self.interval) => {
                    self.write_if_changed().await;
                }
            }
        }

        self.write_if_changed().await;
        info!("SnapshotWriter shutdown complete");
    }
}
