//! Versioned config store.
//!
//! `ConfigStore<T>` wraps `Arc<RwLock<T>>` and counts updates, so a reload
//! is visible to every clone and the current version can be reported.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, RwLockReadGuard};

/// A shared configuration value that can be swapped at runtime.
pub struct ConfigStore<T> {
    inner: Arc<ConfigStoreInner<T>>,
}

struct ConfigStoreInner<T> {
    data: RwLock<T>,
    version: AtomicU64,
}

impl<T> ConfigStore<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(ConfigStoreInner {
                data: RwLock::new(initial),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Replace the stored value.
    ///
    /// Returns the new version number.
    pub async fn update(&self, value: T) -> u64 {
        let mut guard = self.inner.data.write().await;
        *guard = value;
        self.inner.version.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.data.read().await
    }

    /// Number of updates applied since creation.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Relaxed)
    }
}

impl<T: Clone> ConfigStore<T> {
    /// Clone out the current value.
    pub async fn current(&self) -> T {
        self.inner.data.read().await.clone()
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = ConfigStore::new(vec![1u32]);
        assert_eq!(store.version(), 0);

        assert_eq!(store.update(vec![1, 2]).await, 1);
        assert_eq!(*store.read().await, vec![1, 2]);
        assert_eq!(store.current().await, vec![1, 2]);
        assert_eq!(store.version(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = ConfigStore::new(String::from("a"));
        let other = store.clone();
        other.update(String::from("b")).await;
        assert_eq!(store.current().await, "b");
        assert_eq!(store.version(), 1);
    }
}
