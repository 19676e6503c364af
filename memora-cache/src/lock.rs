//! Single-flight lock ownership.

use std::sync::Arc;

use tracing::{debug, warn};

use memora_core::constants::LOCK_VALUE;
use memora_core::traits::CacheStore;
use memora_core::types::Expiry;

/// A held lock key.
///
/// Call [`LockGuard::release`] on every exit path; if the guard is dropped
/// unreleased (a panic, or the caller's future being cancelled) the delete is
/// spawned on the current Tokio runtime instead. Outside a runtime the lock is
/// left to expire.
///
/// Ownership holds only within the lock's expiry (`ceil(max_wait)`). Every
/// holder writes the same value and release is a plain delete, so a
/// computation that outlives the expiry deletes whichever lock a later caller
/// took in the meantime. Size `max_wait` above the expected computation time.
pub(crate) struct LockGuard {
    store: Arc<dyn CacheStore>,
    key: String,
    released: bool,
}

impl LockGuard {
    /// Attempts to create `key`. Store failures count as "not acquired".
    pub(crate) async fn try_acquire(
        store: &Arc<dyn CacheStore>,
        key: &str,
        expiry: Expiry,
    ) -> Option<Self> {
        match store.set_if_absent(key, LOCK_VALUE, expiry).await {
            Ok(true) => {
                debug!(key, ?expiry, "Lock acquired");
                Some(Self {
                    store: store.clone(),
                    key: key.to_string(),
                    released: false,
                })
            }
            Ok(false) => None,
            Err(e) => {
                warn!(key, error = %e, "Lock attempt failed, treating as held");
                None
            }
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    /// Deletes the lock key. Failures are logged and left to expiry.
    pub(crate) async fn release(mut self) {
        self.released = true;
        let keys = [std::mem::take(&mut self.key)];
        match self.store.delete(&keys).await {
            Ok(_) => debug!(key = %keys[0], "Lock released"),
            Err(e) => warn!(key = %keys[0], error = %e, "Lock release failed, left to expire"),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let key = std::mem::take(&mut self.key);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = self.store.clone();
                handle.spawn(async move {
                    if let Err(e) = store.delete(&[key.clone()]).await {
                        warn!(key = %key, error = %e, "Deferred lock release failed");
                    }
                });
            }
            Err(_) => warn!(key = %key, "Lock dropped outside a runtime, left to expire"),
        }
    }
}

/// Releases the lock if one is held.
pub(crate) async fn release(lock: Option<LockGuard>) {
    if let Some(guard) = lock {
        guard.release().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memora_store::MemoryStore;
    use std::time::Duration;

    fn store() -> (Arc<MemoryStore>, Arc<dyn CacheStore>) {
        let memory = Arc::new(MemoryStore::new());
        let shared: Arc<dyn CacheStore> = memory.clone();
        (memory, shared)
    }

    #[tokio::test]
    async fn test_acquire_is_exclusive_until_release() {
        let (memory, store) = store();

        let guard = LockGuard::try_acquire(&store, "ns:k:lock", Expiry::Seconds(5))
            .await
            .unwrap();
        assert_eq!(guard.key(), "ns:k:lock");
        assert!(LockGuard::try_acquire(&store, "ns:k:lock", Expiry::Seconds(5))
            .await
            .is_none());

        guard.release().await;
        assert!(memory.is_empty());
        assert!(LockGuard::try_acquire(&store, "ns:k:lock", Expiry::Seconds(5))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_unavailable_store_is_not_acquired() {
        let (memory, store) = store();
        memory.set_available(false);
        assert!(LockGuard::try_acquire(&store, "k:lock", Expiry::Seconds(1))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_release_after_expiry_deletes_successor_lock() {
        let (memory, store) = store();

        let stale = LockGuard::try_acquire(&store, "k:lock", Expiry::Millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let successor = LockGuard::try_acquire(&store, "k:lock", Expiry::Seconds(30)).await;
        assert!(successor.is_some());

        // The expired holder's release removes the successor's key.
        stale.release().await;
        assert!(memory.is_empty());
        assert!(LockGuard::try_acquire(&store, "k:lock", Expiry::Seconds(30))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_dropped_guard_releases_in_background() {
        let (memory, store) = store();

        let guard = LockGuard::try_acquire(&store, "k:lock", Expiry::Seconds(30))
            .await
            .unwrap();
        drop(guard);

        for _ in 0..50 {
            if memory.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(memory.is_empty());
    }
}
