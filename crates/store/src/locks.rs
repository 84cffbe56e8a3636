//! Per-hash exclusive locks.
//!
//! Every write to a hash directory (new original, clearing derived output,
//! persisting a restoration) happens while holding that hash's lock, so a
//! fresh submission and an older task for the same bytes never interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use restora_core::content_hash::ContentHash;
use tokio::sync::OwnedMutexGuard;

/// Registry of async mutexes keyed by content hash.
#[derive(Default)]
pub struct HashLocks {
    inner: Mutex<HashMap<ContentHash, Arc<tokio::sync::Mutex<()>>>>,
}

/// Proof of exclusive access to one hash directory.
///
/// Released on drop.
#[derive(Debug)]
pub struct HashGuard {
    hash: ContentHash,
    _guard: OwnedMutexGuard<()>,
}

impl HashGuard {
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }
}

impl HashLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `hash`.
    pub async fn lock(&self, hash: &ContentHash) -> HashGuard {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on only cost memory.
            map.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(map.entry(hash.clone()).or_default())
        };

        HashGuard {
            hash: hash.clone(),
            _guard: mutex.lock_owned().await,
        }
    }

    /// Number of hashes currently locked or awaited.
    pub fn active(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|m| Arc::strong_count(m) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_hash_is_exclusive() {
        let locks = Arc::new(HashLocks::new());
        let hash = ContentHash::of_bytes(b"a");

        let first = locks.lock(&hash).await;

        let contender = {
            let locks = Arc::clone(&locks);
            let hash = hash.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&hash).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished(), "second lock must wait");

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("second lock acquired after release")
            .unwrap();
    }

    #[tokio::test]
    async fn different_hashes_do_not_block() {
        let locks = HashLocks::new();
        let _a = locks.lock(&ContentHash::of_bytes(b"a")).await;
        let b = tokio::time::timeout(
            Duration::from_millis(200),
            locks.lock(&ContentHash::of_bytes(b"b")),
        )
        .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = HashLocks::new();
        let guard = locks.lock(&ContentHash::of_bytes(b"a")).await;
        assert_eq!(locks.active(), 1);
        assert_eq!(guard.hash(), &ContentHash::of_bytes(b"a"));
        drop(guard);
        assert_eq!(locks.active(), 0);
    }
}
