use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-post mutual exclusion for tag reconciliation.
///
/// Two reconciliations of the same post interleave their delete and insert
/// steps; holding the guard returned by [`PostLocks::lock`] across the whole
/// update keeps them apart. Different posts never contend. Entries are held
/// weakly and pruned once no guard for that post is alive.
#[derive(Debug, Clone, Default)]
pub struct PostLocks {
    inner: Arc<Mutex<HashMap<String, Weak<AsyncMutex<()>>>>>,
}

impl PostLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, post_id: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.retain(|_, weak| weak.strong_count() > 0);
            match map.get(post_id).and_then(Weak::upgrade) {
                Some(mutex) => mutex,
                None => {
                    let mutex = Arc::new(AsyncMutex::new(()));
                    map.insert(post_id.to_owned(), Arc::downgrade(&mutex));
                    mutex
                }
            }
        };
        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.values().filter(|weak| weak.strong_count() > 0).count()
    }
}
