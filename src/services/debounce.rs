use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Keyed "run once things go quiet" trigger. Re-scheduling a key aborts the
/// pending timer for that key; a job that already started is left to finish.
pub(crate) struct Debouncer<K> {
    delay: Duration,
    inner: Arc<Inner<K>>,
}

struct Inner<K> {
    pending: Mutex<HashMap<K, Pending>>,
    next_ticket: AtomicU64,
}

struct Pending {
    ticket: u64,
    handle: JoinHandle<()>,
}

impl<K> Clone for Debouncer<K> {
    fn clone(&self) -> Self {
        Self { delay: self.delay, inner: self.inner.clone() }
    }
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: Arc::new(Inner {
                pending: Mutex::new(HashMap::new()),
                next_ticket: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn schedule<F, Fut>(&self, key: K, job: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay;
        let inner = self.inner.clone();
        let task_key = key.clone();

        let mut pending = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut pending = inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
                match pending.get(&task_key) {
                    Some(entry) if entry.ticket == ticket => {
                        pending.remove(&task_key);
                    }
                    _ => return,
                }
            }
            job().await;
        });

        if let Some(previous) = pending.insert(key, Pending { ticket, handle }) {
            previous.handle.abort();
        }
    }

    /// Drops the pending timer for `key`, if any. Returns whether one was pending.
    pub(crate) fn cancel(&self, key: &K) -> bool {
        let mut pending = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.remove(key) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_pending(&self, key: &K) -> bool {
        self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner).contains_key(key)
    }
}
