use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::store::{BoxFuture, SessionStore, validate_session_id};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

struct Pending {
    generation: u64,
    state: Value,
    token: CancellationToken,
}

type PendingMap = Arc<Mutex<HashMap<String, Pending>>>;

/// Trailing-debounce decorator around any [`SessionStore`].
///
/// Each `save` replaces the pending state for that session and restarts its
/// timer; only the last state within a quiet period reaches the inner store.
/// Scheduling spawns onto the current tokio runtime.
pub struct DebouncedStore {
    inner: Arc<dyn SessionStore>,
    delay: Duration,
    pending: PendingMap,
    next_generation: AtomicU64,
}

impl DebouncedStore {
    pub fn new(inner: Arc<dyn SessionStore>, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn with_default_delay(inner: Arc<dyn SessionStore>) -> Self {
        Self::new(inner, DEFAULT_DEBOUNCE)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn has_pending(&self, session_id: &str) -> bool {
        lock(&self.pending).contains_key(session_id)
    }

    pub fn schedule(&self, session_id: &str, state: Value) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let previous = lock(&self.pending).insert(
            session_id.to_string(),
            Pending {
                generation,
                state,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
        }

        let inner = Arc::clone(&self.inner);
        let pending = Arc::clone(&self.pending);
        let session_id = session_id.to_string();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            let state = {
                let mut pending = lock(&pending);
                match pending.get(&session_id) {
                    Some(p) if p.generation == generation => {
                        pending.remove(&session_id).map(|p| p.state)
                    }
                    _ => None,
                }
            };

            if let Some(state) = state
                && let Err(error) = inner.save(&session_id, state).await
            {
                tracing::warn!(%error, session_id = %session_id, "debounced_save_failed");
            }
        });
    }

    /// Write every pending state now instead of waiting for its timer.
    ///
    /// Every session is attempted. A state whose write fails is scheduled
    /// again unless a newer one arrived meanwhile, and the first error is
    /// returned.
    pub async fn flush(&self) -> Result<()> {
        let drained: Vec<(String, Pending)> = lock(&self.pending).drain().collect();
        let mut first_error = None;

        for (session_id, pending) in drained {
            pending.token.cancel();
            if let Err(error) = self.inner.save(&session_id, pending.state.clone()).await {
                tracing::warn!(%error, session_id = %session_id, "flush_save_failed");
                if !self.has_pending(&session_id) {
                    self.schedule(&session_id, pending.state);
                }
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl SessionStore for DebouncedStore {
    fn save<'a>(&'a self, session_id: &'a str, state: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            validate_session_id(session_id)?;
            self.schedule(session_id, state);
            Ok(())
        })
    }

    fn load<'a>(&'a self, session_id: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        Box::pin(async move {
            let pending = lock(&self.pending)
                .get(session_id)
                .map(|p| p.state.clone());
            match pending {
                Some(state) => Ok(Some(state)),
                None => self.inner.load(session_id).await,
            }
        })
    }
}

fn lock(pending: &PendingMap) -> std::sync::MutexGuard<'_, HashMap<String, Pending>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, MemoryStore};
    use serde_json::json;

    fn debounced() -> (Arc<MemoryStore>, DebouncedStore) {
        let memory = Arc::new(MemoryStore::new());
        let store = DebouncedStore::with_default_delay(memory.clone());
        (memory, store)
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_state_in_a_burst_is_written() {
        let (memory, store) = debounced();

        store.save("s", json!(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        store.save("s", json!(2)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        store.save("s", json!(3)).await.unwrap();

        assert_eq!(memory.write_count(), 0);
        assert_eq!(store.load("s").await.unwrap(), Some(json!(3)));

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(memory.write_count(), 1);
        assert_eq!(memory.load("s").await.unwrap(), Some(json!(3)));
        assert!(!store.has_pending("s"));
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_debounce_independently() {
        let (memory, store) = debounced();

        store.save("a", json!("a")).await.unwrap();
        store.save("b", json!("b")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(memory.write_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_immediately_and_cancels_timer() {
        let (memory, store) = debounced();

        store.save("s", json!({"v": 1})).await.unwrap();
        store.flush().await.unwrap();
        assert_eq!(memory.write_count(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(memory.write_count(), 1);
    }

    struct RefusingStore {
        inner: MemoryStore,
        refused: &'static str,
    }

    impl SessionStore for RefusingStore {
        fn save<'a>(&'a self, session_id: &'a str, state: Value) -> BoxFuture<'a, Result<()>> {
            Box::pin(async move {
                if session_id == self.refused {
                    return Err(Error::Io(std::io::Error::other("disk full")));
                }
                self.inner.save(session_id, state).await
            })
        }

        fn load<'a>(&'a self, session_id: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
            self.inner.load(session_id)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_flush_keeps_other_sessions_and_retries() {
        let refusing = Arc::new(RefusingStore {
            inner: MemoryStore::new(),
            refused: "broken",
        });
        let store = DebouncedStore::with_default_delay(refusing.clone());

        for i in 0..8 {
            store.save(&format!("s{i}"), json!(i)).await.unwrap();
        }
        store.save("broken", json!("kept")).await.unwrap();

        assert!(store.flush().await.is_err());
        assert_eq!(refusing.inner.write_count(), 8);
        for i in 0..8 {
            assert_eq!(
                refusing.inner.load(&format!("s{i}")).await.unwrap(),
                Some(json!(i))
            );
        }

        assert!(store.has_pending("broken"));
        assert_eq!(store.load("broken").await.unwrap(), Some(json!("kept")));
    }

    #[tokio::test]
    async fn rejects_invalid_session_ids_up_front() {
        let (_, store) = debounced();
        assert!(store.save("../x", json!(null)).await.is_err());
    }
}
