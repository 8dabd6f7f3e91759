//! Live chat sessions keyed by the opaque token handed out at login.
//!
//! Sessions live only in memory. Every lookup refreshes the entry's last-used
//! time, and `run_session_sweeper` drops entries idle for longer than the
//! configured limit, so abandoned logins do not accumulate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use advisor_core::ChatSession;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

pub type SharedSession = Arc<Mutex<ChatSession>>;

struct SessionEntry {
    session: SharedSession,
    last_used: Instant,
}

/// The map lock is only held to look a session up; the per-session mutex is
/// held for the whole operation, so turns within one session never interleave.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: ChatSession) -> Uuid {
        let token = Uuid::new_v4();
        let entry = SessionEntry {
            session: Arc::new(Mutex::new(session)),
            last_used: Instant::now(),
        };
        self.inner.write().await.insert(token, entry);
        token
    }

    pub async fn get(&self, token: &Uuid) -> Option<SharedSession> {
        let mut map = self.inner.write().await;
        let entry = map.get_mut(token)?;
        entry.last_used = Instant::now();
        Some(entry.session.clone())
    }

    pub async fn remove(&self, token: &Uuid) -> Option<SharedSession> {
        self.inner.write().await.remove(token).map(|e| e.session)
    }

    /// Drop sessions not looked up within `max_idle`. A request already holding
    /// a swept session keeps its `Arc` and finishes normally.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|_, e| now.duration_since(e.last_used) < max_idle);
        before - map.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Periodically evict idle sessions until the shutdown signal fires.
pub async fn run_session_sweeper(
    registry: SessionRegistry,
    max_idle: Duration,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = registry.sweep_idle(max_idle).await;
                if evicted > 0 {
                    let remaining = registry.len().await;
                    tracing::info!(evicted, remaining, "Evicted idle chat sessions");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Session sweeper shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{ChatBackend, ChatMessage, CompletionError, SessionSettings};
    use async_trait::async_trait;

    struct NoBackend;

    #[async_trait]
    impl ChatBackend for NoBackend {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, CompletionError> {
            Err(CompletionError::MissingContent)
        }

        fn name(&self) -> &str {
            "none"
        }
    }

    fn session(name: &str) -> ChatSession {
        ChatSession::new(name, Arc::new(NoBackend), SessionSettings::immediate())
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty().await);

        let a = registry.insert(session("a")).await;
        let b = registry.insert(session("b")).await;
        assert_ne!(a, b);
        assert_eq!(registry.len().await, 2);

        let found = registry.get(&a).await.unwrap();
        assert_eq!(found.lock().await.username(), "a");

        assert!(registry.remove(&a).await.is_some());
        assert!(registry.get(&a).await.is_none());
        assert!(registry.remove(&a).await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_same_user_gets_independent_sessions() {
        let registry = SessionRegistry::new();
        let first = registry.insert(session("aadi")).await;
        let second = registry.insert(session("aadi")).await;

        registry.get(&first).await.unwrap().lock().await.new_chat();

        assert!(registry.get(&first).await.unwrap().lock().await.can_resume());
        assert!(!registry.get(&second).await.unwrap().lock().await.can_resume());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_only_idle_sessions() {
        let registry = SessionRegistry::new();
        let stale = registry.insert(session("stale")).await;
        let active = registry.insert(session("active")).await;

        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        assert!(registry.get(&active).await.is_some());
        tokio::time::advance(Duration::from_secs(40 * 60)).await;

        let evicted = registry.sweep_idle(Duration::from_secs(3600)).await;
        assert_eq!(evicted, 1);
        assert!(registry.get(&stale).await.is_none());
        assert!(registry.get(&active).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_logins_do_not_accumulate() {
        let registry = SessionRegistry::new();
        for _ in 0..50 {
            registry.insert(session("aadi")).await;
        }
        assert_eq!(registry.len().await, 50);

        let (tx, rx) = broadcast::channel(1);
        let sweeper = tokio::spawn(run_session_sweeper(
            registry.clone(),
            Duration::from_secs(60),
            Duration::from_secs(10),
            rx,
        ));

        tokio::time::sleep(Duration::from_secs(75)).await;
        assert!(registry.is_empty().await);

        tx.send(()).unwrap();
        sweeper.await.unwrap();
    }
}
