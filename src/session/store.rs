//! Session store and idle-session sweeper.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time;

use crate::app::Application;
use crate::config::SockJsConfig;
use crate::observability::metrics;
use crate::session::{Session, SessionKey};

/// Close code used when the application returns while the session is open.
const APPLICATION_FINISHED: (u16, &str) = (1000, "Session finished");

/// Close code used by the sweeper.
const TIMED_OUT: (u16, &str) = (1000, "Session timed out");

/// Concurrent map of live sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionKey, Arc<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SessionKey) -> Option<Arc<Session>> {
        self.sessions.get(key).map(|s| Arc::clone(s.value()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Look up `key`, creating a fresh session if there is none.
    ///
    /// Returns the session and whether it was just created.
    pub fn get_or_create(&self, key: SessionKey, max_pending: usize) -> (Arc<Session>, bool) {
        match self.sessions.entry(key) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let session = Arc::new(Session::new(entry.key().clone(), max_pending));
                entry.insert(Arc::clone(&session));
                metrics::record_session_opened();
                (session, true)
            }
        }
    }

    /// Look up or create the session for `key`; a new session gets the
    /// application spawned on it.
    ///
    /// The store forgets the session once the application returns, closing
    /// it first if the application left it open.
    pub fn open(
        self: &Arc<Self>,
        key: SessionKey,
        max_pending: usize,
        app: Arc<dyn Application>,
    ) -> Arc<Session> {
        let (session, created) = self.get_or_create(key, max_pending);
        if created {
            let store = Arc::clone(self);
            let served = Arc::clone(&session);
            tokio::spawn(async move {
                app.serve(Arc::clone(&served)).await;
                served.close(APPLICATION_FINISHED.0, APPLICATION_FINISHED.1);
                store.remove(served.key());
            });
        }
        session
    }

    pub fn remove(&self, key: &SessionKey) -> Option<Arc<Session>> {
        let removed = self.sessions.remove(key).map(|(_, s)| s);
        if removed.is_some() {
            metrics::record_session_closed();
        }
        removed
    }

    /// Close every session that has had no consumer for at least `max_idle`.
    ///
    /// Returns how many were closed.
    pub fn sweep(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<Arc<Session>> = self
            .sessions
            .iter()
            .filter(|s| s.unattached_for(now).is_some_and(|idle| idle >= max_idle))
            .map(|s| Arc::clone(s.value()))
            .collect();

        for session in &expired {
            tracing::debug!(session = %session.key(), "Closing idle session");
            session.close(TIMED_OUT.0, TIMED_OUT.1);
        }
        expired.len()
    }

    /// Close all sessions, used on shutdown.
    pub fn close_all(&self, code: u16, reason: &str) {
        for session in self.sessions.iter() {
            session.close(code, reason);
        }
    }
}

/// Periodically closes sessions left without a consumer.
pub struct SessionSweeper {
    store: Arc<SessionStore>,
    config: Arc<ArcSwap<SockJsConfig>>,
}

impl SessionSweeper {
    pub fn new(store: Arc<SessionStore>, config: Arc<ArcSwap<SockJsConfig>>) -> Self {
        Self { store, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let period = self.config.load().transports.disconnect_delay();
        tracing::info!(period = ?period, "Session sweeper starting");

        let mut ticker = time::interval(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let max_idle = self.config.load().transports.disconnect_delay();
                    let closed = self.store.sweep(max_idle);
                    if closed > 0 {
                        tracing::info!(closed, remaining = self.store.len(), "Swept idle sessions");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Session sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::ConnectionId;
    use crate::session::{Consumer, SessionState};

    #[test]
    fn get_or_create_reuses_existing() {
        let store = SessionStore::new();
        let key = SessionKey::new("abc");
        let (first, created) = store.get_or_create(key.clone(), 8);
        assert!(created);
        let (second, created) = store.get_or_create(key.clone(), 8);
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);

        store.remove(&key);
        assert!(store.is_empty());
    }

    #[test]
    fn sweep_closes_only_unattached_sessions() {
        let store = SessionStore::new();
        let (idle, _) = store.get_or_create(SessionKey::new("idle"), 8);
        let (busy, _) = store.get_or_create(SessionKey::new("busy"), 8);
        let (consumer, _rx) = Consumer::channel(ConnectionId::new(), 8);
        busy.attach_consumer(consumer).unwrap();

        assert_eq!(store.sweep(Duration::ZERO), 1);
        assert_eq!(idle.state(), SessionState::Closed);
        assert_eq!(idle.close_status().unwrap().reason, "Session timed out");
        assert_eq!(busy.state(), SessionState::Active);
    }

    #[test]
    fn sweep_respects_idle_threshold() {
        let store = SessionStore::new();
        store.get_or_create(SessionKey::new("recent"), 8);
        assert_eq!(store.sweep(Duration::from_secs(3600)), 0);
    }

    #[tokio::test]
    async fn store_forgets_session_when_application_returns() {
        let store = Arc::new(SessionStore::new());
        let app: Arc<dyn Application> = Arc::new(|session: Arc<Session>| async move {
            let _ = session.recv().await;
        });

        let session = store.open(SessionKey::new("k"), 8, app);
        assert_eq!(store.len(), 1);

        session.receive_message("bye".into()).unwrap();
        for _ in 0..50 {
            if store.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(store.is_empty());
        assert_eq!(session.state(), SessionState::Closed);
    }
}
