//! Per-user session state.
//!
//! A session owns a bibliography and the most recent audit report. The
//! store is held by the server and handed to handlers explicitly; the
//! formatter and scanner never see it.
//!
//! Sessions idle for longer than the store's time-to-live are dropped:
//! lazily when they are next looked up, and in bulk whenever a new session
//! is created.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::bibliography::Bibliography;
use crate::models::AuditReport;

#[derive(Debug, Clone)]
pub struct Session {
    pub bibliography: Bibliography,
    /// Replaced wholesale by each audit run.
    pub last_audit: Option<AuditReport>,
    last_seen: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            bibliography: Bibliography::new(),
            last_audit: None,
            last_seen: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.last_seen) > ttl
    }
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.lock().await;
        let evicted = evict_expired(&mut sessions, self.ttl);
        if evicted > 0 {
            tracing::info!(evicted, "expired idle sessions");
        }
        sessions.insert(id, Session::new());
        tracing::debug!(session = %id, "session created");
        id
    }

    /// Runs `f` against the session, or returns `None` if it does not exist
    /// or has expired. Access refreshes the idle timer.
    pub async fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        if sessions.get(&id)?.is_expired(self.ttl, now) {
            sessions.remove(&id);
            tracing::debug!(session = %id, "session expired");
            return None;
        }
        let session = sessions.get_mut(&id)?;
        session.last_seen = now;
        Some(f(session))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }

    /// Drops every expired session and returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        evict_expired(&mut *self.sessions.lock().await, self.ttl)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

fn evict_expired(sessions: &mut HashMap<Uuid, Session>, ttl: Duration) -> usize {
    let now = Instant::now();
    let before = sessions.len();
    sessions.retain(|_, s| !s.is_expired(ttl, now));
    before - sessions.len()
}
