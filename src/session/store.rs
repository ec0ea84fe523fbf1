//! Session-keyed storage for the HTTP surface.
//!
//! Idle sessions are swept whenever the store is touched, so abandoned
//! conversations do not accumulate for the lifetime of the server.

use super::ConversationSession;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Default idle time after which a session is discarded (one hour).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// A session shared between requests. The mutex serialises interactions
/// within one session.
pub type SharedSession = Arc<Mutex<ConversationSession>>;

struct Entry {
    session: SharedSession,
    last_used: Instant,
}

impl Entry {
    /// A session still held by a request is never idle.
    fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        Arc::strong_count(&self.session) == 1 && now.duration_since(self.last_used) >= ttl
    }
}

/// Result of [`SessionStore::get_or_create`].
pub struct Checkout {
    pub id: Uuid,
    pub session: SharedSession,
    /// True when the session did not exist before this call.
    pub created: bool,
}

/// In-memory map from session id to conversation.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that discards sessions left unused for `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a session, creating it with `create` when the id is absent or unknown.
    pub async fn get_or_create<F>(&self, id: Option<Uuid>, create: F) -> Checkout
    where
        F: FnOnce() -> ConversationSession,
    {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.sweep(&mut sessions, now);

        let id = id.unwrap_or_else(Uuid::new_v4);
        let mut created = false;
        let entry = sessions.entry(id).or_insert_with(|| {
            created = true;
            Entry {
                session: Arc::new(Mutex::new(create())),
                last_used: now,
            }
        });
        entry.last_used = now;

        Checkout {
            id,
            session: entry.session.clone(),
            created,
        }
    }

    pub async fn get(&self, id: &Uuid) -> Option<SharedSession> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.sweep(&mut sessions, now);

        let entry = sessions.get_mut(id)?;
        entry.last_used = now;
        Some(entry.session.clone())
    }

    /// Discard a session. Returns false when it did not exist.
    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn sweep(&self, sessions: &mut HashMap<Uuid, Entry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_idle(now, self.ttl));
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
    }
}
