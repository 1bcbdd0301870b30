mod session;

pub use session::{Session, Viewer};

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Process-wide table of live mirroring sessions, keyed by the opaque id
/// embedded in the shareable URL. An explicit instance rather than a
/// global, so tests can run isolated registries side by side.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh session under a new unique id. The id is a random
    /// UUID v4 and doubles as the access secret in the viewer URL, so
    /// uniqueness against live sessions is checked under the write lock
    /// rather than assumed.
    pub async fn create_session(&self) -> Arc<Session> {
        let mut sessions = self.sessions.write().await;
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let session = Arc::new(Session::new(id.clone()));
        sessions.insert(id.clone(), session.clone());
        info!(session = %id, "session created");
        session
    }

    /// Look up a live session. Sessions whose author already left are
    /// treated as absent even if removal has not landed yet.
    pub async fn get_session(&self, id: &str) -> Option<Arc<Session>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).filter(|s| !s.is_closed()).cloned()
    }

    /// Delete a session entry. Idempotent: removing a missing id is a
    /// no-op.
    pub async fn remove_session(&self, id: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(id).is_some() {
            info!(session = %id, "session removed");
        }
    }

    /// Number of registered sessions, for the health probe.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}
