use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::UserId;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: UserId,
    pub is_admin: bool,
    pub expires_at: DateTime<Utc>,
}

/// Opaque session tokens mapped to the logged-in user
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session and return its token
    pub async fn create(&self, user_id: UserId, is_admin: bool) -> String {
        let token = ulid::Ulid::new().to_string();
        let session = Session {
            user_id,
            is_admin,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.write().await.insert(token.clone(), session);
        token
    }

    /// Look up a live session. Expired sessions are dropped on sight.
    pub async fn get(&self, token: &str) -> Option<Session> {
        let session = self.sessions.read().await.get(token).cloned()?;
        if session.expires_at <= Utc::now() {
            self.sessions.write().await.remove(token);
            return None;
        }
        Some(session)
    }

    pub async fn destroy(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Drop expired sessions (call periodically)
    pub async fn cleanup(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Spawn a background task that sweeps expired sessions every `every`
pub fn spawn_session_sweeper(sessions: SessionStore, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let removed = sessions.cleanup().await;
            if removed > 0 {
                tracing::debug!("Removed {} expired sessions", removed);
            }
        }
    });
}
