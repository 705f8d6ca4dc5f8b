use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Session key holding the page to return to after authorization
pub const ORIGINAL_URL_KEY: &str = "original_url";

/// Redirect target used whenever no usable original URL exists
pub const DEFAULT_REDIRECT: &str = "/";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Session value rejected: {reason}")]
    InvalidValue { reason: String },
}

/// Server side session keyed by the browser's session cookie
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    values: HashMap<String, String>,
    is_new: bool,
}

impl Session {
    fn new(ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            expires_at: now + ttl,
            values: HashMap::new(),
            is_new: true,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn clear_values(&mut self) {
        self.values.clear();
    }

    /// Whether the session was created by this request rather than loaded
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Session persistence used by the browser flow
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session for `session_id`, or a fresh one when the id is
    /// absent, unknown or expired
    async fn load(&self, session_id: Option<&str>) -> Result<Session, SessionError>;

    async fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Empty the stored session in one step and return what it held.
    ///
    /// Of several concurrent callers with the same id, only one sees the
    /// values. `None` when there is no live session for `session_id`.
    async fn consume(&self, session_id: Option<&str>) -> Result<Option<Session>, SessionError>;
}

/// In-memory session store with a fixed lifetime per session
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(600)),
        }
    }

    /// Drop expired sessions, returning how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        let removed = before - sessions.len();
        if removed > 0 {
            debug!("Cleaned up {} expired sessions", removed);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: Option<&str>) -> Result<Session, SessionError> {
        if let Some(id) = session_id.filter(|id| !id.is_empty()) {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(id).filter(|s| !s.is_expired()) {
                let mut session = session.clone();
                session.is_new = false;
                return Ok(session);
            }
        }
        Ok(Session::new(self.ttl))
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        let mut stored = session.clone();
        stored.is_new = false;
        self.sessions.write().await.insert(stored.id.clone(), stored);
        debug!("Stored session {}", session.id);
        Ok(())
    }

    async fn consume(&self, session_id: Option<&str>) -> Result<Option<Session>, SessionError> {
        let Some(id) = session_id.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        let mut sessions = self.sessions.write().await;
        let Some(stored) = sessions.get_mut(id).filter(|s| !s.is_expired()) else {
            return Ok(None);
        };

        let mut taken = stored.clone();
        taken.is_new = false;
        stored.clear_values();
        debug!("Consumed session {}", id);
        Ok(Some(taken))
    }
}

/// Helpers for the pre-authorization page stash
pub struct PendingAuthorization;

impl PendingAuthorization {
    /// Record where to send the browser once authorization completes.
    ///
    /// Only same-origin relative paths are accepted.
    pub fn stash_original_url(session: &mut Session, url: &str) -> Result<(), SessionError> {
        if !is_local_redirect(url) {
            return Err(SessionError::InvalidValue {
                reason: "original_url must be a same-origin path".to_string(),
            });
        }
        session.insert(ORIGINAL_URL_KEY, url);
        Ok(())
    }

    /// Remove the stashed URL and return the redirect target, `/` when absent
    /// or unusable
    pub fn take_original_url(session: &mut Session) -> String {
        session
            .remove(ORIGINAL_URL_KEY)
            .filter(|url| is_local_redirect(url))
            .unwrap_or_else(|| DEFAULT_REDIRECT.to_string())
    }
}

fn is_local_redirect(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')
}
