use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, SameSite};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::core::config::SessionConfig;
use crate::core::error::AppError;

struct SessionEntry {
    values: HashMap<String, String>,
    last_access: Instant,
}

/// Server-side session storage keyed by the id carried in the session cookie.
///
/// Entries idle for longer than the configured timeout are treated as absent
/// and dropped on access or by [`SessionStore::purge_expired`].
pub struct SessionStore {
    sessions: DashMap<Uuid, SessionEntry>,
    cookie_name: String,
    idle_timeout: Duration,
    secure_cookie: bool,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            cookie_name: config.cookie_name.clone(),
            idle_timeout: config.idle_timeout,
            secure_cookie: config.secure_cookie,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Resolve the session for a request. Unknown or expired ids get a fresh,
    /// not yet persisted session.
    pub fn load(self: &Arc<Self>, id: Option<Uuid>) -> Session {
        if let Some(id) = id {
            if self.touch(id) {
                return Session {
                    id,
                    store: Arc::clone(self),
                    is_new: false,
                    destroyed: Arc::new(AtomicBool::new(false)),
                };
            }
        }

        Session {
            id: Uuid::new_v4(),
            store: Arc::clone(self),
            is_new: true,
            destroyed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Drop every idle session, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        let timeout = self.idle_timeout;
        self.sessions
            .retain(|_, entry| entry.last_access.elapsed() < timeout);
        before.saturating_sub(self.sessions.len())
    }

    pub fn session_cookie(&self, id: Uuid) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .build()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), String::new()))
            .path("/")
            .build()
    }

    fn touch(&self, id: Uuid) -> bool {
        let expired = match self.sessions.get_mut(&id) {
            Some(mut entry) => {
                if entry.last_access.elapsed() >= self.idle_timeout {
                    true
                } else {
                    entry.last_access = Instant::now();
                    return true;
                }
            }
            None => return false,
        };

        if expired {
            self.sessions.remove(&id);
        }
        false
    }

    fn get(&self, id: Uuid, key: &str) -> Option<String> {
        self.sessions
            .get(&id)
            .and_then(|entry| entry.values.get(key).cloned())
    }

    fn insert(&self, id: Uuid, key: &str, value: String) {
        let mut entry = self.sessions.entry(id).or_insert_with(|| SessionEntry {
            values: HashMap::new(),
            last_access: Instant::now(),
        });
        entry.last_access = Instant::now();
        entry.values.insert(key.to_string(), value);
    }

    fn remove_value(&self, id: Uuid, key: &str) {
        if let Some(mut entry) = self.sessions.get_mut(&id) {
            entry.values.remove(key);
        }
    }

    fn remove(&self, id: Uuid) {
        self.sessions.remove(&id);
    }
}

/// Handle to the current request's session, inserted by the session middleware
#[derive(Clone)]
pub struct Session {
    id: Uuid,
    store: Arc<SessionStore>,
    is_new: bool,
    destroyed: Arc<AtomicBool>,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// True when the request did not carry a live session cookie
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Relaxed)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(self.id, key)
    }

    pub fn insert(&self, key: &str, value: impl Into<String>) {
        self.store.insert(self.id, key, value.into());
    }

    pub fn remove(&self, key: &str) {
        self.store.remove_value(self.id, key);
    }

    pub fn destroy(&self) {
        self.store.remove(self.id);
        self.destroyed.store(true, Ordering::Relaxed);
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session layer is not installed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(idle: Duration) -> Arc<SessionStore> {
        Arc::new(SessionStore::new(&SessionConfig {
            cookie_name: "sid".to_string(),
            idle_timeout: idle,
            secure_cookie: false,
        }))
    }

    #[test]
    fn test_new_session_is_not_persisted_until_written() {
        let store = store(Duration::from_secs(60));
        let session = store.load(None);

        assert!(session.is_new());
        assert!(!store.contains(session.id()));

        session.insert("jwt-token", "abc");
        assert!(store.contains(session.id()));
        assert_eq!(session.get("jwt-token").as_deref(), Some("abc"));
    }

    #[test]
    fn test_existing_session_is_reloaded() {
        let store = store(Duration::from_secs(60));
        let first = store.load(None);
        first.insert("firstName", "Ravi");

        let second = store.load(Some(first.id()));
        assert!(!second.is_new());
        assert_eq!(second.id(), first.id());
        assert_eq!(second.get("firstName").as_deref(), Some("Ravi"));
    }

    #[test]
    fn test_unknown_id_gets_fresh_session() {
        let store = store(Duration::from_secs(60));
        let unknown = Uuid::new_v4();
        let session = store.load(Some(unknown));

        assert!(session.is_new());
        assert_ne!(session.id(), unknown);
    }

    #[test]
    fn test_idle_session_expires() {
        let store = store(Duration::ZERO);
        let session = store.load(None);
        session.insert("jwt-token", "abc");

        let reloaded = store.load(Some(session.id()));
        assert!(reloaded.is_new());
        assert!(!store.contains(session.id()));
    }

    #[test]
    fn test_purge_expired() {
        let store = store(Duration::ZERO);
        store.load(None).insert("a", "1");
        store.load(None).insert("b", "2");

        assert_eq!(store.purge_expired(), 2);
    }

    #[test]
    fn test_destroy_removes_session() {
        let store = store(Duration::from_secs(60));
        let session = store.load(None);
        session.insert("jwt-token", "abc");
        session.destroy();

        assert!(session.is_destroyed());
        assert!(!store.contains(session.id()));
        assert_eq!(session.get("jwt-token"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let store = store(Duration::from_secs(60));
        let id = Uuid::new_v4();
        let cookie = store.session_cookie(id);

        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), id.to_string());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
