/// Client-side session persistence.
///
/// The auth gate reads the stored session before asking the network, so a
/// returning user is recognised without a round trip.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::{
    error::{AppError, AppResult},
    models::User,
};

/// Cookie name the API expects the session token under
pub const SESSION_COOKIE_NAME: &str = "session_token";

/// Lifetime used when the server does not say when a token expires
pub const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 7;

/// What the client remembers about a signed-in user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSession {
    pub user: User,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(user: User) -> Self {
        Self {
            user,
            session_token: None,
            expires_at: None,
            saved_at: Utc::now(),
        }
    }

    pub fn with_token(mut self, token: Option<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        self.session_token = token;
        self.expires_at = expires_at;
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|expires| expires <= now).unwrap_or(false)
    }
}

/// Storage for the current session
pub trait SessionStore: Send + Sync {
    fn get(&self) -> AppResult<Option<StoredSession>>;

    fn set(&self, session: &StoredSession) -> AppResult<()>;

    fn clear(&self) -> AppResult<()>;
}

/// Session kept only for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<StoredSession>>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> AppResult<Option<StoredSession>> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, session: &StoredSession) -> AppResult<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Session persisted as a JSON file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    /// A missing file means no session; an unreadable one is treated the same way
    fn get(&self) -> AppResult<Option<StoredSession>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::SessionStore(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring corrupted session file"
                );
                Ok(None)
            }
        }
    }

    fn set(&self, session: &StoredSession) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::SessionStore(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content).map_err(|e| {
            AppError::SessionStore(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }

    fn clear(&self) -> AppResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::SessionStore(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Renders the `session_token` cookie
///
/// `secure` adds the `Secure` attribute, which keeps the cookie off plain-HTTP
/// connections.
pub fn session_cookie(token: &str, expires_at: Option<DateTime<Utc>>, secure: bool) -> String {
    let expires =
        expires_at.unwrap_or_else(|| Utc::now() + Duration::days(DEFAULT_SESSION_LIFETIME_DAYS));
    let mut cookie = format!(
        "{}={}; Path=/; Expires={}; SameSite=Strict",
        SESSION_COOKIE_NAME,
        token,
        expires.format("%a, %d %b %Y %H:%M:%S GMT")
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Cookie that removes a previously set `session_token`
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user() -> User {
        User {
            id: 7,
            username: "sam".to_string(),
            email: Some("sam@example.com".to_string()),
        }
    }

    #[test]
    fn test_memory_store_set_get_clear() {
        let store = MemorySessionStore::default();
        assert_eq!(store.get().unwrap(), None);

        let session = StoredSession::new(user());
        store.set(&session).unwrap();
        assert_eq!(store.get().unwrap(), Some(session));

        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let session = StoredSession::new(user()).with_token(Some("tok".to_string()), None);
        FileSessionStore::new(&path).set(&session).unwrap();

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.get().unwrap(), Some(session));

        reopened.clear().unwrap();
        assert!(!path.exists());
        // Clearing twice is fine
        reopened.clear().unwrap();
    }

    #[test]
    fn test_file_store_missing_or_corrupted_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileSessionStore::new(&path);
        assert_eq!(store.get().unwrap(), None);

        std::fs::write(&path, "{\"user\": ").unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let session = StoredSession::new(user());
        assert!(!session.is_expired(now));

        let expired = session
            .clone()
            .with_token(Some("tok".to_string()), Some(now - Duration::minutes(1)));
        assert!(expired.is_expired(now));

        let valid = session.with_token(Some("tok".to_string()), Some(now + Duration::days(1)));
        assert!(!valid.is_expired(now));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let expires = Utc.with_ymd_and_hms(2030, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            session_cookie("abc", Some(expires), true),
            "session_token=abc; Path=/; Expires=Mon, 04 Mar 2030 05:06:07 GMT; SameSite=Strict; Secure"
        );
        assert!(!session_cookie("abc", Some(expires), false).contains("Secure"));
        assert!(session_cookie("abc", None, false).contains("Expires="));
    }
}
