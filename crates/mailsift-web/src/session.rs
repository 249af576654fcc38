use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Cookie carrying the console session token.
pub const SESSION_COOKIE: &str = "msift_session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Transient per-caller session state.
///
/// `terminate_all` is idempotent: an absent token or one with no state is an
/// `Ok(false)` no-op, never an error. Callers see only their own token's
/// state; isolation between concurrent callers is the store's job.
pub trait SessionStore: Send + Sync {
    /// Drops all state held for `token`. Returns whether any state existed.
    fn terminate_all(&self, token: Option<&str>) -> Result<bool, SessionError>;
}

/// In-memory [`SessionStore`] keyed by session token.
#[derive(Default)]
pub struct MemorySessions {
    inner: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores one attribute under the caller's token.
    pub fn insert(
        &self,
        token: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), SessionError> {
        let mut sessions = self.lock()?;
        sessions
            .entry(token.to_owned())
            .or_default()
            .insert(key.into(), value.into());
        Ok(())
    }

    /// All attributes held for `token`, if any.
    pub fn attributes(&self, token: &str) -> Result<Option<HashMap<String, String>>, SessionError> {
        Ok(self.lock()?.get(token).cloned())
    }

    /// Number of live sessions.
    pub fn active(&self) -> Result<usize, SessionError> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, HashMap<String, String>>>, SessionError> {
        self.inner
            .lock()
            .map_err(|_| SessionError::Unavailable("session lock poisoned".into()))
    }
}

impl SessionStore for MemorySessions {
    fn terminate_all(&self, token: Option<&str>) -> Result<bool, SessionError> {
        let Some(token) = token else {
            return Ok(false);
        };
        Ok(self.lock()?.remove(token).is_some())
    }
}

/// Extracts the session token from the request's `Cookie` header(s).
pub fn session_token(headers: &http::HeaderMap) -> Option<String> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminate_drops_only_the_callers_state() {
        let sessions = MemorySessions::new();
        sessions.insert("tok-a", "user", "admin").unwrap();
        sessions.insert("tok-b", "user", "audit").unwrap();

        assert!(sessions.terminate_all(Some("tok-a")).unwrap());
        assert!(sessions.attributes("tok-a").unwrap().is_none());
        assert_eq!(
            sessions.attributes("tok-b").unwrap().unwrap().get("user"),
            Some(&"audit".to_owned())
        );
    }

    #[test]
    fn terminate_is_idempotent() {
        let sessions = MemorySessions::new();
        sessions.insert("tok", "user", "admin").unwrap();

        assert!(sessions.terminate_all(Some("tok")).unwrap());
        assert!(!sessions.terminate_all(Some("tok")).unwrap());
        assert!(!sessions.terminate_all(Some("never-existed")).unwrap());
    }

    #[test]
    fn terminate_without_token_is_a_noop() {
        let sessions = MemorySessions::new();
        sessions.insert("tok", "user", "admin").unwrap();

        assert!(!sessions.terminate_all(None).unwrap());
        assert_eq!(sessions.active().unwrap(), 1);
    }

    #[test]
    fn cookie_token_is_found_among_other_cookies() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::COOKIE,
            format!("theme=dark; {SESSION_COOKIE}=abc123; lang=en")
                .parse()
                .unwrap(),
        );
        assert_eq!(session_token(&headers), Some("abc123".to_owned()));
    }

    #[test]
    fn absent_cookie_yields_no_token() {
        let headers = http::HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        let mut headers = http::HeaderMap::new();
        headers.insert(http::header::COOKIE, "theme=dark".parse().unwrap());
        assert_eq!(session_token(&headers), None);
    }
}
