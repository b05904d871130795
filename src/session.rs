//! # Sessions
//!
//! Server-side session map keyed by an opaque token.
//!
//! A session exists only after a successful credential check, so presence in
//! the map is the authenticated predicate. Each session carries the identity
//! the store's auth endpoint verified, not a hardcoded admin constant, so a
//! second credential becomes a data change rather than a code change.
//!
//! Expiry is ten minutes of inactivity, checked against a timestamp on every
//! access; an expired entry is removed lazily on its next use. The token
//! round-trips in an HttpOnly cookie and is the only session state the client
//! ever holds.
use std::{
    collections::HashMap,
    sync::RwLock,
    time::{Duration, Instant},
};

use axum::http::{HeaderMap, header};
use thiserror::Error;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sexton_session";

pub const SESSION_TTL: Duration = Duration::from_millis(600_000);

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session store lock poisoned")]
    Poisoned,
}

struct Session {
    identity: String,
    last_seen: Instant,
}

pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an authenticated session and returns its opaque token.
    pub fn create(&self, identity: &str) -> Result<String, SessionError> {
        let token = Uuid::new_v4().to_string();

        let mut sessions = self.sessions.write().map_err(|_| SessionError::Poisoned)?;
        sessions.insert(
            token.clone(),
            Session {
                identity: identity.to_string(),
                last_seen: Instant::now(),
            },
        );

        Ok(token)
    }

    /// The auth gate predicate: returns the session's identity when the token
    /// names a live session, refreshing its inactivity clock. Expired entries
    /// are removed here.
    pub fn authenticated(&self, token: Option<&str>) -> Option<String> {
        let token = token?;
        let mut sessions = self.sessions.write().ok()?;

        match sessions.get_mut(token) {
            Some(session) if session.last_seen.elapsed() < self.ttl => {
                session.last_seen = Instant::now();
                Some(session.identity.clone())
            }
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Removes the session. A token with no live session is still a clean
    /// logout; only a failure of the store itself is an error, and the caller
    /// must report it instead of redirecting.
    pub fn destroy(&self, token: Option<&str>) -> Result<(), SessionError> {
        let Some(token) = token else {
            return Ok(());
        };

        let mut sessions = self.sessions.write().map_err(|_| SessionError::Poisoned)?;
        sessions.remove(token);

        Ok(())
    }
}

pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .map(str::to_string)
}

pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}
