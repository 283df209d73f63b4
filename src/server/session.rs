//! In-memory login sessions and their CSRF tokens.
//!
//! A session is created by a successful login and identified by a random id
//! carried in the `taskvault.sid` cookie. Sessions expire after a fixed
//! lifetime and are lost when the process restarts.

use crate::api::types::SESSION_COOKIE;
use axum::http::{header::COOKIE, HeaderMap};
use parking_lot::Mutex;
use rand::{distributions::Alphanumeric, Rng};
use std::collections::HashMap;
use std::time::{Duration, Instant};

const TOKEN_LENGTH: usize = 32;

/// Random alphanumeric token used for session ids and CSRF tokens.
pub fn random_token() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(TOKEN_LENGTH).map(char::from).collect()
}

#[derive(Debug)]
struct SessionEntry {
    expires_at: Instant,
    csrf_token: Option<String>,
}

#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Starts a new session and returns its id. Expired sessions are pruned.
    pub fn create(&self) -> String {
        let now = Instant::now();
        let id = random_token();
        let mut sessions = self.sessions.lock();
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            id.clone(),
            SessionEntry {
                expires_at: now + self.ttl,
                csrf_token: None,
            },
        );
        id
    }

    /// True if `id` names a live session. An expired one is removed.
    pub fn is_valid(&self, id: &str) -> bool {
        let mut sessions = self.sessions.lock();
        match sessions.get(id) {
            Some(entry) if entry.expires_at > Instant::now() => true,
            Some(_) => {
                sessions.remove(id);
                false
            }
            None => false,
        }
    }

    /// Ends the session. Returns whether it existed.
    pub fn destroy(&self, id: &str) -> bool {
        self.sessions.lock().remove(id).is_some()
    }

    /// Returns the session's CSRF token, creating it on first request.
    pub fn csrf_token(&self, id: &str) -> Option<String> {
        if !self.is_valid(id) {
            return None;
        }
        let mut sessions = self.sessions.lock();
        let entry = sessions.get_mut(id)?;
        Some(entry.csrf_token.get_or_insert_with(random_token).clone())
    }

    pub fn verify_csrf(&self, id: &str, token: &str) -> bool {
        self.sessions
            .lock()
            .get(id)
            .and_then(|entry| entry.csrf_token.as_deref())
            .is_some_and(|expected| expected == token)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Session id from the request's `Cookie` headers.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(id: &str, ttl: Duration) -> String {
    format!("{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}", SESSION_COOKIE, id, ttl.as_secs())
}

pub fn expired_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", SESSION_COOKIE)
}
