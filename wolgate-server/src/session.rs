//! In-memory admin sessions.
//!
//! Logging in mints a random 32-byte token, handed to the browser in an
//! HttpOnly cookie and held server-side with an expiry. Logout (or expiry)
//! invalidates the token immediately; a restart logs everyone out.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, header};
use tokio::sync::RwLock;

/// Cookie name for the admin session token.
pub const SESSION_COOKIE: &str = "wolgate_session";

/// Sessions live 12 hours regardless of cookie lifetime.
const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Token -> expiry map behind a lock.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Instant>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new session token.
    pub async fn create(&self) -> String {
        let token = hex::encode(rand::random::<[u8; 32]>());
        self.sessions
            .write()
            .await
            .insert(token.clone(), Instant::now() + SESSION_TTL);
        token
    }

    /// Check a token, dropping it if it has expired.
    pub async fn is_valid(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(token) {
            Some(expiry) if *expiry > Instant::now() => true,
            Some(_) => {
                sessions.remove(token);
                false
            }
            None => false,
        }
    }

    /// Invalidate a token (logout).
    pub async fn remove(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}

/// Extract the session token from the Cookie header, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name == SESSION_COOKIE).then(|| value.to_string())
        })
}

/// Set-Cookie value carrying a fresh session token.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// Set-Cookie value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
