//! Short-lived OAuth sessions.
//!
//! Initiating YouTube linking records the caller's wallet and the
//! anti-forgery `state` token under a random session id, which the browser
//! carries back to the callback in a cookie.  Sessions are single-use and
//! expire after a configurable TTL; a housekeeping task purges stale ones.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use tokio::sync::RwLock;
use tracing::debug;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "amplify_oauth_session";

/// Upper bound on pending sessions held at once.
pub const MAX_PENDING_SESSIONS: usize = 10_000;

/// What the callback needs to finish linking.
#[derive(Debug, Clone)]
pub struct PendingLink {
    /// Anti-forgery token sent to the provider.
    pub state: String,
    /// Wallet the caller claimed when starting the flow.
    pub wallet_address: String,
    created_at: Instant,
}

/// In-memory session table keyed by session id.
#[derive(Clone)]
pub struct OAuthSessions {
    sessions: Arc<RwLock<HashMap<String, PendingLink>>>,
    ttl: Duration,
    capacity: usize,
}

impl OAuthSessions {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, MAX_PENDING_SESSIONS)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Open a session for `wallet_address`.  Returns `(session_id, state)`.
    ///
    /// At capacity, expired sessions are dropped first and then the oldest
    /// pending one.
    pub async fn begin(&self, wallet_address: &str) -> (String, String) {
        let session_id = random_token();
        let state = random_token();

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.capacity {
            sessions.retain(|_, pending| pending.created_at.elapsed() < self.ttl);
        }
        if sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, pending)| pending.created_at)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                sessions.remove(&id);
                debug!("OAuth session table full, evicted oldest entry");
            }
        }

        sessions.insert(
            session_id.clone(),
            PendingLink {
                state: state.clone(),
                wallet_address: wallet_address.to_string(),
                created_at: Instant::now(),
            },
        );

        (session_id, state)
    }

    /// Remove and return the session, or `None` if unknown or expired.
    pub async fn take(&self, session_id: &str) -> Option<PendingLink> {
        let pending = self.sessions.write().await.remove(session_id)?;
        if pending.created_at.elapsed() >= self.ttl {
            debug!("OAuth session expired");
            return None;
        }
        Some(pending)
    }

    /// Drop expired sessions.  Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, pending| pending.created_at.elapsed() < self.ttl);
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "Purged expired OAuth sessions");
        }
        removed
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// `Set-Cookie` value binding the browser to `session_id`.
    pub fn cookie(&self, session_id: &str) -> String {
        format!(
            "{SESSION_COOKIE}={session_id}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.ttl.as_secs()
        )
    }

    /// `Set-Cookie` value removing the session cookie.
    pub fn clear_cookie() -> String {
        format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
    }
}

/// Extract the session id from the request's `Cookie` headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn random_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[tokio::test]
    async fn test_begin_and_take() {
        let sessions = OAuthSessions::new(Duration::from_secs(60));
        let (id, state) = sessions.begin("walletA").await;
        assert_eq!(id.len(), 64);
        assert_ne!(id, state);

        let pending = sessions.take(&id).await.unwrap();
        assert_eq!(pending.state, state);
        assert_eq!(pending.wallet_address, "walletA");

        // Single use.
        assert!(sessions.take(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let sessions = OAuthSessions::new(Duration::ZERO);
        let (id, _) = sessions.begin("walletA").await;
        assert!(sessions.take(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let sessions = OAuthSessions::new(Duration::ZERO);
        sessions.begin("walletA").await;
        sessions.begin("walletB").await;

        assert_eq!(sessions.purge_expired().await, 2);
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let sessions = OAuthSessions::with_capacity(Duration::from_secs(60), 2);
        let (first, _) = sessions.begin("walletA").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let (second, _) = sessions.begin("walletB").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let (third, _) = sessions.begin("walletC").await;

        assert_eq!(sessions.len().await, 2);
        assert!(sessions.take(&first).await.is_none());
        assert_eq!(sessions.take(&second).await.unwrap().wallet_address, "walletB");
        assert_eq!(sessions.take(&third).await.unwrap().wallet_address, "walletC");
    }

    #[tokio::test]
    async fn test_capacity_prefers_dropping_expired() {
        let sessions = OAuthSessions::with_capacity(Duration::ZERO, 1);
        sessions.begin("walletA").await;
        sessions.begin("walletB").await;
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_keeps_fresh_sessions() {
        let sessions = OAuthSessions::new(Duration::from_secs(60));
        sessions.begin("walletA").await;

        assert_eq!(sessions.purge_expired().await, 0);
        assert_eq!(sessions.len().await, 1);
    }

    #[test]
    fn test_session_id_from_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("a=1; amplify_oauth_session=abc123; b=2"),
        );
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_missing_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("amplify_oauth_session="));
        assert!(session_id_from_headers(&headers).is_none());
        assert!(session_id_from_headers(&HeaderMap::new()).is_none());
    }
}
