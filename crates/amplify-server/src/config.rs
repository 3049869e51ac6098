//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.  YouTube linking stays disabled
//! until both Google client credentials are provided.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8001`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./amplify.db`
    pub database_path: PathBuf,

    /// Google OAuth client id.
    /// Env: `GOOGLE_CLIENT_ID`
    pub google_client_id: Option<String>,

    /// Google OAuth client secret.
    /// Env: `GOOGLE_CLIENT_SECRET`
    pub google_client_secret: Option<String>,

    /// Callback URL registered with Google.
    /// Env: `OAUTH_REDIRECT_URI`
    pub oauth_redirect_uri: String,

    /// Where the browser is sent after the OAuth callback.
    /// Env: `FRONTEND_URL`
    /// Default: `http://localhost:3000`
    pub frontend_url: String,

    /// Env: `GOOGLE_AUTH_URL`
    pub google_auth_url: String,

    /// Env: `GOOGLE_TOKEN_URL`
    pub google_token_url: String,

    /// Base URL of the YouTube Data API.
    /// Env: `YOUTUBE_API_URL`
    pub youtube_api_url: String,

    /// Lifetime of a pending OAuth session.
    /// Env: `OAUTH_SESSION_TTL_SECS`
    /// Default: 600 seconds.
    pub oauth_session_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8001).into(),
            database_path: PathBuf::from("./amplify.db"),
            google_client_id: None,
            google_client_secret: None,
            oauth_redirect_uri: "http://localhost:8001/api/oauth/youtube/callback".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            google_auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            google_token_url: "https://oauth2.googleapis.com/token".to_string(),
            youtube_api_url: "https://www.googleapis.com/youtube/v3".to_string(),
            oauth_session_ttl: Duration::from_secs(600),
        }
    }
}

// Client secret stays out of logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("google_client_id", &self.google_client_id)
            .field(
                "google_client_secret",
                &self.google_client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("oauth_redirect_uri", &self.oauth_redirect_uri)
            .field("frontend_url", &self.frontend_url)
            .field("google_auth_url", &self.google_auth_url)
            .field("google_token_url", &self.google_token_url)
            .field("youtube_api_url", &self.youtube_api_url)
            .field("oauth_session_ttl", &self.oauth_session_ttl)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        config.google_client_id = non_empty("GOOGLE_CLIENT_ID");
        config.google_client_secret = non_empty("GOOGLE_CLIENT_SECRET");

        if let Some(uri) = non_empty("OAUTH_REDIRECT_URI") {
            config.oauth_redirect_uri = uri;
        }
        if let Some(url) = non_empty("FRONTEND_URL") {
            config.frontend_url = url;
        }
        if let Some(url) = non_empty("GOOGLE_AUTH_URL") {
            config.google_auth_url = url;
        }
        if let Some(url) = non_empty("GOOGLE_TOKEN_URL") {
            config.google_token_url = url;
        }
        if let Some(url) = non_empty("YOUTUBE_API_URL") {
            config.youtube_api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(val) = lookup("OAUTH_SESSION_TTL_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.oauth_session_ttl = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid OAUTH_SESSION_TTL_SECS, using default"),
            }
        }

        config
    }

    /// Whether both Google client credentials are present.
    pub fn oauth_configured(&self) -> bool {
        self.google_client_id.is_some() && self.google_client_secret.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8001).into());
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert!(!config.oauth_configured());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/tmp/amplify-test.db"),
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("YOUTUBE_API_URL", "http://127.0.0.1:1234/youtube/"),
            ("OAUTH_SESSION_TTL_SECS", "30"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.database_path, PathBuf::from("/tmp/amplify-test.db"));
        assert!(config.oauth_configured());
        assert_eq!(config.youtube_api_url, "http://127.0.0.1:1234/youtube");
        assert_eq!(config.oauth_session_ttl, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("OAUTH_SESSION_TTL_SECS", "0"),
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "  "),
        ]);
        assert_eq!(config.http_addr, ServerConfig::default().http_addr);
        assert_eq!(config.oauth_session_ttl, Duration::from_secs(600));
        assert!(!config.oauth_configured());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = from_pairs(&[("GOOGLE_CLIENT_SECRET", "hunter2")]);
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
