//! YouTube channel linking over Google OAuth 2.0.
//!
//! The rest of the server only sees the [`ChannelLinker`] contract: build an
//! authorization URL for a `state` token, and turn an authorization code
//! into a [`LinkedChannel`] or fail.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use amplify_shared::constants::YOUTUBE_READONLY_SCOPE;

use crate::config::ServerConfig;

/// A channel resolved from an authorization code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedChannel {
    pub channel_id: String,
    pub channel_name: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid OAuth endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Failed to get YouTube channel info: {0}")]
    ChannelLookup(String),

    #[error("No YouTube channel found")]
    NoChannel,
}

#[async_trait]
pub trait ChannelLinker: Send + Sync {
    /// URL the browser is redirected to in order to grant access.
    fn authorization_url(&self, state: &str) -> Result<String, OAuthError>;

    /// Exchange an authorization code for the caller's channel.
    async fn exchange_code(&self, code: &str) -> Result<LinkedChannel, OAuthError>;
}

// ---------------------------------------------------------------------------
// Google / YouTube
// ---------------------------------------------------------------------------

/// [`ChannelLinker`] backed by Google's OAuth endpoints and the YouTube
/// Data API.
pub struct GoogleYoutubeLinker {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    youtube_api_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Deserialize)]
struct ChannelItem {
    id: String,
    snippet: ChannelSnippet,
}

#[derive(Deserialize)]
struct ChannelSnippet {
    title: String,
}

impl GoogleYoutubeLinker {
    /// Returns `None` when the client credentials are not configured.
    pub fn from_config(config: &ServerConfig) -> Option<Self> {
        let client_id = config.google_client_id.clone()?;
        let client_secret = config.google_client_secret.clone()?;

        Some(Self {
            http: reqwest::Client::new(),
            client_id,
            client_secret,
            redirect_uri: config.oauth_redirect_uri.clone(),
            auth_url: config.google_auth_url.clone(),
            token_url: config.google_token_url.clone(),
            youtube_api_url: config.youtube_api_url.clone(),
        })
    }

    async fn fetch_token(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange(format!("{status}: {body}")));
        }

        Ok(resp.json().await?)
    }

    async fn fetch_own_channel(&self, access_token: &str) -> Result<ChannelItem, OAuthError> {
        let resp = self
            .http
            .get(format!("{}/channels", self.youtube_api_url))
            .query(&[("part", "snippet"), ("mine", "true")])
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OAuthError::ChannelLookup(format!("{status}: {body}")));
        }

        let list: ChannelListResponse = resp.json().await?;
        list.items.into_iter().next().ok_or(OAuthError::NoChannel)
    }
}

#[async_trait]
impl ChannelLinker for GoogleYoutubeLinker {
    fn authorization_url(&self, state: &str) -> Result<String, OAuthError> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", YOUTUBE_READONLY_SCOPE),
                ("state", state),
                ("access_type", "offline"),
                ("include_granted_scopes", "true"),
            ],
        )?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<LinkedChannel, OAuthError> {
        let token = self.fetch_token(code).await?;
        let channel = self.fetch_own_channel(&token.access_token).await?;

        debug!(channel_id = %channel.id, "Resolved YouTube channel");

        Ok(LinkedChannel {
            channel_id: channel.id,
            channel_name: channel.snippet.title,
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Form;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    use super::*;

    /// Stand-in for Google's token endpoint and the YouTube channels API.
    async fn spawn_google_stub(with_channel: bool) -> String {
        async fn token(Form(form): Form<HashMap<String, String>>) -> axum::response::Response {
            if form.get("grant_type").map(String::as_str) != Some("authorization_code")
                || form.get("code").map(String::as_str) != Some("good-code")
            {
                return (StatusCode::BAD_REQUEST, "invalid_grant").into_response();
            }
            Json(serde_json::json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "token_type": "Bearer",
            }))
            .into_response()
        }

        let channels = move |headers: HeaderMap| async move {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer access-1");
            if !authorized {
                return StatusCode::UNAUTHORIZED.into_response();
            }
            let items = if with_channel {
                serde_json::json!([{ "id": "UC123", "snippet": { "title": "My Channel" } }])
            } else {
                serde_json::json!([])
            };
            Json(serde_json::json!({ "items": items })).into_response()
        };

        let app = Router::new()
            .route("/token", post(token))
            .route("/youtube/channels", get(channels));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn linker_for(base: &str) -> GoogleYoutubeLinker {
        let config = ServerConfig {
            google_client_id: Some("client-id".into()),
            google_client_secret: Some("client-secret".into()),
            google_token_url: format!("{base}/token"),
            youtube_api_url: format!("{base}/youtube"),
            ..ServerConfig::default()
        };
        GoogleYoutubeLinker::from_config(&config).unwrap()
    }

    #[test]
    fn test_not_configured() {
        assert!(GoogleYoutubeLinker::from_config(&ServerConfig::default()).is_none());
    }

    #[test]
    fn test_authorization_url() {
        let linker = linker_for("http://127.0.0.1:9");
        let url = Url::parse(&linker.authorization_url("state-1").unwrap()).unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["state"], "state-1");
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["scope"], YOUTUBE_READONLY_SCOPE);
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let base = spawn_google_stub(true).await;
        let linked = linker_for(&base).exchange_code("good-code").await.unwrap();

        assert_eq!(
            linked,
            LinkedChannel {
                channel_id: "UC123".into(),
                channel_name: "My Channel".into(),
                access_token: "access-1".into(),
                refresh_token: Some("refresh-1".into()),
            }
        );
    }

    #[tokio::test]
    async fn test_exchange_rejected_code() {
        let base = spawn_google_stub(true).await;
        let err = linker_for(&base).exchange_code("bad-code").await.unwrap_err();
        assert!(matches!(err, OAuthError::TokenExchange(_)));
    }

    #[tokio::test]
    async fn test_exchange_without_channel() {
        let base = spawn_google_stub(false).await;
        let err = linker_for(&base).exchange_code("good-code").await.unwrap_err();
        assert!(matches!(err, OAuthError::NoChannel));
    }
}
