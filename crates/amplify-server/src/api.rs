use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use amplify_shared::CreatorLookup;
use amplify_store::{Creator, Database, Tip};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::identity::{IdentityService, NewTip};
use crate::ledger::{ChannelStats, CreatorProfile, LedgerService};
use crate::oauth::ChannelLinker;
use crate::session::{session_id_from_headers, OAuthSessions};
use crate::SharedDatabase;

#[derive(Clone)]
pub struct AppState {
    pub db: SharedDatabase,
    pub identity: IdentityService,
    pub ledger: LedgerService,
    /// `None` when Google OAuth is not configured.
    pub linker: Option<Arc<dyn ChannelLinker>>,
    pub sessions: OAuthSessions,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        db: Database,
        linker: Option<Arc<dyn ChannelLinker>>,
        config: ServerConfig,
    ) -> Self {
        let db: SharedDatabase = Arc::new(tokio::sync::Mutex::new(db));
        Self {
            identity: IdentityService::new(db.clone()),
            ledger: LedgerService::new(db.clone()),
            db,
            linker,
            sessions: OAuthSessions::new(config.oauth_session_ttl),
            config: Arc::new(config),
        }
    }
}

/// Every endpoint, mounted both at the root and under `/api`.
fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/register", post(register_creator))
        .route("/oauth/youtube/initiate", get(oauth_initiate))
        .route("/oauth/youtube/callback", get(oauth_callback))
        .route("/creator", get(get_creator))
        .route("/creator/settings", put(update_creator_settings))
        .route("/tip", post(record_tip))
        .route("/tips/wallet/:wallet_address", get(list_wallet_tips))
        .route("/tips/:channel_id", get(list_channel_tips))
        .route("/stats/:channel_id", get(channel_stats))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
    status: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    channel_id: String,
    wallet_address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatorQuery {
    channel_id: Option<String>,
    wallet_address: Option<String>,
}

#[derive(Deserialize)]
struct WalletQuery {
    wallet_address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsRequest {
    default_tip_amount: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsResponse {
    message: &'static str,
    default_tip_amount: f64,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    /// Set by the provider when the user denies access.
    error: Option<String>,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Amplify API is running",
        status: "healthy",
    })
}

/// Store failures are reported with 503, never fatal to the process.
async fn health_check(State(state): State<AppState>) -> Response {
    let ping = state.db.lock().await.ping();
    match ping {
        Ok(()) => Json(HealthResponse {
            status: "healthy",
            database: "connected",
            version: env!("CARGO_PKG_VERSION"),
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "database": "disconnected",
                    "version": env!("CARGO_PKG_VERSION"),
                    "error": format!("Database connection failed: {e}"),
                })),
            )
                .into_response()
        }
    }
}

async fn register_creator(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Creator>, ServerError> {
    let creator = state
        .identity
        .register_legacy(&req.channel_id, &req.wallet_address)
        .await?;
    Ok(Json(creator))
}

async fn get_creator(
    State(state): State<AppState>,
    Query(query): Query<CreatorQuery>,
) -> Result<Json<CreatorProfile>, ServerError> {
    let lookup = CreatorLookup::from_params(query.channel_id, query.wallet_address).ok_or_else(
        || ServerError::BadRequest("Either channelId or walletAddress is required".into()),
    )?;
    let creator = state.identity.resolve_creator(&lookup).await?;
    Ok(Json(CreatorProfile::from(&creator)))
}

async fn update_creator_settings(
    State(state): State<AppState>,
    Query(query): Query<WalletQuery>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<SettingsResponse>, ServerError> {
    let default_tip_amount = state
        .identity
        .update_settings(&query.wallet_address, req.default_tip_amount)
        .await?;
    Ok(Json(SettingsResponse {
        message: "Settings updated successfully",
        default_tip_amount,
    }))
}

async fn record_tip(
    State(state): State<AppState>,
    Json(tip): Json<NewTip>,
) -> Result<Json<Tip>, ServerError> {
    Ok(Json(state.identity.record_tip(tip).await?))
}

async fn list_channel_tips(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Tip>>, ServerError> {
    let tips = state
        .ledger
        .list_tips_for_channel(&channel_id, query.limit)
        .await?;
    Ok(Json(tips))
}

async fn list_wallet_tips(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Tip>>, ServerError> {
    let tips = state
        .ledger
        .list_tips_for_wallet(&wallet_address, query.limit)
        .await?;
    Ok(Json(tips))
}

async fn channel_stats(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<ChannelStats>, ServerError> {
    Ok(Json(state.ledger.channel_stats(&channel_id).await?))
}

// ─── YouTube OAuth ───

/// Start linking: remember the wallet in a fresh session and send the
/// browser to the provider.
async fn oauth_initiate(
    State(state): State<AppState>,
    Query(query): Query<WalletQuery>,
) -> Result<Response, ServerError> {
    let linker = state.linker.as_ref().ok_or(ServerError::OAuthNotConfigured)?;

    let wallet_address = query.wallet_address.as_str();
    if wallet_address.trim().is_empty() {
        return Err(ServerError::BadRequest("wallet_address is required".into()));
    }

    let (session_id, oauth_state) = state.sessions.begin(wallet_address).await;
    let url = linker
        .authorization_url(&oauth_state)
        .map_err(|e| ServerError::Internal(format!("OAuth initiation failed: {e}")))?;

    info!(wallet = %wallet_address, "YouTube OAuth started");

    Ok((
        [(header::SET_COOKIE, state.sessions.cookie(&session_id))],
        Redirect::to(&url),
    )
        .into_response())
}

/// Finish linking.  The caller is a browser mid-redirect, so every outcome
/// is a redirect to the frontend carrying a success or error marker.
async fn oauth_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let session_id = session_id_from_headers(&headers);

    let target = match complete_link(&state, session_id.as_deref(), query).await {
        Ok(creator) => {
            let channel = creator.youtube_channel_name.unwrap_or_default();
            frontend_redirect(
                &state.config.frontend_url,
                &[("oauth", "success"), ("channel", &channel)],
            )
        }
        Err(e) => {
            warn!(error = %e, "YouTube OAuth callback failed");
            frontend_redirect(
                &state.config.frontend_url,
                &[("oauth", "error"), ("message", &e.public_message())],
            )
        }
    };

    (
        [(header::SET_COOKIE, OAuthSessions::clear_cookie())],
        Redirect::to(&target),
    )
        .into_response()
}

async fn complete_link(
    state: &AppState,
    session_id: Option<&str>,
    query: CallbackQuery,
) -> Result<Creator, ServerError> {
    if let Some(error) = query.error {
        return Err(ServerError::BadRequest(format!("Authorization denied: {error}")));
    }
    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        return Err(ServerError::BadRequest(
            "Missing code or state parameter".into(),
        ));
    };

    let pending = match session_id {
        Some(id) => state.sessions.take(id).await,
        None => None,
    }
    .ok_or_else(|| ServerError::BadRequest("Wallet address not found in session".into()))?;

    if pending.state != returned_state {
        return Err(ServerError::BadRequest("Invalid state parameter".into()));
    }

    let linker = state.linker.as_ref().ok_or(ServerError::OAuthNotConfigured)?;
    let channel = linker.exchange_code(&code).await?;

    state
        .identity
        .link_youtube(&pending.wallet_address, channel)
        .await
}

/// Append query pairs to the frontend URL.
fn frontend_redirect(frontend_url: &str, pairs: &[(&str, &str)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    let separator = if frontend_url.contains('?') { '&' } else { '?' };
    format!("{frontend_url}{separator}{query}")
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
