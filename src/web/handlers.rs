//! Request handlers for all API endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use tracing::{error, info, warn};

use super::models::*;
use super::websocket::WsMessage;
use super::AppState;
use crate::error::LaunchpadError;
use crate::models::token::{TokenRecord, PLACEHOLDER_IMAGE};
use crate::services::images::{decode_data_uri, ImageStore, IMAGE_REFERENCE_PREFIX};
use crate::services::wallet::short_address;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: LaunchpadError) -> ApiError {
    let status = match &e {
        LaunchpadError::MissingInput(_) | LaunchpadError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LaunchpadError::WalletNotConnected => StatusCode::FORBIDDEN,
        LaunchpadError::SlugTaken(_) => StatusCode::CONFLICT,
        LaunchpadError::TokenNotFound(_) => StatusCode::NOT_FOUND,
        LaunchpadError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        LaunchpadError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    // Client errors carry the message users see, server errors keep it in details
    let (message, details) = match &e {
        LaunchpadError::MissingInput(msg) | LaunchpadError::InvalidInput(msg) => (msg.clone(), None),
        LaunchpadError::WalletNotConnected => (
            "You need to connect a wallet to create a token!".to_string(),
            Some("Please connect your wallet first.".to_string()),
        ),
        LaunchpadError::TokenNotFound(_) => ("Token not found".to_string(), Some(e.to_string())),
        _ => ("Failed to create token. Please try again.".to_string(), Some(e.to_string())),
    };

    if status.is_server_error() {
        error!("{}", e);
    }

    (status, Json(ErrorResponse { error: message, details }))
}

fn token_response(images: &ImageStore, token: TokenRecord) -> TokenResponse {
    TokenResponse {
        display_image_url: images.display_url(&token.image_url),
        created_ago: token.created_ago(),
        token,
    }
}

/// Read endpoints seed the sample tokens on first use
fn ensure_seeded(state: &AppState) {
    if state.config.seed_sample_tokens {
        state.registry.seed_if_empty();
    }
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

// ============================================================================
// Tokens
// ============================================================================

pub async fn list_tokens(
    State(state): State<AppState>,
    Query(query): Query<TokensQuery>,
) -> Json<TokensListResponse> {
    ensure_seeded(&state);

    let tokens: Vec<TokenResponse> = state
        .registry
        .search(query.q.as_deref().unwrap_or_default())
        .into_iter()
        .map(|t| token_response(&state.images, t))
        .collect();
    let total = tokens.len();

    Json(TokensListResponse { tokens, total })
}

pub async fn get_token(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TokenResponse>, ApiError> {
    ensure_seeded(&state);

    state
        .registry
        .find_by_slug(&slug)
        .map(|t| Json(token_response(&state.images, t)))
        .ok_or_else(|| api_error(LaunchpadError::TokenNotFound(slug)))
}

pub async fn launch_token(
    State(state): State<AppState>,
    Json(request): Json<LaunchTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let creator = state
        .wallet
        .address()
        .await
        .ok_or(LaunchpadError::WalletNotConnected)
        .map_err(api_error)?;

    request.validate().map_err(api_error)?;
    // A refused slug must not leave a logo behind
    state.registry.check_slug(&request.symbol).map_err(api_error)?;

    let image_url = upload_logo(&state.images, &request).map_err(api_error)?;
    let new_token = request.into_new_token(image_url.clone(), creator);

    let token = match state.registry.try_create(new_token) {
        Ok(token) => token,
        Err(e) => {
            state.images.discard(&image_url);
            return Err(api_error(e));
        }
    };
    info!(
        "Token {} launched by {}",
        token.slug,
        short_address(token.creator_address.as_deref().unwrap_or_default())
    );
    state.broadcast(WsMessage::token_launched(&token));

    Ok((StatusCode::CREATED, Json(token_response(&state.images, token))))
}

/// Store whichever logo form the request carries; no logo means the placeholder.
fn upload_logo(images: &ImageStore, request: &LaunchTokenRequest) -> Result<String, LaunchpadError> {
    if let Some(uri) = request.logo.as_deref().filter(|s| !s.is_empty()) {
        match decode_data_uri(uri) {
            Some((mime, _)) if mime.starts_with("image/") => return images.upload(uri, &request.symbol),
            _ => {
                return Err(LaunchpadError::InvalidInput(
                    "Logo must be a base64 image data URI".to_string(),
                ))
            }
        }
    }

    if let Some(encoded) = request.logo_base64.as_deref().filter(|s| !s.is_empty()) {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| LaunchpadError::InvalidInput(format!("Logo is not valid base64: {}", e)))?;
        let mime = request.logo_mime.as_deref().unwrap_or("image/png");
        return images.upload_bytes(&bytes, mime, &request.symbol);
    }

    Ok(PLACEHOLDER_IMAGE.to_string())
}

// ============================================================================
// Wallet
// ============================================================================

pub async fn get_wallet(State(state): State<AppState>) -> Json<WalletResponse> {
    let connected = state.wallet.is_connected().await;
    let address = if connected { state.wallet.address().await } else { None };

    Json(WalletResponse {
        connected,
        short: address.as_deref().map(short_address),
        address,
    })
}

/// `WalletChanged` for connect and disconnect comes from the wallet watcher,
/// which sees the new store value on its next tick.
pub async fn connect_wallet(
    State(state): State<AppState>,
) -> Result<Json<ConnectWalletResponse>, ApiError> {
    let address = state
        .wallet
        .connect()
        .await
        .map_err(|e| wallet_error(e, "Failed to connect wallet"))?;

    Ok(Json(ConnectWalletResponse { address }))
}

pub async fn disconnect_wallet(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state
        .wallet
        .disconnect()
        .await
        .map_err(|e| wallet_error(e, "Failed to disconnect wallet"))?;

    Ok(StatusCode::NO_CONTENT)
}

fn wallet_error(e: LaunchpadError, message: &str) -> ApiError {
    let (status, _) = api_error(e);
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            details: None,
        }),
    )
}

// ============================================================================
// Images
// ============================================================================

pub async fn get_token_image(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let content = state.images.resolve(&format!("{}{}", IMAGE_REFERENCE_PREFIX, id));

    match decode_data_uri(&content) {
        Some((mime, bytes)) => ([(header::CONTENT_TYPE, mime)], bytes).into_response(),
        None => {
            if content != PLACEHOLDER_IMAGE {
                warn!("Image {} is not a data URI, serving placeholder", id);
            }
            Redirect::temporary(PLACEHOLDER_IMAGE).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::error::StorageError;
    use crate::services::SlugPolicy;
    use crate::storage::{KeyValueStore, MemoryStore, TOKENS_KEY, WALLET_KEY};
    use crate::web::server::create_app;

    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

    /// Memory store that refuses every write and delete of one key
    struct RefusingStore {
        inner: Arc<MemoryStore>,
        refused: &'static str,
    }

    impl KeyValueStore for RefusingStore {
        fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
            if key == self.refused {
                return Err(StorageError::Unavailable("quota".to_string()));
            }
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
            if key == self.refused {
                return Err(StorageError::Unavailable("quota".to_string()));
            }
            self.inner.remove(key)
        }
    }

    fn app() -> (AppState, Router) {
        let (_, state, app) = app_with(Config::default());
        (state, app)
    }

    fn app_with(config: Config) -> (Arc<MemoryStore>, AppState, Router) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), Arc::new(config));
        (store, state.clone(), create_app(state))
    }

    fn refusing_app(refused: &'static str) -> (Arc<MemoryStore>, AppState, Router) {
        let inner = Arc::new(MemoryStore::new());
        let store = Arc::new(RefusingStore {
            inner: inner.clone(),
            refused,
        });
        let state = AppState::new(store, Arc::new(Config::default()));
        (inner, state.clone(), create_app(state))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn launch_body() -> Value {
        json!({
            "name": "My Awesome Token",
            "symbol": "MAT",
            "description": "A token with utility",
            "initialSupply": 1000000,
            "initialPrice": 0.1
        })
    }

    #[tokio::test]
    async fn test_list_seeds_samples() {
        let (_, app) = app();

        let (status, body) = send(&app, "GET", "/api/tokens", None).await;
        assert_eq!(status, StatusCode::OK);
        let list: TokensListResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.tokens[0].token.slug, "fries");
        assert_eq!(list.tokens[0].created_ago, "13 MIN AGO");

        let (_, body) = send(&app, "GET", "/api/tokens?q=kawaii", None).await;
        let list: TokensListResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.total, 1);
    }

    #[tokio::test]
    async fn test_unknown_token_is_404() {
        let (_, app) = app();

        let (status, body) = send(&app, "GET", "/api/tokens/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.error, "Token not found");
    }

    #[tokio::test]
    async fn test_launch_requires_wallet() {
        let (state, app) = app();

        let (status, _) = send(&app, "POST", "/api/tokens", Some(launch_body())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(state.registry.find_by_slug("mat").is_none());
    }

    #[tokio::test]
    async fn test_launch_rejects_missing_fields() {
        let (state, app) = app();
        state.wallet.connect().await.unwrap();

        let (status, body) = send(&app, "POST", "/api/tokens", Some(json!({ "name": "X" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.error, "Please fill in all required fields");
    }

    #[tokio::test]
    async fn test_wallet_connect_launch_and_fetch() {
        let (state, app) = app();
        let mut events = state.subscribe_ws();

        let (status, body) = send(&app, "POST", "/api/wallet/connect", None).await;
        assert_eq!(status, StatusCode::OK);
        let connected: ConnectWalletResponse = serde_json::from_slice(&body).unwrap();

        let (_, body) = send(&app, "GET", "/api/wallet", None).await;
        let wallet: WalletResponse = serde_json::from_slice(&body).unwrap();
        assert!(wallet.connected);
        assert_eq!(wallet.address.as_deref(), Some(connected.address.as_str()));

        let mut body = launch_body();
        body["logo"] = json!(PNG_URI);
        let (status, body) = send(&app, "POST", "/api/tokens", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        let launched: TokenResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(launched.token.slug, "mat");
        assert_eq!(launched.token.mcap, "$100.00K");
        assert_eq!(launched.token.creator_address.as_deref(), Some(connected.address.as_str()));
        assert!(launched.token.image_url.starts_with("/api/images/tokens/mat-"));
        assert_eq!(launched.display_image_url, PNG_URI);

        let (status, body) = send(&app, "GET", "/api/tokens/mat", None).await;
        assert_eq!(status, StatusCode::OK);
        let fetched: TokenResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(fetched.token, launched.token);

        let (status, bytes) = send(&app, "GET", &launched.token.image_url, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);

        // Connecting is announced by the wallet watcher, not the handler
        assert!(matches!(events.recv().await.unwrap(), WsMessage::TokenLaunched { slug, .. } if slug == "mat"));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_launch_with_base64_logo() {
        let (_, app) = app();
        send(&app, "POST", "/api/wallet/connect", None).await;

        let mut body = launch_body();
        body["logoBase64"] = json!("iVBORw0KGgo=");
        body["logoMime"] = json!("image/png");
        let (status, body) = send(&app, "POST", "/api/tokens", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        let launched: TokenResponse = serde_json::from_slice(&body).unwrap();
        assert!(launched.token.image_url.starts_with("/api/images/tokens/mat-"));
        assert_eq!(launched.display_image_url, PNG_URI);

        let (status, bytes) = send(&app, "GET", &launched.token.image_url, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_launch_rejects_invalid_logo() {
        let (store, state, app) = app_with(Config::default());
        state.wallet.connect().await.unwrap();

        for (field, value) in [
            ("logo", "not a data uri"),
            ("logo", "data:text/plain;base64,aGVsbG8="),
            ("logoBase64", "@@@"),
        ] {
            let mut body = launch_body();
            body[field] = json!(value);
            let (status, _) = send(&app, "POST", "/api/tokens", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} = {}", field, value);
        }

        assert!(state.registry.find_by_slug("mat").is_none());
        // Only the wallet address is stored
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_launch_under_reject_stores_no_image() {
        let config = Config {
            slug_policy: SlugPolicy::Reject,
            ..Config::default()
        };
        let (store, state, app) = app_with(config);
        state.wallet.connect().await.unwrap();

        let mut body = launch_body();
        body["logo"] = json!(PNG_URI);
        let (status, _) = send(&app, "POST", "/api/tokens", Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        // Wallet, token list and one image
        assert_eq!(store.len(), 3);

        body["symbol"] = json!("m.a.t");
        let (status, _) = send(&app, "POST", "/api/tokens", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(store.len(), 3);
        assert_eq!(state.registry.list_all().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_launch_discards_logo() {
        let (store, state, app) = refusing_app(TOKENS_KEY);
        state.wallet.connect().await.unwrap();

        let mut body = launch_body();
        body["logo"] = json!(PNG_URI);
        let (status, body) = send(&app, "POST", "/api/tokens", Some(body)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.error, "Failed to create token. Please try again.");

        // The uploaded logo went away with the failed launch
        assert_eq!(store.len(), 1);
        assert!(store.get(WALLET_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_disconnect_clears_wallet() {
        let (state, app) = app();
        let mut events = state.subscribe_ws();
        state.wallet.connect().await.unwrap();

        let (status, _) = send(&app, "POST", "/api/wallet/disconnect", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!state.wallet.is_connected().await);

        let (_, body) = send(&app, "GET", "/api/wallet", None).await;
        let wallet: WalletResponse = serde_json::from_slice(&body).unwrap();
        assert!(!wallet.connected);
        assert_eq!(wallet.short, None);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_disconnect_is_503() {
        let (store, state, app) = refusing_app(WALLET_KEY);
        store.set(WALLET_KEY, "0x00000000deadbeef").unwrap();

        let (status, body) = send(&app, "POST", "/api/wallet/disconnect", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.error, "Failed to disconnect wallet");

        assert!(state.wallet.is_connected().await);
        let (_, body) = send(&app, "GET", "/api/wallet", None).await;
        let wallet: WalletResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(wallet.short.as_deref(), Some("0x0000...beef"));
    }

    #[tokio::test]
    async fn test_unknown_image_redirects_to_placeholder() {
        let (_, app) = app();

        let (status, _) = send(&app, "GET", "/api/images/tokens/fries-123", None).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    }
}
