//! HTTP API for piste.
//!
//! Serves the chat assistant, the danmaku board and the generators as JSON
//! endpoints under `/api`, plus `/health`.
//!
//! Built on Axum. All shared state lives in one [`AppState`] built at startup
//! and handed to every handler through an `Arc`.

pub mod api;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Request};
use axum::http::{Method, StatusCode, header};
use axum::{Router, response::Json, routing::get};
use chrono::{DateTime, Utc};
use piste_assistant::Assistant;
use piste_config::{AppConfig, ConfigError};
use piste_core::Error;
use piste_generators::{DanmakuBoard, Generators, LearnerProfiles};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    pub config: AppConfig,
    pub assistant: Arc<Assistant>,
    pub generators: Generators,
    pub start_time: DateTime<Utc>,
    rng: Mutex<StdRng>,
    board: Mutex<DanmakuBoard>,
    profiles: Mutex<LearnerProfiles>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// State around an existing assistant. The generator RNG is seeded from
    /// `generators.seed` when set, otherwise from the OS.
    pub fn new(config: AppConfig, assistant: Arc<Assistant>) -> Self {
        let rng = match config.generators.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let board = DanmakuBoard::new(config.generators.danmaku_cap);

        Self {
            assistant,
            generators: Generators::new(),
            start_time: Utc::now(),
            rng: Mutex::new(rng),
            board: Mutex::new(board),
            profiles: Mutex::new(LearnerProfiles::new()),
            config,
        }
    }

    /// Build everything from configuration, including the remote client
    /// when an API key is present.
    pub fn from_config(config: AppConfig) -> Result<Self, ConfigError> {
        let remote = piste_providers::build_from_config(&config)?;
        let assistant = Arc::new(Assistant::from_config(&config, remote));
        Ok(Self::new(config, assistant))
    }

    /// Generator RNG. Held only for the duration of one generation.
    pub fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn board(&self) -> MutexGuard<'_, DanmakuBoard> {
        self.board.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn profiles(&self) -> MutexGuard<'_, LearnerProfiles> {
        self.profiles.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message.into(),
        }),
    )
}

/// JSON body extractor whose rejections (bad syntax, wrong content type,
/// wrong field types) come back as a 400 in the API error shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                debug!(status = rejection.status().as_u16(), "Rejected request body");
                Err(api_error(
                    StatusCode::BAD_REQUEST,
                    format!("请求格式错误: {}", rejection.body_text()),
                ))
            }
        }
    }
}

/// Read an explicit `null` as the field's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Map a domain error onto a status code: caller mistakes are 400, an
/// unavailable remote is 503, anything else 500.
pub(crate) fn error_response(err: Error) -> ApiError {
    let status = match &err {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        Error::Remote(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!(status = status.as_u16(), error = %err, "Request failed");
    }
    api_error(status, err.to_string())
}

/// Build the full router.
///
/// Layers applied:
/// - CORS for the browser front end (GET, POST, DELETE with JSON bodies)
/// - Request body size limit (64 KB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::api_router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the HTTP server and serve until the process exits.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(AppState::from_config(config)?);

    let status = state.assistant.status();
    info!(
        addr = %addr,
        mode = %status.mode,
        remote = status.remote_name.as_deref().unwrap_or("none"),
        knowledge_entries = state.assistant.responder().store().len(),
        "Gateway starting"
    );

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
