mod auth;
mod deep_search;
mod email;
mod products;
mod search;
mod weights;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use dreamwell_core::AppConfig;
use dreamwell_deepsearch::{VideoAiClient, YtDlpDownloader};
use dreamwell_email::EmailClient;
use dreamwell_llm::LlmClient;
use dreamwell_match::Judge;
use dreamwell_youtube::YouTubeClient;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub youtube: Option<Arc<YouTubeClient>>,
    pub judge: Arc<Judge>,
    pub llm: Option<Arc<LlmClient>>,
    pub videoai: Option<Arc<VideoAiClient>>,
    pub email: Option<Arc<EmailClient>>,
    pub downloader: Arc<YtDlpDownloader>,
    /// Plain client for product-page fetches during ingestion.
    pub http: reqwest::Client,
}

impl AppState {
    /// Builds production state from configuration: every external client is
    /// present exactly when its API key is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn from_config(pool: PgPool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let timeout = config.client_request_timeout_secs;

        let youtube = config
            .youtube_api_key
            .as_deref()
            .map(|key| {
                YouTubeClient::new(
                    key,
                    timeout,
                    config.client_max_retries,
                    config.client_retry_backoff_base_secs,
                )
            })
            .transpose()?
            .map(Arc::new);

        let llm = config
            .llm_api_key
            .as_deref()
            .map(|key| LlmClient::new(key, timeout))
            .transpose()?
            .map(Arc::new);
        let judge = match config.llm_api_key.as_deref() {
            Some(key) => Judge::Llm(LlmClient::new(key, timeout)?),
            None => Judge::Neutral,
        };

        let videoai = config
            .videoai_api_key
            .as_deref()
            .map(|key| VideoAiClient::new(key, timeout))
            .transpose()?
            .map(Arc::new);

        let email = config
            .email_api_key
            .as_deref()
            .map(|key| EmailClient::new(key, &config.email_from, timeout))
            .transpose()?
            .map(Arc::new);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(Self {
            pool,
            config,
            youtube,
            judge: Arc::new(judge),
            llm,
            videoai,
            email,
            downloader: Arc::new(YtDlpDownloader::default()),
            http,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &dreamwell_db::DbError) -> ApiError {
    if matches!(error, dreamwell_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Typed 503 for endpoints whose external collaborator has no configured key.
pub(super) fn service_unavailable(request_id: String, what: &str) -> ApiError {
    ApiError::new(
        request_id,
        "service_unavailable",
        format!("{what} is not configured on this deployment"),
    )
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/api/auth/products", get(products::list_products))
        .route("/api/auth/products/ingest", post(products::ingest_product))
        .route("/api/auth/products/{id}", put(products::update_product))
        .route(
            "/api/auth/scoring-weights",
            get(weights::get_weights).post(weights::save_weights),
        )
        .route(
            "/api/auth/search-influencers",
            post(search::search_influencers),
        )
        .route(
            "/api/auth/deep-search/analyze",
            post(deep_search::analyze_video),
        )
        .route(
            "/api/auth/deep-search/status/{video_url}",
            get(deep_search::get_status),
        )
        .route("/api/auth/deep-search/history", get(deep_search::history))
        .route(
            "/api/auth/deep-search/retry/{analysis_id}",
            post(deep_search::retry_analysis),
        )
        .route(
            "/api/auth/send-sponsor-email",
            post(email::send_sponsor_email),
        )
        .route(
            "/api/auth/send-notification",
            post(email::send_notification),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match dreamwell_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "../api_test.rs"]
mod tests;
