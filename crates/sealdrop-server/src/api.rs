//! HTTP surface of the relay.
//!
//! | Method | Path                  | Success                        |
//! |--------|-----------------------|--------------------------------|
//! | POST   | `/api/create-secret`  | 201 `{id, expires_in_seconds}` |
//! | GET    | `/api/fetch-secret`   | 200 `{ciphertext_hex, iv_hex}` |
//! | GET    | `/health`             | 200 `ok`                       |
//!
//! Every response, errors included, carries `Cache-Control: no-store` and
//! `Pragma: no-cache` so no intermediary can answer a fetch without reaching
//! the atomic consume.

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use sealdrop_core::{
    SecretId, WireError,
    env::Environment,
    wire::{
        CreateSecretRequest, CreateSecretResponse, ErrorCode, ErrorResponse, FetchSecretQuery,
        FetchSecretResponse,
    },
};
use thiserror::Error;
use tower_http::{
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{relay::Relay, relay::RelayError, storage::RelayStorage};

/// Default request body limit (256 KiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024;

/// Request failure, rendered as an [`ErrorResponse`] body.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing request fields
    #[error("{0}")]
    InvalidParameter(String),

    /// Record absent (never existed, consumed, or expired)
    #[error("secret not found or already viewed")]
    NotFound,

    /// Body above the configured limit
    #[error("request body too large")]
    PayloadTooLarge,

    /// Backing store unavailable; detail is logged, not returned
    #[error("relay storage unavailable")]
    TransportFailure(String),

    /// Unexpected fault; detail is logged, not returned
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            Self::InvalidParameter(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidParameter),
            Self::NotFound => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            Self::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, ErrorCode::PayloadTooLarge),
            Self::TransportFailure(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::TransportFailure)
            },
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::TransportFailure(detail) => tracing::error!(%detail, "storage failure"),
            Self::Internal(detail) => tracing::error!(%detail, "internal failure"),
            Self::InvalidParameter(reason) => tracing::debug!(%reason, "rejected request"),
            Self::NotFound | Self::PayloadTooLarge => {},
        }

        let (status, code) = self.status_and_code();
        (status, Json(ErrorResponse { error: self.to_string(), code })).into_response()
    }
}

impl From<WireError> for ApiError {
    fn from(err: WireError) -> Self {
        Self::InvalidParameter(err.to_string())
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::ZeroTtl => Self::InvalidParameter(err.to_string()),
            RelayError::IdExhausted(_) | RelayError::Storage(_) => {
                Self::TransportFailure(err.to_string())
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::InvalidParameter(rejection.body_text())
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Build the relay router.
pub fn router<E: Environment, S: RelayStorage>(relay: Relay<E, S>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/create-secret", post(create_secret::<E, S>))
        .route("/api/fetch-secret", get(fetch_secret::<E, S>))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(header::PRAGMA, HeaderValue::from_static("no-cache")))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(relay)
}

/// POST /api/create-secret
///
/// Validates shape only and stores the ciphertext under a fresh id.
async fn create_secret<E: Environment, S: RelayStorage>(
    State(relay): State<Relay<E, S>>,
    payload: Result<Json<CreateSecretRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSecretResponse>), ApiError> {
    let Json(request) = payload?;
    let validated = request.validate()?;
    let ttl = validated.ttl;

    let id = tokio::task::spawn_blocking(move || {
        relay.create(validated.ciphertext, validated.iv, validated.ttl)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(CreateSecretResponse { id, expires_in_seconds: ttl.as_secs() })))
}

/// GET /api/fetch-secret?id=<id>
///
/// Atomically consumes the record. A malformed id is indistinguishable from a
/// consumed one.
async fn fetch_secret<E: Environment, S: RelayStorage>(
    State(relay): State<Relay<E, S>>,
    query: Result<Query<FetchSecretQuery>, QueryRejection>,
) -> Result<Json<FetchSecretResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::InvalidParameter(e.body_text()))?;
    let raw_id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::InvalidParameter(WireError::MissingField("id").to_string()))?;

    let Ok(id) = raw_id.parse::<SecretId>() else {
        return Err(ApiError::NotFound);
    };

    let record = tokio::task::spawn_blocking(move || relay.consume(id)).await??;
    let record = record.ok_or(ApiError::NotFound)?;

    Ok(Json(FetchSecretResponse::new(&record.ciphertext, &record.nonce())))
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
