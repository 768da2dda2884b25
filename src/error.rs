//! Error types for the service.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors raised while reading configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    /// An environment variable is set but unparseable.
    #[error("invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },
}

/// Errors from the event store.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Pool creation failed.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Checking out a pooled connection failed.
    #[error("pool checkout failed: {0}")]
    Checkout(#[from] deadpool_postgres::PoolError),

    /// Query execution failed.
    #[error("query failed: {0}")]
    Query(#[from] tokio_postgres::Error),
}

/// Request-level errors surfaced to HTTP clients.
///
/// The store is the single fatal error source: any upstream failure aborts
/// the request as a 500 carrying the raw message. Malformed query parameters
/// are rejected up front with a 400.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
