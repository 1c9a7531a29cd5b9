//! Client and search error types.

use tcq_core::{SearchKind, ValidationError};
use tcq_tql::QueryError;
use thiserror::Error;

/// Failures from the signed transport and the resource endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {body}")]
    Unauthorized { body: String },

    #[error("Resource not found: {body}")]
    NotFound { body: String },

    #[error("Rate limit exceeded")]
    RateLimited { body: String },

    #[error("API error: HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status behind this error, when the backend answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::NotFound { .. } => Some(404),
            ApiError::RateLimited { .. } => Some(429),
            ApiError::Status { code, .. } => Some(*code),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// What went wrong underneath a search.
#[derive(Debug, Error)]
pub enum SearchFailure {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Request(#[from] ValidationError),

    #[error("{kind} request failed: {source}")]
    Endpoint {
        kind: SearchKind,
        #[source]
        source: ApiError,
    },
}

/// The only error [`crate::SearchEngine`] returns. The cause is always kept.
#[derive(Debug, Error)]
#[error("Search execution failed: {source}")]
pub struct SearchExecutionError {
    #[from]
    source: SearchFailure,
}

impl SearchExecutionError {
    pub fn failure(&self) -> &SearchFailure {
        &self.source
    }

    pub fn into_failure(self) -> SearchFailure {
        self.source
    }
}
