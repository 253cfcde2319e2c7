//! Error types for the HTTP surface and server startup.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::comments::CommentError;
use crate::library::LibraryError;
use crate::registry::RegistryError;
use crate::resilience::{PolicyError, ResilienceError};
use crate::store::StoreError;

/// Failure while assembling the application state.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid breaker policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("document store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("service registry setup failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("catalog setup failed: {0}")]
    Catalog(#[from] CatalogError),
}

/// Handler error, rendered as `{"error": CODE, "message": ...}`.
///
/// Every breaker failure, open or exhausted, renders as a bare
/// `503 {"error": "SERVICE_UNAVAILABLE"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Unavailable(ResilienceError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Unavailable(e) => {
                tracing::warn!(error = %e, "Dependency unavailable");
                json!({ "error": self.code() })
            }
            Self::Internal(message) => {
                tracing::error!(error = %message, "Request failed");
                json!({ "error": self.code(), "message": message })
            }
            other => json!({ "error": other.code(), "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ResilienceError> for ApiError {
    fn from(e: ResilienceError) -> Self {
        Self::Unavailable(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { .. } => Self::Conflict(e.to_string()),
            ref rejected if rejected.is_rejection() => Self::BadRequest(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::FlagNotFound(_) => Self::NotFound(e.to_string()),
            RegistryError::Unavailable(inner) => inner.into(),
            RegistryError::Store(inner) => inner.into(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Unavailable(inner) => inner.into(),
            CatalogError::NotFound => Self::NotFound(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CommentError> for ApiError {
    fn from(e: CommentError) -> Self {
        match e {
            CommentError::EmptyComment | CommentError::InvalidRating(_) => Self::BadRequest(e.to_string()),
            CommentError::Unavailable(inner) => inner.into(),
            CommentError::Store(inner) => inner.into(),
        }
    }
}

impl From<LibraryError> for ApiError {
    fn from(e: LibraryError) -> Self {
        match e {
            LibraryError::GameAlreadyExists(_) => Self::Conflict(e.to_string()),
            LibraryError::GameNotInList(_) => Self::NotFound(e.to_string()),
            LibraryError::Unavailable(inner) => inner.into(),
            LibraryError::Store(inner) => inner.into(),
        }
    }
}
