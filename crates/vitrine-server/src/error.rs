//! REST API error type.
//!
//! Every failing route returns the same envelope the success path uses:
//! `{"success": false, "message": ...}` with an appropriate status code.
//! Internal details (paths, SQL) never reach the client — they go to the
//! log instead.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use vitrine_store::StoreError;

/// Errors surfaced by the REST routes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request payload failed validation (400).
    #[error("{0}")]
    Validation(String),

    /// Referenced record does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// Anything else (500). The cause is logged, not echoed.
    #[error("Internal server error")]
    Internal(#[source] StoreError),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionNotFound(_) => Self::NotFound("Session not found".into()),
            StoreError::ProductNotFound(_) => Self::NotFound("Product not found".into()),
            other => Self::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(cause) = &self {
            error!(error = %cause, "request failed");
        }
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let err = ApiError::Validation("Title cannot exceed 200 characters".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Title cannot exceed 200 characters");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err: ApiError = StoreError::SessionNotFound("sess_1".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Session not found");
    }

    #[test]
    fn product_not_found_maps_to_404() {
        let err: ApiError = StoreError::ProductNotFound("prod_1".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Product not found");
    }

    #[test]
    fn internal_hides_details() {
        let err: ApiError = StoreError::Migration {
            message: "/var/lib/vitrine.db is gone".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }
}
