//! API error types with structured JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::authorization::AuthGateError;
use crate::booking::BookingError;
use crate::core_state::CoreError;
use crate::crypto::CryptoError;
use crate::db::DatabaseError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("{0}")]
    InvalidLogin(&'static str),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("This time is already taken")]
    SlotConflict,
    #[error("Invalid status change: {0}")]
    InvalidTransition(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidToken | ApiError::InvalidLogin(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) | ApiError::SlotConflict | ApiError::InvalidTransition(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "AUTH_REQUIRED",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::InvalidLogin(_) => "INVALID_LOGIN",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::SlotConflict => "SLOT_CONFLICT",
            ApiError::InvalidTransition(_) => "INVALID_TRANSITION",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                "An internal error occurred".to_string()
            }
            ApiError::BadRequest(detail)
            | ApiError::Forbidden(detail)
            | ApiError::InvalidTransition(detail)
            | ApiError::NotFound(detail) => detail.clone(),
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message,
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<AuthGateError> for ApiError {
    fn from(err: AuthGateError) -> Self {
        match err {
            AuthGateError::Unauthenticated => ApiError::Unauthorized,
            AuthGateError::InvalidCredential => ApiError::InvalidToken,
            forbidden @ AuthGateError::Forbidden { .. } => ApiError::Forbidden(forbidden.to_string()),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidRequest(detail) => ApiError::BadRequest(detail),
            BookingError::SlotConflict => ApiError::SlotConflict,
            BookingError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            e @ BookingError::InvalidTransition { .. } => ApiError::InvalidTransition(e.to_string()),
            e @ BookingError::Forbidden { .. } => ApiError::Forbidden(e.to_string()),
            BookingError::Database(e) => e.into(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, .. } => {
                ApiError::NotFound(format!("{entity_type} not found"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Database(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
