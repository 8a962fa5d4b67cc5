//! Shared types for the HTTP layer.

use std::sync::Arc;

use serde::Serialize;

use crate::api::error::ApiError;
use crate::core_state::CoreState;

// ═══════════════════════════════════════════════════════════
// API context
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
///
/// Handlers receive it as `State<ApiContext>`; middleware reads it from
/// request extensions (the router installs it as the outermost layer).
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Common response bodies
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body returned by creation endpoints.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
    pub message: String,
}

/// Parse a numeric path segment, reporting junk as a 400 with the JSON body.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid ID format: {raw}")))
}

/// Trim and drop empty strings from an optional text field.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
