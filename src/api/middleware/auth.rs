//! Bearer credential authentication and role gates.
//!
//! `require_auth` verifies `Authorization: Bearer <token>` through the
//! `AuthGate` and injects the caller's `Identity` into request extensions.
//! The role gates run after it and only compare the injected role.

use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::authorize;
use crate::crypto::Identity;
use crate::models::Role;

/// Require a valid bearer credential.
///
/// On success the `Identity` is added to the request (for handlers) and to
/// the response (for the audit logger, which runs outside this layer).
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = ctx.core.gate().authenticate_header(header)?;

    req.extensions_mut().insert(identity.clone());

    let mut response = next.run(req).await;
    response.extensions_mut().insert(identity);
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Ok(response)
}

pub async fn require_patient(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(req, next, Role::Patient).await
}

pub async fn require_doctor(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(req, next, Role::Doctor).await
}

pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(req, next, Role::Admin).await
}

async fn require_role(req: Request<axum::body::Body>, next: Next, role: Role) -> Response {
    let Some(identity) = req.extensions().get::<Identity>() else {
        return ApiError::Unauthorized.into_response();
    };

    if let Err(e) = authorize(identity, role) {
        tracing::warn!(
            user_id = identity.user_id,
            role = %identity.role,
            required = %role,
            path = %req.uri().path(),
            "Role check failed"
        );
        return ApiError::from(e).into_response();
    }

    next.run(req).await
}
