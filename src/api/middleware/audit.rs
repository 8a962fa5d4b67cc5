//! Request logging middleware.
//!
//! Tags every request with a fresh request id, logs method, path, caller
//! and response status, and echoes the id in `X-Request-Id`.

use std::time::Instant;

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::crypto::Identity;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(req).await;

    // Set by `require_auth` on authenticated routes
    let caller = response.extensions().get::<Identity>().map(|id| id.user_id);
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        tracing::error!(%request_id, %method, %path, ?caller, status, elapsed_ms, "Request failed");
    } else {
        tracing::info!(%request_id, %method, %path, ?caller, status, elapsed_ms, "Request handled");
    }

    if let Ok(val) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    response
}
