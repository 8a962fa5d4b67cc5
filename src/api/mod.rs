//! HTTP API for the clinic.
//!
//! Routes are nested under `/api/`. Public catalog and account routes
//! need no credential; everything else runs behind the bearer auth
//! middleware and a per-group role gate.
//!
//! The router is composable: `api_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::ServerError;
pub use types::ApiContext;
