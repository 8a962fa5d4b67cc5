//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Audit logger: request id, one log line per request
//! 2. Auth validator: bearer credential → `Identity` (protected routes)
//! 3. Role gate: exact role match (patient, doctor and admin route groups)

pub mod audit;
pub mod auth;
