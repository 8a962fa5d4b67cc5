//! Request authentication and role-based authorization.
//!
//! Two stateless checks, applied in order by the API middleware:
//! 1. `authenticate`: bearer credential → `Identity` (signature + expiry)
//! 2. `authorize`: `Identity` × required role → allow / `Forbidden`
//!
//! A third rule gates which appointment statuses each role may request.
//! Whether the requested edge exists at all is decided by
//! `AppointmentStatus::can_transition_to`, independently of role.

use crate::crypto::{CryptoError, Identity, TokenIssuer};
use crate::models::{AppointmentStatus, Role};

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthGateError {
    /// No `Authorization: Bearer <token>` header.
    #[error("Authentication required")]
    Unauthenticated,
    /// Signature, format or expiry check failed.
    #[error("Invalid or expired credential")]
    InvalidCredential,
    #[error("Role {actual} may not access {required} resources")]
    Forbidden { required: Role, actual: Role },
}

// ═══════════════════════════════════════════════════════════
// Gate
// ═══════════════════════════════════════════════════════════

/// Verifies credentials minted by the same `TokenIssuer`.
#[derive(Debug, Clone)]
pub struct AuthGate {
    issuer: TokenIssuer,
}

impl AuthGate {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Authenticate from a raw `Authorization` header value.
    pub fn authenticate_header(&self, header: Option<&str>) -> Result<Identity, AuthGateError> {
        let token = header
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthGateError::Unauthenticated)?;
        self.authenticate(token)
    }

    /// Verify a bare credential.
    pub fn authenticate(&self, credential: &str) -> Result<Identity, AuthGateError> {
        self.issuer.verify(credential).map_err(|e| {
            match &e {
                CryptoError::TokenExpired => tracing::debug!("Rejected expired credential"),
                other => tracing::debug!(error = %other, "Rejected credential"),
            }
            AuthGateError::InvalidCredential
        })
    }
}

/// Require an exact role match.
pub fn authorize(identity: &Identity, required: Role) -> Result<(), AuthGateError> {
    if identity.role == required {
        Ok(())
    } else {
        Err(AuthGateError::Forbidden {
            required,
            actual: identity.role,
        })
    }
}

/// Which target statuses a role may request on an appointment it can see.
///
/// Patients may only cancel. Doctors and admins may confirm, complete or
/// cancel. Nobody may move an appointment back to `pending`.
pub fn may_request_status(role: Role, target: AppointmentStatus) -> bool {
    match role {
        Role::Patient => target == AppointmentStatus::Canceled,
        Role::Doctor | Role::Admin => target != AppointmentStatus::Pending,
    }
}
