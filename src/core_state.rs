//! Application state shared by every request.
//!
//! Holds the injected configuration plus the two stateless services built
//! from it (credential gate, password hasher). Request handlers open their
//! own SQLite connection through `open_db`; no connection is shared.

use rusqlite::Connection;

use crate::authorization::AuthGate;
use crate::config::ServerConfig;
use crate::crypto::{CryptoError, PasswordHasher, TokenIssuer};
use crate::db::{self, seed};
use crate::models::User;

pub struct CoreState {
    pub config: ServerConfig,
    gate: AuthGate,
    hasher: PasswordHasher,
}

impl CoreState {
    pub fn new(config: ServerConfig) -> Self {
        let issuer = TokenIssuer::new(&config.jwt_secret, config.token_ttl_secs);
        let hasher = PasswordHasher::new(config.password_iterations);
        Self {
            config,
            gate: AuthGate::new(issuer),
            hasher,
        }
    }

    /// Create the database if needed, migrate it and insert first-start data.
    pub fn initialize(&self) -> Result<(), CoreError> {
        let conn = db::open_database(&self.config.db_path)?;
        seed::seed_services(&conn)?;

        if let Some(admin) = &self.config.admin {
            let hash = self.hasher.hash(&admin.password)?;
            seed::seed_admin(&conn, &admin.email, &hash)?;
        }

        tracing::info!(path = %self.config.db_path.display(), "Database ready");
        Ok(())
    }

    /// Open a connection to the (already migrated) database.
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        db::open_connection(&self.config.db_path).map_err(CoreError::Database)
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Mint a credential for a stored account.
    pub fn issue_token(&self, user: &User) -> Result<String, CoreError> {
        Ok(self.gate.issuer().issue(user.id, &user.email, user.role)?)
    }

    /// Hash off the async runtime: PBKDF2 at production cost takes a while.
    pub async fn hash_password(&self, password: String) -> Result<String, CoreError> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| CoreError::Blocking(e.to_string()))?
            .map_err(CoreError::Crypto)
    }

    pub async fn verify_password(&self, password: String, stored: String) -> Result<bool, CoreError> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| CoreError::Blocking(e.to_string()))?
            .map_err(CoreError::Crypto)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("Background task failed: {0}")]
    Blocking(String),
}
