use pbkdf2::password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand::rngs::OsRng;

use super::CryptoError;

/// PBKDF2-SHA256 password hashing with a per-password random salt.
///
/// Stored form is a PHC string (`$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>`).
/// The round count travels with the hash so it can be raised later
/// without invalidating existing accounts.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, CryptoError> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params {
            rounds: self.iterations,
            ..Params::default()
        };
        let hash = Pbkdf2
            .hash_password_customized(password.as_bytes(), None, None, params, &salt)
            .map_err(|e| CryptoError::HashingFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check `password` against a stored hash in constant time.
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, CryptoError> {
        let parsed = PasswordHash::new(stored).map_err(|_| CryptoError::MalformedHash)?;
        match Pbkdf2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(_) => Err(CryptoError::MalformedHash),
        }
    }
}
