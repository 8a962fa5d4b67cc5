pub mod password;
pub mod token;

pub use password::*;
pub use token::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Credential expired")]
    TokenExpired,

    #[error("Credential invalid: {0}")]
    TokenInvalid(String),

    #[error("Credential signing failed: {0}")]
    SigningFailed(String),
}
