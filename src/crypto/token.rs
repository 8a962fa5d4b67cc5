use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::CryptoError;
use crate::models::Role;

/// Signed credential payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Caller identity recovered from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

/// Mints and verifies HS256 credentials with a server-held secret.
///
/// The secret is injected at construction; nothing here reads configuration.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn issue(&self, user_id: i64, email: &str, role: Role) -> Result<String, CryptoError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))
    }

    /// Verify signature and expiry, returning the embedded identity.
    pub fn verify(&self, token: &str) -> Result<Identity, CryptoError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => CryptoError::TokenExpired,
                _ => CryptoError::TokenInvalid(e.to_string()),
            }
        })?;

        let user_id = data
            .claims
            .sub
            .parse()
            .map_err(|_| CryptoError::TokenInvalid("non-numeric subject".into()))?;

        Ok(Identity {
            user_id,
            email: data.claims.email,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("unit-test-secret", 3600)
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let token = issuer().issue(7, "p@test.com", Role::Patient).unwrap();
        let identity = issuer().verify(&token).unwrap();
        assert_eq!(
            identity,
            Identity {
                user_id: 7,
                email: "p@test.com".into(),
                role: Role::Patient,
            }
        );
    }

    #[test]
    fn token_has_three_segments() {
        let token = issuer().issue(1, "a@test.com", Role::Admin).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn expired_token_reports_expiry() {
        let stale = TokenIssuer::new("unit-test-secret", -120);
        let token = stale.issue(1, "a@test.com", Role::Admin).unwrap();
        assert!(matches!(issuer().verify(&token), Err(CryptoError::TokenExpired)));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let forged = TokenIssuer::new("attacker-secret", 3600)
            .issue(1, "a@test.com", Role::Admin)
            .unwrap();
        assert!(matches!(issuer().verify(&forged), Err(CryptoError::TokenInvalid(_))));
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let token = issuer().issue(1, "p@test.com", Role::Patient).unwrap();
        let admin = issuer().issue(1, "p@test.com", Role::Admin).unwrap();

        // Splice the admin payload onto the patient signature
        let parts: Vec<&str> = token.split('.').collect();
        let admin_parts: Vec<&str> = admin.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], admin_parts[1], parts[2]);

        assert!(matches!(issuer().verify(&spliced), Err(CryptoError::TokenInvalid(_))));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(issuer().verify("not-a-jwt"), Err(CryptoError::TokenInvalid(_))));
        assert!(matches!(issuer().verify(""), Err(CryptoError::TokenInvalid(_))));
    }
}
