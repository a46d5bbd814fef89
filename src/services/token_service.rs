//! Signed bearer credentials binding an administrator email. The rest of the
//! backend treats this as an opaque issue/verify capability.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ServiceError;

/// Token lifetime. Logout revokes earlier via the stored `session_active`
/// flag, so the expiry only bounds how long a leaked token stays usable.
const TOKEN_TTL_SECS: i64 = 60 * 60 * 24;

/// Claims embedded in an admin bearer token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject — the administrator's email.
    sub: String,
    /// Issued-at (unix timestamp).
    iat: i64,
    /// Expiration (unix timestamp).
    exp: i64,
}

/// HS256 signer/verifier for admin bearer tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    /// Build the service from the configured shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for the subject email.
    pub fn issue(&self, subject: &str) -> Result<String, ServiceError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(
            |err| {
                tracing::error!(error = %err, "failed to sign bearer token");
                ServiceError::Internal("token signing failed".into())
            },
        )
    }

    /// Verify a token and yield its subject email.
    pub fn verify(&self, token: &str) -> Result<String, ServiceError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims.sub)
            .map_err(|_| ServiceError::Unauthorized("invalid or expired token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_round_trip() {
        let tokens = TokenService::new("unit-test-secret");
        let token = tokens.issue("hayden@unsw.edu.au").unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), "hayden@unsw.edu.au");
    }

    #[test]
    fn garbage_and_cross_secret_tokens_are_rejected() {
        let tokens = TokenService::new("unit-test-secret");
        assert!(tokens.verify("not-a-token").is_err());

        let other = TokenService::new("different-secret");
        let token = other.issue("someone@example.com").unwrap();
        assert!(matches!(
            tokens.verify(&token),
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
