//! Bearer token verification against the shared signing secret.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::identity::Identity;
use crate::registry::service::Role;

/// Claims carried by a collaborator-issued access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id.
    pub sub: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiration time (unix seconds).
    pub exp: i64,
}

/// The ways a presented token can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialFault {
    /// Valid signature, expiry elapsed.
    #[error("token expired")]
    Expired,
    /// Structure could not be parsed at all.
    #[error("token malformed")]
    Malformed,
    /// Parses, but the signature does not verify.
    #[error("token signature invalid")]
    BadSignature,
}

/// Verifies tokens with the shared HS256 secret and decodes the claims into
/// an [`Identity`]. Verification is pure: no network, no clock beyond the
/// expiry check.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, CredentialFault> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => CredentialFault::Expired,
                ErrorKind::InvalidSignature => CredentialFault::BadSignature,
                _ => CredentialFault::Malformed,
            },
        )?;

        let claims = data.claims;
        Ok(Identity {
            subject: claims.sub,
            username: claims.username,
            roles: claims.roles.iter().map(Role::new).collect(),
        })
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The decoding key wraps the shared secret; never print it.
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}
