//! Bearer-token verification against the identity provider.
//!
//! Two verifiers share the `TokenVerifier` seam: Firebase ID tokens checked
//! against Google's published JWK set, and HS256 tokens signed with a shared
//! secret for local development and tests.

pub mod firebase;
pub mod secret;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use firebase::FirebaseVerifier;
pub use secret::SharedSecretVerifier;

/// Claims of a token that passed verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: u64,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("unknown signing key: {0}")]
    UnknownKey(String),
    #[error("token rejected: {0}")]
    Invalid(String),
    #[error("key set unavailable: {0}")]
    KeySet(String),
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, IdentityError>;
}

pub(crate) fn require_subject(claims: VerifiedClaims) -> Result<VerifiedClaims, IdentityError> {
    if claims.sub.trim().is_empty() {
        return Err(IdentityError::Invalid("empty subject".into()));
    }
    Ok(claims)
}
