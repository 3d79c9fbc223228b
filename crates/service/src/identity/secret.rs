use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::{require_subject, IdentityError, TokenVerifier, VerifiedClaims};

/// HS256 verification with a shared secret.
pub struct SharedSecretVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SharedSecretVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self { key: DecodingKey::from_secret(secret.as_bytes()), validation }
    }
}

#[async_trait]
impl TokenVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, IdentityError> {
        let data = decode::<VerifiedClaims>(token, &self.key, &self.validation)
            .map_err(|e| IdentityError::Invalid(e.to_string()))?;
        require_subject(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn now() -> u64 {
        chrono::Utc::now().timestamp() as u64
    }

    fn token(secret: &str, claims: serde_json::Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let v = SharedSecretVerifier::new("test-secret");
        let t = token("test-secret", json!({"sub": "uid-1", "email": "u@x.com", "exp": now() + 600}));
        let claims = v.verify(&t).await.unwrap();
        assert_eq!(claims.sub, "uid-1");
        assert_eq!(claims.email.as_deref(), Some("u@x.com"));
    }

    #[tokio::test]
    async fn rejects_expired_wrong_secret_and_garbage() {
        let v = SharedSecretVerifier::new("test-secret");
        let expired = token("test-secret", json!({"sub": "u", "exp": now() - 120}));
        let wrong = token("other-secret", json!({"sub": "u", "exp": now() + 600}));
        let no_sub = token("test-secret", json!({"exp": now() + 600}));
        for t in [expired.as_str(), wrong.as_str(), no_sub.as_str(), "not-a-jwt", ""] {
            assert!(v.verify(t).await.is_err(), "{t}");
        }
    }

    #[tokio::test]
    async fn rejects_blank_subject() {
        let v = SharedSecretVerifier::new("test-secret");
        let t = token("test-secret", json!({"sub": " ", "exp": now() + 600}));
        assert!(matches!(v.verify(&t).await, Err(IdentityError::Invalid(_))));
    }
}
