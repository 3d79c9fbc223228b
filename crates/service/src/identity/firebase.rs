use std::time::{Duration, Instant};

use async_trait::async_trait;
use configs::IdentityConfig;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::{require_subject, IdentityError, TokenVerifier, VerifiedClaims};

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

/// Verifies Firebase ID tokens (RS256) against the securetoken JWK set.
///
/// The key set is fetched lazily and kept for `jwks_ttl_secs`. A token whose
/// `kid` is missing from a fresh set may force a refetch, but at most once per
/// `jwks_min_refresh_secs`, and concurrent misses share a single fetch. When a
/// refresh fails the previous set keeps serving for `jwks_max_stale_secs` past
/// its TTL.
pub struct FirebaseVerifier {
    client: reqwest::Client,
    jwks_url: String,
    project_id: String,
    ttl: Duration,
    min_refresh: Duration,
    max_stale: Duration,
    cache: RwLock<Option<CachedKeys>>,
    /// Held while fetching; records when the last fetch was attempted.
    refresh_lock: Mutex<Option<Instant>>,
}

impl FirebaseVerifier {
    pub fn new(cfg: &IdentityConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            jwks_url: cfg.jwks_url.clone(),
            project_id: cfg.project_id.clone(),
            ttl: Duration::from_secs(cfg.jwks_ttl_secs),
            min_refresh: Duration::from_secs(cfg.jwks_min_refresh_secs),
            max_stale: Duration::from_secs(cfg.jwks_max_stale_secs),
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(None),
        }
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
        validation
    }

    async fn fetch_keys(&self) -> Result<JwkSet, IdentityError> {
        let resp = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| IdentityError::KeySet(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(IdentityError::KeySet(format!("jwks endpoint returned {}", resp.status())));
        }
        resp.json::<JwkSet>()
            .await
            .map_err(|e| IdentityError::KeySet(e.to_string()))
    }

    /// Key for `kid` from a cached set no older than `max_age`.
    async fn cached_key(&self, kid: &str, max_age: Duration) -> Result<Option<DecodingKey>, IdentityError> {
        let cache = self.cache.read().await;
        let Some(entry) = cache.as_ref().filter(|e| e.fetched_at.elapsed() < max_age) else {
            return Ok(None);
        };
        entry
            .set
            .find(kid)
            .map(|jwk| DecodingKey::from_jwk(jwk).map_err(|e| IdentityError::KeySet(e.to_string())))
            .transpose()
    }

    async fn has_cached_set(&self) -> bool {
        self.cache.read().await.is_some()
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, IdentityError> {
        if let Some(key) = self.cached_key(kid, self.ttl).await? {
            return Ok(key);
        }

        let mut last_attempt = self.refresh_lock.lock().await;
        // another caller may have refreshed while we waited
        if let Some(key) = self.cached_key(kid, self.ttl).await? {
            return Ok(key);
        }
        let stale_limit = self.ttl + self.max_stale;

        if last_attempt.is_some_and(|at| at.elapsed() < self.min_refresh) {
            debug!(%kid, "key set refresh throttled");
            if let Some(key) = self.cached_key(kid, stale_limit).await? {
                return Ok(key);
            }
            if self.has_cached_set().await {
                return Err(IdentityError::UnknownKey(kid.to_string()));
            }
            return Err(IdentityError::KeySet("key set not loaded; refresh throttled".into()));
        }

        *last_attempt = Some(Instant::now());
        match self.fetch_keys().await {
            Ok(set) => {
                debug!(keys = set.keys.len(), "refreshed identity key set");
                let key = set
                    .find(kid)
                    .map(|jwk| DecodingKey::from_jwk(jwk).map_err(|e| IdentityError::KeySet(e.to_string())));
                *self.cache.write().await = Some(CachedKeys { set, fetched_at: Instant::now() });
                key.unwrap_or_else(|| Err(IdentityError::UnknownKey(kid.to_string())))
            }
            Err(e) => {
                if let Some(key) = self.cached_key(kid, stale_limit).await? {
                    warn!(err = %e, "key set refresh failed; using stale keys");
                    return Ok(key);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl TokenVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, IdentityError> {
        let header = decode_header(token).map_err(|e| IdentityError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::Invalid(format!("unexpected algorithm {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::Malformed("missing kid".into()))?;
        let key = self.key_for(&kid).await?;
        let data = decode::<VerifiedClaims>(token, &key, &self.validation()).map_err(|e| {
            warn!(%kid, err = %e, "identity token failed validation");
            IdentityError::Invalid(e.to_string())
        })?;
        require_subject(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    };

    use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    const PROJECT: &str = "creative-agency";
    const TEST_KEY_PEM: &str = include_str!("../../tests/fixtures/identity_rsa.pem");
    // base64url modulus of TEST_KEY_PEM
    const TEST_KEY_N: &str = "tT8TF2GmvWNlNY-3PV45822mxl848D5cOg3r_COq3a44vpx9_74PIcXvyDBb1QYTxUwZ4wgyV89wYCrwFrFAbvb__dFRjuNTF0tLLO3qcWD-ereSK4UgK2GIWsuLQkRg83C0DeJAixHRHLzNnX3jhBsaTP_PVPbZlPbi22QWdvo35Qr-DtnI5EAfS479epNQEQ55Kqs-AUaP-1D-7qtD_XiX45iWh2SAWZAhSVf1mB57kNSkLLG4yHLlGR-ffh1DDeFOgILEQMix6jU19x5qDG-E7XZp46kedGQvvXTZ6h75YPUm25UF_5cy8XxaDpsVnSaYAZBOop8p-kbc_7L5hw";

    // header {"alg":"RS256","kid":"k1","typ":"JWT"}, payload {"sub":"u","exp":4102444800}
    const RS256_TOKEN: &str =
        "eyJhbGciOiJSUzI1NiIsImtpZCI6ImsxIiwidHlwIjoiSldUIn0.eyJzdWIiOiJ1IiwiZXhwIjo0MTAyNDQ0ODAwfQ.c2ln";
    // header {"alg":"HS256","typ":"JWT"}
    const HS256_TOKEN: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiJ1IiwiZXhwIjo0MTAyNDQ0ODAwfQ.c2ln";

    /// Mock JWKS endpoint: counts hits, can be switched to failing.
    #[derive(Clone)]
    struct KeyServer {
        hits: Arc<AtomicUsize>,
        down: Arc<AtomicBool>,
        keys: Value,
    }

    impl KeyServer {
        fn empty() -> Self {
            Self::with_keys(json!({ "keys": [] }))
        }

        fn with_test_key() -> Self {
            Self::with_keys(json!({ "keys": [{
                "kty": "RSA", "use": "sig", "alg": "RS256", "kid": "k1", "n": TEST_KEY_N, "e": "AQAB"
            }] }))
        }

        fn with_keys(keys: Value) -> Self {
            Self { hits: Arc::new(AtomicUsize::new(0)), down: Arc::new(AtomicBool::new(false)), keys }
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }

        async fn start(&self) -> anyhow::Result<String> {
            let server = self.clone();
            let app = Router::new().route(
                "/jwks",
                get(move || {
                    let server = server.clone();
                    async move {
                        server.hits.fetch_add(1, Ordering::SeqCst);
                        if server.down.load(Ordering::SeqCst) {
                            return StatusCode::SERVICE_UNAVAILABLE.into_response();
                        }
                        Json(server.keys.clone()).into_response()
                    }
                }),
            );
            let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
            let addr = listener.local_addr()?;
            tokio::spawn(async move {
                let _ = axum::serve(listener, app).await;
            });
            Ok(format!("http://{}/jwks", addr))
        }
    }

    fn verifier(jwks_url: String) -> FirebaseVerifier {
        FirebaseVerifier::new(&IdentityConfig { project_id: PROJECT.into(), jwks_url, ..IdentityConfig::default() })
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn signed(claims: Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some("k1".into());
        let key = EncodingKey::from_rsa_pem(TEST_KEY_PEM.as_bytes()).unwrap();
        encode(&header, &claims, &key).unwrap()
    }

    fn id_token(aud: &str, iss: &str, exp: i64) -> String {
        signed(json!({"sub": "uid-42", "email": "client@agency.test", "aud": aud, "iss": iss, "exp": exp}))
    }

    fn issuer() -> String {
        format!("https://securetoken.google.com/{PROJECT}")
    }

    #[test]
    fn issuer_follows_project() {
        let v = verifier("http://unused".into());
        assert_eq!(v.issuer(), issuer());
    }

    #[tokio::test]
    async fn accepts_token_signed_by_published_key() -> anyhow::Result<()> {
        let keys = KeyServer::with_test_key();
        let v = verifier(keys.start().await?);
        let claims = v.verify(&id_token(PROJECT, &issuer(), now() + 600)).await?;
        assert_eq!(claims.sub, "uid-42");
        assert_eq!(claims.email.as_deref(), Some("client@agency.test"));

        // second token served from cache
        v.verify(&id_token(PROJECT, &issuer(), now() + 900)).await?;
        assert_eq!(keys.hits(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn rejects_wrong_audience_issuer_or_expired() -> anyhow::Result<()> {
        let keys = KeyServer::with_test_key();
        let v = verifier(keys.start().await?);
        let bad = [
            id_token("other-project", &issuer(), now() + 600),
            id_token(PROJECT, "https://securetoken.google.com/other-project", now() + 600),
            id_token(PROJECT, &issuer(), now() - 3600),
        ];
        for token in &bad {
            assert!(matches!(v.verify(token).await, Err(IdentityError::Invalid(_))));
        }
        Ok(())
    }

    #[tokio::test]
    async fn unknown_kid_rejected_after_refetch() -> anyhow::Result<()> {
        let keys = KeyServer::empty();
        let v = verifier(keys.start().await?);
        let err = v.verify(RS256_TOKEN).await.unwrap_err();
        assert!(matches!(err, IdentityError::UnknownKey(ref k) if k == "k1"), "{err}");
        assert_eq!(keys.hits(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn repeated_unknown_kids_do_not_refetch() -> anyhow::Result<()> {
        let keys = KeyServer::empty();
        let v = Arc::new(verifier(keys.start().await?));
        for _ in 0..5 {
            assert!(matches!(v.verify(RS256_TOKEN).await, Err(IdentityError::UnknownKey(_))));
        }
        let concurrent: Vec<_> = (0..8)
            .map(|_| {
                let v = v.clone();
                tokio::spawn(async move { v.verify(RS256_TOKEN).await })
            })
            .collect();
        for task in concurrent {
            assert!(task.await?.is_err());
        }
        assert_eq!(keys.hits(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn stale_keys_serve_while_key_set_is_down() -> anyhow::Result<()> {
        let keys = KeyServer::with_test_key();
        let v = FirebaseVerifier::new(&IdentityConfig {
            project_id: PROJECT.into(),
            jwks_url: keys.start().await?,
            jwks_ttl_secs: 0,
            jwks_min_refresh_secs: 0,
            ..IdentityConfig::default()
        });
        v.verify(&id_token(PROJECT, &issuer(), now() + 600)).await?;

        keys.down.store(true, Ordering::SeqCst);
        let claims = v.verify(&id_token(PROJECT, &issuer(), now() + 600)).await?;
        assert_eq!(claims.sub, "uid-42");
        assert_eq!(keys.hits(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_algorithm_rejected_without_fetch() -> anyhow::Result<()> {
        let keys = KeyServer::empty();
        let v = verifier(keys.start().await?);
        assert!(matches!(v.verify(HS256_TOKEN).await, Err(IdentityError::Invalid(_))));
        assert!(matches!(v.verify("garbage").await, Err(IdentityError::Malformed(_))));
        assert_eq!(keys.hits(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_key_set_is_an_error() {
        let v = verifier("http://127.0.0.1:1/jwks".into());
        assert!(matches!(v.verify(RS256_TOKEN).await, Err(IdentityError::KeySet(_))));
    }
}
