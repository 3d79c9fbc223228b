#![allow(dead_code)]

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{body::Body, http::Response, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tempfile::TempDir;

use server::{routes, startup, ServerState};
use service::{
    identity::{SharedSecretVerifier, TokenVerifier},
    media::{MediaAsset, MediaError, MediaHost},
    store::{DocumentStore, MemoryStore},
    ResourceGateway, UploadRelay,
};

pub const SECRET: &str = "test-secret";
pub const BANNER_URL: &str = "https://res.cloudinary.test/agency/banner.png";
pub const BOUNDARY: &str = "agency-test-boundary";

/// Media host double: answers with a fixed URL or fails, and remembers what it was sent.
#[derive(Default)]
pub struct StubMedia {
    pub fail: bool,
    pub uploaded: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl MediaHost for StubMedia {
    async fn upload(&self, path: &Path) -> Result<MediaAsset, MediaError> {
        let bytes = tokio::fs::read(path).await?;
        self.uploaded.lock().unwrap().push(bytes);
        if self.fail {
            return Err(MediaError::Rejected { status: 401, body: "bad credentials".into() });
        }
        Ok(MediaAsset { secure_url: BANNER_URL.into(), public_id: Some("banner".into()) })
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub media: Arc<StubMedia>,
    pub staging: TempDir,
}

pub fn test_app() -> TestApp {
    test_app_with(false, false)
}

pub fn test_app_with(media_fails: bool, legacy_write_responses: bool) -> TestApp {
    let staging = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let media = Arc::new(StubMedia { fail: media_fails, ..Default::default() });
    let verifier: Arc<dyn TokenVerifier> = Arc::new(SharedSecretVerifier::new(SECRET));
    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    let dyn_media: Arc<dyn MediaHost> = media.clone();
    let state = ServerState {
        gateway: Arc::new(ResourceGateway::new(dyn_store)),
        relay: Arc::new(UploadRelay::new(dyn_media, staging.path())),
        verifier,
        legacy_write_responses,
        max_upload_bytes: 1024 * 1024,
    };
    let router = routes::build_router(state, startup::build_cors());
    TestApp { router, store, media, staging }
}

pub fn mint_token(secret: &str, exp_offset_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + exp_offset_secs;
    let claims = json!({"sub": "uid-123", "email": "client@agency.test", "exp": exp});
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

pub fn valid_token() -> String {
    mint_token(SECRET, 3600)
}

/// `multipart/form-data` body with text fields and an optional `serviceBanner` file.
pub fn multipart_body(fields: &[(&str, &str)], banner: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some(bytes) = banner {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"serviceBanner\"; filename=\"banner.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(resp: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
