use std::path::Path;

use async_trait::async_trait;
use configs::MediaConfig;
use reqwest::multipart::{Form, Part};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use super::{MediaAsset, MediaError, MediaHost};

/// Signed uploads to the Cloudinary image upload endpoint.
pub struct CloudinaryHost {
    client: reqwest::Client,
    cfg: MediaConfig,
}

impl CloudinaryHost {
    pub fn new(cfg: MediaConfig) -> Self {
        Self { client: reqwest::Client::new(), cfg }
    }

    pub fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.cloud_name
        )
    }
}

/// Request signature: `k=v` pairs sorted by key, joined with `&`, secret appended, SHA-256 hex.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    hex::encode(Sha256::digest(format!("{joined}{api_secret}").as_bytes()))
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    #[instrument(skip(self), fields(cloud = %self.cfg.cloud_name))]
    async fn upload(&self, path: &Path) -> Result<MediaAsset, MediaError> {
        if !self.cfg.is_configured() {
            return Err(MediaError::NotConfigured);
        }
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut params = vec![("timestamp", chrono::Utc::now().timestamp().to_string())];
        if let Some(folder) = self.cfg.folder.as_ref().filter(|f| !f.trim().is_empty()) {
            params.push(("folder", folder.clone()));
        }
        let signature = sign(&params, &self.cfg.api_secret);

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("api_key", self.cfg.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (k, v) in params {
            form = form.text(k, v);
        }

        let resp = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "media host rejected upload");
            return Err(MediaError::Rejected { status: status.as_u16(), body });
        }
        let asset = resp
            .json::<MediaAsset>()
            .await
            .map_err(|e| MediaError::Decode(e.to_string()))?;
        info!(url = %asset.secure_url, "media uploaded");
        Ok(asset)
    }
}
