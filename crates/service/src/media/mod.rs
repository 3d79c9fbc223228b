//! Media host abstraction: push a staged file, get back a stable URL.

pub mod cloudinary;

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use cloudinary::CloudinaryHost;

/// What the media host hands back for an upload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MediaAsset {
    pub secure_url: String,
    #[serde(default)]
    pub public_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host is not configured")]
    NotConfigured,
    #[error("staging io error: {0}")]
    Io(String),
    #[error("media host unreachable: {0}")]
    Transport(String),
    #[error("media host rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected media host response: {0}")]
    Decode(String),
}

impl From<std::io::Error> for MediaError {
    fn from(e: std::io::Error) -> Self {
        MediaError::Io(e.to_string())
    }
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<MediaAsset, MediaError>;
}
