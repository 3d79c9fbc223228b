//! Upload relay
//!
//! An uploaded file is streamed into a `StagedUpload` inside the staging
//! directory, pushed to the media host, and removed when the guard drops,
//! whichever way the request ends.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

use crate::media::{MediaError, MediaHost};

/// A staged upload; the file is deleted when this value is dropped.
pub struct StagedUpload {
    file: NamedTempFile,
    writer: tokio::fs::File,
    len: u64,
}

impl StagedUpload {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), MediaError> {
        self.writer.write_all(chunk).await?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(&mut self) -> Result<(), MediaError> {
        self.writer.flush().await?;
        self.writer.sync_all().await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Extension of the client's file name, restricted to short alphanumerics.
fn safe_extension(original_name: Option<&str>) -> String {
    original_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

pub struct UploadRelay {
    media: Arc<dyn MediaHost>,
    staging_dir: PathBuf,
}

impl UploadRelay {
    pub fn new(media: Arc<dyn MediaHost>, staging_dir: impl Into<PathBuf>) -> Self {
        Self { media, staging_dir: staging_dir.into() }
    }

    /// Open a staged file named after the form field, keeping the client's extension.
    pub fn stage(&self, field_name: &str, original_name: Option<&str>) -> Result<StagedUpload, MediaError> {
        let file = tempfile::Builder::new()
            .prefix(&format!("{field_name}-"))
            .suffix(&safe_extension(original_name))
            .tempfile_in(&self.staging_dir)?;
        let writer = tokio::fs::File::from_std(file.as_file().try_clone()?);
        Ok(StagedUpload { file, writer, len: 0 })
    }

    /// Push the staged bytes to the media host and return the stable URL.
    #[instrument(skip(self, staged), fields(path = %staged.path().display(), bytes = staged.len()))]
    pub async fn relay(&self, staged: &StagedUpload) -> Result<String, MediaError> {
        match self.media.upload(staged.path()).await {
            Ok(asset) => {
                info!(url = %asset.secure_url, public_id = ?asset.public_id, "upload_relayed");
                Ok(asset.secure_url)
            }
            Err(e) => {
                error!(err = %e, "upload_relay_failed");
                Err(e)
            }
        }
    }
}
