/**
 * Direct Conversion
 *
 * Converts a stored file to another format on user request. Unlike the
 * conversion inside the save flow, every failure here reaches the caller as
 * a typed error so it can be shown to the user.
 */

use std::sync::Arc;

use bytes::Bytes;

use crate::backend::engine::{ConvertRequest, EngineClient};
use crate::backend::error::BackendError;
use crate::backend::host::{FileId, FileStore};
use crate::shared::{DownloadClaims, SharedError};

use super::launcher::SessionLauncher;

/// Result of a direct conversion
#[derive(Debug, Clone)]
pub struct Converted {
    /// File name with the new extension
    pub name: String,
    pub content: Bytes,
}

pub struct ConversionService {
    files: Arc<dyn FileStore>,
    engine: EngineClient,
    launcher: Arc<SessionLauncher>,
}

impl ConversionService {
    pub fn new(files: Arc<dyn FileStore>, engine: EngineClient, launcher: Arc<SessionLauncher>) -> Self {
        Self {
            files,
            engine,
            launcher,
        }
    }

    /// Convert a file to `to_ext` and return the converted bytes
    pub async fn convert(&self, file_id: FileId, user_id: &str, to_ext: &str) -> Result<Converted, BackendError> {
        let to_ext = to_ext.trim().trim_start_matches('.').to_ascii_lowercase();
        if to_ext.is_empty() || !to_ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SharedError::validation("to", "target extension must be alphanumeric").into());
        }

        let file = self
            .files
            .file(file_id)
            .await?
            .ok_or_else(|| BackendError::not_found(format!("file {} not found", file_id)))?;
        let from_ext = file.extension();
        if from_ext == to_ext {
            return Err(SharedError::validation("to", "file already has this format").into());
        }

        let source_url = self.launcher.download_url(DownloadClaims {
            user_id: Some(user_id.to_string()),
            ..DownloadClaims::new(file.id)
        })?;
        let revision_key = format!("{}{}", file.id, file.mtime);

        let request = ConvertRequest::new(source_url, from_ext, to_ext.clone(), revision_key);
        let result_url = self.engine.convert(&request).await?;
        let content = self
            .engine
            .fetch_bytes(&self.engine.settings().to_internal_url(&result_url))
            .await?;

        let stem = std::path::Path::new(&file.name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("document");
        tracing::info!("[Engine] Converted file {} to {}", file.id, to_ext);

        Ok(Converted {
            name: format!("{}.{}", stem, to_ext),
            content,
        })
    }
}
