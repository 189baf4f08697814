/**
 * Version History
 *
 * Assembles the history the editor shows for a file: every preserved
 * version plus the current content, oldest first, each with its download
 * URL and whatever the ledger recorded for it (engine change history,
 * changes archive, author).
 *
 * # Lineage
 *
 * The host's version list is the source of truth for which version precedes
 * which. Each ledger record is read against the id listed right before it;
 * the first listed version has no predecessor. A record written against a
 * different predecessor is purged by the ledger and shows up without
 * history.
 */

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::ledger::{VersionAuthor, VersionLedger};
use crate::backend::error::BackendError;
use crate::backend::host::{FileId, FileStore};
use crate::backend::session::{KeyService, SessionLauncher};
use crate::shared::revision::generate_revision_id;
use crate::shared::DownloadClaims;

/// One version as shown in the editor's history panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub version: String,
    /// Engine key of this version's content
    pub key: String,
    /// Modification time of the content, in seconds
    pub created: i64,
    pub current: bool,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<VersionAuthor>,
    /// Engine change history recorded when the version was saved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes_url: Option<String>,
}

/// History of one file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHistory {
    pub current_version: String,
    pub history: Vec<HistoryEntry>,
}

pub struct VersionService {
    files: Arc<dyn FileStore>,
    ledger: VersionLedger,
    keys: KeyService,
    launcher: Arc<SessionLauncher>,
}

impl VersionService {
    pub fn new(files: Arc<dyn FileStore>, ledger: VersionLedger, keys: KeyService, launcher: Arc<SessionLauncher>) -> Self {
        Self {
            files,
            ledger,
            keys,
            launcher,
        }
    }

    /// Version history of a file as seen by `user_id`
    pub async fn history(&self, file_id: FileId, user_id: &str) -> Result<FileHistory, BackendError> {
        let file = self
            .files
            .file(file_id)
            .await?
            .ok_or_else(|| BackendError::not_found(format!("file {} not found", file_id)))?;

        let mut lineage: Vec<(String, i64)> = self
            .files
            .versions(file.id)
            .await?
            .into_iter()
            .map(|version| (version.id, version.mtime))
            .collect();
        let current_version = file.mtime.to_string();
        lineage.push((current_version.clone(), file.mtime));
        let last = lineage.len() - 1;

        let mut history = Vec::with_capacity(lineage.len());
        let mut expected_prev = String::new();
        for (index, (version_id, mtime)) in lineage.into_iter().enumerate() {
            let current = index == last;
            let changes = self
                .ledger
                .get_history(&file.owner_id, file.id, &version_id, &expected_prev)
                .await?;
            let user = self.ledger.get_author(&file.owner_id, file.id, &version_id).await?;

            let changes_url = if changes.is_some() && self.ledger.has_changes(&file.owner_id, file.id, &version_id).await? {
                Some(self.launcher.download_url(DownloadClaims {
                    user_id: Some(user_id.to_string()),
                    version: Some(version_id.clone()),
                    changes: true,
                    ..DownloadClaims::new(file.id)
                })?)
            } else {
                None
            };

            let (key, url) = if current {
                let url = self.launcher.download_url(DownloadClaims {
                    user_id: Some(user_id.to_string()),
                    ..DownloadClaims::new(file.id)
                })?;
                (self.keys.key_for(&file).await?, url)
            } else {
                let url = self.launcher.download_url(DownloadClaims {
                    user_id: Some(user_id.to_string()),
                    version: Some(version_id.clone()),
                    ..DownloadClaims::new(file.id)
                })?;
                (generate_revision_id(&format!("{}{}", file.id, version_id)), url)
            };

            history.push(HistoryEntry {
                version: version_id.clone(),
                key,
                created: mtime,
                current,
                url,
                user,
                changes,
                changes_url,
            });
            expected_prev = version_id;
        }

        tracing::debug!("[Versions] Listed {} versions of file {}", history.len(), file.id);
        Ok(FileHistory {
            current_version,
            history,
        })
    }
}
