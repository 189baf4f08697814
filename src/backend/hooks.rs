/**
 * Host Event Hooks
 *
 * Keeps the registry and the ledger consistent with changes the host makes
 * to files:
 *
 * - a write drops the editing key unless the file is locked, so the next
 *   session starts from the new content under a fresh key
 * - a delete drops the key unconditionally and the file's ledger records
 * - deleting or restoring a version drops that version's ledger record
 */

use async_trait::async_trait;

use crate::backend::host::{FileEvents, FileInfo};
use crate::backend::keylock::KeyLockRegistry;
use crate::backend::versions::VersionLedger;

#[derive(Clone, Debug)]
pub struct HostHooks {
    registry: KeyLockRegistry,
    ledger: VersionLedger,
}

impl HostHooks {
    pub fn new(registry: KeyLockRegistry, ledger: VersionLedger) -> Self {
        Self { registry, ledger }
    }
}

#[async_trait]
impl FileEvents for HostHooks {
    async fn file_written(&self, file: &FileInfo) {
        match self.registry.delete_key(file.id, false).await {
            Ok(true) => tracing::debug!("[KeyLock] Content of file {} changed, key reset", file.id),
            Ok(false) => {}
            Err(e) => tracing::warn!("[KeyLock] Failed to reset key of file {}: {}", file.id, e),
        }
    }

    async fn file_deleted(&self, file: &FileInfo) {
        if let Err(e) = self.registry.delete_key(file.id, true).await {
            tracing::warn!("[KeyLock] Failed to delete key of file {}: {}", file.id, e);
        }
        if let Err(e) = self.ledger.delete_file(file.id).await {
            tracing::warn!("[Versions] Failed to delete history of file {}: {}", file.id, e);
        }
    }

    async fn version_deleted(&self, file: &FileInfo, version_id: &str) {
        if let Err(e) = self.ledger.delete_version(&file.owner_id, file.id, version_id).await {
            tracing::warn!(
                "[Versions] Failed to delete history of version {} of file {}: {}",
                version_id,
                file.id,
                e
            );
        }
    }

    async fn version_restored(&self, file: &FileInfo, version_id: &str) {
        if let Err(e) = self.registry.delete_key(file.id, false).await {
            tracing::warn!("[KeyLock] Failed to reset key of file {}: {}", file.id, e);
        }
        if let Err(e) = self.ledger.delete_version(&file.owner_id, file.id, version_id).await {
            tracing::warn!(
                "[Versions] Failed to delete history of restored version {} of file {}: {}",
                version_id,
                file.id,
                e
            );
        }
    }
}
