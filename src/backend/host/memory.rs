/**
 * In-Memory Host
 *
 * A complete in-process implementation of the host collaborator traits.
 * The server binary uses it when no external host adapter is wired in, and
 * every test drives the protocol against it.
 *
 * # Write Behaviour
 *
 * Each write preserves the previous content as a version whose id is the
 * previous mtime, bumps the mtime and then notifies the registered
 * `FileEvents` listener, the way a real storage backend fires its write
 * hook after the fact. Restoring a version moves it back to current, so it
 * leaves the version list.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use super::{
    AdvisoryLocks, FileEvents, FileId, FileInfo, FileStore, HostError, StorageLocation, Template, UserDirectory,
    VersionInfo,
};

struct StoredVersion {
    info: VersionInfo,
    content: Bytes,
}

struct StoredFile {
    info: FileInfo,
    content: Bytes,
    versions: Vec<StoredVersion>,
}

#[derive(Default)]
struct HostState {
    next_id: FileId,
    files: HashMap<FileId, StoredFile>,
    shares: HashMap<String, FileId>,
    users: HashMap<String, String>,
    blank_documents: HashMap<String, Bytes>,
    templates: HashMap<FileId, Template>,
    advisory_locks: HashMap<FileId, String>,
    advisory_lock_calls: usize,
    pending_write_failures: usize,
    write_attempts: usize,
}

/// Host implementation backed by process memory
#[derive(Clone, Default)]
pub struct MemoryHost {
    state: Arc<Mutex<HostState>>,
    listener: Arc<Mutex<Option<Arc<dyn FileEvents>>>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn listener(&self) -> Option<Arc<dyn FileEvents>> {
        self.listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Register the receiver of write/delete notifications
    pub fn set_listener(&self, listener: Arc<dyn FileEvents>) {
        *self.listener.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(listener);
    }

    fn insert(&self, owner_id: &str, name: &str, content: Bytes, location: StorageLocation) -> FileInfo {
        let mut state = self.state();
        state.next_id += 1;
        let info = FileInfo {
            id: state.next_id,
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            mtime: chrono::Utc::now().timestamp(),
            size: content.len(),
            location,
        };
        state.files.insert(
            info.id,
            StoredFile {
                info: info.clone(),
                content,
                versions: Vec::new(),
            },
        );
        info
    }

    /// Store a new local file
    pub fn add_file(&self, owner_id: &str, name: &str, content: impl Into<Bytes>) -> FileInfo {
        self.insert(owner_id, name, content.into(), StorageLocation::Local)
    }

    /// Store a file mounted from a federated instance
    pub fn add_remote_file(
        &self,
        owner_id: &str,
        name: &str,
        content: impl Into<Bytes>,
        origin: &str,
        share_token: &str,
        path: &str,
    ) -> FileInfo {
        let location = StorageLocation::Remote {
            origin: origin.trim_end_matches('/').to_string(),
            share_token: share_token.to_string(),
            path: path.to_string(),
        };
        self.insert(owner_id, name, content.into(), location)
    }

    /// Publish a file under a share token
    pub fn add_share(&self, share_token: &str, file_id: FileId) {
        self.state().shares.insert(share_token.to_string(), file_id);
    }

    pub fn add_user(&self, user_id: &str, display_name: &str) {
        self.state()
            .users
            .insert(user_id.to_string(), display_name.to_string());
    }

    pub fn add_blank_document(&self, extension: &str, content: impl Into<Bytes>) {
        self.state()
            .blank_documents
            .insert(extension.to_ascii_lowercase(), content.into());
    }

    /// Add a document to the template catalog
    pub fn add_template(&self, name: &str, content: impl Into<Bytes>) -> FileId {
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        state.templates.insert(
            id,
            Template {
                id,
                name: name.to_string(),
                content: content.into(),
            },
        );
        id
    }

    /// Make the next `count` writes fail as if another process held the
    /// storage write lock
    pub fn fail_next_writes(&self, count: usize) {
        self.state().pending_write_failures = count;
    }

    /// Writes attempted so far, failed ones included
    pub fn write_attempts(&self) -> usize {
        self.state().write_attempts
    }

    pub fn advisory_lock_calls(&self) -> usize {
        self.state().advisory_lock_calls
    }

    pub fn is_advisory_locked(&self, file_id: FileId) -> bool {
        self.state().advisory_locks.contains_key(&file_id)
    }

    /// Replace content the way a user upload would, firing the write hook
    pub async fn external_write(&self, file_id: FileId, content: impl Into<Bytes>) -> Result<FileInfo, HostError> {
        self.write(file_id, content.into()).await
    }

    /// Remove a file and fire the delete hook
    pub async fn delete_file(&self, file_id: FileId) -> Result<(), HostError> {
        let info = {
            let mut state = self.state();
            state.shares.retain(|_, id| *id != file_id);
            state
                .files
                .remove(&file_id)
                .map(|file| file.info)
                .ok_or_else(|| HostError::NotFound(format!("file {}", file_id)))?
        };
        if let Some(listener) = self.listener() {
            listener.file_deleted(&info).await;
        }
        Ok(())
    }

    /// Drop a preserved version and fire the version hook
    pub async fn delete_version(&self, file_id: FileId, version_id: &str) -> Result<(), HostError> {
        let info = {
            let mut state = self.state();
            let file = state
                .files
                .get_mut(&file_id)
                .ok_or_else(|| HostError::NotFound(format!("file {}", file_id)))?;
            let before = file.versions.len();
            file.versions.retain(|version| version.info.id != version_id);
            if file.versions.len() == before {
                return Err(HostError::NotFound(format!("version {} of file {}", version_id, file_id)));
            }
            file.info.clone()
        };
        if let Some(listener) = self.listener() {
            listener.version_deleted(&info, version_id).await;
        }
        Ok(())
    }

    /// Make a preserved version current again and fire the restore hook
    pub async fn restore_version(&self, file_id: FileId, version_id: &str) -> Result<FileInfo, HostError> {
        let content = self.read_version(file_id, version_id).await?;
        let info = self.write(file_id, content).await?;
        if let Some(file) = self.state().files.get_mut(&file_id) {
            file.versions.retain(|version| version.info.id != version_id);
        }
        if let Some(listener) = self.listener() {
            listener.version_restored(&info, version_id).await;
        }
        Ok(info)
    }
}

#[async_trait]
impl FileStore for MemoryHost {
    async fn file(&self, file_id: FileId) -> Result<Option<FileInfo>, HostError> {
        Ok(self.state().files.get(&file_id).map(|file| file.info.clone()))
    }

    async fn resolve_share(&self, share_token: &str, _path: Option<&str>) -> Result<Option<FileInfo>, HostError> {
        let state = self.state();
        Ok(state
            .shares
            .get(share_token)
            .and_then(|id| state.files.get(id))
            .map(|file| file.info.clone()))
    }

    async fn read(&self, file_id: FileId) -> Result<Bytes, HostError> {
        self.state()
            .files
            .get(&file_id)
            .map(|file| file.content.clone())
            .ok_or_else(|| HostError::NotFound(format!("file {}", file_id)))
    }

    async fn write(&self, file_id: FileId, content: Bytes) -> Result<FileInfo, HostError> {
        let info = {
            let mut state = self.state();
            state.write_attempts += 1;
            if state.pending_write_failures > 0 {
                state.pending_write_failures -= 1;
                return Err(HostError::WriteLocked(file_id));
            }

            let file = state
                .files
                .get_mut(&file_id)
                .ok_or_else(|| HostError::NotFound(format!("file {}", file_id)))?;

            file.info.size = content.len();
            let previous = std::mem::replace(&mut file.content, content);
            file.versions.push(StoredVersion {
                info: VersionInfo {
                    id: file.info.mtime.to_string(),
                    mtime: file.info.mtime,
                    size: previous.len(),
                },
                content: previous,
            });
            file.info.mtime = chrono::Utc::now().timestamp().max(file.info.mtime + 1);
            file.info.clone()
        };

        if let Some(listener) = self.listener() {
            listener.file_written(&info).await;
        }
        Ok(info)
    }

    async fn versions(&self, file_id: FileId) -> Result<Vec<VersionInfo>, HostError> {
        self.state()
            .files
            .get(&file_id)
            .map(|file| file.versions.iter().map(|version| version.info.clone()).collect())
            .ok_or_else(|| HostError::NotFound(format!("file {}", file_id)))
    }

    async fn read_version(&self, file_id: FileId, version_id: &str) -> Result<Bytes, HostError> {
        let state = self.state();
        let file = state
            .files
            .get(&file_id)
            .ok_or_else(|| HostError::NotFound(format!("file {}", file_id)))?;
        file.versions
            .iter()
            .find(|version| version.info.id == version_id)
            .map(|version| version.content.clone())
            .ok_or_else(|| HostError::NotFound(format!("version {} of file {}", version_id, file_id)))
    }

    async fn blank_document(&self, extension: &str) -> Result<Bytes, HostError> {
        self.state()
            .blank_documents
            .get(&extension.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("blank {} document", extension)))
    }

    async fn template(&self, template_id: FileId) -> Result<Option<Template>, HostError> {
        Ok(self.state().templates.get(&template_id).cloned())
    }
}

#[async_trait]
impl UserDirectory for MemoryHost {
    async fn display_name(&self, user_id: &str) -> Option<String> {
        self.state().users.get(user_id).cloned()
    }
}

#[async_trait]
impl AdvisoryLocks for MemoryHost {
    async fn lock(&self, file_id: FileId, owner: &str) -> Result<(), HostError> {
        let mut state = self.state();
        state.advisory_lock_calls += 1;
        match state.advisory_locks.get(&file_id) {
            Some(holder) if holder != owner => Err(HostError::WriteLocked(file_id)),
            _ => {
                state.advisory_locks.insert(file_id, owner.to_string());
                Ok(())
            }
        }
    }

    async fn unlock(&self, file_id: FileId, owner: &str) -> Result<(), HostError> {
        let mut state = self.state();
        if state.advisory_locks.get(&file_id).map(String::as_str) == Some(owner) {
            state.advisory_locks.remove(&file_id);
        }
        Ok(())
    }
}
