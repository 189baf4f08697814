//! Host Collaborator Interfaces
//!
//! The document-management host owns storage, users and sharing. This
//! module describes the narrow slice of it the editing protocol consumes,
//! as async traits injected into the services at startup.
//!
//! # Module Structure
//!
//! ```text
//! host/
//! ├── mod.rs     - Traits, file metadata and host errors
//! └── memory.rs  - In-process host used for standalone runs and tests
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// In-process host implementation
pub mod memory;

pub use memory::MemoryHost;

/// Host identifier of a file
pub type FileId = i64;

/// Where a file's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// Stored by this host
    Local,
    /// Mounted from a federated instance through a share
    Remote {
        /// Origin of the remote instance, without trailing slash
        origin: String,
        share_token: String,
        /// Path of the file inside the share
        path: String,
    },
}

/// File metadata the protocol needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub id: FileId,
    pub owner_id: String,
    pub name: String,
    /// Modification time, also the id the next preserved version will get
    pub mtime: i64,
    /// Content length in bytes
    pub size: usize,
    pub location: StorageLocation,
}

impl FileInfo {
    /// Lowercase extension without the dot, empty if there is none
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.location, StorageLocation::Remote { .. })
    }
}

/// A preserved earlier version of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Version id; the mtime the content had when it was current
    pub id: String,
    pub mtime: i64,
    pub size: usize,
}

/// A document from the host's template catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: FileId,
    pub name: String,
    pub content: Bytes,
}

/// Failures reported by the host
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("{0} not found")]
    NotFound(String),
    /// Someone else holds the storage write lock; worth retrying
    #[error("file {0} is locked for writing")]
    WriteLocked(FileId),
    #[error("access to file {0} denied")]
    Forbidden(FileId),
    #[error("storage error: {0}")]
    Storage(String),
}

impl HostError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::WriteLocked(_))
    }
}

/// File storage and sharing
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn file(&self, file_id: FileId) -> Result<Option<FileInfo>, HostError>;

    /// Resolve a file reached through a public share
    async fn resolve_share(&self, share_token: &str, path: Option<&str>) -> Result<Option<FileInfo>, HostError>;

    async fn read(&self, file_id: FileId) -> Result<Bytes, HostError>;

    /// Replace the content; the previous content becomes a version
    async fn write(&self, file_id: FileId, content: Bytes) -> Result<FileInfo, HostError>;

    /// Preserved versions, oldest first
    async fn versions(&self, file_id: FileId) -> Result<Vec<VersionInfo>, HostError>;

    async fn read_version(&self, file_id: FileId, version_id: &str) -> Result<Bytes, HostError>;

    /// Blank document used when a new file of this type is created
    async fn blank_document(&self, extension: &str) -> Result<Bytes, HostError>;

    /// Template catalog entry
    async fn template(&self, template_id: FileId) -> Result<Option<Template>, HostError>;
}

/// User lookups
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn display_name(&self, user_id: &str) -> Option<String>;
}

/// Host advisory file locks wrapped around content writes
#[async_trait]
pub trait AdvisoryLocks: Send + Sync {
    async fn lock(&self, file_id: FileId, owner: &str) -> Result<(), HostError>;
    async fn unlock(&self, file_id: FileId, owner: &str) -> Result<(), HostError>;
}

/// Notifications the host raises about changes it made
#[async_trait]
pub trait FileEvents: Send + Sync {
    async fn file_written(&self, file: &FileInfo);
    async fn file_deleted(&self, file: &FileInfo);
    async fn version_deleted(&self, file: &FileInfo, version_id: &str);
    async fn version_restored(&self, file: &FileInfo, version_id: &str);
}
