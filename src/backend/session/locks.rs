/**
 * Lock Providers
 *
 * One abstraction over where a file's editing key and lock live: the local
 * registry for files stored here, the remote instance for federated mounts.
 * `KeyService` picks the provider from the file's storage location.
 */

use async_trait::async_trait;

use crate::backend::host::FileInfo;
use crate::backend::keylock::KeyLockRegistry;
use crate::backend::remote::RemoteSessionProxy;

/// Keeper of a file's editing key and lock
#[async_trait]
pub trait LockProvider: Send + Sync {
    /// Editing key, if the provider could supply one
    async fn key(&self, file: &FileInfo) -> Result<Option<String>, sqlx::Error>;

    /// Set the lock and optionally the forcesave mark
    ///
    /// `Ok(false)` means the change did not take effect.
    async fn set_lock(&self, file: &FileInfo, locked: bool, forcesave: Option<bool>) -> Result<bool, sqlx::Error>;
}

/// Files stored by this host
#[derive(Clone, Debug)]
pub struct LocalLocks {
    registry: KeyLockRegistry,
}

impl LocalLocks {
    pub fn new(registry: KeyLockRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl LockProvider for LocalLocks {
    async fn key(&self, file: &FileInfo) -> Result<Option<String>, sqlx::Error> {
        self.registry.get_or_create_key(file.id).await.map(Some)
    }

    async fn set_lock(&self, file: &FileInfo, locked: bool, forcesave: Option<bool>) -> Result<bool, sqlx::Error> {
        self.registry.set_lock(file.id, locked).await?;
        if let Some(forcesave) = forcesave {
            self.registry.set_forcesave(file.id, forcesave).await?;
        }
        Ok(true)
    }
}

/// Files mounted from a federated instance
///
/// The forcesave mark is mirrored into the local registry, which is where
/// the duplicate-forcesave guard reads it.
#[derive(Clone, Debug)]
pub struct RemoteLocks {
    proxy: RemoteSessionProxy,
    registry: KeyLockRegistry,
}

impl RemoteLocks {
    pub fn new(proxy: RemoteSessionProxy, registry: KeyLockRegistry) -> Self {
        Self { proxy, registry }
    }
}

#[async_trait]
impl LockProvider for RemoteLocks {
    async fn key(&self, file: &FileInfo) -> Result<Option<String>, sqlx::Error> {
        Ok(self.proxy.get_remote_key(file).await)
    }

    async fn set_lock(&self, file: &FileInfo, locked: bool, forcesave: Option<bool>) -> Result<bool, sqlx::Error> {
        let confirmed = self.proxy.lock_remote_key(file, locked, forcesave).await;
        if let Some(forcesave) = forcesave {
            self.registry.set_forcesave(file.id, forcesave).await?;
        }
        Ok(confirmed)
    }
}

/// Resolves editing keys and lock providers per file
#[derive(Clone, Debug)]
pub struct KeyService {
    registry: KeyLockRegistry,
    local: LocalLocks,
    remote: RemoteLocks,
}

impl KeyService {
    pub fn new(registry: KeyLockRegistry, proxy: RemoteSessionProxy) -> Self {
        Self {
            local: LocalLocks::new(registry.clone()),
            remote: RemoteLocks::new(proxy, registry.clone()),
            registry,
        }
    }

    pub fn registry(&self) -> &KeyLockRegistry {
        &self.registry
    }

    /// Provider responsible for the file
    pub fn provider(&self, file: &FileInfo) -> &dyn LockProvider {
        if RemoteSessionProxy::is_remote(file) {
            &self.remote
        } else {
            &self.local
        }
    }

    /// Editing key of the file
    ///
    /// A federated file whose remote does not answer gets a locally minted
    /// key instead of failing the request.
    pub async fn key_for(&self, file: &FileInfo) -> Result<String, sqlx::Error> {
        if let Some(key) = self.provider(file).key(file).await? {
            return Ok(key);
        }
        tracing::info!("[KeyLock] Remote key unavailable for file {}, using a local key", file.id);
        self.registry.get_or_create_key(file.id).await
    }
}
