/**
 * Callback Coordinator
 *
 * The state machine the Docs engine drives through the track endpoint.
 * There is no stored state enum: the state of a file is the lock row plus
 * the status the engine just reported, and every callback re-enters here.
 *
 * | Status | Action |
 * |--------|--------|
 * | Editing | lock |
 * | MustSave, Corrupted | save flow, then unlock and clear the forcesave mark |
 * | Closed | unlock |
 * | Forcesave, CorruptedForcesave | save flow, then stay locked and set the forcesave mark |
 *
 * # Save Flow
 *
 * 1. The report must carry a result URL (400 otherwise).
 * 2. Engine URLs are rewritten to the engine's internal address.
 * 3. A result in another format is converted back to the file's own.
 * 4. The result is downloaded.
 * 5. The writer is taken from the report.
 * 6. The file is locked for a forcesave and unlocked otherwise, so that
 *    the host's write hook resets the key only after a final save. A
 *    federated forcesave whose remote lock fails is abandoned.
 * 7. The content is written, retrying while the storage is write-locked,
 *    inside the host's advisory lock when it has one.
 * 8. Engine history is recorded for non-forcesave saves that do not follow
 *    a forcesave, when version history is enabled.
 * 9. The writer is recorded as the version's author.
 *
 * The final lock write runs after the flow whatever its outcome, so a
 * failed save never strands a file locked.
 */

use std::sync::Arc;

use axum::http::StatusCode;
use bytes::Bytes;
use serde_json::json;
use thiserror::Error;

use super::retry::RetryPolicy;
use super::types::{TrackOutcome, TrackRequest};
use crate::backend::engine::{ConvertRequest, EngineClient, EngineError};
use crate::backend::host::{AdvisoryLocks, FileId, FileInfo, FileStore, HostError, UserDirectory};
use crate::backend::session::KeyService;
use crate::backend::versions::{VersionAuthor, VersionLedger};
use crate::shared::{ServiceConfig, TrackClaims, TrackStatus};

/// Owner name used for the host's advisory lock
const ADVISORY_LOCK_OWNER: &str = "docbridge";

#[derive(Debug, Error)]
enum SaveError {
    #[error("report carries no result url")]
    MissingUrl,
    #[error("remote instance did not confirm the lock")]
    RemoteLock,
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Host(#[from] HostError),
}

impl SaveError {
    fn outcome(&self) -> TrackOutcome {
        match self {
            Self::MissingUrl => TrackOutcome::rejected(StatusCode::BAD_REQUEST),
            _ => TrackOutcome::failed(),
        }
    }
}

/// Applies engine status reports to files
pub struct CallbackCoordinator {
    config: Arc<ServiceConfig>,
    files: Arc<dyn FileStore>,
    users: Arc<dyn UserDirectory>,
    advisory: Option<Arc<dyn AdvisoryLocks>>,
    engine: EngineClient,
    keys: KeyService,
    ledger: VersionLedger,
    retry: RetryPolicy,
}

impl CallbackCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<ServiceConfig>,
        files: Arc<dyn FileStore>,
        users: Arc<dyn UserDirectory>,
        advisory: Option<Arc<dyn AdvisoryLocks>>,
        engine: EngineClient,
        keys: KeyService,
        ledger: VersionLedger,
    ) -> Self {
        Self {
            config,
            files,
            users,
            advisory,
            engine,
            keys,
            ledger,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the content-write retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Apply one track report
    pub async fn track(&self, claims: &TrackClaims, request: TrackRequest) -> TrackOutcome {
        let file = match self.resolve(claims).await {
            Ok(Some(file)) => file,
            Ok(None) => {
                tracing::warn!("[Track] File {} not found", claims.file_id);
                return TrackOutcome::rejected(StatusCode::NOT_FOUND);
            }
            Err(e) => {
                tracing::error!("[Track] Failed to resolve file {}: {}", claims.file_id, e);
                return TrackOutcome::failed();
            }
        };

        tracing::debug!(
            "[Track] Status {:?} for file {} (key {:?})",
            request.status,
            file.id,
            request.key
        );

        match request.status {
            TrackStatus::Editing => {
                self.set_lock(&file, true, None).await;
                TrackOutcome::ok()
            }
            TrackStatus::Closed => {
                self.set_lock(&file, false, None).await;
                TrackOutcome::ok()
            }
            status => self.save(&file, status, &request, claims).await,
        }
    }

    async fn resolve(&self, claims: &TrackClaims) -> Result<Option<FileInfo>, HostError> {
        match &claims.share_token {
            Some(share_token) => {
                self.files
                    .resolve_share(share_token, claims.file_path.as_deref())
                    .await
            }
            None => self.files.file(claims.file_id).await,
        }
    }

    /// Lock write outside the save flow; failures are logged
    async fn set_lock(&self, file: &FileInfo, locked: bool, forcesave: Option<bool>) -> bool {
        match self.keys.provider(file).set_lock(file, locked, forcesave).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!("[Track] Lock change to {} not confirmed for file {}", locked, file.id);
                false
            }
            Err(e) => {
                tracing::error!("[Track] Failed to set lock of file {}: {}", file.id, e);
                false
            }
        }
    }

    async fn save(&self, file: &FileInfo, status: TrackStatus, request: &TrackRequest, claims: &TrackClaims) -> TrackOutcome {
        let prev_was_forcesave = match self.keys.registry().was_forcesave(file.id).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("[Track] Could not read forcesave mark of file {}: {}", file.id, e);
                false
            }
        };

        let result = self
            .save_flow(file, status, request, claims, prev_was_forcesave)
            .await;

        // Final lock write, on every path
        let finalized = match self
            .keys
            .provider(file)
            .set_lock(file, status.is_forcesave(), Some(status.is_forcesave()))
            .await
        {
            Ok(confirmed) => {
                if !confirmed {
                    tracing::warn!("[Track] Final lock write not confirmed for file {}", file.id);
                }
                true
            }
            Err(e) => {
                tracing::error!("[Track] Final lock write failed for file {}: {}", file.id, e);
                false
            }
        };

        match result {
            Ok(()) if finalized => {
                tracing::info!("[Track] Saved file {} ({:?})", file.id, status);
                TrackOutcome::ok()
            }
            Ok(()) => TrackOutcome::failed(),
            Err(e) => {
                tracing::error!("[Track] Save of file {} failed: {}", file.id, e);
                e.outcome()
            }
        }
    }

    async fn save_flow(
        &self,
        file: &FileInfo,
        status: TrackStatus,
        request: &TrackRequest,
        claims: &TrackClaims,
        prev_was_forcesave: bool,
    ) -> Result<(), SaveError> {
        let engine = self.engine.settings();
        let mut url = engine.to_internal_url(request.url.as_deref().ok_or(SaveError::MissingUrl)?);

        let file_ext = file.extension();
        if let Some(result_ext) = request
            .filetype
            .as_deref()
            .map(str::to_ascii_lowercase)
            .filter(|ext| *ext != file_ext)
        {
            tracing::debug!("[Track] Converting result {} -> {} for file {}", result_ext, file_ext, file.id);
            let revision_key = format!("{}{}", file.id, url);
            let converted = self
                .engine
                .convert(&ConvertRequest::new(url.clone(), result_ext, file_ext.clone(), revision_key))
                .await?;
            url = engine.to_internal_url(&converted);
        }

        let content = self.engine.fetch_bytes(&url).await?;

        let writer = request
            .writer()
            .map(|id| self.strip_instance_prefix(id).to_string())
            .or_else(|| claims.user_id.clone());

        match self
            .keys
            .provider(file)
            .set_lock(file, status.is_forcesave(), None)
            .await
        {
            Ok(true) => {}
            Ok(false) if status.is_forcesave() => return Err(SaveError::RemoteLock),
            Ok(false) => tracing::warn!("[Track] Remote unlock not confirmed for file {}", file.id),
            Err(e) => tracing::warn!("[Track] Failed to set lock of file {}: {}", file.id, e),
        }

        let previous_version = file.mtime.to_string();
        let written = self.write_content(file.id, content).await?;
        let version_id = written.mtime.to_string();

        if !self.config.version_history {
            return Ok(());
        }

        if !status.is_forcesave() && !prev_was_forcesave {
            let changes = self.fetch_changes(request).await;
            let history = request.history.clone().unwrap_or_else(|| json!({}));
            if let Err(e) = self
                .ledger
                .save_history(
                    &file.owner_id,
                    file.id,
                    &version_id,
                    &history,
                    changes.as_deref(),
                    &previous_version,
                )
                .await
            {
                tracing::warn!("[Versions] Failed to store history of file {}: {}", file.id, e);
            }
        } else if prev_was_forcesave {
            tracing::debug!("[Versions] Previous save of file {} was a forcesave, no history", file.id);
        }

        if let Some(writer) = writer {
            if let Some(name) = self.users.display_name(&writer).await {
                let author = VersionAuthor { id: writer, name };
                if let Err(e) = self
                    .ledger
                    .save_author(&file.owner_id, file.id, &version_id, &author)
                    .await
                {
                    tracing::warn!("[Versions] Failed to store author of file {}: {}", file.id, e);
                }
            }
        }

        Ok(())
    }

    fn strip_instance_prefix<'a>(&self, engine_user: &'a str) -> &'a str {
        engine_user
            .strip_prefix(self.config.instance_id.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .unwrap_or(engine_user)
    }

    async fn fetch_changes(&self, request: &TrackRequest) -> Option<Bytes> {
        let url = request.changes_url.as_deref()?;
        let url = self.engine.settings().to_internal_url(url);
        match self.engine.fetch_bytes(&url).await {
            Ok(changes) => Some(changes),
            Err(e) => {
                tracing::warn!("[Versions] Failed to download changes: {}", e);
                None
            }
        }
    }

    async fn write_content(&self, file_id: FileId, content: Bytes) -> Result<FileInfo, HostError> {
        let result = self
            .retry
            .run(
                || {
                    let content = content.clone();
                    async move { self.write_once(file_id, content).await }
                },
                HostError::is_transient,
            )
            .await;
        if let Err(e) = &result {
            tracing::error!("[Track] Giving up writing file {}: {}", file_id, e);
        }
        result
    }

    async fn write_once(&self, file_id: FileId, content: Bytes) -> Result<FileInfo, HostError> {
        let Some(locks) = &self.advisory else {
            return self.files.write(file_id, content).await;
        };

        locks.lock(file_id, ADVISORY_LOCK_OWNER).await?;
        let result = self.files.write(file_id, content).await;
        if let Err(e) = locks.unlock(file_id, ADVISORY_LOCK_OWNER).await {
            tracing::warn!("[Track] Failed to release advisory lock of file {}: {}", file_id, e);
        }
        result
    }
}
