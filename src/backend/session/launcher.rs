/**
 * Editor Launch
 *
 * Prepares everything the browser editor needs to open a file through the
 * Docs engine: the editing key, capability URLs for download and status
 * tracking, the permission block, and, when the engine has a secret, the
 * whole configuration signed for the engine.
 *
 * # Callback URLs
 *
 * All URLs point at `storage_url` (how the engine reaches this host) and
 * carry a signed session token in `doc`:
 *
 * - `/callback/download?doc=` - short-lived `download` token
 * - `/callback/track?doc=` - `track` token living as long as a session
 * - `/callback/emptyfile?doc=` - `empty` token, used for zero-byte files
 */

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::backend::engine::EngineClient;
use crate::backend::error::BackendError;
use crate::backend::host::{FileId, FileInfo, FileStore, UserDirectory};
use crate::backend::permissions::{EditorPermissions, PermissionStore};
use crate::backend::tokens::TokenCodec;
use crate::shared::{
    DirectClaims, DownloadClaims, EmptyClaims, ServiceConfig, SessionClaims, TrackClaims,
};

use super::locks::KeyService;

/// User shown in the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorUser {
    /// Engine-side id, prefixed with the instance id
    pub id: String,
    pub name: String,
}

/// Everything needed to open one editing session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorLaunch {
    pub key: String,
    pub file_type: String,
    pub document_type: &'static str,
    pub title: String,
    pub document_url: String,
    pub callback_url: String,
    pub mode: &'static str,
    pub permissions: EditorPermissions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<EditorUser>,
    /// Public engine address the browser loads the editor from
    pub engine_url: String,
    /// Configuration signed for the engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl EditorLaunch {
    /// Editor configuration in the engine's shape
    pub fn engine_config(&self) -> Value {
        let mut config = json!({
            "document": {
                "fileType": self.file_type,
                "key": self.key,
                "title": self.title,
                "url": self.document_url,
                "permissions": self.permissions,
            },
            "documentType": self.document_type,
            "editorConfig": {
                "callbackUrl": self.callback_url,
                "mode": self.mode,
            },
        });
        if let Some(user) = &self.user {
            config["editorConfig"]["user"] = json!(user);
        }
        config
    }
}

/// Engine document family of an extension
pub fn document_type(extension: &str) -> &'static str {
    match extension {
        "xlsx" | "xls" | "ods" | "csv" | "xlsm" | "xltx" | "ots" => "cell",
        "pptx" | "ppt" | "odp" | "ppsx" | "potx" | "otp" => "slide",
        "pdf" | "djvu" | "xps" | "oxps" => "pdf",
        _ => "word",
    }
}

/// Mints tokens and assembles editor launches
pub struct SessionLauncher {
    config: Arc<ServiceConfig>,
    codec: TokenCodec,
    files: Arc<dyn FileStore>,
    users: Arc<dyn UserDirectory>,
    keys: KeyService,
    permissions: PermissionStore,
    engine: EngineClient,
}

impl SessionLauncher {
    pub fn new(
        config: Arc<ServiceConfig>,
        codec: TokenCodec,
        files: Arc<dyn FileStore>,
        users: Arc<dyn UserDirectory>,
        keys: KeyService,
        permissions: PermissionStore,
        engine: EngineClient,
    ) -> Self {
        Self {
            config,
            codec,
            files,
            users,
            keys,
            permissions,
            engine,
        }
    }

    fn callback_url(&self, path: &str, token: &str) -> String {
        format!("{}{}?doc={}", self.config.storage_url, path, token)
    }

    /// Capability URL the engine downloads the file from
    pub fn download_url(&self, claims: DownloadClaims) -> Result<String, BackendError> {
        let token = self.codec.sign(&SessionClaims::Download(claims))?;
        Ok(self.callback_url("/callback/download", &token))
    }

    /// Token for a trusted client to open or convert a file directly
    pub fn direct_token(&self, file_id: FileId, user_id: &str) -> Result<String, BackendError> {
        let claims = SessionClaims::Direct(DirectClaims {
            file_id,
            user_id: user_id.to_string(),
        });
        Ok(self.codec.sign(&claims)?)
    }

    /// Prepare a session for a user opening a file they can reach directly
    pub async fn prepare(&self, file_id: FileId, user_id: &str, can_edit: bool) -> Result<EditorLaunch, BackendError> {
        let file = self
            .files
            .file(file_id)
            .await?
            .ok_or_else(|| BackendError::not_found(format!("file {} not found", file_id)))?;
        self.launch(file, Some(user_id), None, None, EditorPermissions::full(can_edit))
            .await
    }

    /// Prepare a session for a visitor arriving through a public share
    pub async fn prepare_shared(
        &self,
        share_token: &str,
        path: Option<&str>,
        can_edit: bool,
    ) -> Result<EditorLaunch, BackendError> {
        let file = self
            .files
            .resolve_share(share_token, path)
            .await?
            .ok_or_else(|| BackendError::not_found("share not found"))?;
        let extra = self.permissions.get(share_token).await?;
        self.launch(
            file,
            None,
            Some(share_token),
            path,
            EditorPermissions::for_share(can_edit, extra),
        )
        .await
    }

    async fn launch(
        &self,
        file: FileInfo,
        user_id: Option<&str>,
        share_token: Option<&str>,
        path: Option<&str>,
        permissions: EditorPermissions,
    ) -> Result<EditorLaunch, BackendError> {
        let key = self.keys.key_for(&file).await?;
        let extension = file.extension();

        let document_url = if file.size == 0 {
            let claims = SessionClaims::Empty(EmptyClaims {
                file_id: file.id,
                user_id: user_id.map(str::to_string),
            });
            self.callback_url("/callback/emptyfile", &self.codec.sign(&claims)?)
        } else {
            self.download_url(DownloadClaims {
                user_id: user_id.map(str::to_string),
                share_token: share_token.map(str::to_string),
                file_path: path.map(str::to_string),
                ..DownloadClaims::new(file.id)
            })?
        };

        let track = SessionClaims::Track(TrackClaims {
            file_id: file.id,
            user_id: user_id.map(str::to_string),
            share_token: share_token.map(str::to_string),
            file_path: path.map(str::to_string),
        });
        let track_token = self.codec.sign_with_ttl(&track, self.config.track_token_ttl)?;

        let user = match user_id {
            Some(id) => Some(EditorUser {
                id: format!("{}_{}", self.config.instance_id, id),
                name: self.users.display_name(id).await.unwrap_or_else(|| id.to_string()),
            }),
            None => None,
        };

        let mut launch = EditorLaunch {
            key,
            document_type: document_type(&extension),
            file_type: extension,
            title: file.name.clone(),
            document_url,
            callback_url: self.callback_url("/callback/track", &track_token),
            mode: if permissions.is_editing() { "edit" } else { "view" },
            permissions,
            user,
            engine_url: self.engine.settings().public_url.clone(),
            token: None,
        };

        if let Some(codec) = self.engine.codec() {
            launch.token = Some(codec.sign(&launch.engine_config())?);
        }

        tracing::debug!("[Launch] Prepared {} session for file {}", launch.mode, file.id);
        Ok(launch)
    }
}
