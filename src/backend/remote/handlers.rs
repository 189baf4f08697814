/**
 * Federation Endpoints
 *
 * The serving side of the federation API that `RemoteSessionProxy` calls on
 * other instances. A share token (plus the path inside the share) names the
 * file; holding it is what authorizes the call.
 *
 * - `POST /api/v1/key` `{shareToken, path}` -> `{key}`
 * - `POST /api/v1/keylock` `{shareToken, path, lock, fs?}` -> `{}`
 * - `GET /api/v1/healthcheck` -> `{alive: true}`
 */

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::error::BackendError;
use crate::backend::host::FileInfo;
use crate::backend::server::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRequest {
    pub share_token: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyLockRequest {
    pub share_token: String,
    #[serde(default)]
    pub path: Option<String>,
    pub lock: bool,
    /// Forcesave mark to store alongside the lock
    #[serde(default)]
    pub fs: Option<bool>,
}

async fn shared_file(state: &AppState, share_token: &str, path: Option<&str>) -> Result<FileInfo, BackendError> {
    if share_token.is_empty() {
        return Err(BackendError::handler(StatusCode::BAD_REQUEST, "shareToken missing"));
    }
    let path = path.filter(|path| !path.is_empty());
    state
        .files
        .resolve_share(share_token, path)
        .await?
        .ok_or_else(|| BackendError::not_found("share not found"))
}

/// Editing key of a shared file, minted on first request
pub async fn handle_key(State(state): State<AppState>, Json(request): Json<KeyRequest>) -> Result<Json<Value>, BackendError> {
    let file = shared_file(&state, &request.share_token, request.path.as_deref()).await?;
    let key = state.keys.key_for(&file).await?;
    tracing::debug!("[Remote] Served key of file {} to a federated instance", file.id);
    Ok(Json(json!({ "key": key })))
}

/// Lock or unlock a shared file on behalf of a federated instance
pub async fn handle_keylock(
    State(state): State<AppState>,
    Json(request): Json<KeyLockRequest>,
) -> Result<Json<Value>, BackendError> {
    let file = shared_file(&state, &request.share_token, request.path.as_deref()).await?;
    let confirmed = state
        .keys
        .provider(&file)
        .set_lock(&file, request.lock, request.fs)
        .await?;
    if !confirmed {
        return Err(BackendError::handler(
            StatusCode::CONFLICT,
            format!("lock change not confirmed for file {}", file.id),
        ));
    }
    tracing::debug!(
        "[Remote] Federated lock={} fs={:?} on file {}",
        request.lock,
        request.fs,
        file.id
    );
    Ok(Json(json!({})))
}

/// Liveness probe for federated instances
pub async fn handle_healthcheck() -> Json<Value> {
    Json(json!({ "alive": true }))
}
