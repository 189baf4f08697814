/**
 * Remote Session Proxy
 *
 * Files mounted from a federated instance keep their editing key and lock on
 * the instance that stores them. This proxy forwards those operations to
 * the remote's federation API:
 *
 * - `POST {origin}/api/v1/key` `{shareToken, path}` -> `{key}`
 * - `POST {origin}/api/v1/keylock` `{shareToken, path, lock, fs?}` -> `{}`
 * - `GET {origin}/api/v1/healthcheck` -> `{alive}`
 *
 * The share token is the capability that authorizes the call on the remote.
 *
 * # Failure Policy
 *
 * Nothing here returns an error to the caller. A failed key lookup yields
 * `None` (the caller mints a local key instead) and a failed lock call
 * yields `false`. A 404 from the remote means the integration is not
 * installed there, so the remote is marked unavailable in the health cache.
 */

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use super::health::HealthCache;
use crate::backend::host::{FileInfo, StorageLocation};
use crate::shared::RemoteSettings;

const KEY_PATH: &str = "/api/v1/key";
const KEYLOCK_PATH: &str = "/api/v1/keylock";
const HEALTHCHECK_PATH: &str = "/api/v1/healthcheck";

/// Failures of federated calls
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote {0} is unavailable")]
    Unavailable(String),
    /// The remote answered with an error
    #[error("remote rejected the request: {0}")]
    Rejected(String),
    /// The remote does not serve the federation API
    #[error("federation API missing on {0}")]
    AppMissing(String),
}

/// Forwards key and lock operations to federated instances
#[derive(Clone, Debug)]
pub struct RemoteSessionProxy {
    http: Client,
    settings: RemoteSettings,
    health: HealthCache,
}

impl RemoteSessionProxy {
    pub fn new(settings: RemoteSettings, health: HealthCache) -> Self {
        Self {
            http: Client::new(),
            settings,
            health,
        }
    }

    /// Whether the file's storage is a federated mount
    pub fn is_remote(file: &FileInfo) -> bool {
        file.is_remote()
    }

    /// Whether the remote instance serves the federation API
    ///
    /// Uses the health cache; a failed probe is cached as not alive.
    pub async fn health_check(&self, origin: &str) -> bool {
        match self.health.get(origin).await {
            Ok(Some(alive)) => return alive,
            Ok(None) => {}
            Err(e) => tracing::warn!("[Remote] Health cache read failed for {}: {}", origin, e),
        }

        let alive = match self.probe(origin).await {
            Ok(alive) => alive,
            Err(e) => {
                tracing::warn!("[Remote] Health check of {} failed: {}", origin, e);
                false
            }
        };
        self.record_health(origin, alive).await;
        alive
    }

    async fn probe(&self, origin: &str) -> Result<bool, RemoteError> {
        let response = self
            .http
            .get(format!("{}{}", origin, HEALTHCHECK_PATH))
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Ok(false);
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Rejected(e.to_string()))?;
        Ok(body.get("alive").and_then(Value::as_bool).unwrap_or(false))
    }

    async fn record_health(&self, origin: &str, alive: bool) {
        if let Err(e) = self.health.set(origin, alive).await {
            tracing::warn!("[Remote] Failed to cache health of {}: {}", origin, e);
        }
    }

    async fn post(&self, origin: &str, path: &str, body: Value) -> Result<Value, RemoteError> {
        if !self.health_check(origin).await {
            return Err(RemoteError::Unavailable(origin.to_string()));
        }

        let response = self
            .http
            .post(format!("{}{}", origin, path))
            .timeout(self.settings.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            self.record_health(origin, false).await;
            return Err(RemoteError::AppMissing(origin.to_string()));
        }
        if !response.status().is_success() {
            return Err(RemoteError::Rejected(format!("HTTP {}", response.status())));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Rejected(e.to_string()))?;
        if let Some(error) = value.get("error").filter(|error| !error.is_null()) {
            return Err(RemoteError::Rejected(error.to_string()));
        }
        Ok(value)
    }

    /// Editing key the remote instance holds for the file
    pub async fn get_remote_key(&self, file: &FileInfo) -> Option<String> {
        let StorageLocation::Remote {
            origin,
            share_token,
            path,
        } = &file.location
        else {
            return None;
        };

        let body = json!({ "shareToken": share_token, "path": path });
        match self.post(origin, KEY_PATH, body).await {
            Ok(value) => {
                let key = value
                    .get("key")
                    .and_then(Value::as_str)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string);
                if key.is_none() {
                    tracing::warn!("[Remote] {} returned no key for file {}", origin, file.id);
                }
                key
            }
            Err(e) => {
                tracing::warn!("[Remote] Key request for file {} failed: {}", file.id, e);
                None
            }
        }
    }

    /// Set the lock (and optionally the forcesave mark) on the remote
    ///
    /// Returns whether the remote confirmed the change.
    pub async fn lock_remote_key(&self, file: &FileInfo, lock: bool, forcesave: Option<bool>) -> bool {
        let StorageLocation::Remote {
            origin,
            share_token,
            path,
        } = &file.location
        else {
            return false;
        };

        let mut body = json!({ "shareToken": share_token, "path": path, "lock": lock });
        if let Some(forcesave) = forcesave {
            body["fs"] = json!(forcesave);
        }

        match self.post(origin, KEYLOCK_PATH, body).await {
            Ok(_) => {
                tracing::debug!("[Remote] Set lock={} on {} for file {}", lock, origin, file.id);
                true
            }
            Err(e) => {
                tracing::warn!("[Remote] Lock request for file {} failed: {}", file.id, e);
                false
            }
        }
    }
}
