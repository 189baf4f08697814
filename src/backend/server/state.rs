/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct is the central container for the application,
 * holding:
 * - The service configuration
 * - The host's session token codec and the Docs engine client
 * - The SQLite-backed stores (key/lock registry, version ledger, share
 *   permissions, remote health cache)
 * - The host collaborators (storage, users, advisory locks)
 * - The services built from them (callback coordinator, session launcher,
 *   conversions, version history)
 *
 * # Thread Safety
 *
 * Everything is cheap to clone: stores wrap a `SqlitePool`, collaborators
 * and services sit behind `Arc`.
 *
 * # Example
 *
 * ```rust,no_run
 * use docbridge::backend::server::state::AppState;
 * use axum::extract::State;
 *
 * async fn handler(State(state): State<AppState>) {
 *     let history = state.config.version_history;
 *     // ...
 * }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::backend::callback::{CallbackCoordinator, RetryPolicy};
use crate::backend::engine::EngineClient;
use crate::backend::error::BackendError;
use crate::backend::hooks::HostHooks;
use crate::backend::host::{AdvisoryLocks, FileStore, MemoryHost, UserDirectory};
use crate::backend::keylock::KeyLockRegistry;
use crate::backend::permissions::PermissionStore;
use crate::backend::remote::{HealthCache, RemoteSessionProxy};
use crate::backend::session::{ConversionService, KeyService, SessionLauncher};
use crate::backend::tokens::TokenCodec;
use crate::backend::versions::{VersionLedger, VersionService};
use crate::shared::ServiceConfig;

/// Host collaborators injected at startup
#[derive(Clone)]
pub struct HostServices {
    pub files: Arc<dyn FileStore>,
    pub users: Arc<dyn UserDirectory>,
    /// Advisory locking, when the host supports it
    pub advisory: Option<Arc<dyn AdvisoryLocks>>,
}

impl HostServices {
    /// Use an in-process host for every collaborator
    pub fn from_memory(host: &MemoryHost) -> Self {
        Self {
            files: Arc::new(host.clone()),
            users: Arc::new(host.clone()),
            advisory: Some(Arc::new(host.clone())),
        }
    }
}

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,

    /// Signs and verifies the `doc` session tokens
    pub host_codec: TokenCodec,

    /// Docs engine client; carries the engine token codec when a secret is set
    pub engine: EngineClient,

    pub registry: KeyLockRegistry,
    pub ledger: VersionLedger,
    pub keys: KeyService,
    pub proxy: RemoteSessionProxy,
    pub permissions: PermissionStore,

    pub files: Arc<dyn FileStore>,
    pub users: Arc<dyn UserDirectory>,

    pub coordinator: Arc<CallbackCoordinator>,
    pub launcher: Arc<SessionLauncher>,
    pub conversions: Arc<ConversionService>,
    pub versions: Arc<VersionService>,
}

impl AppState {
    /// Wire every store and service on top of `pool` and the host
    pub fn new(config: ServiceConfig, pool: SqlitePool, host: HostServices) -> Result<Self, BackendError> {
        Self::with_retry_policy(config, pool, host, RetryPolicy::default())
    }

    /// Like `new`, with a custom retry policy for content writes
    pub fn with_retry_policy(
        config: ServiceConfig,
        pool: SqlitePool,
        host: HostServices,
        retry: RetryPolicy,
    ) -> Result<Self, BackendError> {
        let config = Arc::new(config);
        let host_codec = TokenCodec::new(&config.host_secret, config.token_leeway);
        let engine = EngineClient::new(config.engine.clone(), config.token_leeway)?;

        let registry = KeyLockRegistry::new(pool.clone(), config.instance_id.clone());
        let ledger = VersionLedger::new(pool.clone());
        let permissions = PermissionStore::new(pool.clone());
        let health = HealthCache::new(pool, config.remote.health_ttl);
        let proxy = RemoteSessionProxy::new(config.remote.clone(), health);
        let keys = KeyService::new(registry.clone(), proxy.clone());

        let coordinator = CallbackCoordinator::new(
            config.clone(),
            host.files.clone(),
            host.users.clone(),
            host.advisory.clone(),
            engine.clone(),
            keys.clone(),
            ledger.clone(),
        )
        .with_retry_policy(retry);

        let launcher = Arc::new(SessionLauncher::new(
            config.clone(),
            host_codec.clone(),
            host.files.clone(),
            host.users.clone(),
            keys.clone(),
            permissions.clone(),
            engine.clone(),
        ));
        let conversions = ConversionService::new(host.files.clone(), engine.clone(), launcher.clone());
        let versions = VersionService::new(host.files.clone(), ledger.clone(), keys.clone(), launcher.clone());

        Ok(Self {
            config,
            host_codec,
            engine,
            registry,
            ledger,
            keys,
            proxy,
            permissions,
            files: host.files,
            users: host.users,
            coordinator: Arc::new(coordinator),
            launcher,
            conversions: Arc::new(conversions),
            versions: Arc::new(versions),
        })
    }

    /// Event listener to register with the host
    pub fn hooks(&self) -> HostHooks {
        HostHooks::new(self.registry.clone(), self.ledger.clone())
    }
}

impl FromRef<AppState> for Arc<ServiceConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for EngineClient {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.engine.clone()
    }
}

impl FromRef<AppState> for KeyLockRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for VersionLedger {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ledger.clone()
    }
}
