/**
 * Server Initialization
 *
 * This module wires the application state and the router together.
 *
 * # Initialization Process
 *
 * 1. Build the token codecs, the engine client and the SQLite stores
 * 2. Build the callback coordinator, launcher and conversion service
 * 3. Register the key/ledger hooks as the host's file event listener
 * 4. Create the router
 *
 * A bad engine URL or secret is a configuration error and stops startup.
 */

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::backend::error::BackendError;
use crate::backend::host::MemoryHost;
use crate::backend::routes::router::create_router;
use crate::backend::server::state::{AppState, HostServices};
use crate::shared::ServiceConfig;

/// Create and configure the Axum application on top of an in-process host
///
/// # Errors
///
/// Fails when the engine client cannot be built from the configuration.
pub fn create_app(config: ServiceConfig, pool: SqlitePool, host: MemoryHost) -> Result<Router<()>, BackendError> {
    tracing::info!("Initializing docbridge (instance {})", config.instance_id);

    let state = AppState::new(config, pool, HostServices::from_memory(&host))?;
    host.set_listener(Arc::new(state.hooks()));

    Ok(create_app_with_state(state))
}

/// Create the router for an already wired state
///
/// The caller is responsible for registering `state.hooks()` with its host.
pub fn create_app_with_state(state: AppState) -> Router<()> {
    tracing::info!(
        "Engine at {} (signed: {}), version history {}",
        state.engine.settings().request_url(),
        state.engine.codec().is_some(),
        if state.config.version_history { "on" } else { "off" }
    );
    create_router(state)
}
