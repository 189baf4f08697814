/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Callback routes (engine-facing)
 * 2. API routes (federation, direct sessions)
 * 3. Fallback handler (404)
 *
 * A `TraceLayer` wraps everything so each request gets a span.
 */

use axum::{http::StatusCode, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::callback_routes::configure_callback_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = configure_callback_routes(Router::new());
    let router = configure_api_routes(router);

    router
        .fallback(|| async { (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found", "status": 404 }))) })
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
