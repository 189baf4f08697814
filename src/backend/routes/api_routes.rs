/**
 * API Route Handlers
 *
 * # Routes
 *
 * ## Federation
 * - `POST /api/v1/key` - editing key of a shared file
 * - `POST /api/v1/keylock` - lock a shared file
 * - `GET /api/v1/healthcheck` - liveness probe
 *
 * ## Direct sessions
 * - `GET /api/v1/direct` - editor launch (requires a `direct` token)
 * - `POST /api/v1/convert` - convert a file (requires a `direct` token)
 * - `GET /api/v1/history` - version history (requires a `direct` token)
 */

use axum::{routing::get, routing::post, Router};

use crate::backend::remote::handlers::{handle_healthcheck, handle_key, handle_keylock};
use crate::backend::server::state::AppState;
use crate::backend::session::handlers::{handle_convert, handle_direct};
use crate::backend::versions::handlers::handle_history;

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Federation endpoints
        .route("/api/v1/key", post(handle_key))
        .route("/api/v1/keylock", post(handle_keylock))
        .route("/api/v1/healthcheck", get(handle_healthcheck))
        // Direct-token endpoints
        .route("/api/v1/direct", get(handle_direct))
        .route("/api/v1/convert", post(handle_convert))
        .route("/api/v1/history", get(handle_history))
}
