/**
 * Callback Route Handlers
 *
 * Routes the Docs engine calls while a document is open.
 *
 * # Routes
 *
 * - `GET /callback/download` - file content
 * - `GET /callback/emptyfile` - blank document
 * - `POST /callback/track` - status reports
 *
 * Every route is authorized by the `doc` session token in the query; see
 * `backend::callback::handlers`.
 */

use axum::{routing::get, routing::post, Router};

use crate::backend::callback::handlers::{handle_download, handle_empty_file, handle_track};
use crate::backend::server::state::AppState;

/// Configure the engine callback routes
pub fn configure_callback_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/callback/download", get(handle_download))
        .route("/callback/emptyfile", get(handle_empty_file))
        .route("/callback/track", post(handle_track))
}
