/**
 * Version History Endpoint
 *
 * - `GET /api/v1/history?doc=` - history of the `direct` token's file
 */

use axum::{
    extract::{Query, State},
    Json,
};

use super::history::FileHistory;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::backend::session::handlers::{direct_claims, DirectQuery};

/// List the versions of the token's file
pub async fn handle_history(
    State(state): State<AppState>,
    Query(query): Query<DirectQuery>,
) -> Result<Json<FileHistory>, BackendError> {
    let claims = direct_claims(&state, query.doc.as_deref())?;
    let history = state.versions.history(claims.file_id, &claims.user_id).await?;
    Ok(Json(history))
}
