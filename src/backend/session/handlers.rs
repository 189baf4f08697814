/**
 * Direct Session Endpoints
 *
 * Endpoints for trusted clients holding a `direct` token:
 *
 * - `GET /api/v1/direct?doc=` - editor launch for the token's file and user
 * - `POST /api/v1/convert?doc=` `{to}` - converted file bytes
 */

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::launcher::EditorLaunch;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::{DirectClaims, SessionClaims, TokenAction};

#[derive(Debug, Deserialize)]
pub struct DirectQuery {
    #[serde(default)]
    pub doc: Option<String>,
    /// Open read-only
    #[serde(default)]
    pub view: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConvertBody {
    pub to: String,
}

pub(crate) fn direct_claims(state: &AppState, doc: Option<&str>) -> Result<DirectClaims, BackendError> {
    let doc = doc
        .filter(|doc| !doc.is_empty())
        .ok_or_else(|| BackendError::handler(StatusCode::BAD_REQUEST, "doc parameter missing"))?;
    match state.host_codec.verify_session(doc, TokenAction::Direct)? {
        SessionClaims::Direct(claims) => Ok(claims),
        other => Err(BackendError::handler(
            StatusCode::FORBIDDEN,
            format!("unexpected {} token", other.action()),
        )),
    }
}

/// Prepare an editing session for the token's user
pub async fn handle_direct(
    State(state): State<AppState>,
    Query(query): Query<DirectQuery>,
) -> Result<Json<EditorLaunch>, BackendError> {
    let claims = direct_claims(&state, query.doc.as_deref())?;
    let launch = state
        .launcher
        .prepare(claims.file_id, &claims.user_id, !query.view)
        .await?;
    Ok(Json(launch))
}

/// Convert the token's file to another format
pub async fn handle_convert(
    State(state): State<AppState>,
    Query(query): Query<DirectQuery>,
    Json(body): Json<ConvertBody>,
) -> Result<Response, BackendError> {
    let claims = direct_claims(&state, query.doc.as_deref())?;
    let converted = state
        .conversions
        .convert(claims.file_id, &claims.user_id, &body.to)
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", converted.name.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        converted.content,
    )
        .into_response())
}
