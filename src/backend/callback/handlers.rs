/**
 * Callback Handlers
 *
 * The endpoints the Docs engine calls back into:
 *
 * - `GET /callback/download?doc=` - file content (`download` token)
 * - `GET /callback/emptyfile?doc=` - blank document (`empty` token)
 * - `POST /callback/track?doc=` - status report (`track` token)
 *
 * The `doc` token is the capability: it names the file and what may be
 * done with it. When an engine secret is configured the engine must also
 * prove itself with its own signed token.
 */

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::types::{SignedReport, TrackBody, TrackOutcome, TrackRequest};
use crate::backend::error::BackendError;
use crate::backend::host::FileInfo;
use crate::backend::middleware::{engine_header_claims, EngineAuthorized};
use crate::backend::server::state::AppState;
use crate::shared::{SessionClaims, TokenAction};

/// `doc` query parameter carrying the session token
#[derive(Debug, Default, Deserialize)]
pub struct DocQuery {
    #[serde(default)]
    pub doc: Option<String>,
}

fn require_doc(query: &DocQuery) -> Result<&str, BackendError> {
    query
        .doc
        .as_deref()
        .filter(|doc| !doc.is_empty())
        .ok_or_else(|| BackendError::handler(StatusCode::BAD_REQUEST, "doc parameter missing"))
}

fn attachment(name: &str, content: impl Into<Body>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", name.replace('"', ""));
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content.into(),
    )
        .into_response()
}

async fn resolve_file(
    state: &AppState,
    file_id: i64,
    share_token: Option<&str>,
    file_path: Option<&str>,
) -> Result<FileInfo, BackendError> {
    let file = match share_token {
        Some(share_token) => state.files.resolve_share(share_token, file_path).await?,
        None => state.files.file(file_id).await?,
    };
    file.ok_or_else(|| BackendError::not_found(format!("file {} not found", file_id)))
}

/// Serve file content to the engine
///
/// Depending on the token this is the current content, a preserved version,
/// the changes archive recorded for a version, or a template from the host's
/// catalog (`template` tokens name a template id instead of a file).
pub async fn handle_download(
    State(state): State<AppState>,
    Query(query): Query<DocQuery>,
    _engine: EngineAuthorized,
) -> Result<Response, BackendError> {
    let claims = match state.host_codec.verify_session(require_doc(&query)?, TokenAction::Download)? {
        SessionClaims::Download(claims) => claims,
        other => {
            return Err(BackendError::handler(
                StatusCode::FORBIDDEN,
                format!("unexpected {} token", other.action()),
            ))
        }
    };

    if claims.template {
        if claims.version.is_some() || claims.changes {
            return Err(BackendError::handler(
                StatusCode::BAD_REQUEST,
                "template tokens carry no version",
            ));
        }
        let template = state
            .files
            .template(claims.file_id)
            .await?
            .ok_or_else(|| BackendError::not_found(format!("template {} not found", claims.file_id)))?;
        tracing::debug!("[Download] Template {}", template.id);
        return Ok(attachment(&template.name, template.content));
    }

    let file = resolve_file(
        &state,
        claims.file_id,
        claims.share_token.as_deref(),
        claims.file_path.as_deref(),
    )
    .await?;

    match (&claims.version, claims.changes) {
        (Some(version), true) => {
            let changes = state
                .ledger
                .get_changes(&file.owner_id, file.id, version)
                .await?
                .ok_or_else(|| BackendError::not_found(format!("no changes stored for version {}", version)))?;
            tracing::debug!("[Download] Changes of version {} of file {}", version, file.id);
            Ok(attachment("changes.zip", changes))
        }
        (Some(version), false) => {
            let content = state.files.read_version(file.id, version).await?;
            tracing::debug!("[Download] Version {} of file {}", version, file.id);
            Ok(attachment(&file.name, content))
        }
        (None, true) => Err(BackendError::handler(
            StatusCode::BAD_REQUEST,
            "changes requested without a version",
        )),
        (None, false) => {
            let content = state.files.read(file.id).await?;
            tracing::debug!("[Download] File {}", file.id);
            Ok(attachment(&file.name, content))
        }
    }
}

/// Serve a blank document of the file's type
pub async fn handle_empty_file(
    State(state): State<AppState>,
    Query(query): Query<DocQuery>,
    _engine: EngineAuthorized,
) -> Result<Response, BackendError> {
    let claims = match state.host_codec.verify_session(require_doc(&query)?, TokenAction::Empty)? {
        SessionClaims::Empty(claims) => claims,
        other => {
            return Err(BackendError::handler(
                StatusCode::FORBIDDEN,
                format!("unexpected {} token", other.action()),
            ))
        }
    };

    let file = resolve_file(&state, claims.file_id, None, None).await?;
    let content = state.files.blank_document(&file.extension()).await?;
    Ok(attachment(&file.name, content))
}

/// Apply a status report from the engine
///
/// Answers with the engine's `{"error": 0|1}` contract.
pub async fn handle_track(
    State(state): State<AppState>,
    Query(query): Query<DocQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> TrackOutcome {
    let body: TrackBody = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("[Track] Unreadable report: {}", e);
            return TrackOutcome::rejected(StatusCode::BAD_REQUEST);
        }
    };

    let Some(doc) = query.doc.clone().or_else(|| body.doc.clone()).filter(|doc| !doc.is_empty()) else {
        tracing::warn!("[Track] Report without doc token");
        return TrackOutcome::rejected(StatusCode::BAD_REQUEST);
    };

    let claims = match state.host_codec.verify_session(&doc, TokenAction::Track) {
        Ok(SessionClaims::Track(claims)) => claims,
        Ok(_) => return TrackOutcome::rejected(StatusCode::FORBIDDEN),
        Err(e) => {
            tracing::warn!("[Track] Rejected doc token: {}", e);
            return TrackOutcome::rejected(StatusCode::FORBIDDEN);
        }
    };

    let signed = match signed_report(&state, &headers, &body) {
        Ok(signed) => signed,
        Err(outcome) => return outcome,
    };

    let request = match TrackRequest::from_body(body, signed) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("[Track] Invalid report for file {}: {}", claims.file_id, e);
            return TrackOutcome::rejected(StatusCode::BAD_REQUEST);
        }
    };

    state.coordinator.track(&claims, request).await
}

/// Engine-signed report, required when an engine secret is configured
///
/// The token embedded in the body wins over the header.
fn signed_report(state: &AppState, headers: &HeaderMap, body: &TrackBody) -> Result<Option<SignedReport>, TrackOutcome> {
    let Some(codec) = state.engine.codec() else {
        return Ok(None);
    };

    let claims = match body.token.as_deref().filter(|token| !token.is_empty()) {
        Some(token) => codec.verify::<serde_json::Value>(token).map(Some),
        None => engine_header_claims(headers, &state.engine),
    };

    match claims {
        Ok(Some(claims)) => SignedReport::from_claims(claims).map(Some).map_err(|e| {
            tracing::warn!("[Track] Unreadable engine token payload: {}", e);
            TrackOutcome::rejected(StatusCode::FORBIDDEN)
        }),
        Ok(None) => {
            tracing::warn!("[Track] Engine token missing");
            Err(TrackOutcome::rejected(StatusCode::UNAUTHORIZED))
        }
        Err(e) => {
            tracing::warn!("[Track] Rejected engine token: {}", e);
            Err(TrackOutcome::rejected(StatusCode::FORBIDDEN))
        }
    }
}
