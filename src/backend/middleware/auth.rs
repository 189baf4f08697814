/**
 * Engine Authentication
 *
 * When an engine secret is configured, requests coming from the Docs
 * engine carry a bearer token signed with it in the configured header.
 * The download endpoints require it; the track endpoint accepts it as an
 * alternative to the token embedded in the body.
 */

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};
use serde_json::Value;

use crate::backend::engine::EngineClient;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::backend::tokens::{extract_bearer_token, TokenError};

/// Verified claims of the engine token in the configured header
///
/// `Ok(None)` when signing is disabled or no bearer token is present.
pub fn engine_header_claims(headers: &HeaderMap, engine: &EngineClient) -> Result<Option<Value>, TokenError> {
    let Some(codec) = engine.codec() else {
        return Ok(None);
    };
    let Some(token) = headers
        .get(engine.settings().jwt_header.as_str())
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
    else {
        return Ok(None);
    };

    codec.verify::<Value>(token).map(Some).map_err(|e| {
        tracing::warn!("Invalid engine token: {}", e);
        e
    })
}

/// Axum extractor for requests that must come from the engine
///
/// Holds the verified claims, or `None` when signing is disabled.
#[derive(Clone, Debug)]
pub struct EngineAuthorized(pub Option<Value>);

impl FromRequestParts<AppState> for EngineAuthorized {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if state.engine.codec().is_none() {
            return Ok(Self(None));
        }

        match engine_header_claims(&parts.headers, &state.engine)? {
            Some(claims) => Ok(Self(Some(claims))),
            None => {
                tracing::warn!("Missing engine token on {}", parts.uri.path());
                Err(BackendError::handler(StatusCode::UNAUTHORIZED, "engine token missing"))
            }
        }
    }
}
