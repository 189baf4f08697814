//! Session and engine token helpers

use std::time::Duration;

use docbridge::backend::tokens::TokenCodec;
use docbridge::shared::{DirectClaims, DownloadClaims, EmptyClaims, SessionClaims, TrackClaims};
use serde_json::{json, Value};

pub const HOST_SECRET: &str = "host-test-secret";
pub const ENGINE_SECRET: &str = "engine-test-secret";

pub fn host_codec() -> TokenCodec {
    TokenCodec::new(HOST_SECRET, Duration::from_secs(300))
}

pub fn engine_codec() -> TokenCodec {
    TokenCodec::new(ENGINE_SECRET, Duration::from_secs(300))
}

pub fn track_token(file_id: i64, user_id: Option<&str>) -> String {
    let claims = SessionClaims::Track(TrackClaims {
        file_id,
        user_id: user_id.map(str::to_string),
        share_token: None,
        file_path: None,
    });
    host_codec().sign(&claims).expect("sign track token")
}

pub fn download_token(claims: DownloadClaims) -> String {
    host_codec()
        .sign(&SessionClaims::Download(claims))
        .expect("sign download token")
}

pub fn empty_token(file_id: i64) -> String {
    host_codec()
        .sign(&SessionClaims::Empty(EmptyClaims { file_id, user_id: None }))
        .expect("sign empty token")
}

pub fn direct_token(file_id: i64, user_id: &str) -> String {
    host_codec()
        .sign(&SessionClaims::Direct(DirectClaims {
            file_id,
            user_id: user_id.to_string(),
        }))
        .expect("sign direct token")
}

/// Header value the engine sends with its signed requests
pub fn engine_bearer(payload: Value) -> String {
    let token = engine_codec()
        .sign(&json!({ "payload": payload }))
        .expect("sign engine token");
    format!("Bearer {}", token)
}

/// `doc` parameter of a callback URL
pub fn doc_param(url: &str) -> String {
    url.split("doc=").nth(1).unwrap_or_default().to_string()
}
