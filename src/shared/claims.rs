//! Session token claim sets
//!
//! Every URL handed to the Docs engine embeds a signed token instead of raw
//! identifiers. The payload is a tagged variant keyed by `action`, so a
//! download token can never be replayed against the track endpoint and an
//! unknown action fails to decode at all.

use serde::{Deserialize, Serialize};

/// Endpoint a session token is minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenAction {
    Download,
    Empty,
    Track,
    Direct,
}

impl std::fmt::Display for TokenAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Download => "download",
            Self::Empty => "empty",
            Self::Track => "track",
            Self::Direct => "direct",
        };
        f.write_str(name)
    }
}

/// Claims of a token that lets the engine fetch file content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadClaims {
    pub file_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Preserved version to serve instead of the current content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Serve the stored changes archive of `version`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub changes: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub template: bool,
}

impl DownloadClaims {
    pub fn new(file_id: i64) -> Self {
        Self {
            file_id,
            user_id: None,
            share_token: None,
            file_path: None,
            version: None,
            changes: false,
            template: false,
        }
    }
}

/// Claims of a token that serves a blank document of the file's type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyClaims {
    pub file_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Claims of the token embedded in the engine's callback URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackClaims {
    pub file_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// Claims of a direct-editing token issued to a trusted client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectClaims {
    pub file_id: i64,
    pub user_id: String,
}

/// Decoded session token payload, discriminated by `action`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SessionClaims {
    Download(DownloadClaims),
    Empty(EmptyClaims),
    Track(TrackClaims),
    Direct(DirectClaims),
}

impl SessionClaims {
    pub fn action(&self) -> TokenAction {
        match self {
            Self::Download(_) => TokenAction::Download,
            Self::Empty(_) => TokenAction::Empty,
            Self::Track(_) => TokenAction::Track,
            Self::Direct(_) => TokenAction::Direct,
        }
    }

    pub fn file_id(&self) -> i64 {
        match self {
            Self::Download(claims) => claims.file_id,
            Self::Empty(claims) => claims.file_id,
            Self::Track(claims) => claims.file_id,
            Self::Direct(claims) => claims.file_id,
        }
    }
}
