/**
 * Track Callback Types
 *
 * The status report the Docs engine posts to the track endpoint, the part
 * of it an engine-signed token may override, and the answer sent back.
 *
 * # Engine Contract
 *
 * The engine expects `{"error": 0}` for an accepted report and
 * `{"error": 1}` for one the host could not apply. Anything but a 200
 * makes the engine retry, so non-200 answers are reserved for requests
 * that can never succeed (bad tokens, a save without a result URL).
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::shared::{ForcesaveType, SharedError, TrackStatus};

/// One entry of the engine's `actions` list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackAction {
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub userid: String,
}

/// Raw body of a track callback
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackBody {
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub changesurl: Option<String>,
    #[serde(default)]
    pub filetype: Option<String>,
    #[serde(default)]
    pub forcesavetype: Option<i64>,
    #[serde(default)]
    pub users: Option<Vec<String>>,
    #[serde(default)]
    pub actions: Option<Vec<TrackAction>>,
    #[serde(default)]
    pub history: Option<Value>,
    /// Engine-signed copy of the report
    #[serde(default)]
    pub token: Option<String>,
}

/// Fields taken from the engine-signed token instead of the raw body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignedReport {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub users: Option<Vec<String>>,
}

impl SignedReport {
    /// Decode a verified engine token payload
    ///
    /// Tokens sent in the header wrap the report in `payload`.
    pub fn from_claims(claims: Value) -> Result<Self, SharedError> {
        let report = match claims {
            Value::Object(mut map) if map.contains_key("payload") => map.remove("payload").unwrap_or(Value::Null),
            other => other,
        };
        Ok(serde_json::from_value(report)?)
    }
}

/// A validated track report
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRequest {
    pub key: Option<String>,
    pub status: TrackStatus,
    pub url: Option<String>,
    pub changes_url: Option<String>,
    /// Extension of the engine's result file
    pub filetype: Option<String>,
    pub forcesave_type: Option<ForcesaveType>,
    pub users: Vec<String>,
    pub actions: Vec<TrackAction>,
    pub history: Option<Value>,
}

impl TrackRequest {
    /// Build the request from the raw body, letting `signed` override the
    /// fields the engine signs
    pub fn from_body(body: TrackBody, signed: Option<SignedReport>) -> Result<Self, SharedError> {
        let (key, status, url, users) = match signed {
            Some(report) => (report.key, report.status, report.url, report.users),
            None => (body.key, body.status, body.url, body.users),
        };

        let status = status.ok_or_else(|| SharedError::validation("status", "missing"))?;
        Ok(Self {
            key,
            status: TrackStatus::try_from(status)?,
            url: url.filter(|url| !url.is_empty()),
            changes_url: body.changesurl.filter(|url| !url.is_empty()),
            filetype: body.filetype.filter(|ext| !ext.is_empty()),
            forcesave_type: body.forcesavetype.and_then(ForcesaveType::from_code),
            users: users.unwrap_or_default(),
            actions: body.actions.unwrap_or_default(),
            history: body.history.filter(|history| !history.is_null()),
        })
    }

    /// Engine user id of the person the save is attributed to
    ///
    /// The last user in the list, or for a save-button forcesave the user
    /// of the first recorded action.
    pub fn writer(&self) -> Option<&str> {
        if self.forcesave_type == Some(ForcesaveType::Button) {
            if let Some(action) = self.actions.first().filter(|action| !action.userid.is_empty()) {
                return Some(&action.userid);
            }
        }
        self.users.last().map(String::as_str).filter(|user| !user.is_empty())
    }
}

/// Answer to a track callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackOutcome {
    pub status: StatusCode,
    pub error: u8,
}

impl TrackOutcome {
    pub fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            error: 0,
        }
    }

    /// Report accepted but not applied
    pub fn failed() -> Self {
        Self {
            status: StatusCode::OK,
            error: 1,
        }
    }

    pub fn rejected(status: StatusCode) -> Self {
        Self { status, error: 1 }
    }

    pub fn is_ok(&self) -> bool {
        self.error == 0
    }
}

impl IntoResponse for TrackOutcome {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.error }))).into_response()
    }
}
