/**
 * Docs Engine HTTP Client
 *
 * Wraps the three engine services this host calls (converter, health
 * check, command service) plus raw downloads of engine-produced files.
 *
 * # Signed Requests
 *
 * When an engine secret is configured, every JSON request is wrapped in the
 * engine's envelope: the body gains a `token` field holding the body signed
 * as a JWT, and the configured header carries `Bearer <jwt>` of
 * `{"payload": body}`. Both tokens expire after the short token leeway.
 *
 * # Transport
 *
 * Two `reqwest` clients are built up front, one validating certificates and
 * one not. Each call picks one from the settings, so disabling verification
 * for the engine never leaks into any other outgoing connection. Every call
 * sets its own timeout: conversions get the long one, everything else the
 * regular request timeout.
 */

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::errors::EngineError;
use crate::backend::tokens::TokenCodec;
use crate::shared::{generate_revision_id, EngineSettings};

const CONVERTER_PATH: &str = "/converter";
const HEALTHCHECK_PATH: &str = "/healthcheck";
const COMMAND_PATH: &str = "/coauthoring/CommandService.ashx";

/// Parameters of a synchronous conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    /// URL the engine downloads the source from
    pub source_url: String,
    pub from_ext: String,
    pub to_ext: String,
    /// Cache key of the conversion; canonicalized before sending
    pub revision_key: String,
    /// Locale used for number and date formats
    pub region: Option<String>,
    /// Produce a fillable form when converting to PDF
    pub to_form: bool,
}

impl ConvertRequest {
    pub fn new(
        source_url: impl Into<String>,
        from_ext: impl Into<String>,
        to_ext: impl Into<String>,
        revision_key: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            from_ext: from_ext.into(),
            to_ext: to_ext.into(),
            revision_key: revision_key.into(),
            region: None,
            to_form: false,
        }
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn to_form(mut self, to_form: bool) -> Self {
        self.to_form = to_form;
        self
    }

    /// JSON body of the converter request
    fn body(&self, key: &str) -> Value {
        let mut body = json!({
            "async": false,
            "url": self.source_url,
            "outputtype": self.to_ext,
            "filetype": self.from_ext,
            "title": format!("{}.{}", key, self.from_ext),
            "key": key,
        });
        if let Some(region) = &self.region {
            body["region"] = json!(region);
        }
        if self.to_form {
            body["pdf"] = json!({ "form": true });
        }
        body
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConvertResponse {
    #[serde(default)]
    end_convert: bool,
    #[serde(default)]
    file_url: Option<String>,
    #[serde(default)]
    error: Option<i64>,
}

/// Client for the Docs engine
#[derive(Debug, Clone)]
pub struct EngineClient {
    settings: EngineSettings,
    codec: Option<TokenCodec>,
    strict: Client,
    insecure: Client,
}

impl EngineClient {
    /// Build a client; `leeway` is the lifetime of signed request tokens
    pub fn new(settings: EngineSettings, leeway: Duration) -> Result<Self, EngineError> {
        let codec = settings
            .jwt_secret
            .as_deref()
            .map(|secret| TokenCodec::new(secret, leeway).allow_missing_exp());
        let strict = Client::builder().build()?;
        let insecure = Client::builder().danger_accept_invalid_certs(true).build()?;

        Ok(Self {
            settings,
            codec,
            strict,
            insecure,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Codec for tokens shared with the engine, if a secret is configured
    pub fn codec(&self) -> Option<&TokenCodec> {
        self.codec.as_ref()
    }

    fn http(&self) -> &Client {
        if self.settings.verify_peer {
            &self.strict
        } else {
            &self.insecure
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.request_url(), path)
    }

    /// Wrap a JSON body in the signed-request envelope
    ///
    /// Returns the body to send and the header value, if signing is enabled.
    pub fn envelope(&self, mut body: Value) -> Result<(Value, Option<String>), EngineError> {
        let Some(codec) = &self.codec else {
            return Ok((body, None));
        };

        let header = codec
            .sign(&json!({ "payload": &body }))
            .map_err(|e| EngineError::Signing(e.to_string()))?;
        let token = codec.sign(&body).map_err(|e| EngineError::Signing(e.to_string()))?;
        if let Value::Object(map) = &mut body {
            map.insert("token".to_string(), Value::String(token));
        }
        Ok((body, Some(format!("Bearer {}", header))))
    }

    fn signed_post(&self, url: &str, body: Value, timeout: Duration) -> Result<RequestBuilder, EngineError> {
        let (body, header) = self.envelope(body)?;
        let mut request = self
            .http()
            .post(url)
            .timeout(timeout)
            .header("Accept", "application/json")
            .json(&body);
        if let Some(header) = header {
            request = request.header(self.settings.jwt_header.as_str(), header);
        }
        Ok(request)
    }

    /// Convert a document and return the URL of the result
    pub async fn convert(&self, request: &ConvertRequest) -> Result<String, EngineError> {
        let key = generate_revision_id(&request.revision_key);
        let url = format!("{}?shardKey={}", self.url(CONVERTER_PATH), key);

        tracing::debug!(
            "[Engine] Converting {} -> {} (key {})",
            request.from_ext,
            request.to_ext,
            key
        );

        let response = self
            .signed_post(&url, request.body(&key), self.settings.convert_timeout)?
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        let parsed: ConvertResponse =
            serde_json::from_str(&text).map_err(|e| EngineError::BadResponse(e.to_string()))?;

        if let Some(code) = parsed.error.filter(|code| *code != 0) {
            tracing::warn!("[Engine] Conversion error {} for key {}", code, key);
            return Err(EngineError::Conversion { code });
        }
        if !parsed.end_convert {
            return Err(EngineError::NotReady);
        }
        parsed
            .file_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| EngineError::BadResponse("conversion result has no fileUrl".to_string()))
    }

    /// Whether the engine reports itself healthy
    pub async fn healthcheck(&self) -> Result<bool, EngineError> {
        let response = self
            .http()
            .get(self.url(HEALTHCHECK_PATH))
            .timeout(self.settings.request_timeout)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        Ok(body.trim() == "true")
    }

    /// Send a command to the engine's command service
    ///
    /// `extra` fields are merged into the request body next to `c`.
    pub async fn command(&self, verb: &str, extra: Option<Value>) -> Result<Value, EngineError> {
        let mut body = json!({ "c": verb });
        if let (Some(Value::Object(fields)), Value::Object(map)) = (extra, &mut body) {
            map.extend(fields);
        }

        let response = self
            .signed_post(&self.url(COMMAND_PATH), body, self.settings.request_timeout)?
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text).map_err(|e| EngineError::BadResponse(e.to_string()))?;

        match value.get("error").and_then(Value::as_i64) {
            Some(0) | None => Ok(value),
            Some(code) => {
                tracing::warn!("[Engine] Command '{}' failed with code {}", verb, code);
                Err(EngineError::Command { code })
            }
        }
    }

    /// Engine version string
    pub async fn version(&self) -> Result<String, EngineError> {
        let response = self.command("version", None).await?;
        response
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| EngineError::BadResponse("version missing from command response".to_string()))
    }

    /// Download a file produced by the engine
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes, EngineError> {
        let response = self
            .http()
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?)
    }

    /// Health check followed by a version query
    ///
    /// Returns the engine version when both succeed.
    pub async fn check(&self) -> Result<String, EngineError> {
        if !self.healthcheck().await? {
            return Err(EngineError::BadResponse("healthcheck did not report true".to_string()));
        }
        let version = self.version().await?;
        tracing::info!("[Engine] Docs engine {} is available", version);
        Ok(version)
    }
}
