//! Service configuration module
//!
//! Provides the configuration types for the Docs engine integration. Values
//! are assembled with [`ServiceConfigBuilder`] (the server fills it from the
//! environment) and checked once by [`ServiceConfigBuilder::build`].

use std::time::Duration;
use thiserror::Error;

/// Default header the engine reads its bearer token from
pub const DEFAULT_JWT_HEADER: &str = "Authorization";

/// Connection settings for the Docs engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Engine address as seen by browsers, without trailing slash
    pub public_url: String,
    /// Engine address for server-to-server traffic, when it differs
    pub internal_url: Option<String>,
    /// Shared secret for signed requests and callbacks
    pub jwt_secret: Option<String>,
    /// Header carrying the bearer token
    pub jwt_header: String,
    /// Validate the engine's TLS certificate
    pub verify_peer: bool,
    pub request_timeout: Duration,
    pub convert_timeout: Duration,
}

impl EngineSettings {
    /// Base URL for requests this host sends to the engine
    pub fn request_url(&self) -> &str {
        self.internal_url.as_deref().unwrap_or(&self.public_url)
    }

    /// Rewrite an engine-issued URL so this host fetches it over the
    /// internal address
    ///
    /// URLs that do not start with the public address are returned as-is.
    pub fn to_internal_url(&self, url: &str) -> String {
        match &self.internal_url {
            Some(internal) if internal != &self.public_url => {
                match url.strip_prefix(self.public_url.as_str()) {
                    Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') => {
                        format!("{}{}", internal, rest)
                    }
                    _ => url.to_string(),
                }
            }
            _ => url.to_string(),
        }
    }
}

/// Settings for calls to federated instances
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub request_timeout: Duration,
    /// How long a health-check result is trusted
    pub health_ttl: Duration,
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Prefix of locally minted editing keys and engine user ids
    pub instance_id: String,
    /// Secret for the host's own session tokens
    pub host_secret: String,
    /// Address the engine uses to reach this host, without trailing slash
    pub storage_url: String,
    pub engine: EngineSettings,
    pub remote: RemoteSettings,
    /// Record engine history and authors for saved versions
    pub version_history: bool,
    /// Lifetime of short-lived tokens (downloads, signed engine requests)
    pub token_leeway: Duration,
    /// Lifetime of track tokens, which must outlive an editing session
    pub track_token_ttl: Duration,
}

impl ServiceConfig {
    /// Create a new ServiceConfigBuilder
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }
}

/// Builder for ServiceConfig
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    instance_id: Option<String>,
    host_secret: Option<String>,
    storage_url: Option<String>,
    engine_url: Option<String>,
    engine_internal_url: Option<String>,
    engine_secret: Option<String>,
    jwt_header: Option<String>,
    verify_peer: Option<bool>,
    request_timeout: Option<Duration>,
    convert_timeout: Option<Duration>,
    remote_timeout: Option<Duration>,
    remote_health_ttl: Option<Duration>,
    version_history: Option<bool>,
    token_leeway: Option<Duration>,
    track_token_ttl: Option<Duration>,
}

impl ServiceConfigBuilder {
    pub fn instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = Some(id.into());
        self
    }

    pub fn host_secret(mut self, secret: impl Into<String>) -> Self {
        self.host_secret = Some(secret.into());
        self
    }

    pub fn storage_url(mut self, url: impl Into<String>) -> Self {
        self.storage_url = Some(url.into());
        self
    }

    pub fn engine_url(mut self, url: impl Into<String>) -> Self {
        self.engine_url = Some(url.into());
        self
    }

    pub fn engine_internal_url(mut self, url: impl Into<String>) -> Self {
        self.engine_internal_url = Some(url.into());
        self
    }

    pub fn engine_secret(mut self, secret: impl Into<String>) -> Self {
        self.engine_secret = Some(secret.into());
        self
    }

    pub fn jwt_header(mut self, header: impl Into<String>) -> Self {
        self.jwt_header = Some(header.into());
        self
    }

    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = Some(verify);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn convert_timeout(mut self, timeout: Duration) -> Self {
        self.convert_timeout = Some(timeout);
        self
    }

    pub fn remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = Some(timeout);
        self
    }

    pub fn remote_health_ttl(mut self, ttl: Duration) -> Self {
        self.remote_health_ttl = Some(ttl);
        self
    }

    pub fn version_history(mut self, enabled: bool) -> Self {
        self.version_history = Some(enabled);
        self
    }

    pub fn token_leeway(mut self, leeway: Duration) -> Self {
        self.token_leeway = Some(leeway);
        self
    }

    pub fn track_token_ttl(mut self, ttl: Duration) -> Self {
        self.track_token_ttl = Some(ttl);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ServiceConfig, ConfigError> {
        let engine_url = normalize_url(self.engine_url.ok_or(ConfigError::MissingValue("engine_url"))?)?;
        let storage_url =
            normalize_url(self.storage_url.ok_or(ConfigError::MissingValue("storage_url"))?)?;
        let internal_url = self
            .engine_internal_url
            .filter(|url| !url.trim().is_empty())
            .map(normalize_url)
            .transpose()?;

        let host_secret = self
            .host_secret
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::MissingValue("host_secret"))?;

        let instance_id = self
            .instance_id
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingValue("instance_id"))?;
        if !instance_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidValue {
                field: "instance_id",
                message: "must be alphanumeric".to_string(),
            });
        }

        let jwt_header = self
            .jwt_header
            .filter(|header| !header.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_JWT_HEADER.to_string());
        if is_invalid_header_name(&jwt_header) {
            return Err(ConfigError::InvalidValue {
                field: "jwt_header",
                message: format!("'{}' is not a valid header name", jwt_header),
            });
        }

        Ok(ServiceConfig {
            instance_id,
            host_secret,
            storage_url,
            engine: EngineSettings {
                public_url: engine_url,
                internal_url,
                jwt_secret: self.engine_secret.filter(|secret| !secret.is_empty()),
                jwt_header,
                verify_peer: self.verify_peer.unwrap_or(true),
                request_timeout: self.request_timeout.unwrap_or(Duration::from_secs(60)),
                convert_timeout: self.convert_timeout.unwrap_or(Duration::from_secs(120)),
            },
            remote: RemoteSettings {
                request_timeout: self.remote_timeout.unwrap_or(Duration::from_secs(5)),
                health_ttl: self.remote_health_ttl.unwrap_or(Duration::from_secs(3600)),
            },
            version_history: self.version_history.unwrap_or(true),
            token_leeway: self.token_leeway.unwrap_or(Duration::from_secs(300)),
            track_token_ttl: self.track_token_ttl.unwrap_or(Duration::from_secs(24 * 60 * 60)),
        })
    }
}

fn normalize_url(url: String) -> Result<String, ConfigError> {
    let trimmed = url.trim().trim_end_matches('/').to_string();
    let parsed = reqwest::Url::parse(&trimmed).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(url));
    }
    Ok(trimmed)
}

fn is_invalid_header_name(name: &str) -> bool {
    !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}
