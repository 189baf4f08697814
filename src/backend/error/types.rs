/**
 * Backend Error Types
 *
 * This module defines the error type returned by the HTTP handlers and the
 * services behind them. Each subsystem keeps its own error enum; this type
 * wraps them so handlers can use `?` throughout.
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Request-level problems detected by a handler: missing parameters, a
 * missing engine token, an unknown file.
 *
 * ## Subsystem Errors
 *
 * - `Token` - session or engine token rejected
 * - `Engine` - Docs engine request failed
 * - `Host` - storage reported a failure
 * - `Remote` - federated instance call failed
 * - `Database` - registry, ledger or cache query failed
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::engine::EngineError;
use crate::backend::host::HostError;
use crate::backend::remote::RemoteError;
use crate::backend::tokens::TokenError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use docbridge::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "doc parameter missing");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., missing parameter, unknown file)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::NOT_FOUND, message)
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `Token` - 403 Forbidden, 500 when signing failed
    /// - `Engine` - 502 Bad Gateway, 504 on timeout
    /// - `Host` - 404 / 423 / 403 / 500 by kind
    /// - `Remote` - 502 Bad Gateway
    /// - `Database` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Token(_) => StatusCode::FORBIDDEN,
            Self::Engine(EngineError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            Self::Engine(_) => StatusCode::BAD_GATEWAY,
            Self::Host(err) => match err {
                HostError::NotFound(_) => StatusCode::NOT_FOUND,
                HostError::WriteLocked(_) => StatusCode::LOCKED,
                HostError::Forbidden(_) => StatusCode::FORBIDDEN,
                HostError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Remote(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::ProtocolError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::SerializationError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            // Storage and database internals are not echoed to callers
            Self::Database(_) => "Internal storage error".to_string(),
            Self::Host(HostError::Storage(_)) => "Internal storage error".to_string(),
            other => other.to_string(),
        }
    }
}
