/**
 * Docs Engine Errors
 *
 * Failures of requests sent to the Docs engine. The engine reports its own
 * numeric error codes in the response body; these are decoded into
 * `EngineError::Conversion` and `EngineError::Command` and carry a fixed
 * human-readable description for the user-facing callers.
 *
 * # Conversion Codes
 *
 * | Code | Meaning |
 * |------|---------|
 * | -1 | Unknown error |
 * | -2 | Conversion timeout |
 * | -3 | Conversion error |
 * | -4 | Error while downloading the source |
 * | -5 | Incorrect password |
 * | -6 | Error while accessing the conversion database |
 * | -7 | Input error |
 * | -8 | Invalid token |
 * | -9 | Output format could not be determined |
 * | -10 | Size limit exceeded |
 * | -20 | Error while processing the document |
 */

use thiserror::Error;

/// Errors returned by `EngineClient`
#[derive(Debug, Error)]
pub enum EngineError {
    /// The converter answered with an error code
    #[error("conversion failed ({code}): {}", conversion_error_message(*code))]
    Conversion { code: i64 },

    /// The command service answered with a non-zero error code
    #[error("command failed ({code}): {}", command_error_message(*code))]
    Command { code: i64 },

    #[error("engine unreachable: {0}")]
    Unreachable(String),

    #[error("engine request timed out")]
    Timeout,

    /// The response could not be interpreted
    #[error("bad engine response: {0}")]
    BadResponse(String),

    /// The converter returned without finishing
    #[error("conversion did not finish")]
    NotReady,

    /// Non-success HTTP status
    #[error("engine returned HTTP {0}")]
    Status(u16),

    #[error("failed to sign engine request: {0}")]
    Signing(String),
}

impl EngineError {
    /// Engine-reported error code, if this error carries one
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Conversion { code } | Self::Command { code } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if let Some(status) = error.status() {
            Self::Status(status.as_u16())
        } else if error.is_decode() {
            Self::BadResponse(error.to_string())
        } else {
            Self::Unreachable(error.to_string())
        }
    }
}

/// Description of a converter error code
pub fn conversion_error_message(code: i64) -> &'static str {
    match code {
        -1 => "Unknown error",
        -2 => "Conversion timeout",
        -3 => "Conversion error",
        -4 => "Error while downloading the document file to be converted",
        -5 => "Incorrect password",
        -6 => "Error while accessing the conversion result database",
        -7 => "Input error",
        -8 => "Invalid token",
        -9 => "Cannot automatically determine the output file format",
        -10 => "Size limit exceeded",
        -20 => "Error while processing the document",
        _ => "Unknown conversion error",
    }
}

/// Description of a command service error code
pub fn command_error_message(code: i64) -> &'static str {
    match code {
        0 => "No errors",
        1 => "Document key is missing or no document with such key could be found",
        2 => "Callback url not correct",
        3 => "Internal server error",
        4 => "No changes were applied to the document before the command",
        5 => "Command not correct",
        6 => "Invalid token",
        _ => "Unknown command error",
    }
}
