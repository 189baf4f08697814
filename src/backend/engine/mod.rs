//! Docs Engine Client Module
//!
//! HTTP protocol spoken with the Docs engine: synchronous conversion,
//! health check, the command service and raw downloads, with the optional
//! signed-request envelope and typed engine error codes.
//!
//! # Module Structure
//!
//! ```text
//! engine/
//! ├── mod.rs     - Module exports and documentation
//! ├── client.rs  - `EngineClient` and conversion requests
//! └── errors.rs  - `EngineError` and engine error code descriptions
//! ```

/// Engine HTTP client
pub mod client;

/// Engine error taxonomy
pub mod errors;

pub use client::{ConvertRequest, EngineClient};
pub use errors::{command_error_message, conversion_error_message, EngineError};
