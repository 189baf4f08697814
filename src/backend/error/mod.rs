//! Backend Error Module
//!
//! This module defines the error type returned by handlers and services.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - Error conversion implementations
//! ```
//!
//! # HTTP Response Conversion
//!
//! `BackendError` implements `IntoResponse`, producing an appropriate status
//! code and a JSON body. The track endpoint does not use it: the Docs engine
//! expects its own `{"error": 0|1}` contract there.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;
