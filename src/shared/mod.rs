//! Shared Module
//!
//! This module contains types that do not depend on the server stack: the
//! Docs engine's callback statuses, the session token claim sets, revision
//! key canonicalization and the service configuration.
//!
//! # Overview
//!
//! Everything here is plain data plus pure functions, so it is usable from
//! tools and tests without building the `ssr` backend.

/// Shared error types
pub mod error;

/// Service configuration
pub mod config;

/// Engine callback status codes
pub mod status;

/// Session token claim sets
pub mod claims;

/// Revision key canonicalization
pub mod revision;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use config::{ConfigError, EngineSettings, RemoteSettings, ServiceConfig, ServiceConfigBuilder};
pub use status::{ForcesaveType, TrackStatus};
pub use claims::{DirectClaims, DownloadClaims, EmptyClaims, SessionClaims, TokenAction, TrackClaims};
pub use revision::generate_revision_id;
