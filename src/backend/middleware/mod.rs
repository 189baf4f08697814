//! Middleware Module
//!
//! Request-level checks shared by several handlers.
//!
//! - **`auth`** - verification of engine-signed bearer tokens

pub mod auth;

pub use auth::{engine_header_claims, EngineAuthorized};
