//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - In-memory database fixtures
//! - A wiremock stand-in for the Docs engine and federated instances
//! - A wired application with an in-memory host
//! - Session and engine token helpers

#![allow(dead_code)]

pub mod database;
pub mod engine;
pub mod tokens;

// Re-export commonly used utilities
pub use app::*;
pub use database::*;
pub use engine::*;
pub use tokens::*;
