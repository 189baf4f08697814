//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//! Routes are organized by caller into focused submodules.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs              - Module exports and documentation
//! ├── router.rs           - Main router creation
//! ├── callback_routes.rs  - Docs engine callbacks
//! └── api_routes.rs       - Federation and direct-session endpoints
//! ```
//!
//! # Route Types
//!
//! ## Callback Routes
//!
//! - `GET /callback/download` - file content for the engine
//! - `GET /callback/emptyfile` - blank document for the engine
//! - `POST /callback/track` - engine status reports
//!
//! ## API Routes
//!
//! - `POST /api/v1/key`, `POST /api/v1/keylock`, `GET /api/v1/healthcheck`
//! - `GET /api/v1/direct`, `POST /api/v1/convert`, `GET /api/v1/history`

/// Main router creation
pub mod router;

/// Engine callback routes
pub mod callback_routes;

/// API endpoint routes
pub mod api_routes;

pub use router::create_router;
