//! docbridge - Docs engine integration for a document-management host
//!
//! docbridge sits between a host that stores files and an external Docs
//! engine that edits them collaboratively. Browsers talk to the engine
//! directly; the engine calls back into docbridge to fetch file content and
//! to push saved results, and docbridge keeps each file's editing key, lock
//! and version history consistent with those callbacks.
//!
//! # Module Structure
//!
//! - **`shared`** - Types that do not need the server stack
//!   - Track statuses, session token claims, revision keys
//!   - Service configuration and its builder
//!   - Error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Key/lock registry, version ledger, federation proxy (SQLite via sqlx)
//!   - Docs engine client (reqwest) and token codec (jsonwebtoken)
//!   - Callback state machine and the Axum HTTP server
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the backend modules and the binaries
//!
//! # Usage
//!
//! ```rust,no_run
//! use docbridge::backend::host::MemoryHost;
//! use docbridge::backend::server::{config, create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = config::load_config()?;
//! let pool = config::load_database(&server.database_url).await?;
//! let app = create_app(server.service, pool, MemoryHost::new())?;
//! let listener = tokio::net::TcpListener::bind(("0.0.0.0", server.port)).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `Result<T, E>` for fallible operations
//! - Custom error types in `shared::error` and `backend::error`
//! - The track endpoint always answers in the engine's `{"error": 0|1}` shape

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
