//! Backend Module
//!
//! This module contains all server-side code for docbridge: the services
//! that keep a host's files consistent with the Docs engine's editing
//! sessions, and the Axum HTTP server exposing them.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`tokens`** - HS256 session and engine token codec
//! - **`host`** - Traits for the document-management host, plus `MemoryHost`
//! - **`keylock`** - Durable per-file editing key, lock and forcesave mark
//! - **`engine`** - Docs engine HTTP client (conversion, commands, health)
//! - **`remote`** - Federated key/lock proxy and its endpoints
//! - **`versions`** - Per-version engine history and author ledger
//! - **`permissions`** - Extra share permissions
//! - **`session`** - Lock providers, editor launch, direct conversion
//! - **`callback`** - Track state machine and engine callback endpoints
//! - **`hooks`** - Host file events applied to the registry and ledger
//! - **`middleware`** - Engine token extraction
//! - **`server`** / **`routes`** - State, configuration and routing
//! - **`error`** - Backend error type
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── hooks.rs        - Host event listener
//! ├── callback/       - Track state machine and endpoints
//! ├── engine/         - Docs engine client
//! ├── error/          - Error types
//! ├── host/           - Host collaborator traits
//! ├── keylock/        - Key/lock registry
//! ├── middleware/     - Engine token extractor
//! ├── permissions/    - Share permissions
//! ├── remote/         - Federation
//! ├── routes/         - Route configuration
//! ├── server/         - Server initialization and state
//! ├── session/        - Launch, lock providers, conversion
//! ├── tokens/         - Token codec
//! └── versions/       - Version ledger
//! ```
//!
//! # Persistence
//!
//! Registry, ledger, permissions and the remote health cache share one
//! SQLite pool (`sqlx`), migrated at startup from `migrations/`.
//!
//! # Example
//!
//! ```rust,no_run
//! use docbridge::backend::host::MemoryHost;
//! use docbridge::backend::server::{config, create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = config::load_config()?;
//! let pool = config::load_database(&server.database_url).await?;
//! let app = create_app(server.service, pool, MemoryHost::new())?;
//! // Use app with axum::serve
//! # Ok(())
//! # }
//! ```

/// Server setup and configuration
#[cfg(feature = "ssr")]
pub mod server;

/// Route configuration
#[cfg(feature = "ssr")]
pub mod routes;

/// Backend error types
#[cfg(feature = "ssr")]
pub mod error;

/// Middleware for request processing
#[cfg(feature = "ssr")]
pub mod middleware;

/// Session and engine token codec
#[cfg(feature = "ssr")]
pub mod tokens;

/// Host collaborator interfaces
#[cfg(feature = "ssr")]
pub mod host;

/// Editing key and lock registry
#[cfg(feature = "ssr")]
pub mod keylock;

/// Docs engine client
#[cfg(feature = "ssr")]
pub mod engine;

/// Federated instances
#[cfg(feature = "ssr")]
pub mod remote;

/// Version history ledger
#[cfg(feature = "ssr")]
pub mod versions;

/// Extra share permissions
#[cfg(feature = "ssr")]
pub mod permissions;

/// Editing sessions
#[cfg(feature = "ssr")]
pub mod session;

/// Engine callbacks
#[cfg(feature = "ssr")]
pub mod callback;

/// Host event hooks
#[cfg(feature = "ssr")]
pub mod hooks;

/// Re-export commonly used types
#[cfg(feature = "ssr")]
pub use server::create_app;
#[cfg(feature = "ssr")]
pub use error::BackendError;
#[cfg(feature = "ssr")]
pub use callback::CallbackCoordinator;
