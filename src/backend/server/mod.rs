//! Server Module
//!
//! This module contains the server-side code for configuring and starting
//! the Axum HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState, HostServices and FromRef implementations
//! ├── config.rs       - Environment configuration and database setup
//! └── init.rs         - App creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `config::load_config` reads the environment
//! 2. **Database**: `config::load_database` opens SQLite and runs migrations
//! 3. **State Creation**: `AppState::new` wires stores and services
//! 4. **Router Creation**: `init::create_app` registers hooks and routes
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
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use init::{create_app, create_app_with_state};
pub use state::{AppState, HostServices};
