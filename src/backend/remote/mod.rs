//! Federation Module
//!
//! Key and lock operations for files stored on another instance, proxied
//! over that instance's federation API, with a shared availability cache.
//!
//! # Module Structure
//!
//! ```text
//! remote/
//! ├── mod.rs      - Module exports and documentation
//! ├── handlers.rs - Federation endpoints served to other instances
//! ├── health.rs   - `remote_instances` availability cache
//! └── proxy.rs    - `RemoteSessionProxy` HTTP client
//! ```

/// Federation endpoints
pub mod handlers;

/// Remote availability cache
pub mod health;

/// Federated key/lock client
pub mod proxy;

pub use health::HealthCache;
pub use proxy::{RemoteError, RemoteSessionProxy};
