//! Key/Lock Registry Module
//!
//! Durable per-file editing session state: the editing key the Docs engine
//! caches documents under, the lock flag that marks the engine as the
//! authoritative writer, and the forcesave marker used by the duplicate
//! forcesave guard.
//!
//! # Module Structure
//!
//! ```text
//! keylock/
//! ├── mod.rs       - Module exports and documentation
//! └── registry.rs  - `editing_keys` table operations
//! ```

/// `editing_keys` table operations
pub mod registry;

pub use registry::{KeyLockRegistry, KeyLockState};
