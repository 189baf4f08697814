//! Editing Session Module
//!
//! Everything around an editing session that is not the callback state
//! machine itself: where a file's key and lock live, how a session is
//! launched, and user-requested conversions.
//!
//! # Module Structure
//!
//! ```text
//! session/
//! ├── mod.rs         - Module exports and documentation
//! ├── locks.rs       - `LockProvider`, local and remote providers, `KeyService`
//! ├── launcher.rs    - `SessionLauncher` and `EditorLaunch`
//! ├── conversion.rs  - `ConversionService`
//! └── handlers.rs    - direct launch and conversion endpoints
//! ```

/// Key and lock providers
pub mod locks;

/// Editor launch preparation
pub mod launcher;

/// User-requested conversions
pub mod conversion;

/// Direct-token endpoints
pub mod handlers;

pub use conversion::{ConversionService, Converted};
pub use launcher::{document_type, EditorLaunch, EditorUser, SessionLauncher};
pub use locks::{KeyService, LocalLocks, LockProvider, RemoteLocks};
