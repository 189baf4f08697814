//! Version Reconciliation Module
//!
//! Maps save events onto the host's version history: the engine's change
//! history and changes archive per saved version, the version's author, and
//! eviction of records whose save lineage no longer matches the host.
//!
//! # Module Structure
//!
//! ```text
//! versions/
//! ├── mod.rs       - Module exports and documentation
//! ├── ledger.rs    - `version_history` table operations
//! ├── history.rs   - `VersionService`, the lineage-checked history listing
//! └── handlers.rs  - history endpoint
//! ```

/// `version_history` table operations
pub mod ledger;

/// History listing
pub mod history;

/// History endpoint
pub mod handlers;

pub use history::{FileHistory, HistoryEntry, VersionService};
pub use ledger::{VersionAuthor, VersionLedger};
