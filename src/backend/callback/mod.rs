//! Engine Callback Module
//!
//! The protocol state machine the Docs engine drives while a document is
//! open, edited, saved and closed, and the HTTP endpoints it calls.
//!
//! # Module Structure
//!
//! ```text
//! callback/
//! ├── mod.rs          - Module exports and documentation
//! ├── coordinator.rs  - `CallbackCoordinator` and the save flow
//! ├── handlers.rs     - download, empty-file and track endpoints
//! ├── retry.rs        - bounded retry of content writes
//! └── types.rs        - track report and answer types
//! ```
//!
//! # Flow
//!
//! 1. The handler verifies the `doc` session token for the endpoint's action
//! 2. With an engine secret, the engine's own token is verified and its
//!    signed fields replace the raw report fields
//! 3. `CallbackCoordinator::track` applies the report

/// Status report state machine
pub mod coordinator;

/// HTTP endpoints
pub mod handlers;

/// Content write retry
pub mod retry;

/// Report and answer types
pub mod types;

pub use coordinator::CallbackCoordinator;
pub use retry::{BackoffStrategy, RetryPolicy};
pub use types::{SignedReport, TrackAction, TrackBody, TrackOutcome, TrackRequest};
