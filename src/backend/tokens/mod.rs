//! Token Module
//!
//! Signed tokens are the only credential the Docs engine presents when it
//! calls back into this host, and the envelope this host puts on its own
//! requests to the engine.
//!
//! # Module Structure
//!
//! ```text
//! tokens/
//! ├── mod.rs    - Module exports and documentation
//! └── codec.rs  - HS256 signing, verification and error mapping
//! ```
//!
//! # Two Secrets
//!
//! - The host codec signs session tokens (`download`, `empty`, `track`,
//!   `direct`) with the host's own secret; only this host can mint them.
//! - The engine codec uses the secret shared with the Docs engine to sign
//!   outgoing requests and to verify engine-signed callback payloads.

/// Token signing and verification
pub mod codec;

pub use codec::{extract_bearer_token, TokenCodec, TokenError};
