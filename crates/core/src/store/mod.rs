//! Content-addressed disk cache for fetched payloads.
//!
//! Entries are keyed by the SHA-256 of a request identity and laid out as a
//! shallow directory tree derived from the hex digest:
//!
//! ```text
//! <root>/abc/def/012/3456789...
//! ```
//!
//! - Content-addressed keys via [`StoreKey::from_identity`]
//! - Pure path derivation via [`store_path`]
//! - Atomic writes (temp file + rename) so readers never see partial bytes
//! - Freshness checks against the entry's modification time

pub mod disk;
pub mod hash;

pub use crate::Error;

pub use disk::ContentStore;
pub use hash::{StoreKey, request_identity, store_path};
