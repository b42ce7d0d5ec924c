//! Networked cosmetic property synchronization.
//!
//! One generic engine keeps a named visual attribute consistent between the
//! authoritative (local) avatar instance and its remote copies. The protocol
//! is deliberately small: serialize a catalogue index to JSON, publish it
//! under a fixed key in the owning peer's property map, and have every
//! instance apply updates idempotently. Conflict policy is last-write-wins
//! per key; there is no logical clock and no merge.

pub mod catalogue;
pub mod cosmetics;
pub mod engine;

// Re-export main types for convenience
pub use catalogue::Catalogue;
pub use cosmetics::{CosmeticKind, Rgba};
pub use engine::{Applier, DefaultPolicy, PropertyPublisher, PropertySyncEngine};

// Error types
use thiserror::Error;

/// Failures of the sync core. All of them are recoverable: callers log a
/// warning, the operation aborts, and the previous state stays intact. State
/// is idempotent, so a future update self-corrects; nothing is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error("Unrecognized option; only options from the pre-determined catalogue can be set")]
    InvalidOption,

    #[error("Index {index} out of range for catalogue of {len}")]
    OutOfRange { index: i64, len: usize },

    #[error("Applier target missing: {reason}")]
    MissingTarget { reason: String },

    #[error("Only the avatar's owning peer may originate changes")]
    NotAuthoritative,

    #[error("Malformed property payload: {reason}")]
    Payload { reason: String },
}

pub type SyncResult<T> = Result<T, SyncError>;
