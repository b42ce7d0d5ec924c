//! Room and peer substrate.
//!
//! This module models the shared room the cosmetic sync engines run over: a
//! set of peers, each with an identity and a string-keyed property bag, plus
//! an ephemeral broadcast message channel. Property updates replicate to
//! every client and replay to late joiners; broadcast messages are
//! fire-and-forget.

pub mod client;
pub mod events;
pub mod messages;
pub mod peer;

// Re-export main types for convenience
pub use client::{RoomBus, RoomClient, RoomEvents};
pub use events::RoomEvent;
pub use messages::{CosmeticChangeMessage, GunMessage, IndexPayload, RayMessage};
pub use peer::{Peer, PeerId};

// Error types
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RoomError {
    #[error("Message encode failed: {reason}")]
    Encode { reason: String },

    #[error("Message decode failed: {reason}")]
    Decode { reason: String },
}

pub type RoomResult<T> = Result<T, RoomError>;
