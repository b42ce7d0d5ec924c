//! Wire formats for the room layer.
//!
//! Everything on the wire is a small JSON document; there is no binary
//! framing and no versioning field. Synced properties carry an
//! [`IndexPayload`]; the toy gun broadcasts [`RayMessage`], [`GunMessage`]
//! and [`CosmeticChangeMessage`] as ephemeral messages.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::room::peer::PeerId;
use crate::sync::cosmetics::CosmeticKind;

/// Payload of every synced cosmetic property: an index into the catalogue
/// shared by all instances of the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPayload {
    pub index: i64,
}

impl IndexPayload {
    pub fn new(index: usize) -> Self {
        Self {
            index: index as i64,
        }
    }

    pub fn encode(&self) -> String {
        // Serializing a single integer field cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Visual trace of a single gun shot, broadcast so every client can draw the
/// same beam. Fire-and-forget; stale rays are simply never drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayMessage {
    pub start: Vec3,
    pub end: Vec3,
}

/// Grab/trigger state of the shared gun prop. Fields are optional so a
/// message only carries the part of the state that changed; unknown fields
/// are rejected so other message types on the same channel never parse as an
/// empty `GunMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GunMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_grabbed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_firing: Option<bool>,
}

/// Request that one specific peer swap one of its cosmetic channels to the
/// given catalogue entry. Only the addressed peer acts on it; everyone else
/// drops it on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmeticChangeMessage {
    pub target_peer_id: PeerId,
    pub kind: CosmeticKind,
    pub index: usize,
}
