//! The cosmetic attribute channels.
//!
//! Six near-identical attribute kinds share one generic engine; the only
//! per-kind differences are the property key and the default selected on
//! spawn. Colors additionally carry their own option type.

use serde::{Deserialize, Serialize};

use crate::room::peer::PeerId;
use crate::sync::catalogue::Catalogue;
use crate::sync::engine::{Applier, DefaultPolicy, PropertySyncEngine};

/// The cosmetic attributes an avatar can sync. Serializes by name so
/// targeted change requests can say which channel they concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CosmeticKind {
    Hat,
    Shape,
    Face,
    Material,
    Color,
    Texture,
}

impl CosmeticKind {
    /// Fixed property-channel key for this attribute.
    pub fn property_key(&self) -> &'static str {
        match self {
            CosmeticKind::Hat => "simple-hat-avatar",
            CosmeticKind::Shape => "simple-shape-avatar",
            CosmeticKind::Face => "simple-face-avatar",
            CosmeticKind::Material => "simple-material-avatar",
            CosmeticKind::Color => "simple-color-avatar",
            CosmeticKind::Texture => "avatar-texture",
        }
    }

    /// What a freshly spawned local avatar wears before anyone picks:
    /// textures get costume roulette, colors stay untouched until chosen,
    /// everything else starts at the first catalogue entry.
    pub fn default_policy(&self) -> DefaultPolicy {
        match self {
            CosmeticKind::Texture => DefaultPolicy::Random,
            CosmeticKind::Color => DefaultPolicy::None,
            _ => DefaultPolicy::First,
        }
    }
}

/// Build the engine for one cosmetic attribute of one avatar instance.
pub fn cosmetic_engine<O>(
    kind: CosmeticKind,
    peer: PeerId,
    is_local: bool,
    catalogue: Catalogue<O>,
    applier: impl Applier<O> + 'static,
) -> PropertySyncEngine<O> {
    PropertySyncEngine::new(kind.property_key(), peer, is_local, catalogue, applier)
        .with_default_policy(kind.default_policy())
}

/// Color option for the color channel. Catalogues of these stand in for the
/// original free-form color picker; indices keep the wire format uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn red() -> Self {
        Self::new(255, 0, 0, 255)
    }
}
