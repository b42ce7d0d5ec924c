//! Toy raycast gun.
//!
//! The gun is a shared prop: grabbing, firing and the resulting beam are
//! broadcast as ephemeral messages so every client draws the same thing.
//! Each gun changes one cosmetic channel; hitting another peer's avatar
//! sends that peer a targeted [`CosmeticChangeMessage`] for that channel.
//! Only the addressed peer acts on it, by driving its own engine through the
//! normal origination path. Physics raycasting stays outside this crate; the
//! caller reports what the ray hit.

use glam::Vec3;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::room::client::RoomClient;
use crate::room::events::RoomEvent;
use crate::room::messages::{CosmeticChangeMessage, GunMessage, RayMessage};
use crate::room::peer::PeerId;
use crate::room::RoomResult;
use crate::sync::cosmetics::CosmeticKind;
use crate::sync::engine::PropertySyncEngine;

/// What the caller's raycast hit, if anything.
#[derive(Debug, Clone, Copy)]
pub struct HitTarget {
    /// Peer owning the avatar that was hit.
    pub peer: PeerId,
    /// World-space hit point; becomes the beam endpoint.
    pub point: Vec3,
    /// Size of the target's catalogue for the channel this gun changes.
    pub option_count: usize,
    /// Entry the target currently wears on that channel, if known.
    pub current_index: Option<usize>,
}

/// Local state of the gun prop.
pub struct RaycastGun {
    /// Which cosmetic channel a hit rerolls (hat gun, material gun, ...).
    kind: CosmeticKind,
    max_range: f32,
    held: bool,
    firing: bool,
    /// Most recent beam, local or remote, for whatever draws it.
    last_ray: Option<RayMessage>,
}

impl RaycastGun {
    pub fn new(kind: CosmeticKind, max_range: f32) -> Self {
        Self {
            kind,
            max_range,
            held: false,
            firing: false,
            last_ray: None,
        }
    }

    pub fn kind(&self) -> CosmeticKind {
        self.kind
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Whether the trigger is down, locally or on the holder's remote copy.
    pub fn is_firing(&self) -> bool {
        self.firing
    }

    pub fn last_ray(&self) -> Option<RayMessage> {
        self.last_ray
    }

    /// Pick the gun up. Firing only works while held.
    pub fn grab(&mut self, room: &mut RoomClient) -> RoomResult<()> {
        self.held = true;
        room.send_json(&GunMessage {
            is_grabbed: Some(true),
            is_firing: None,
        })
    }

    /// Put the gun down, releasing the trigger with it.
    pub fn release(&mut self, room: &mut RoomClient) -> RoomResult<()> {
        self.held = false;
        self.firing = false;
        room.send_json(&GunMessage {
            is_grabbed: Some(false),
            is_firing: Some(false),
        })
    }

    /// Fire from `muzzle` along `direction`.
    ///
    /// Broadcasts the trigger pull and the beam to everyone. When the
    /// reported hit is an avatar with more than one option to choose from on
    /// this gun's channel, also sends the victim a random new entry distinct
    /// from its current one. Returns the change that was requested, if any.
    pub fn fire(
        &mut self,
        room: &mut RoomClient,
        muzzle: Vec3,
        direction: Vec3,
        hit: Option<&HitTarget>,
    ) -> RoomResult<Option<CosmeticChangeMessage>> {
        if !self.held {
            debug!("trigger pulled on a gun nobody is holding");
            return Ok(None);
        }

        self.firing = true;
        room.send_json(&GunMessage {
            is_grabbed: None,
            is_firing: Some(true),
        })?;

        let end = match hit {
            Some(hit) => hit.point,
            None => muzzle + direction.normalize_or_zero() * self.max_range,
        };
        let ray = RayMessage { start: muzzle, end };
        self.last_ray = Some(ray);
        room.send_json(&ray)?;

        let Some(hit) = hit else {
            return Ok(None);
        };
        if hit.option_count < 2 {
            debug!(peer = %hit.peer, kind = ?self.kind, "hit avatar has no alternatives");
            return Ok(None);
        }

        let index = random_other_index(hit.option_count, hit.current_index);
        let change = CosmeticChangeMessage {
            target_peer_id: hit.peer,
            kind: self.kind,
            index,
        };
        info!(target = %hit.peer, kind = ?self.kind, index, "sending change to hit avatar");
        room.send_json(&change)?;
        Ok(Some(change))
    }

    /// Mirror remote gun state: grabbed/released and trigger toggles, and
    /// remote beams recorded for drawing.
    pub fn handle_event(&mut self, event: &RoomEvent) {
        let RoomEvent::Message { payload, .. } = event else {
            return;
        };

        if let Ok(ray) = serde_json::from_str::<RayMessage>(payload) {
            self.last_ray = Some(ray);
            return;
        }
        if let Ok(state) = serde_json::from_str::<GunMessage>(payload) {
            if let Some(grabbed) = state.is_grabbed {
                self.held = grabbed;
            }
            if let Some(firing) = state.is_firing {
                self.firing = firing;
            }
        }
    }
}

/// Acts on targeted cosmetic changes addressed to the local peer.
///
/// Remote peers cannot write another peer's properties directly; they ask,
/// and the addressed peer originates the change itself through its own
/// engine for the named channel.
pub struct CosmeticChangeReceiver {
    local_peer: PeerId,
}

impl CosmeticChangeReceiver {
    pub fn new(local_peer: PeerId) -> Self {
        Self { local_peer }
    }

    pub fn handle_event<O>(
        &self,
        event: &RoomEvent,
        room: &mut RoomClient,
        engine: &mut PropertySyncEngine<O>,
    ) {
        let RoomEvent::Message { payload, .. } = event else {
            return;
        };
        let Ok(change) = serde_json::from_str::<CosmeticChangeMessage>(payload) else {
            return;
        };

        if change.target_peer_id != self.local_peer || !engine.is_local() {
            debug!(target = %change.target_peer_id, "change not addressed to us");
            return;
        }
        if engine.key() != change.kind.property_key() {
            // Addressed to us, but for a different channel than this engine.
            return;
        }

        info!(kind = ?change.kind, index = change.index, "applying change requested by another peer");
        if let Err(e) = engine.set_index(room, change.index) {
            warn!(error = %e, "requested change was not applicable");
        }
    }
}

fn random_other_index(option_count: usize, current: Option<usize>) -> usize {
    let mut rng = rand::rng();
    loop {
        let candidate = rng.random_range(0..option_count);
        if Some(candidate) != current {
            return candidate;
        }
    }
}
