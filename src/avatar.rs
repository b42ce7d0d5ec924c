//! Avatar instance model.
//!
//! An [`Avatar`] is one embodiment of a peer: the local (authoritative) copy
//! on the machine of the peer who controls it, and a remote copy everywhere
//! else. The [`AvatarRig`] is the presentation-side state the cosmetic
//! appliers mutate; rendering itself happens elsewhere.

use std::cell::RefCell;
use std::rc::Rc;

use crate::room::peer::PeerId;
use crate::sync::cosmetics::Rgba;
use crate::sync::SyncResult;

/// One instance of a peer's avatar.
#[derive(Debug, Clone)]
pub struct Avatar {
    pub peer: PeerId,
    pub name: String,
    /// Whether this is the authoritative copy. Only the local copy may
    /// originate cosmetic changes; every copy applies them.
    pub is_local: bool,
}

impl Avatar {
    pub fn local(peer: PeerId, name: impl Into<String>) -> Self {
        Self {
            peer,
            name: name.into(),
            is_local: true,
        }
    }

    pub fn remote(peer: PeerId, name: impl Into<String>) -> Self {
        Self {
            peer,
            name: name.into(),
            is_local: false,
        }
    }
}

/// Visual state of one avatar instance. Appliers write here; whatever draws
/// the avatar reads it.
#[derive(Debug, Clone, Default)]
pub struct AvatarRig {
    pub active_hat: Option<usize>,
    pub active_shape: Option<usize>,
    pub active_face: Option<usize>,
    pub material: Option<String>,
    pub base_color: Option<Rgba>,
    pub texture: Option<String>,
}

impl AvatarRig {
    /// Deactivate all other hats and activate the one at `index`.
    pub fn activate_hat(&mut self, index: usize) {
        self.active_hat = Some(index);
    }

    pub fn activate_shape(&mut self, index: usize) {
        self.active_shape = Some(index);
    }

    pub fn activate_face(&mut self, index: usize) {
        self.active_face = Some(index);
    }

    pub fn assign_material(&mut self, material: impl Into<String>) {
        self.material = Some(material.into());
    }

    /// Tint every part of the avatar with one base color.
    pub fn set_base_color(&mut self, color: Rgba) {
        self.base_color = Some(color);
    }

    pub fn assign_texture(&mut self, texture: impl Into<String>) {
        self.texture = Some(texture.into());
    }
}

/// Rig handle shared between the appliers of one avatar instance. Sync runs
/// on a single thread, so a plain `Rc<RefCell>` is enough.
pub type SharedRig = Rc<RefCell<AvatarRig>>;

pub fn shared_rig() -> SharedRig {
    Rc::new(RefCell::new(AvatarRig::default()))
}

/// Applier for the hat channel over a shared rig.
pub fn hat_applier(rig: SharedRig) -> impl FnMut(usize, &String) -> SyncResult<()> {
    move |index, _hat| {
        rig.borrow_mut().activate_hat(index);
        Ok(())
    }
}

pub fn shape_applier(rig: SharedRig) -> impl FnMut(usize, &String) -> SyncResult<()> {
    move |index, _shape| {
        rig.borrow_mut().activate_shape(index);
        Ok(())
    }
}

pub fn face_applier(rig: SharedRig) -> impl FnMut(usize, &String) -> SyncResult<()> {
    move |index, _face| {
        rig.borrow_mut().activate_face(index);
        Ok(())
    }
}

pub fn material_applier(rig: SharedRig) -> impl FnMut(usize, &String) -> SyncResult<()> {
    move |_index, material: &String| {
        rig.borrow_mut().assign_material(material.clone());
        Ok(())
    }
}

pub fn color_applier(rig: SharedRig) -> impl FnMut(usize, &Rgba) -> SyncResult<()> {
    move |_index, color| {
        rig.borrow_mut().set_base_color(*color);
        Ok(())
    }
}

pub fn texture_applier(rig: SharedRig) -> impl FnMut(usize, &String) -> SyncResult<()> {
    move |_index, texture: &String| {
        rig.borrow_mut().assign_texture(texture.clone());
        Ok(())
    }
}
