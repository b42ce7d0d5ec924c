// Headless demo: two peers in one room swapping cosmetics.
//
// Each side owns the authoritative engines for its own avatar and a remote
// mirror of the other peer's avatar. Everything runs on one thread; calls to
// pump() stand in for the per-frame tick of a real client.

use anyhow::Result;
use glam::Vec3;
use tracing::info;

use roomprops::avatar::{hat_applier, shared_rig, texture_applier, Avatar};
use roomprops::gun::{CosmeticChangeReceiver, HitTarget, RaycastGun};
use roomprops::room::RoomBus;
use roomprops::sync::cosmetics::cosmetic_engine;
use roomprops::sync::{Catalogue, CosmeticKind};
use roomprops::utils::logging::init_logging;

fn hat_catalogue() -> Catalogue<String> {
    Catalogue::new(vec![
        "tophat".to_string(),
        "beanie".to_string(),
        "crown".to_string(),
    ])
}

fn texture_catalogue() -> Catalogue<String> {
    Catalogue::new(vec![
        "denim".to_string(),
        "tweed".to_string(),
        "neon".to_string(),
        "plaid".to_string(),
    ])
}

fn main() -> Result<()> {
    init_logging();
    info!("{} {} demo", roomprops::APP_NAME, roomprops::VERSION);

    let settings = roomprops::config::load_settings().unwrap_or_default();

    let bus = RoomBus::new();
    let mut alice = bus.join("alice");
    let mut bob = bus.join("bob");
    alice.pump(); // alice learns about bob

    // Alice's authoritative avatar.
    let alice_avatar = Avatar::local(alice.id(), "alice");
    let alice_rig = shared_rig();
    let mut alice_hat = cosmetic_engine(
        CosmeticKind::Hat,
        alice_avatar.peer,
        alice_avatar.is_local,
        hat_catalogue(),
        hat_applier(alice_rig.clone()),
    );
    let mut alice_texture = cosmetic_engine(
        CosmeticKind::Texture,
        alice_avatar.peer,
        alice_avatar.is_local,
        texture_catalogue(),
        texture_applier(alice_rig.clone()),
    );
    let alice_events = alice.subscribe();
    let alice_receiver = CosmeticChangeReceiver::new(alice.id());

    // Bob's remote mirror of alice.
    let mirror_avatar = Avatar::remote(alice.id(), "alice");
    let mirror_rig = shared_rig();
    let mut mirror_hat = cosmetic_engine(
        CosmeticKind::Hat,
        mirror_avatar.peer,
        mirror_avatar.is_local,
        hat_catalogue(),
        hat_applier(mirror_rig.clone()),
    );
    let mut mirror_texture = cosmetic_engine(
        CosmeticKind::Texture,
        mirror_avatar.peer,
        mirror_avatar.is_local,
        texture_catalogue(),
        texture_applier(mirror_rig.clone()),
    );
    let bob_events = bob.subscribe();

    // Spawn defaults: first hat, texture per settings (saved choice or
    // costume roulette).
    alice_hat.initialize(&mut alice);
    match settings.initial_texture_index(alice_texture.catalogue().len()) {
        Some(index) => alice_texture.set_index(&mut alice, index)?,
        None => alice_texture.initialize(&mut alice),
    }

    // Alice changes her mind about the hat.
    alice_hat.set_option(&mut alice, &"crown".to_string())?;
    for event in alice_events.drain() {
        alice_hat.handle_event(&event);
        alice_texture.handle_event(&event);
    }

    bob.pump();
    for event in bob_events.drain() {
        mirror_hat.handle_event(&event);
        mirror_texture.handle_event(&event);
    }
    info!(
        hat = ?mirror_rig.borrow().active_hat,
        texture = ?mirror_rig.borrow().texture,
        "bob's view of alice after sync"
    );

    // Bob grabs the hat gun and shoots alice; she swaps to the requested hat
    // herself, and the change replicates back like any other.
    let mut gun = RaycastGun::new(CosmeticKind::Hat, 100.0);
    gun.grab(&mut bob)?;
    let hit = HitTarget {
        peer: alice.id(),
        point: Vec3::new(2.0, 1.6, 0.0),
        option_count: mirror_hat.catalogue().len(),
        current_index: mirror_hat.current_index(),
    };
    gun.fire(&mut bob, Vec3::new(0.0, 1.6, 0.0), Vec3::X, Some(&hit))?;

    alice.pump();
    for event in alice_events.drain() {
        alice_receiver.handle_event(&event, &mut alice, &mut alice_hat);
        alice_hat.handle_event(&event);
    }

    bob.pump();
    for event in bob_events.drain() {
        mirror_hat.handle_event(&event);
        gun.handle_event(&event);
    }
    info!(
        alice_hat = ?alice_rig.borrow().active_hat,
        bobs_view = ?mirror_rig.borrow().active_hat,
        "after the hat gun"
    );

    // Hat roulette: alice swaps to a random hat she is not already wearing.
    if let Some(index) = alice_hat.catalogue().random_other(alice_hat.current_index()) {
        alice_hat.set_index(&mut alice, index)?;
        bob.pump();
        for event in bob_events.drain() {
            mirror_hat.handle_event(&event);
        }
        info!(bobs_view = ?mirror_rig.borrow().active_hat, "after hat roulette");
    }

    Ok(())
}
