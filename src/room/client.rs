//! In-process room substrate.
//!
//! [`RoomBus`] is a full-mesh fanout connecting every [`RoomClient`] that
//! joined it. Delivery is deterministic and single-threaded: envelopes queue
//! in each client's inbox until the owner calls [`RoomClient::pump`], which
//! applies them to the local view of remote peers and fans [`RoomEvent`]s out
//! to scoped subscriptions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use tracing::{debug, warn};

use crate::room::events::RoomEvent;
use crate::room::peer::{Peer, PeerId};
use crate::room::{RoomError, RoomResult};
use crate::sync::engine::PropertyPublisher;

/// Envelope routed between clients on the bus.
#[derive(Debug, Clone)]
enum Envelope {
    Joined { peer: PeerId, name: String },
    Left { peer: PeerId },
    Property { peer: PeerId, key: String, value: String },
    Message { sender: PeerId, payload: String },
}

struct RosterEntry {
    peer: PeerId,
    name: String,
    tx: Sender<Envelope>,
}

type Roster = Arc<RwLock<Vec<RosterEntry>>>;

/// Shared roster of everyone in the room. Cheap to clone; clients keep a
/// handle so they can broadcast without going through a central pump.
#[derive(Clone, Default)]
pub struct RoomBus {
    roster: Roster,
}

impl RoomBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the room under a display name, returning the client for the new
    /// peer. Existing members learn about the newcomer on their next pump and
    /// replay their current property state to it.
    pub fn join(&self, name: impl Into<String>) -> RoomClient {
        let name = name.into();
        let id = PeerId::new();
        let (tx, inbox) = unbounded();

        // Members who joined earlier are known immediately; their property
        // state arrives via replay once they observe the join.
        let mut peers = HashMap::new();
        {
            let mut roster = self.roster.write().expect("room roster lock poisoned");
            for entry in roster.iter() {
                let _ = entry.tx.send(Envelope::Joined {
                    peer: id,
                    name: name.clone(),
                });
                peers.insert(entry.peer, Peer::new(entry.peer, entry.name.clone()));
            }
            roster.push(RosterEntry {
                peer: id,
                name: name.clone(),
                tx,
            });
        }

        debug!(peer = %id, name = %name, "peer joined room");

        RoomClient {
            me: Peer::new(id, name),
            peers,
            roster: self.roster.clone(),
            inbox,
            subscribers: Vec::new(),
            in_room: true,
        }
    }

    pub fn peer_count(&self) -> usize {
        self.roster.read().expect("room roster lock poisoned").len()
    }
}

/// Drain-style handle for room events. Dropping it deregisters the
/// subscription; the owning client prunes the dead channel on its next
/// dispatch.
pub struct RoomEvents {
    rx: Receiver<RoomEvent>,
}

impl RoomEvents {
    /// Take every event queued since the last drain, in arrival order.
    pub fn drain(&self) -> Vec<RoomEvent> {
        self.rx.try_iter().collect()
    }
}

/// One participant's connection to the room.
///
/// Owns the local peer's property bag (`me`) and a view of every remote
/// peer's bag, kept current by [`pump`](RoomClient::pump).
pub struct RoomClient {
    me: Peer,
    peers: HashMap<PeerId, Peer>,
    roster: Roster,
    inbox: Receiver<Envelope>,
    subscribers: Vec<Sender<RoomEvent>>,
    in_room: bool,
}

impl RoomClient {
    pub fn id(&self) -> PeerId {
        self.me.id
    }

    /// The local peer ("Me"). Writes go through
    /// [`set_property`](Self::set_property) so they replicate.
    pub fn me(&self) -> &Peer {
        &self.me
    }

    /// Local view of a remote peer, if we have heard from it.
    pub fn peer(&self, id: PeerId) -> Option<&Peer> {
        self.peers.get(&id)
    }

    pub fn remote_peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    /// Set a property on the local peer and replicate it to the room.
    ///
    /// The update is also echoed to local subscribers, mirroring how the
    /// room server reflects a peer's own update back to it; sync engines
    /// rely on duplicate suppression to make the echo a no-op.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        self.me.set(key.clone(), value.clone());

        self.broadcast(Envelope::Property {
            peer: self.me.id,
            key: key.clone(),
            value: value.clone(),
        });

        let echo = RoomEvent::PeerUpdated {
            peer: self.me.id,
            key,
            value,
        };
        self.dispatch(echo);
    }

    /// Broadcast an ephemeral message to every other peer. Not persisted;
    /// peers that join later never see it.
    pub fn send_message(&mut self, payload: impl Into<String>) {
        self.broadcast(Envelope::Message {
            sender: self.me.id,
            payload: payload.into(),
        });
    }

    /// Serialize a message struct to JSON and broadcast it.
    pub fn send_json<T: Serialize>(&mut self, message: &T) -> RoomResult<()> {
        let payload = serde_json::to_string(message).map_err(|e| RoomError::Encode {
            reason: e.to_string(),
        })?;
        self.send_message(payload);
        Ok(())
    }

    /// Register for room events. The subscription stays live until the
    /// returned handle is dropped.
    pub fn subscribe(&mut self) -> RoomEvents {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        RoomEvents { rx }
    }

    /// Drain the inbox: apply remote updates to the local peer views and fan
    /// the resulting events out to subscribers. Call once per frame/tick.
    pub fn pump(&mut self) {
        let pending: Vec<Envelope> = self.inbox.try_iter().collect();
        for envelope in pending {
            match envelope {
                Envelope::Joined { peer, name } => {
                    self.peers.insert(peer, Peer::new(peer, name.clone()));
                    self.replay_properties_to(peer);
                    self.dispatch(RoomEvent::PeerJoined { peer, name });
                }
                Envelope::Left { peer } => {
                    self.peers.remove(&peer);
                    self.dispatch(RoomEvent::PeerLeft { peer });
                }
                Envelope::Property { peer, key, value } => {
                    self.peers
                        .entry(peer)
                        .or_insert_with(|| Peer::new(peer, String::new()))
                        .set(key.clone(), value.clone());
                    self.dispatch(RoomEvent::PeerUpdated { peer, key, value });
                }
                Envelope::Message { sender, payload } => {
                    self.dispatch(RoomEvent::Message { sender, payload });
                }
            }
        }
    }

    /// Leave the room, announcing the departure to the remaining peers.
    /// Also runs on drop, so teardown is deterministic regardless of exit
    /// path.
    pub fn leave(&mut self) {
        if !self.in_room {
            return;
        }
        self.in_room = false;

        let id = self.me.id;
        self.broadcast(Envelope::Left { peer: id });

        let mut roster = self.roster.write().expect("room roster lock poisoned");
        roster.retain(|entry| entry.peer != id);
        debug!(peer = %id, "peer left room");
    }

    /// Send our full property bag directly to a newcomer so it starts from
    /// current state rather than waiting for the next change.
    fn replay_properties_to(&self, joiner: PeerId) {
        let roster = self.roster.read().expect("room roster lock poisoned");
        let Some(entry) = roster.iter().find(|entry| entry.peer == joiner) else {
            warn!(peer = %joiner, "joiner missing from roster, skipping state replay");
            return;
        };
        for (key, value) in self.me.properties() {
            let _ = entry.tx.send(Envelope::Property {
                peer: self.me.id,
                key: key.to_string(),
                value: value.to_string(),
            });
        }
    }

    fn broadcast(&self, envelope: Envelope) {
        let roster = self.roster.read().expect("room roster lock poisoned");
        for entry in roster.iter().filter(|entry| entry.peer != self.me.id) {
            let _ = entry.tx.send(envelope.clone());
        }
    }

    fn dispatch(&mut self, event: RoomEvent) {
        // Dropped subscriptions show up as failed sends; prune them here.
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Drop for RoomClient {
    fn drop(&mut self) {
        self.leave();
    }
}

impl PropertyPublisher for RoomClient {
    fn publish(&mut self, key: &str, value: &str) {
        self.set_property(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_replication() {
        let bus = RoomBus::new();
        let mut alice = bus.join("alice");
        let mut bob = bus.join("bob");
        alice.pump(); // observe bob joining

        alice.set_property("simple-hat-avatar", r#"{"index":1}"#);
        bob.pump();

        let view = bob.peer(alice.id()).expect("bob should know alice");
        assert_eq!(view.get("simple-hat-avatar"), Some(r#"{"index":1}"#));
    }

    #[test]
    fn test_late_joiner_receives_state_replay() {
        let bus = RoomBus::new();
        let mut alice = bus.join("alice");
        alice.set_property("simple-color-avatar", r#"{"index":4}"#);

        let mut carol = bus.join("carol");
        alice.pump(); // alice sees carol join and replays her properties
        carol.pump();

        let view = carol.peer(alice.id()).expect("carol should know alice");
        assert_eq!(view.get("simple-color-avatar"), Some(r#"{"index":4}"#));
    }

    #[test]
    fn test_own_updates_echo_to_subscribers() {
        let bus = RoomBus::new();
        let mut alice = bus.join("alice");
        let events = alice.subscribe();

        alice.set_property("simple-hat-avatar", r#"{"index":0}"#);

        let drained = events.drain();
        assert_eq!(drained.len(), 1);
        assert!(matches!(
            &drained[0],
            RoomEvent::PeerUpdated { peer, key, .. }
                if *peer == alice.id() && key == "simple-hat-avatar"
        ));
    }

    #[test]
    fn test_messages_are_not_persisted() {
        let bus = RoomBus::new();
        let mut alice = bus.join("alice");
        let mut bob = bus.join("bob");
        alice.pump();

        alice.send_message(r#"{"is_firing":true}"#);
        let bob_events = bob.subscribe();
        bob.pump();

        let drained = bob_events.drain();
        assert!(drained
            .iter()
            .any(|e| matches!(e, RoomEvent::Message { .. })));

        // Nothing landed in the property bag.
        let view = bob.peer(alice.id()).expect("bob should know alice");
        assert_eq!(view.property_count(), 0);
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let bus = RoomBus::new();
        let mut alice = bus.join("alice");

        let events = alice.subscribe();
        drop(events);

        alice.set_property("simple-hat-avatar", r#"{"index":0}"#);
        assert!(alice.subscribers.is_empty());
    }

    #[test]
    fn test_leave_announces_departure() {
        let bus = RoomBus::new();
        let mut alice = bus.join("alice");
        let mut bob = bus.join("bob");
        alice.pump();
        bob.pump();

        let bob_events = bob.subscribe();
        alice.leave();
        bob.pump();

        assert!(bob_events
            .drain()
            .iter()
            .any(|e| matches!(e, RoomEvent::PeerLeft { .. })));
        assert_eq!(bus.peer_count(), 1);
    }
}
