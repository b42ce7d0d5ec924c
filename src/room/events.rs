use crate::room::peer::PeerId;

/// Events delivered from the room layer to the application.
/// These are clean, application-friendly data structures; sync engines
/// consume `PeerUpdated`, the gun plumbing consumes `Message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// A peer joined the room.
    PeerJoined { peer: PeerId, name: String },

    /// A peer left the room (or its client was dropped).
    PeerLeft { peer: PeerId },

    /// One entry in a peer's property bag changed. Carries the new raw value
    /// so consumers never have to re-read the bag; last-write-wins.
    PeerUpdated {
        peer: PeerId,
        key: String,
        value: String,
    },

    /// An ephemeral broadcast message. Not persisted anywhere; peers that
    /// join later never see it.
    Message { sender: PeerId, payload: String },
}

impl RoomEvent {
    /// The peer this event concerns (the sender, for broadcast messages).
    pub fn peer(&self) -> PeerId {
        match self {
            RoomEvent::PeerJoined { peer, .. } => *peer,
            RoomEvent::PeerLeft { peer } => *peer,
            RoomEvent::PeerUpdated { peer, .. } => *peer,
            RoomEvent::Message { sender, .. } => *sender,
        }
    }

    pub fn is_property_update(&self) -> bool {
        matches!(self, RoomEvent::PeerUpdated { .. })
    }
}
