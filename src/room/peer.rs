use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identity of a room participant.
///
/// Every client mints one on join; it travels with every property update and
/// broadcast message so receivers can route events to the right avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PeerId(pub Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A room participant: identity plus a string-keyed property bag.
///
/// Properties are the only persistent per-peer state the room carries. Each
/// cosmetic sync channel writes its serialized payload under a fixed key;
/// remote clients keep a `Peer` view per participant and update it as
/// property-change events arrive.
#[derive(Debug, Clone)]
pub struct Peer {
    pub id: PeerId,
    pub name: String,
    properties: HashMap<String, String>,
}

impl Peer {
    pub fn new(id: PeerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    /// Read a property. Absent keys read as `None`, matching the "empty
    /// value" case sync engines treat as a no-op.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Write a property, returning the previous value if any.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.properties.insert(key.into(), value.into())
    }

    /// Snapshot of all properties, used to replay state to late joiners.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}
