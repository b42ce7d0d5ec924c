//! The generic property sync engine.
//!
//! One engine instance owns one named cosmetic attribute of one avatar
//! instance. The local (authoritative) instance originates changes by
//! publishing a serialized catalogue index to the owning peer's property
//! map; every instance, local and remote, applies updates for that key
//! through the same path. Duplicate payloads are suppressed by comparing the
//! raw token, which also absorbs the echo of a just-sent local update.

use tracing::{debug, warn};

use crate::room::events::RoomEvent;
use crate::room::messages::IndexPayload;
use crate::room::peer::PeerId;
use crate::sync::catalogue::Catalogue;
use crate::sync::{SyncError, SyncResult};

/// Sink for published property values. Implemented by `RoomClient`; tests
/// substitute a recorder.
pub trait PropertyPublisher {
    fn publish(&mut self, key: &str, value: &str);
}

/// Maps a resolved catalogue option to a concrete visual side effect
/// (activate an object, assign a material, swap a texture). Supplied by the
/// surrounding application; the engine only sequences the calls.
pub trait Applier<O> {
    fn apply(&mut self, index: usize, option: &O) -> SyncResult<()>;
}

impl<O, F> Applier<O> for F
where
    F: FnMut(usize, &O) -> SyncResult<()>,
{
    fn apply(&mut self, index: usize, option: &O) -> SyncResult<()> {
        self(index, option)
    }
}

/// What a freshly spawned local instance selects when nothing is set yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultPolicy {
    /// Leave the attribute unset until someone picks a value.
    #[default]
    None,
    /// First catalogue entry.
    First,
    /// Uniformly random entry (costume roulette on spawn).
    Random,
}

/// Keeps one named visual attribute consistent between the authoritative
/// instance and all remote observers of the same peer.
pub struct PropertySyncEngine<O> {
    key: String,
    peer: PeerId,
    is_local: bool,
    catalogue: Catalogue<O>,
    applier: Box<dyn Applier<O>>,
    default_policy: DefaultPolicy,
    current_index: Option<usize>,
    // Raw token of the last payload we processed. Purely for duplicate
    // suppression; not a version number.
    last_applied: Option<String>,
}

impl<O> PropertySyncEngine<O> {
    pub fn new(
        key: impl Into<String>,
        peer: PeerId,
        is_local: bool,
        catalogue: Catalogue<O>,
        applier: impl Applier<O> + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            peer,
            is_local,
            catalogue,
            applier: Box::new(applier),
            default_policy: DefaultPolicy::default(),
            current_index: None,
            last_applied: None,
        }
    }

    pub fn with_default_policy(mut self, policy: DefaultPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_option(&self) -> Option<&O> {
        self.current_index.and_then(|i| self.catalogue.get(i))
    }

    pub fn catalogue(&self) -> &Catalogue<O> {
        &self.catalogue
    }

    /// Activate a catalogue entry and replicate the choice.
    ///
    /// Only valid on the authoritative instance; remote copies do not
    /// control this avatar. The option must be a member of the catalogue.
    /// This is the only path by which a change may originate.
    pub fn set_option(&mut self, room: &mut dyn PropertyPublisher, option: &O) -> SyncResult<()>
    where
        O: PartialEq,
    {
        if !self.is_local {
            warn!(key = %self.key, "ignoring set_option on a remote avatar copy");
            return Err(SyncError::NotAuthoritative);
        }

        let Some(index) = self.catalogue.index_of(option) else {
            warn!(
                key = %self.key,
                "unrecognized option; only options from the pre-determined catalogue can be set"
            );
            return Err(SyncError::InvalidOption);
        };

        self.set_index(room, index)
    }

    /// Activate a catalogue entry by position and replicate the choice.
    pub fn set_index(&mut self, room: &mut dyn PropertyPublisher, index: usize) -> SyncResult<()> {
        if !self.is_local {
            warn!(key = %self.key, "ignoring set_index on a remote avatar copy");
            return Err(SyncError::NotAuthoritative);
        }
        if index >= self.catalogue.len() {
            warn!(key = %self.key, index, len = self.catalogue.len(), "index outside catalogue");
            return Err(SyncError::OutOfRange {
                index: index as i64,
                len: self.catalogue.len(),
            });
        }

        // Apply locally through the same path remote updates take, then
        // publish so remote copies are informed of the change as an event.
        let payload = IndexPayload::new(index).encode();
        self.process(&payload)?;
        room.publish(&self.key, &payload);
        Ok(())
    }

    /// Feed a room event through the engine. Events for other peers or other
    /// keys are ignored; failures are logged and swallowed, leaving the
    /// previous state intact.
    pub fn handle_event(&mut self, event: &RoomEvent) {
        let RoomEvent::PeerUpdated { peer, key, value } = event else {
            return;
        };
        if *peer != self.peer || key != &self.key {
            // The peer being updated is not ours, or the property is not the
            // one we sync. Safe to ignore.
            return;
        }

        if let Err(e) = self.process(value) {
            warn!(key = %self.key, error = %e, "discarding property update");
        }
    }

    /// Run once when the owning instance becomes active: a local instance
    /// with a non-empty catalogue and nothing selected picks a default per
    /// policy and replicates it like any other change.
    pub fn initialize(&mut self, room: &mut dyn PropertyPublisher) {
        if !self.is_local || self.current_index.is_some() || self.catalogue.is_empty() {
            return;
        }

        let index = match self.default_policy {
            DefaultPolicy::None => return,
            DefaultPolicy::First => 0,
            DefaultPolicy::Random => match self.catalogue.random_index() {
                Some(i) => i,
                None => return,
            },
        };

        if let Err(e) = self.set_index(room, index) {
            warn!(key = %self.key, error = %e, "failed to apply default option");
        }
    }

    /// Decode and apply one raw payload. Returns `Ok(false)` when the
    /// payload was empty or a duplicate of the last applied token.
    fn process(&mut self, raw: &str) -> SyncResult<bool> {
        if raw.is_empty() || self.last_applied.as_deref() == Some(raw) {
            return Ok(false);
        }

        let payload = IndexPayload::decode(raw).map_err(|e| SyncError::Payload {
            reason: e.to_string(),
        })?;

        let index = usize::try_from(payload.index).map_err(|_| SyncError::OutOfRange {
            index: payload.index,
            len: self.catalogue.len(),
        })?;
        let Some(option) = self.catalogue.get(index) else {
            return Err(SyncError::OutOfRange {
                index: payload.index,
                len: self.catalogue.len(),
            });
        };

        // Application is universal; only origination is restricted to the
        // local instance.
        self.applier.apply(index, option)?;

        self.current_index = Some(index);
        self.last_applied = Some(raw.to_string());
        debug!(key = %self.key, index, "applied property update");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Publisher that records what would have been replicated.
    #[derive(Default)]
    struct Recorder {
        published: Vec<(String, String)>,
    }

    impl PropertyPublisher for Recorder {
        fn publish(&mut self, key: &str, value: &str) {
            self.published.push((key.to_string(), value.to_string()));
        }
    }

    fn engine_with_log(
        is_local: bool,
    ) -> (PropertySyncEngine<&'static str>, Rc<RefCell<Vec<usize>>>) {
        let applied = Rc::new(RefCell::new(Vec::new()));
        let log = applied.clone();
        let engine = PropertySyncEngine::new(
            "simple-hat-avatar",
            PeerId::new(),
            is_local,
            Catalogue::new(vec!["tophat", "beanie", "crown"]),
            move |index: usize, _option: &&str| {
                log.borrow_mut().push(index);
                Ok(())
            },
        );
        (engine, applied)
    }

    fn update_for<O>(engine: &PropertySyncEngine<O>, value: &str) -> RoomEvent {
        RoomEvent::PeerUpdated {
            peer: engine.peer(),
            key: engine.key().to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_set_option_publishes_index_payload() {
        let (mut engine, applied) = engine_with_log(true);
        let mut room = Recorder::default();

        engine.set_option(&mut room, &"crown").unwrap();

        assert_eq!(engine.current_index(), Some(2));
        assert_eq!(*applied.borrow(), vec![2]);
        assert_eq!(
            room.published,
            vec![("simple-hat-avatar".to_string(), r#"{"index":2}"#.to_string())]
        );
    }

    #[test]
    fn test_unknown_option_is_rejected_without_side_effects() {
        let (mut engine, applied) = engine_with_log(true);
        let mut room = Recorder::default();

        let err = engine.set_option(&mut room, &"fedora").unwrap_err();

        assert_eq!(err, SyncError::InvalidOption);
        assert_eq!(engine.current_index(), None);
        assert!(applied.borrow().is_empty());
        assert!(room.published.is_empty());
    }

    #[test]
    fn test_remote_copy_cannot_originate() {
        let (mut engine, applied) = engine_with_log(false);
        let mut room = Recorder::default();

        let err = engine.set_option(&mut room, &"tophat").unwrap_err();

        assert_eq!(err, SyncError::NotAuthoritative);
        assert_eq!(engine.current_index(), None);
        assert!(applied.borrow().is_empty());
        assert!(room.published.is_empty());
    }

    #[test]
    fn test_remote_copy_applies_updates() {
        let (mut engine, applied) = engine_with_log(false);

        engine.handle_event(&update_for(&engine, r#"{"index":1}"#));

        assert_eq!(engine.current_index(), Some(1));
        assert_eq!(*applied.borrow(), vec![1]);
    }

    #[test]
    fn test_duplicate_payload_is_suppressed() {
        let (mut engine, applied) = engine_with_log(false);
        let event = update_for(&engine, r#"{"index":1}"#);

        engine.handle_event(&event);
        engine.handle_event(&event);

        assert_eq!(*applied.borrow(), vec![1]);
    }

    #[test]
    fn test_out_of_range_update_preserves_state() {
        let (mut engine, applied) = engine_with_log(false);

        engine.handle_event(&update_for(&engine, r#"{"index":2}"#));
        engine.handle_event(&update_for(&engine, r#"{"index":5}"#));
        engine.handle_event(&update_for(&engine, r#"{"index":-1}"#));

        assert_eq!(engine.current_index(), Some(2));
        assert_eq!(*applied.borrow(), vec![2]);
    }

    #[test]
    fn test_empty_payload_is_ignored() {
        let (mut engine, applied) = engine_with_log(false);

        engine.handle_event(&update_for(&engine, ""));

        assert_eq!(engine.current_index(), None);
        assert!(applied.borrow().is_empty());

        // No token was recorded, so a real update still goes through.
        engine.handle_event(&update_for(&engine, r#"{"index":1}"#));
        assert_eq!(engine.current_index(), Some(1));
        assert_eq!(*applied.borrow(), vec![1]);
    }

    #[test]
    fn test_malformed_payload_preserves_state() {
        let (mut engine, applied) = engine_with_log(false);

        engine.handle_event(&update_for(&engine, r#"{"index":0}"#));
        engine.handle_event(&update_for(&engine, "definitely not json"));

        assert_eq!(engine.current_index(), Some(0));
        assert_eq!(*applied.borrow(), vec![0]);
    }

    #[test]
    fn test_events_for_other_peers_and_keys_are_ignored() {
        let (mut engine, applied) = engine_with_log(false);

        engine.handle_event(&RoomEvent::PeerUpdated {
            peer: PeerId::new(), // someone else
            key: engine.key().to_string(),
            value: r#"{"index":1}"#.to_string(),
        });
        engine.handle_event(&RoomEvent::PeerUpdated {
            peer: engine.peer(),
            key: "simple-color-avatar".to_string(),
            value: r#"{"index":1}"#.to_string(),
        });

        assert_eq!(engine.current_index(), None);
        assert!(applied.borrow().is_empty());
    }

    #[test]
    fn test_initialize_selects_first_entry() {
        let (engine, applied) = engine_with_log(true);
        let mut engine = engine.with_default_policy(DefaultPolicy::First);
        let mut room = Recorder::default();

        engine.initialize(&mut room);

        assert_eq!(engine.current_index(), Some(0));
        assert_eq!(*applied.borrow(), vec![0]);
        assert_eq!(room.published[0].1, r#"{"index":0}"#);

        // A second initialize is a no-op: something is already set.
        engine.initialize(&mut room);
        assert_eq!(room.published.len(), 1);
    }

    #[test]
    fn test_initialize_random_policy_applies_and_publishes_in_bounds_index() {
        let (engine, applied) = engine_with_log(true);
        let mut engine = engine.with_default_policy(DefaultPolicy::Random);
        let mut room = Recorder::default();

        engine.initialize(&mut room);

        let index = engine.current_index().expect("roulette picked an entry");
        assert!(index < engine.catalogue().len());
        assert_eq!(*applied.borrow(), vec![index]);
        assert_eq!(
            room.published,
            vec![(
                "simple-hat-avatar".to_string(),
                format!(r#"{{"index":{index}}}"#)
            )]
        );
    }

    #[test]
    fn test_initialize_respects_none_policy_and_remote_copies() {
        let (mut engine, _) = engine_with_log(true);
        let mut room = Recorder::default();
        engine.initialize(&mut room);
        assert!(room.published.is_empty());

        let (engine, _) = engine_with_log(false);
        let mut engine = engine.with_default_policy(DefaultPolicy::First);
        engine.initialize(&mut room);
        assert!(room.published.is_empty());
    }

    #[test]
    fn test_failed_applier_leaves_state_for_self_correction() {
        let mut engine = PropertySyncEngine::new(
            "simple-material-avatar",
            PeerId::new(),
            false,
            Catalogue::new(vec!["brick", "wood"]),
            |_index: usize, option: &&str| {
                if *option == "wood" {
                    Err(SyncError::MissingTarget {
                        reason: "no renderer for wood".to_string(),
                    })
                } else {
                    Ok(())
                }
            },
        );

        engine.handle_event(&update_for(&engine, r#"{"index":1}"#));
        assert_eq!(engine.current_index(), None);

        // The token was not recorded, so a repeat of the same payload gets a
        // fresh chance to apply once the target exists.
        engine.handle_event(&update_for(&engine, r#"{"index":0}"#));
        assert_eq!(engine.current_index(), Some(0));
    }
}
