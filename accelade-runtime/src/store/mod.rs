//! Component state stores
//!
//! A store owns the state of one component instance. Every substrate has
//! its own store, built on that substrate's change-notification model, but
//! all of them present the same [`StateStore`] contract:
//!
//! - dotted-path `get`/`set`, where `set` creates intermediate objects and
//!   reports whether anything changed
//! - `set_many`, which applies every update before notifying
//! - general and key-scoped subscriptions with idempotent unsubscribe
//! - a substrate-native [`ReactiveHandle`] that only the matching binding
//!   controller consumes
//!
//! Writing a value equal to the current one notifies nobody.

mod angular;
mod react;
mod svelte;
mod vanilla;
mod vue;

pub use angular::{AngularStore, SignalState};
pub use react::ReactStore;
pub use svelte::SvelteStore;
pub use vanilla::{StateProxy, VanillaStore};
pub use vue::{ReactiveObject, VueStore};

use crate::path::{self, State};
use accelade_reactive::{ExternalStore, KeyedSubscribers, SubscriberList, Unsubscribe, Writable};
use accelade_types::SubstrateId;
use serde_json::Value as Json;
use std::rc::Rc;

/// One observed change; `None` stands for a missing value
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    /// The path exactly as it was written
    pub key: String,
    pub new_value: Option<Json>,
    pub old_value: Option<Json>,
}

/// General subscriber: sees every change
pub type ChangeCallback = dyn Fn(&StateChange);

/// Key-scoped subscriber: `(new, old)` for one key
pub type KeyCallback = dyn Fn(Option<&Json>, Option<&Json>);

/// The substrate-native reactive object behind a store
#[derive(Clone)]
pub enum ReactiveHandle {
    Proxy(StateProxy),
    Reactive(ReactiveObject),
    External(ExternalStore<State>),
    Writable(Writable<State>),
    Signals(SignalState),
}

impl ReactiveHandle {
    pub fn substrate(&self) -> SubstrateId {
        match self {
            ReactiveHandle::Proxy(_) => SubstrateId::Vanilla,
            ReactiveHandle::Reactive(_) => SubstrateId::Vue,
            ReactiveHandle::External(_) => SubstrateId::React,
            ReactiveHandle::Writable(_) => SubstrateId::Svelte,
            ReactiveHandle::Signals(_) => SubstrateId::Angular,
        }
    }
}

impl std::fmt::Debug for ReactiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReactiveHandle")
            .field(&self.substrate())
            .finish()
    }
}

/// State container contract shared by every substrate
pub trait StateStore {
    fn substrate(&self) -> SubstrateId;

    /// Replace the state with a copy of `initial` and rebuild the handle
    fn init(&self, initial: State);

    /// Read a dotted path; `None` when any segment is missing
    fn get(&self, path: &str) -> Option<Json>;

    /// Write a dotted path; returns whether the state changed
    fn set(&self, path: &str, value: Json) -> bool;

    /// Apply every update in order, then notify
    fn set_many(&self, updates: State);

    fn subscribe(&self, callback: Rc<ChangeCallback>) -> Unsubscribe;

    fn subscribe_key(&self, key: &str, callback: Rc<KeyCallback>) -> Unsubscribe;

    /// Detached snapshot of the whole state
    fn get_state(&self) -> State;

    fn has(&self, key: &str) -> bool {
        self.get_state().contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.get_state().keys().cloned().collect()
    }

    /// Drop all subscribers and the state; later writes are ignored
    fn dispose(&self);

    fn is_disposed(&self) -> bool;

    fn reactive_handle(&self) -> ReactiveHandle;
}

/// Create the store for `substrate`
pub fn create_store(substrate: SubstrateId) -> Rc<dyn StateStore> {
    match substrate {
        SubstrateId::Vanilla => Rc::new(VanillaStore::new()),
        SubstrateId::Vue => Rc::new(VueStore::new()),
        SubstrateId::React => Rc::new(ReactStore::new()),
        SubstrateId::Svelte => Rc::new(SvelteStore::new()),
        SubstrateId::Angular => Rc::new(AngularStore::new()),
    }
}

// ===== Shared plumbing =====

/// Subscriber registry used by every store
#[derive(Clone, Default)]
pub struct Notifier {
    general: SubscriberList<ChangeCallback>,
    keyed: KeyedSubscribers<KeyCallback>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: Rc<ChangeCallback>) -> Unsubscribe {
        self.general.add(callback)
    }

    pub fn subscribe_key(&self, key: &str, callback: Rc<KeyCallback>) -> Unsubscribe {
        self.keyed.add(key, callback)
    }

    /// General subscribers first, then the subscribers of `change.key`
    pub fn notify(&self, change: &StateChange) {
        self.general.notify(|callback| callback(change));
        self.keyed.notify(&change.key, |callback| {
            callback(change.new_value.as_ref(), change.old_value.as_ref())
        });
    }

    pub fn notify_all(&self, changes: &[StateChange]) {
        for change in changes {
            self.notify(change);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.general.len()
    }

    pub fn key_subscriber_count(&self, key: &str) -> usize {
        self.keyed.count(key)
    }

    pub fn clear(&self) {
        self.general.clear();
        self.keyed.clear();
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("general", &self.general.len())
            .field("keys", &self.keyed.key_count())
            .finish()
    }
}

/// Write `value` at `path` inside `state`
///
/// Returns the change, or `None` when the stored value already equals
/// `value`.
pub(crate) fn write_path(state: &mut State, path: &str, value: Json) -> Option<StateChange> {
    let value = path::normalize(value);
    if path::get_path(state, path) == Some(&value) {
        return None;
    }
    let old_value = path::set_path(state, path, value.clone());
    Some(StateChange {
        key: path.to_string(),
        new_value: Some(value),
        old_value,
    })
}

/// Normalize a full initial state
pub(crate) fn normalize_state(state: State) -> State {
    state
        .into_iter()
        .map(|(key, value)| (key, path::normalize(value)))
        .collect()
}
