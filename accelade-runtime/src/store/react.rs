//! Store backed by an immutable-snapshot external store
//!
//! Every write publishes a fresh `State` snapshot. Snapshot listeners carry
//! no payload and re-read the snapshot; a `set_many` publishes one snapshot
//! and wakes them once.

use super::{normalize_state, write_path, ChangeCallback, KeyCallback, Notifier, ReactiveHandle, StateChange, StateStore};
use crate::path::{self, State};
use accelade_reactive::{ExternalStore, Unsubscribe};
use accelade_types::SubstrateId;
use serde_json::Value as Json;
use std::cell::Cell;
use std::rc::Rc;

pub struct ReactStore {
    external: ExternalStore<State>,
    notifier: Notifier,
    disposed: Cell<bool>,
}

impl ReactStore {
    pub fn new() -> Self {
        Self {
            external: ExternalStore::new(State::new()),
            notifier: Notifier::new(),
            disposed: Cell::new(false),
        }
    }

    /// Number of published snapshots
    pub fn version(&self) -> u64 {
        self.external.version()
    }
}

impl Default for ReactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for ReactStore {
    fn substrate(&self) -> SubstrateId {
        SubstrateId::React
    }

    fn init(&self, initial: State) {
        self.disposed.set(false);
        self.external.set_snapshot(normalize_state(initial));
    }

    fn get(&self, path: &str) -> Option<Json> {
        path::get_path(&self.external.get_snapshot(), path).cloned()
    }

    fn set(&self, path: &str, value: Json) -> bool {
        if self.disposed.get() {
            return false;
        }
        let mut next = (*self.external.get_snapshot()).clone();
        let Some(change) = write_path(&mut next, path, value) else {
            return false;
        };
        self.external.set_snapshot(next);
        self.notifier.notify(&change);
        true
    }

    fn set_many(&self, updates: State) {
        if self.disposed.get() {
            return;
        }
        let mut next = (*self.external.get_snapshot()).clone();
        let changes: Vec<StateChange> = updates
            .into_iter()
            .filter_map(|(key, value)| write_path(&mut next, &key, value))
            .collect();
        if changes.is_empty() {
            return;
        }
        self.external.batch(|| self.external.set_snapshot(next));
        self.notifier.notify_all(&changes);
    }

    fn subscribe(&self, callback: Rc<ChangeCallback>) -> Unsubscribe {
        self.notifier.subscribe(callback)
    }

    fn subscribe_key(&self, key: &str, callback: Rc<KeyCallback>) -> Unsubscribe {
        self.notifier.subscribe_key(key, callback)
    }

    fn get_state(&self) -> State {
        (*self.external.get_snapshot()).clone()
    }

    fn has(&self, key: &str) -> bool {
        self.external.get_snapshot().contains_key(key)
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.notifier.clear();
        self.external.close();
        self.external.set_snapshot(State::new());
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    fn reactive_handle(&self) -> ReactiveHandle {
        ReactiveHandle::External(self.external.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_many_publishes_one_snapshot() {
        let store = ReactStore::new();
        store.init(State::new());
        let ReactiveHandle::External(external) = store.reactive_handle() else {
            panic!("expected an external store handle");
        };
        let wakeups = Rc::new(Cell::new(0));
        let w = wakeups.clone();
        let _handle = external.subscribe(move || w.set(w.get() + 1));

        let before = store.version();
        let mut updates = State::new();
        updates.insert("a".into(), json!(1));
        updates.insert("b".into(), json!(2));
        updates.insert("c".into(), json!(3));
        store.set_many(updates);

        assert_eq!(wakeups.get(), 1);
        assert_eq!(store.version(), before + 1);
        assert_eq!(external.get_snapshot().len(), 3);
    }

    #[test]
    fn test_old_snapshots_are_untouched() {
        let store = ReactStore::new();
        store.init(State::new());
        let ReactiveHandle::External(external) = store.reactive_handle() else {
            panic!("expected an external store handle");
        };
        let before = external.get_snapshot();
        store.set("n", json!(1));
        assert!(before.is_empty());
        assert_eq!(external.get_snapshot().get("n"), Some(&json!(1)));
    }
}
