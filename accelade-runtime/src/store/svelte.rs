//! Store backed by a writable holding the whole state

use super::{normalize_state, write_path, ChangeCallback, KeyCallback, Notifier, ReactiveHandle, StateChange, StateStore};
use crate::path::{self, State};
use accelade_reactive::{Unsubscribe, Writable};
use accelade_types::SubstrateId;
use serde_json::Value as Json;
use std::cell::Cell;
use std::rc::Rc;

pub struct SvelteStore {
    writable: Writable<State>,
    notifier: Notifier,
    disposed: Cell<bool>,
}

impl SvelteStore {
    pub fn new() -> Self {
        Self {
            writable: Writable::new(State::new()),
            notifier: Notifier::new(),
            disposed: Cell::new(false),
        }
    }
}

impl Default for SvelteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for SvelteStore {
    fn substrate(&self) -> SubstrateId {
        SubstrateId::Svelte
    }

    fn init(&self, initial: State) {
        self.disposed.set(false);
        self.writable.set(normalize_state(initial));
    }

    fn get(&self, path: &str) -> Option<Json> {
        path::get_path(&self.writable.get(), path).cloned()
    }

    fn set(&self, path: &str, value: Json) -> bool {
        if self.disposed.get() {
            return false;
        }
        let mut next = self.writable.get();
        let Some(change) = write_path(&mut next, path, value) else {
            return false;
        };
        self.writable.set(next);
        self.notifier.notify(&change);
        true
    }

    /// One `set` on the writable, so subscribers see a single new value
    fn set_many(&self, updates: State) {
        if self.disposed.get() {
            return;
        }
        let mut next = self.writable.get();
        let changes: Vec<StateChange> = updates
            .into_iter()
            .filter_map(|(key, value)| write_path(&mut next, &key, value))
            .collect();
        if changes.is_empty() {
            return;
        }
        self.writable.set(next);
        self.notifier.notify_all(&changes);
    }

    fn subscribe(&self, callback: Rc<ChangeCallback>) -> Unsubscribe {
        self.notifier.subscribe(callback)
    }

    fn subscribe_key(&self, key: &str, callback: Rc<KeyCallback>) -> Unsubscribe {
        self.notifier.subscribe_key(key, callback)
    }

    fn get_state(&self) -> State {
        self.writable.get()
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.notifier.clear();
        self.writable.close();
        self.writable.set(State::new());
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    fn reactive_handle(&self) -> ReactiveHandle {
        ReactiveHandle::Writable(self.writable.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn test_writable_subscribers_get_whole_state() {
        let store = SvelteStore::new();
        let mut initial = State::new();
        initial.insert("count".into(), json!(0));
        store.init(initial);

        let ReactiveHandle::Writable(writable) = store.reactive_handle() else {
            panic!("expected a writable handle");
        };
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _handle = writable.subscribe(move |state: &State| {
            s.borrow_mut().push(state.get("count").cloned())
        });

        store.set("count", json!(1));
        let mut updates = State::new();
        updates.insert("count".into(), json!(2));
        updates.insert("label".into(), json!("two"));
        store.set_many(updates);

        assert_eq!(
            *seen.borrow(),
            vec![Some(json!(0)), Some(json!(1)), Some(json!(2))]
        );
    }
}
