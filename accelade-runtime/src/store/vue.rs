//! Store backed by a dependency-tracked reactive object
//!
//! Reads through [`ReactiveObject`] register the running effect on the
//! top-level key they touch; writes trigger that key. A binding effect that
//! read `user.name` therefore re-runs for any write under `user`, and
//! nothing else.

use super::{normalize_state, write_path, ChangeCallback, KeyCallback, Notifier, ReactiveHandle, StateChange, StateStore};
use crate::expr::Scope;
use crate::path::{self, State};
use accelade_reactive::{batch, Dep, Unsubscribe};
use accelade_types::SubstrateId;
use serde_json::Value as Json;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
struct ReactiveInner {
    state: RefCell<State>,
    deps: RefCell<HashMap<String, Dep>>,
}

/// State object with per-key dependency tracking
#[derive(Clone, Default)]
pub struct ReactiveObject {
    inner: Rc<ReactiveInner>,
}

impl ReactiveObject {
    pub fn new(state: State) -> Self {
        let object = Self::default();
        *object.inner.state.borrow_mut() = normalize_state(state);
        object
    }

    /// Deps are created on first use, so reads of missing keys are tracked too
    fn dep(&self, key: &str) -> Dep {
        self.inner
            .deps
            .borrow_mut()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Tracked read of a dotted path
    pub fn get(&self, path: &str) -> Option<Json> {
        self.dep(path::root_key(path)).track();
        self.peek(path)
    }

    /// Untracked read of a dotted path
    pub fn peek(&self, path: &str) -> Option<Json> {
        path::get_path(&self.inner.state.borrow(), path).cloned()
    }

    /// Write without notifying store subscribers; triggers the key's dep
    pub fn set(&self, path: &str, value: Json) -> Option<StateChange> {
        let change = write_path(&mut self.inner.state.borrow_mut(), path, value)?;
        self.dep(path::root_key(path)).trigger();
        Some(change)
    }

    /// Replace every key, triggering each dep once
    pub fn replace(&self, state: State) {
        *self.inner.state.borrow_mut() = normalize_state(state);
        let deps: Vec<Dep> = self.inner.deps.borrow().values().cloned().collect();
        batch(|| deps.iter().for_each(Dep::trigger));
    }

    pub fn snapshot(&self) -> State {
        self.inner.state.borrow().clone()
    }

    /// Number of keys with a dep allocated
    pub fn tracked_key_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }
}

impl Scope for ReactiveObject {
    fn lookup(&self, name: &str) -> Option<Json> {
        self.dep(name).track();
        self.inner.state.borrow().get(name).cloned()
    }
}

pub struct VueStore {
    object: ReactiveObject,
    notifier: Notifier,
    disposed: Cell<bool>,
}

impl VueStore {
    pub fn new() -> Self {
        Self {
            object: ReactiveObject::default(),
            notifier: Notifier::new(),
            disposed: Cell::new(false),
        }
    }
}

impl Default for VueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for VueStore {
    fn substrate(&self) -> SubstrateId {
        SubstrateId::Vue
    }

    fn init(&self, initial: State) {
        self.disposed.set(false);
        self.object.replace(initial);
    }

    fn get(&self, path: &str) -> Option<Json> {
        self.object.peek(path)
    }

    fn set(&self, path: &str, value: Json) -> bool {
        if self.disposed.get() {
            return false;
        }
        match self.object.set(path, value) {
            Some(change) => {
                self.notifier.notify(&change);
                true
            }
            None => false,
        }
    }

    /// Effects triggered by the updates run once, after the last one
    fn set_many(&self, updates: State) {
        if self.disposed.get() {
            return;
        }
        batch(|| {
            let changes: Vec<StateChange> = updates
                .into_iter()
                .filter_map(|(key, value)| self.object.set(&key, value))
                .collect();
            self.notifier.notify_all(&changes);
        });
    }

    fn subscribe(&self, callback: Rc<ChangeCallback>) -> Unsubscribe {
        self.notifier.subscribe(callback)
    }

    fn subscribe_key(&self, key: &str, callback: Rc<KeyCallback>) -> Unsubscribe {
        self.notifier.subscribe_key(key, callback)
    }

    fn get_state(&self) -> State {
        self.object.snapshot()
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.notifier.clear();
        *self.object.inner.state.borrow_mut() = State::new();
        self.object.inner.deps.borrow_mut().clear();
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    fn reactive_handle(&self) -> ReactiveHandle {
        ReactiveHandle::Reactive(self.object.clone())
    }
}
