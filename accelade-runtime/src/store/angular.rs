//! Store backed by one signal per top-level key
//!
//! [`SignalState`] keeps a [`Signal`] for every top-level key, in insertion
//! order, plus an aggregate [`BehaviorSubject`] carrying the whole state.
//! Reading a missing key tracks the key set, so an effect that looked for
//! a key re-runs when that key is first written.

use super::{normalize_state, write_path, ChangeCallback, KeyCallback, Notifier, ReactiveHandle, StateChange, StateStore};
use crate::expr::Scope;
use crate::path::{self, State};
use accelade_reactive::{batch, BehaviorSubject, Dep, Signal, Unsubscribe};
use accelade_types::SubstrateId;
use serde_json::Value as Json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct SignalInner {
    signals: RefCell<Vec<(String, Signal<Json>)>>,
    key_set: Dep,
    stream: BehaviorSubject<State>,
}

/// Per-key signals with an aggregate state stream
#[derive(Clone)]
pub struct SignalState {
    inner: Rc<SignalInner>,
}

impl SignalState {
    pub fn new(state: State) -> Self {
        let state = normalize_state(state);
        let signals = state
            .iter()
            .map(|(key, value)| (key.clone(), Signal::new(value.clone())))
            .collect();
        Self {
            inner: Rc::new(SignalInner {
                signals: RefCell::new(signals),
                key_set: Dep::new(),
                stream: BehaviorSubject::new(state),
            }),
        }
    }

    fn signal(&self, key: &str) -> Option<Signal<Json>> {
        self.inner
            .signals
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, signal)| signal.clone())
    }

    /// Tracked read of a dotted path
    pub fn get(&self, path: &str) -> Option<Json> {
        let mut parts = path.splitn(2, '.');
        let root = parts.next().unwrap_or(path);
        let value = match self.signal(root) {
            Some(signal) => signal.get(),
            None => {
                self.inner.key_set.track();
                return None;
            }
        };
        match parts.next() {
            Some(rest) => path::get_in(&value, rest).cloned(),
            None => Some(value),
        }
    }

    /// Untracked read of a dotted path
    pub fn peek(&self, path: &str) -> Option<Json> {
        path::get_path(&self.snapshot(), path).cloned()
    }

    /// Write one path, creating the key's signal on first write
    ///
    /// The aggregate stream is not emitted; see [`SignalState::publish`].
    fn write(&self, path: &str, value: Json) -> Option<StateChange> {
        let key = path::root_key(path);
        let existing = self.signal(key);

        let mut scratch = State::new();
        if let Some(signal) = &existing {
            scratch.insert(key.to_string(), signal.get_untracked());
        }
        let change = write_path(&mut scratch, path, value)?;
        let root_value = scratch.remove(key).unwrap_or(Json::Null);

        match existing {
            Some(signal) => {
                signal.set(root_value);
            }
            None => {
                self.inner
                    .signals
                    .borrow_mut()
                    .push((key.to_string(), Signal::new(root_value)));
                self.inner.key_set.trigger();
            }
        }
        Some(change)
    }

    /// Push the current state to the aggregate stream
    fn publish(&self) {
        self.inner.stream.next(self.snapshot());
    }

    /// Write one path and publish the new aggregate state
    pub fn set(&self, path: &str, value: Json) -> Option<StateChange> {
        let change = self.write(path, value)?;
        self.publish();
        Some(change)
    }

    /// Replace the state: changed keys are set, new keys get signals,
    /// absent keys are dropped
    pub fn replace(&self, state: State) {
        let state = normalize_state(state);
        batch(|| {
            let mut keys_changed = false;
            for (key, value) in &state {
                match self.signal(key) {
                    Some(signal) => {
                        signal.set(value.clone());
                    }
                    None => {
                        self.inner
                            .signals
                            .borrow_mut()
                            .push((key.clone(), Signal::new(value.clone())));
                        keys_changed = true;
                    }
                }
            }
            let before = self.inner.signals.borrow().len();
            self.inner
                .signals
                .borrow_mut()
                .retain(|(key, _)| state.contains_key(key));
            if keys_changed || before != self.inner.signals.borrow().len() {
                self.inner.key_set.trigger();
            }
        });
        self.publish();
    }

    pub fn snapshot(&self) -> State {
        self.inner
            .signals
            .borrow()
            .iter()
            .map(|(key, signal)| (key.clone(), signal.get_untracked()))
            .collect()
    }

    /// The aggregate stream; new subscribers receive the current state
    pub fn stream(&self) -> &BehaviorSubject<State> {
        &self.inner.stream
    }

    pub fn signal_count(&self) -> usize {
        self.inner.signals.borrow().len()
    }
}

impl Scope for SignalState {
    fn lookup(&self, name: &str) -> Option<Json> {
        match self.signal(name) {
            Some(signal) => Some(signal.get()),
            None => {
                self.inner.key_set.track();
                None
            }
        }
    }
}

pub struct AngularStore {
    signals: SignalState,
    notifier: Notifier,
    disposed: Cell<bool>,
}

impl AngularStore {
    pub fn new() -> Self {
        Self {
            signals: SignalState::new(State::new()),
            notifier: Notifier::new(),
            disposed: Cell::new(false),
        }
    }
}

impl Default for AngularStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for AngularStore {
    fn substrate(&self) -> SubstrateId {
        SubstrateId::Angular
    }

    fn init(&self, initial: State) {
        self.disposed.set(false);
        self.signals.replace(initial);
    }

    fn get(&self, path: &str) -> Option<Json> {
        self.signals.peek(path)
    }

    fn set(&self, path: &str, value: Json) -> bool {
        if self.disposed.get() {
            return false;
        }
        match self.signals.set(path, value) {
            Some(change) => {
                self.notifier.notify(&change);
                true
            }
            None => false,
        }
    }

    /// Signal effects run once after the batch; the stream emits once
    fn set_many(&self, updates: State) {
        if self.disposed.get() {
            return;
        }
        batch(|| {
            let changes: Vec<StateChange> = updates
                .into_iter()
                .filter_map(|(key, value)| self.signals.write(&key, value))
                .collect();
            if changes.is_empty() {
                return;
            }
            self.signals.publish();
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
        self.signals.snapshot()
    }

    fn has(&self, key: &str) -> bool {
        self.signals.signal(key).is_some()
    }

    fn keys(&self) -> Vec<String> {
        self.signals
            .inner
            .signals
            .borrow()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.notifier.clear();
        self.signals.stream().complete();
        self.signals.inner.signals.borrow_mut().clear();
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    fn reactive_handle(&self) -> ReactiveHandle {
        ReactiveHandle::Signals(self.signals.clone())
    }
}
