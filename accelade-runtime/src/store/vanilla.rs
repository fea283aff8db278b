//! Setter-routing store for pages without a reactivity framework
//!
//! [`StateProxy`] stands in for property interception: every write goes
//! through its `set`, which compares, stores and then notifies the
//! subscriber lists synchronously. Renderers listen on the coarser
//! [`StateProxy::on_refresh`], which fires once per write call however many
//! keys it changed.

use super::{normalize_state, write_path, ChangeCallback, KeyCallback, Notifier, ReactiveHandle, StateChange, StateStore};
use crate::expr::Scope;
use crate::path::{self, State};
use accelade_reactive::{SubscriberList, Unsubscribe};
use accelade_types::SubstrateId;
use serde_json::Value as Json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

struct ProxyInner {
    state: RefCell<State>,
    notifier: Notifier,
    refresh: SubscriberList<dyn Fn()>,
}

/// Shared handle to state whose writes are routed through change
/// notification
#[derive(Clone)]
pub struct StateProxy {
    inner: Rc<ProxyInner>,
}

impl StateProxy {
    pub fn new(state: State) -> Self {
        Self {
            inner: Rc::new(ProxyInner {
                state: RefCell::new(normalize_state(state)),
                notifier: Notifier::new(),
                refresh: SubscriberList::new(),
            }),
        }
    }

    pub fn get(&self, path: &str) -> Option<Json> {
        path::get_path(&self.inner.state.borrow(), path).cloned()
    }

    /// Store and notify; returns whether the value changed
    pub fn set(&self, path: &str, value: Json) -> bool {
        let change = write_path(&mut self.inner.state.borrow_mut(), path, value);
        match change {
            Some(change) => {
                self.inner.notifier.notify(&change);
                self.refresh();
                true
            }
            None => false,
        }
    }

    /// Store every update, notify once per changed key, then refresh once
    pub fn set_many(&self, updates: State) -> Vec<StateChange> {
        let changes: Vec<StateChange> = {
            let mut state = self.inner.state.borrow_mut();
            updates
                .into_iter()
                .filter_map(|(key, value)| write_path(&mut state, &key, value))
                .collect()
        };
        self.inner.notifier.notify_all(&changes);
        if !changes.is_empty() {
            self.refresh();
        }
        changes
    }

    fn refresh(&self) {
        self.inner.refresh.notify(|callback| callback());
    }

    /// Replace the whole state without notifying
    pub fn replace(&self, state: State) {
        *self.inner.state.borrow_mut() = normalize_state(state);
    }

    pub fn snapshot(&self) -> State {
        self.inner.state.borrow().clone()
    }

    pub fn on_change(&self, callback: Rc<ChangeCallback>) -> Unsubscribe {
        self.inner.notifier.subscribe(callback)
    }

    /// Called after each `set` or `set_many` that changed something
    pub fn on_refresh(&self, callback: Rc<dyn Fn()>) -> Unsubscribe {
        self.inner.refresh.add(callback)
    }

    pub fn refresh_listener_count(&self) -> usize {
        self.inner.refresh.len()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }
}

impl Scope for StateProxy {
    fn lookup(&self, name: &str) -> Option<Json> {
        self.inner.state.borrow().get(name).cloned()
    }
}

pub struct VanillaStore {
    proxy: StateProxy,
    disposed: Cell<bool>,
}

impl VanillaStore {
    pub fn new() -> Self {
        Self {
            proxy: StateProxy::new(State::new()),
            disposed: Cell::new(false),
        }
    }
}

impl Default for VanillaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for VanillaStore {
    fn substrate(&self) -> SubstrateId {
        SubstrateId::Vanilla
    }

    fn init(&self, initial: State) {
        self.proxy.replace(initial);
        self.disposed.set(false);
    }

    fn get(&self, path: &str) -> Option<Json> {
        self.proxy.get(path)
    }

    fn set(&self, path: &str, value: Json) -> bool {
        if self.disposed.get() {
            debug!(path, "ignoring write to disposed store");
            return false;
        }
        self.proxy.set(path, value)
    }

    fn set_many(&self, updates: State) {
        if !self.disposed.get() {
            self.proxy.set_many(updates);
        }
    }

    fn subscribe(&self, callback: Rc<ChangeCallback>) -> Unsubscribe {
        self.proxy.notifier().subscribe(callback)
    }

    fn subscribe_key(&self, key: &str, callback: Rc<KeyCallback>) -> Unsubscribe {
        self.proxy.notifier().subscribe_key(key, callback)
    }

    fn get_state(&self) -> State {
        self.proxy.snapshot()
    }

    fn has(&self, key: &str) -> bool {
        self.proxy.inner.state.borrow().contains_key(key)
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.proxy.notifier().clear();
        self.proxy.inner.refresh.clear();
        self.proxy.replace(State::new());
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    fn reactive_handle(&self) -> ReactiveHandle {
        ReactiveHandle::Proxy(self.proxy.clone())
    }
}
