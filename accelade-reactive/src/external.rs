//! External stores
//!
//! An external store exposes an immutable snapshot that is replaced on
//! every write, plus a list of change listeners. Listeners receive no
//! payload; they re-read the snapshot. Writes inside [`ExternalStore::batch`]
//! produce a single notification when the outermost batch exits.

use crate::subscribers::{SubscriberList, Unsubscribe};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::trace;

type Listener = dyn Fn();

pub struct ExternalStore<T> {
    snapshot: Rc<RefCell<Rc<T>>>,
    listeners: SubscriberList<Listener>,
    batch_depth: Rc<Cell<usize>>,
    dirty: Rc<Cell<bool>>,
    version: Rc<Cell<u64>>,
}

impl<T> Clone for ExternalStore<T> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            listeners: self.listeners.clone(),
            batch_depth: self.batch_depth.clone(),
            dirty: self.dirty.clone(),
            version: self.version.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ExternalStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalStore")
            .field("snapshot", &self.snapshot.borrow())
            .field("version", &self.version.get())
            .finish()
    }
}

impl<T: 'static> ExternalStore<T> {
    pub fn new(initial: T) -> Self {
        Self {
            snapshot: Rc::new(RefCell::new(Rc::new(initial))),
            listeners: SubscriberList::new(),
            batch_depth: Rc::new(Cell::new(0)),
            dirty: Rc::new(Cell::new(false)),
            version: Rc::new(Cell::new(0)),
        }
    }

    /// The current snapshot; later writes never mutate it
    pub fn get_snapshot(&self) -> Rc<T> {
        self.snapshot.borrow().clone()
    }

    /// Incremented on every snapshot replacement
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Unsubscribe {
        self.listeners.add(Rc::new(listener))
    }

    /// Replace the snapshot and notify listeners (deferred inside a batch)
    pub fn set_snapshot(&self, next: T) {
        *self.snapshot.borrow_mut() = Rc::new(next);
        self.version.set(self.version.get() + 1);
        if self.batch_depth.get() > 0 {
            self.dirty.set(true);
        } else {
            self.emit();
        }
    }

    /// Run `f` with notifications coalesced into one
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.batch_depth.set(self.batch_depth.get() + 1);
        let result = f();
        self.batch_depth.set(self.batch_depth.get() - 1);

        if self.batch_depth.get() == 0 && self.dirty.replace(false) {
            trace!(version = self.version.get(), "flushing batched snapshot");
            self.emit();
        }
        result
    }

    fn emit(&self) {
        self.listeners.notify(|listener| listener());
    }

    /// Drop every listener; later snapshots are published to nobody
    pub fn close(&self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<T: Clone + 'static> ExternalStore<T> {
    /// Produce the next snapshot from a copy of the current one
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = (*self.get_snapshot()).clone();
        f(&mut next);
        self.set_snapshot(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshots_are_immutable() {
        let store = ExternalStore::new(vec![1]);
        let before = store.get_snapshot();
        store.update(|v| v.push(2));
        assert_eq!(*before, vec![1]);
        assert_eq!(*store.get_snapshot(), vec![1, 2]);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_batch_coalesces_notifications() {
        let store = ExternalStore::new(0);
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let _handle = store.subscribe(move || c.set(c.get() + 1));

        store.batch(|| {
            store.set_snapshot(1);
            store.batch(|| store.set_snapshot(2));
            store.set_snapshot(3);
        });
        assert_eq!(calls.get(), 1);
        assert_eq!(*store.get_snapshot(), 3);

        store.batch(|| ());
        assert_eq!(calls.get(), 1);

        store.set_snapshot(4);
        assert_eq!(calls.get(), 2);
    }
}
