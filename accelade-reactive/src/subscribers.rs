//! Subscriber registrations
//!
//! Registrations are identified by a monotonically increasing id. A
//! notification pass iterates a snapshot of the registrations taken when the
//! pass starts, and skips any entry removed while the pass is running. A
//! callback may therefore unsubscribe itself or its siblings without other
//! subscribers being skipped or called twice.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Identifier of one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Handle that removes exactly one registration
///
/// Calling [`Unsubscribe::unsubscribe`] more than once is a no-op. Dropping
/// the handle does not unsubscribe.
pub struct Unsubscribe {
    action: Cell<Option<Box<dyn FnOnce()>>>,
}

impl Unsubscribe {
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            action: Cell::new(Some(Box::new(action))),
        }
    }

    /// A handle with nothing to remove
    pub fn noop() -> Self {
        Self {
            action: Cell::new(None),
        }
    }

    pub fn unsubscribe(&self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }

    /// Whether the registration has not been removed through this handle yet
    pub fn is_active(&self) -> bool {
        let action = self.action.take();
        let active = action.is_some();
        self.action.set(action);
        active
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("active", &self.is_active())
            .finish()
    }
}

// ===== SubscriberList =====

struct ListInner<F: ?Sized> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Rc<F>)>,
}

/// Ordered list of callbacks
pub struct SubscriberList<F: ?Sized> {
    inner: Rc<RefCell<ListInner<F>>>,
}

impl<F: ?Sized> Clone for SubscriberList<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F: ?Sized> Default for SubscriberList<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for SubscriberList<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberList")
            .field("len", &self.len())
            .finish()
    }
}

impl<F: ?Sized> SubscriberList<F> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ListInner {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().entries.clear();
    }

    fn contains(&self, id: SubscriptionId) -> bool {
        self.inner
            .borrow()
            .entries
            .iter()
            .any(|(entry, _)| *entry == id)
    }

    /// Invoke `call` for every registration live at the start of the pass
    pub fn notify(&self, mut call: impl FnMut(&F)) {
        let snapshot: Vec<(SubscriptionId, Rc<F>)> = self.inner.borrow().entries.clone();
        for (id, callback) in snapshot {
            if self.contains(id) {
                call(&callback);
            }
        }
    }
}

impl<F: ?Sized + 'static> SubscriberList<F> {
    /// Register a callback, returning the handle that removes it
    pub fn add(&self, callback: Rc<F>) -> Unsubscribe {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = SubscriptionId(inner.next_id);
            inner.next_id += 1;
            inner.entries.push((id, callback));
            id
        };

        let weak: Weak<RefCell<ListInner<F>>> = Rc::downgrade(&self.inner);
        Unsubscribe::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }
}

// ===== KeyedSubscribers =====

struct KeyedInner<F: ?Sized> {
    next_id: u64,
    keys: HashMap<String, Vec<(SubscriptionId, Rc<F>)>>,
}

/// Callbacks grouped by key
///
/// A key's entry is deallocated as soon as its last callback is removed.
pub struct KeyedSubscribers<F: ?Sized> {
    inner: Rc<RefCell<KeyedInner<F>>>,
}

impl<F: ?Sized> Clone for KeyedSubscribers<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F: ?Sized> Default for KeyedSubscribers<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for KeyedSubscribers<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedSubscribers")
            .field("keys", &self.inner.borrow().keys.len())
            .finish()
    }
}

impl<F: ?Sized> KeyedSubscribers<F> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(KeyedInner {
                next_id: 1,
                keys: HashMap::new(),
            })),
        }
    }

    /// Number of keys with at least one registration
    pub fn key_count(&self) -> usize {
        self.inner.borrow().keys.len()
    }

    pub fn count(&self, key: &str) -> usize {
        self.inner
            .borrow()
            .keys
            .get(key)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().keys.clear();
    }

    fn contains(&self, key: &str, id: SubscriptionId) -> bool {
        self.inner
            .borrow()
            .keys
            .get(key)
            .map(|entries| entries.iter().any(|(entry, _)| *entry == id))
            .unwrap_or(false)
    }
}

impl<F: ?Sized + 'static> KeyedSubscribers<F> {
    pub fn add(&self, key: &str, callback: Rc<F>) -> Unsubscribe {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = SubscriptionId(inner.next_id);
            inner.next_id += 1;
            inner
                .keys
                .entry(key.to_string())
                .or_default()
                .push((id, callback));
            id
        };

        let weak = Rc::downgrade(&self.inner);
        let key = key.to_string();
        Unsubscribe::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.borrow_mut();
                if let Some(entries) = inner.keys.get_mut(&key) {
                    entries.retain(|(entry, _)| *entry != id);
                    if entries.is_empty() {
                        inner.keys.remove(&key);
                    }
                }
            }
        })
    }

    /// Invoke `call` for every registration on `key` live at the start of the pass
    pub fn notify(&self, key: &str, mut call: impl FnMut(&F)) {
        let snapshot: Vec<(SubscriptionId, Rc<F>)> = match self.inner.borrow().keys.get(key) {
            Some(entries) => entries.clone(),
            None => return,
        };
        for (id, callback) in snapshot {
            if self.contains(key, id) {
                call(&callback);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Callback = dyn Fn(&mut Vec<&'static str>);

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let list: SubscriberList<Callback> = SubscriberList::new();
        let first = list.add(Rc::new(|log: &mut Vec<&'static str>| log.push("a")));
        let _second = list.add(Rc::new(|log: &mut Vec<&'static str>| log.push("b")));

        assert!(first.is_active());
        first.unsubscribe();
        first.unsubscribe();
        assert!(!first.is_active());
        assert_eq!(list.len(), 1);

        let mut log = Vec::new();
        list.notify(|f| f(&mut log));
        assert_eq!(log, vec!["b"]);
    }

    #[test]
    fn test_self_removal_during_notify() {
        let list: SubscriberList<dyn Fn()> = SubscriberList::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<Unsubscribe>>> = Rc::new(RefCell::new(None));

        let (c, s) = (calls.clone(), slot.clone());
        let handle = list.add(Rc::new(move || {
            c.borrow_mut().push(1);
            if let Some(handle) = s.borrow().as_ref() {
                handle.unsubscribe();
            }
        }));
        *slot.borrow_mut() = Some(handle);
        let c = calls.clone();
        let _other = list.add(Rc::new(move || c.borrow_mut().push(2)));

        list.notify(|f| f());
        list.notify(|f| f());
        assert_eq!(*calls.borrow(), vec![1, 2, 2]);
    }

    #[test]
    fn test_removed_sibling_is_skipped_in_current_pass() {
        let list: SubscriberList<dyn Fn()> = SubscriberList::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let victim: Rc<RefCell<Option<Unsubscribe>>> = Rc::new(RefCell::new(None));

        let (c, v) = (calls.clone(), victim.clone());
        let _first = list.add(Rc::new(move || {
            c.borrow_mut().push("first");
            if let Some(handle) = v.borrow().as_ref() {
                handle.unsubscribe();
            }
        }));
        let c = calls.clone();
        *victim.borrow_mut() = Some(list.add(Rc::new(move || c.borrow_mut().push("second"))));

        list.notify(|f| f());
        assert_eq!(*calls.borrow(), vec!["first"]);
    }

    #[test]
    fn test_keyed_sets_are_deallocated() {
        let keyed: KeyedSubscribers<dyn Fn()> = KeyedSubscribers::new();
        let a = keyed.add("count", Rc::new(|| {}));
        let b = keyed.add("count", Rc::new(|| {}));
        let c = keyed.add("name", Rc::new(|| {}));
        assert_eq!(keyed.key_count(), 2);
        assert_eq!(keyed.count("count"), 2);

        a.unsubscribe();
        assert_eq!(keyed.count("count"), 1);
        b.unsubscribe();
        b.unsubscribe();
        assert_eq!(keyed.key_count(), 1);
        c.unsubscribe();
        assert_eq!(keyed.key_count(), 0);
    }

    #[test]
    fn test_keyed_notify_only_matching_key() {
        let keyed: KeyedSubscribers<dyn Fn(&str)> = KeyedSubscribers::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _h = keyed.add("a", Rc::new(move |v: &str| s.borrow_mut().push(v.to_string())));

        keyed.notify("a", |f| f("one"));
        keyed.notify("b", |f| f("two"));
        assert_eq!(*seen.borrow(), vec!["one".to_string()]);
    }

    #[test]
    fn test_handle_outliving_list() {
        let list: SubscriberList<dyn Fn()> = SubscriberList::new();
        let handle = list.add(Rc::new(|| {}));
        drop(list);
        handle.unsubscribe();
    }
}
