//! Writable stores
//!
//! A writable holds one value and pushes it to subscribers. Subscribing
//! delivers the current value immediately, so a subscriber never has to
//! read the store separately to render its first state.

use crate::subscribers::{SubscriberList, Unsubscribe};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Subscriber<T> = dyn Fn(&T);

pub struct Writable<T> {
    value: Rc<RefCell<T>>,
    subscribers: SubscriberList<Subscriber<T>>,
}

impl<T> Clone for Writable<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Writable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writable")
            .field("value", &*self.value.borrow())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Writable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            subscribers: SubscriberList::new(),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Subscribe and receive the current value right away
    pub fn subscribe(&self, subscriber: impl Fn(&T) + 'static) -> Unsubscribe {
        let subscriber: Rc<Subscriber<T>> = Rc::new(subscriber);
        let current = self.get();
        subscriber(&current);
        self.subscribers.add(subscriber)
    }

    /// Replace the value; subscribers run only when it changed
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.emit();
        true
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    fn emit(&self) {
        let current = self.get();
        self.subscribers.notify(|subscriber| subscriber(&current));
    }

    /// Drop every subscriber
    pub fn close(&self) {
        self.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_emits_immediately() {
        let store = Writable::new(vec![1]);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        let handle = store.subscribe(move |v: &Vec<i32>| s.borrow_mut().push(v.len()));
        assert_eq!(*seen.borrow(), vec![1]);

        store.update(|v| v.push(2));
        assert!(!store.set(vec![1, 2]));
        assert_eq!(*seen.borrow(), vec![1, 2]);

        handle.unsubscribe();
        store.set(vec![]);
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(store.subscriber_count(), 0);
    }
}
