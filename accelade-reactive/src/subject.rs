//! Behavior subjects

use crate::subscribers::{SubscriberList, Unsubscribe};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Observer<T> = dyn Fn(&T);

/// A stream that always has a current value
///
/// New observers receive the current value on subscription, whether or not
/// anything was emitted since. Every [`BehaviorSubject::next`] emits, even
/// when the value is unchanged.
pub struct BehaviorSubject<T> {
    value: Rc<RefCell<T>>,
    observers: SubscriberList<Observer<T>>,
}

impl<T> Clone for BehaviorSubject<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            observers: self.observers.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BehaviorSubject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorSubject")
            .field("value", &*self.value.borrow())
            .finish()
    }
}

impl<T: Clone + 'static> BehaviorSubject<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            observers: SubscriberList::new(),
        }
    }

    pub fn value(&self) -> T {
        self.value.borrow().clone()
    }

    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Unsubscribe {
        let observer: Rc<Observer<T>> = Rc::new(observer);
        let current = self.value();
        observer(&current);
        self.observers.add(observer)
    }

    pub fn next(&self, value: T) {
        *self.value.borrow_mut() = value;
        let current = self.value();
        self.observers.notify(|observer| observer(&current));
    }

    /// Drop every observer
    pub fn complete(&self) {
        self.observers.clear();
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_current_value() {
        let subject = BehaviorSubject::new(0);
        subject.next(7);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _handle = subject.subscribe(move |v: &i32| s.borrow_mut().push(*v));
        assert_eq!(*seen.borrow(), vec![7]);

        subject.next(7);
        assert_eq!(*seen.borrow(), vec![7, 7]);

        subject.complete();
        subject.next(8);
        assert_eq!(*seen.borrow(), vec![7, 7]);
        assert_eq!(subject.value(), 8);
    }
}
