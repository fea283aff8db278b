//! Tracked value cells

use crate::tracking::Dep;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct SignalInner<T> {
    value: RefCell<T>,
    dep: Dep,
}

/// A value cell whose reads are tracked by the running effect
///
/// Writing a value equal to the current one does not trigger dependents.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal")
            .field(&*self.inner.value.borrow())
            .finish()
    }
}

impl<T: Clone + PartialEq> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                dep: Dep::new(),
            }),
        }
    }

    /// Read the value, recording the read
    pub fn get(&self) -> T {
        self.inner.dep.track();
        self.inner.value.borrow().clone()
    }

    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the value for the duration of `f`, recording the read
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.dep.track();
        f(&self.inner.value.borrow())
    }

    /// Returns whether the value changed
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.inner.dep.trigger();
        true
    }

    /// Modify the value in place; dependents are triggered when it changed
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get_untracked();
        f(&mut next);
        self.set(next)
    }

    /// Number of effects currently depending on this signal
    pub fn subscriber_count(&self) -> usize {
        self.inner.dep.subscriber_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::Effect;
    use std::cell::Cell;

    #[test]
    fn test_equal_write_is_cut_off() {
        let signal = Signal::new(1);
        let runs = Rc::new(Cell::new(0));

        let (s, r) = (signal.clone(), runs.clone());
        let _effect = Effect::new(move || {
            s.get();
            r.set(r.get() + 1);
        });

        assert!(!signal.set(1));
        assert_eq!(runs.get(), 1);
        assert!(signal.set(2));
        assert_eq!(runs.get(), 2);
        assert!(signal.update(|v| *v += 1));
        assert_eq!(signal.get_untracked(), 3);
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn test_untracked_read_does_not_subscribe() {
        let signal = Signal::new(String::from("a"));
        let s = signal.clone();
        let _effect = Effect::new(move || {
            s.get_untracked();
        });
        assert_eq!(signal.subscriber_count(), 0);
        assert_eq!(signal.with(|v| v.len()), 1);
    }
}
