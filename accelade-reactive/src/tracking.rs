//! Dependency tracking
//!
//! A running [`Effect`] sits on the observer stack; every [`Dep`] read while
//! it runs records the effect as a subscriber. Triggering a dep re-runs its
//! subscribers, each of which first drops its old dependencies so the
//! read-set always reflects the latest run.
//!
//! Deps hold effects weakly: an effect lives exactly as long as its
//! [`Effect`] handle.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::trace;

struct Runtime {
    /// Effects currently executing, innermost last
    observers: RefCell<Vec<Weak<EffectInner>>>,
    /// Nesting depth of `untrack`
    untracked: Cell<usize>,
    /// Nesting depth of `batch`
    batch_depth: Cell<usize>,
    /// Effects triggered inside a batch, in trigger order
    pending: RefCell<Vec<Rc<EffectInner>>>,
    next_id: Cell<u64>,
}

thread_local! {
    static RUNTIME: Runtime = Runtime {
        observers: RefCell::new(Vec::new()),
        untracked: Cell::new(0),
        batch_depth: Cell::new(0),
        pending: RefCell::new(Vec::new()),
        next_id: Cell::new(1),
    };
}

fn next_id() -> u64 {
    RUNTIME.with(|rt| {
        let id = rt.next_id.get();
        rt.next_id.set(id + 1);
        id
    })
}

fn current_observer() -> Option<Rc<EffectInner>> {
    RUNTIME.with(|rt| {
        if rt.untracked.get() > 0 {
            return None;
        }
        rt.observers.borrow().last().and_then(Weak::upgrade)
    })
}

#[derive(Clone, Copy)]
enum Depth {
    Untracked,
    Batch,
}

impl Depth {
    fn counter(self, rt: &Runtime) -> &Cell<usize> {
        match self {
            Depth::Untracked => &rt.untracked,
            Depth::Batch => &rt.batch_depth,
        }
    }
}

/// Decrements a depth counter when dropped, so early returns and panics
/// leave the runtime balanced
struct DepthGuard(Depth);

impl DepthGuard {
    fn enter(depth: Depth) -> Self {
        RUNTIME.with(|rt| {
            let cell = depth.counter(rt);
            cell.set(cell.get() + 1);
        });
        DepthGuard(depth)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        RUNTIME.with(|rt| {
            let cell = self.0.counter(rt);
            cell.set(cell.get().saturating_sub(1));
        });
    }
}

/// Run `f` without recording any dependency reads
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _guard = DepthGuard::enter(Depth::Untracked);
    f()
}

/// Whether a `batch` is currently open
pub fn is_batching() -> bool {
    RUNTIME.with(|rt| rt.batch_depth.get() > 0)
}

/// Run `f`, deferring triggered effects until the outermost batch exits
///
/// Each effect runs at most once per batch, in the order it was first
/// triggered.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let result = {
        let _guard = DepthGuard::enter(Depth::Batch);
        f()
    };

    if !is_batching() {
        loop {
            let queued = RUNTIME.with(|rt| std::mem::take(&mut *rt.pending.borrow_mut()));
            if queued.is_empty() {
                break;
            }
            trace!(count = queued.len(), "flushing batched effects");
            for effect in queued {
                effect.run();
            }
        }
    }
    result
}

// ===== Dep =====

struct DepInner {
    subscribers: RefCell<Vec<(u64, Weak<EffectInner>)>>,
}

/// A tracked source of change
#[derive(Clone)]
pub struct Dep {
    inner: Rc<DepInner>,
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Dep {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DepInner {
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Record a read by the currently running effect, if any
    pub fn track(&self) {
        let Some(effect) = current_observer() else {
            return;
        };
        {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            if subscribers.iter().any(|(id, _)| *id == effect.id) {
                return;
            }
            subscribers.push((effect.id, Rc::downgrade(&effect)));
        }
        effect.deps.borrow_mut().push(Rc::downgrade(&self.inner));
    }

    /// Re-run every effect that read this dep
    pub fn trigger(&self) {
        let snapshot: Vec<Rc<EffectInner>> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            subscribers.retain(|(_, effect)| effect.strong_count() > 0);
            subscribers
                .iter()
                .filter_map(|(_, effect)| effect.upgrade())
                .collect()
        };

        for effect in snapshot {
            effect.schedule();
        }
    }

    /// Number of live effects subscribed to this dep
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|(_, effect)| effect.strong_count() > 0)
            .count()
    }
}

// ===== Effect =====

struct EffectInner {
    id: u64,
    body: RefCell<Option<Box<dyn FnMut()>>>,
    deps: RefCell<Vec<Weak<DepInner>>>,
    active: Cell<bool>,
    running: Cell<bool>,
}

impl EffectInner {
    fn schedule(self: &Rc<Self>) {
        if !self.active.get() {
            return;
        }
        if is_batching() {
            RUNTIME.with(|rt| {
                let mut pending = rt.pending.borrow_mut();
                if !pending.iter().any(|queued| queued.id == self.id) {
                    pending.push(self.clone());
                }
            });
        } else {
            self.run();
        }
    }

    fn cleanup(&self) {
        for dep in self.deps.borrow_mut().drain(..) {
            if let Some(dep) = dep.upgrade() {
                dep.subscribers.borrow_mut().retain(|(id, _)| *id != self.id);
            }
        }
    }

    fn run(self: &Rc<Self>) {
        // Triggers raised by the body itself do not re-enter it
        if !self.active.get() || self.running.get() {
            return;
        }
        let Some(mut body) = self.body.borrow_mut().take() else {
            return;
        };

        self.cleanup();
        self.running.set(true);
        RUNTIME.with(|rt| rt.observers.borrow_mut().push(Rc::downgrade(self)));

        body();

        RUNTIME.with(|rt| {
            rt.observers.borrow_mut().pop();
        });
        self.running.set(false);

        if self.active.get() {
            *self.body.borrow_mut() = Some(body);
        }
    }

    fn stop(&self) {
        if self.active.replace(false) {
            self.cleanup();
            self.body.borrow_mut().take();
        }
    }
}

/// A computation that re-runs whenever a dep it read is triggered
///
/// The body runs once on creation. Dropping the handle stops the effect.
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("active", &self.inner.active.get())
            .finish()
    }
}

impl Effect {
    pub fn new(body: impl FnMut() + 'static) -> Self {
        let inner = Rc::new(EffectInner {
            id: next_id(),
            body: RefCell::new(Some(Box::new(body))),
            deps: RefCell::new(Vec::new()),
            active: Cell::new(true),
            running: Cell::new(false),
        });
        inner.run();
        Self { inner }
    }

    /// Re-run the body now, re-collecting dependencies
    pub fn run(&self) {
        self.inner.run();
    }

    /// Stop reacting; safe to call repeatedly and from inside the body
    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Number of deps read by the most recent run
    pub fn dep_count(&self) -> usize {
        self.inner
            .deps
            .borrow()
            .iter()
            .filter(|dep| dep.strong_count() > 0)
            .count()
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_reruns_on_trigger() {
        let dep = Dep::new();
        let runs = Rc::new(Cell::new(0));

        let (d, r) = (dep.clone(), runs.clone());
        let effect = Effect::new(move || {
            d.track();
            r.set(r.get() + 1);
        });
        assert_eq!(runs.get(), 1);
        assert_eq!(effect.dep_count(), 1);

        dep.trigger();
        assert_eq!(runs.get(), 2);

        effect.stop();
        dep.trigger();
        assert_eq!(runs.get(), 2);
        assert_eq!(dep.subscriber_count(), 0);
    }

    #[test]
    fn test_dependencies_follow_latest_run() {
        let flag = Dep::new();
        let a = Dep::new();
        let b = Dep::new();
        let use_a = Rc::new(Cell::new(true));
        let runs = Rc::new(Cell::new(0));

        let (f, da, db, u, r) = (flag.clone(), a.clone(), b.clone(), use_a.clone(), runs.clone());
        let _effect = Effect::new(move || {
            f.track();
            if u.get() {
                da.track();
            } else {
                db.track();
            }
            r.set(r.get() + 1);
        });

        use_a.set(false);
        flag.trigger();
        assert_eq!(runs.get(), 2);

        a.trigger();
        assert_eq!(runs.get(), 2);
        b.trigger();
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn test_batch_runs_each_effect_once() {
        let a = Dep::new();
        let b = Dep::new();
        let runs = Rc::new(Cell::new(0));

        let (da, db, r) = (a.clone(), b.clone(), runs.clone());
        let _effect = Effect::new(move || {
            da.track();
            db.track();
            r.set(r.get() + 1);
        });

        batch(|| {
            a.trigger();
            b.trigger();
            batch(|| a.trigger());
            assert_eq!(runs.get(), 1);
        });
        assert_eq!(runs.get(), 2);
        assert!(!is_batching());
    }

    #[test]
    fn test_untrack_skips_reads() {
        let dep = Dep::new();
        let runs = Rc::new(Cell::new(0));

        let (d, r) = (dep.clone(), runs.clone());
        let _effect = Effect::new(move || {
            untrack(|| d.track());
            r.set(r.get() + 1);
        });

        dep.trigger();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_dropping_handle_stops_effect() {
        let dep = Dep::new();
        let runs = Rc::new(Cell::new(0));

        let (d, r) = (dep.clone(), runs.clone());
        let effect = Effect::new(move || {
            d.track();
            r.set(r.get() + 1);
        });
        drop(effect);

        dep.trigger();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_stop_from_inside_body() {
        let dep = Dep::new();
        let slot: Rc<RefCell<Option<Rc<Effect>>>> = Rc::new(RefCell::new(None));
        let runs = Rc::new(Cell::new(0));

        let (d, s, r) = (dep.clone(), slot.clone(), runs.clone());
        let effect = Rc::new(Effect::new(move || {
            d.track();
            r.set(r.get() + 1);
            if r.get() > 1 {
                if let Some(effect) = s.borrow().as_ref() {
                    effect.stop();
                }
            }
        }));
        *slot.borrow_mut() = Some(effect.clone());

        dep.trigger();
        dep.trigger();
        assert_eq!(runs.get(), 2);
        assert!(!effect.is_active());
        slot.borrow_mut().take();
    }
}
