//! Accelade Reactive - change-notification primitives
//!
//! Each state store substrate is driven by a different notification model.
//! This crate provides the building blocks for all of them:
//!
//! - **Subscriber lists** with snapshot iteration and idempotent removal
//!   ([`SubscriberList`], [`KeyedSubscribers`], [`Unsubscribe`])
//! - **Dependency tracking** with re-running effects ([`Dep`], [`Effect`],
//!   [`batch`], [`untrack`])
//! - **Cells and streams** built on top: [`Signal`], [`Writable`],
//!   [`BehaviorSubject`] and [`ExternalStore`]
//!
//! Everything here is single-threaded (`Rc`/`RefCell`); notification passes
//! run synchronously before the mutating call returns.

pub mod external;
pub mod signal;
pub mod subject;
pub mod subscribers;
pub mod tracking;
pub mod writable;

pub use external::ExternalStore;
pub use signal::Signal;
pub use subject::BehaviorSubject;
pub use subscribers::{KeyedSubscribers, SubscriberList, SubscriptionId, Unsubscribe};
pub use tracking::{batch, is_batching, untrack, Dep, Effect};
pub use writable::Writable;
