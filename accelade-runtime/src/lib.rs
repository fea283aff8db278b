//! Accelade Runtime - adapter-driven reactive bindings for server-rendered
//! components
//!
//! Server-rendered markup declares its bindings with attributes
//! (`a-text="count"`, `@click="increment('count')"`, `{{ total * 2 }}`)
//! and carries its initial state as JSON. The runtime brings that markup to
//! life on one of five reactivity substrates:
//!
//! - **Expressions** ([`expr`]): a safe-subset evaluator with a parsed
//!   expression cache
//! - **Stores** ([`store`]): per-substrate state containers behind one
//!   [`StateStore`] contract
//! - **Controllers** ([`binding`]): scan a component root, render every
//!   binding and keep it current
//! - **Adapters** ([`adapter`], [`registry`]): pair a store with its
//!   controller and detect which substrate the page uses
//! - **Components** ([`component`]): mount every root on a page
//!
//! ## Example
//!
//! ```rust
//! use accelade_dom::Document;
//! use accelade_runtime::{AdapterRegistry, HostEnvironment, Page};
//!
//! let doc = Document::new();
//! doc.append_html(
//!     doc.body(),
//!     r#"<div data-accelade data-accelade-state='{"count": 1}'>
//!          <span a-text="count * 2"></span>
//!        </div>"#,
//! )
//! .unwrap();
//!
//! let env = HostEnvironment::new(doc.clone());
//! let page = Page::boot(&env, &AdapterRegistry::with_builtin_adapters());
//!
//! let component = &page.components()[0];
//! component.store().set("count", serde_json::json!(5));
//! assert_eq!(doc.text_content(component.root()).trim(), "10");
//! ```

pub mod adapter;
pub mod binding;
pub mod component;
pub mod config;
pub mod error;
pub mod expr;
pub mod path;
pub mod registry;
pub mod store;

pub use adapter::{Adapter, BuiltinAdapter, HostEnvironment, MarkupConvention};
pub use binding::{BindingController, ControllerCore};
pub use component::{Component, Page};
pub use config::AcceladeConfig;
pub use error::{AcceladeError, Result};
pub use expr::{evaluate, evaluate_boolean, evaluate_class_map, evaluate_string, Evaluator, Value};
pub use path::State;
pub use registry::{AdapterRegistry, Registration, RegistryState};
pub use store::{create_store, StateChange, StateStore};
