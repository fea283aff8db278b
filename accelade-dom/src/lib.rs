//! Accelade DOM - an in-memory document tree
//!
//! The binding engine needs a DOM to drive: elements with attributes, text
//! and comment nodes, inline styles, form control state and event
//! listeners. This crate provides that tree as an arena owned by a
//! cheaply cloneable [`Document`] handle.
//!
//! - **Nodes** are addressed by [`NodeId`]; detached nodes stay alive so
//!   they can be reinserted later (conditional rendering relies on this)
//! - **Events** are dispatched synchronously and bubble to ancestors
//! - **Markup** can be parsed from HTML fragments and serialized back
//!
//! ## Example
//!
//! ```rust
//! use accelade_dom::Document;
//!
//! let doc = Document::new();
//! let nodes = doc.append_html(doc.body(), r#"<p class="note">Hello</p>"#).unwrap();
//!
//! assert_eq!(doc.text_content(nodes[0]), "Hello");
//! assert!(doc.has_class(nodes[0], "note"));
//! ```

pub mod document;
pub mod event;
pub mod node;
mod parse;
mod serialize;

pub use document::Document;
pub use event::{Event, Listener, ListenerId};
pub use node::{NodeId, NodeType};

/// Error types for DOM operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node is not an element: {0}")]
    NotAnElement(NodeId),

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },
}

pub type DomResult<T> = Result<T, DomError>;
