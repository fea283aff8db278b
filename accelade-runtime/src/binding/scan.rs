//! Discovery of binding declarations under a component root
//!
//! Declarations are collected in document order before any of them is
//! bound, so conditional renders that detach nodes cannot hide later
//! declarations from the walk.

use super::render::has_interpolation;
use super::BindingController;
use crate::adapter::{Declaration, MarkupConvention};
use accelade_dom::{Document, NodeId, NodeType};
use tracing::debug;

/// Attribute marking a component root
pub const COMPONENT_ATTRIBUTE: &str = "data-accelade";

/// One discovered declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    Attribute {
        node: NodeId,
        declaration: Declaration,
        value: String,
    },
    Interpolation {
        node: NodeId,
        template: String,
    },
}

/// Every declaration under `root`, `root` included
///
/// `script` and `style` content is never scanned, and nested component
/// roots are left to their own controllers.
pub fn collect(doc: &Document, root: NodeId, convention: &MarkupConvention) -> Vec<Found> {
    let mut found = Vec::new();
    visit(doc, root, true, convention, &mut found);
    found
}

fn visit(doc: &Document, node: NodeId, is_root: bool, convention: &MarkupConvention, found: &mut Vec<Found>) {
    match doc.node_type(node) {
        Some(NodeType::Element) => {
            let tag = doc.tag_name(node).unwrap_or_default();
            if tag == "script" || tag == "style" {
                return;
            }
            if !is_root && doc.has_attribute(node, COMPONENT_ATTRIBUTE) {
                debug!(%node, "skipping nested component");
                return;
            }
            for (name, value) in doc.attributes(node) {
                match convention.classify(&name) {
                    Some(declaration) => found.push(Found::Attribute {
                        node,
                        declaration,
                        value,
                    }),
                    None if name.starts_with(convention.prefix.as_str())
                        && name != convention.cloak_attribute
                        && name != convention.script_attribute =>
                    {
                        debug!(%node, attribute = %name, "unrecognized binding attribute");
                    }
                    None => {}
                }
            }
            for child in doc.children(node) {
                visit(doc, child, false, convention, found);
            }
        }
        Some(NodeType::Text) => {
            if let Some(text) = doc.node_text(node) {
                if has_interpolation(&text) {
                    found.push(Found::Interpolation { node, template: text });
                }
            }
        }
        _ => {}
    }
}

/// Bind every declaration under `root` through `controller`
pub fn bind_all<C: BindingController + ?Sized>(controller: &C, root: NodeId) -> usize {
    let core = controller.core();
    let found = collect(core.document(), root, core.convention());
    let count = found.len();
    for item in found {
        match item {
            Found::Attribute {
                node,
                declaration,
                value,
            } => controller.bind_declaration(node, &declaration, &value),
            Found::Interpolation { node, template } => controller.bind_interpolation(node, &template),
        }
    }
    debug!(%root, declarations = count, "scan complete");
    count
}
