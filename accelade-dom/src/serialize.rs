//! Markup serialization

use crate::node::{NodeData, NodeId, NodeKind, RAW_TEXT_ELEMENTS, VOID_ELEMENTS};
use std::collections::HashMap;

pub(crate) fn write_node(nodes: &HashMap<NodeId, NodeData>, id: NodeId, out: &mut String) {
    let Some(node) = nodes.get(&id) else {
        return;
    };

    match &node.kind {
        NodeKind::Document => write_children(nodes, node, false, out),
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in &el.attributes {
                write_attribute(name, value, out);
            }
            if let Some(style) = el.attribute("style") {
                write_attribute("style", &style, out);
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&el.tag.as_str());
            write_children(nodes, node, raw, out);
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

pub(crate) fn write_children(
    nodes: &HashMap<NodeId, NodeData>,
    node: &NodeData,
    raw: bool,
    out: &mut String,
) {
    for child in &node.children {
        match nodes.get(child).map(|c| &c.kind) {
            Some(NodeKind::Text(text)) if raw => out.push_str(text),
            _ => write_node(nodes, *child, out),
        }
    }
}

fn write_attribute(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    if !value.is_empty() {
        out.push_str("=\"");
        out.push_str(&value.replace('&', "&amp;").replace('"', "&quot;"));
        out.push('"');
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
