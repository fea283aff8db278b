//! Node storage types

use crate::event::{Listener, ListenerId};
use std::collections::HashSet;
use std::fmt;

/// Node identifier within a [`Document`](crate::Document)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The type of a node, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
}

/// Elements whose content is raw text (not parsed or escaped)
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements that never have children
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, Default)]
pub(crate) struct ElementData {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    /// Inline style declarations; the `style` attribute is derived from these
    pub style: Vec<(String, String)>,
    /// `value` property, overriding the attribute once written
    pub value: Option<String>,
    /// `checked` property, overriding the attribute once written
    pub checked: Option<bool>,
    /// Expando markers set by script code
    pub markers: HashSet<String>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        if name == "style" {
            return if self.style.is_empty() {
                None
            } else {
                Some(format_style(&self.style))
            };
        }
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if name == "style" {
            self.style = parse_style(value);
            return;
        }
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> bool {
        if name == "style" {
            let had = !self.style.is_empty();
            self.style.clear();
            return had;
        }
        let before = self.attributes.len();
        self.attributes.retain(|(n, _)| n != name);
        before != self.attributes.len()
    }

    pub fn classes(&self) -> Vec<String> {
        self.attribute("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn set_classes(&mut self, classes: &[String]) {
        if classes.is_empty() {
            self.remove_attribute("class");
        } else {
            self.set_attribute("class", &classes.join(" "));
        }
    }
}

/// Text and comment payloads carry their data directly
#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Document => NodeType::Document,
            NodeKind::Element(_) => NodeType::Element,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
        }
    }
}

pub(crate) struct RegisteredListener {
    pub id: ListenerId,
    pub event: String,
    pub listener: Listener,
}

pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub listeners: Vec<RegisteredListener>,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }
}

pub(crate) fn parse_style(text: &str) -> Vec<(String, String)> {
    text.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

pub(crate) fn format_style(style: &[(String, String)]) -> String {
    style
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}
