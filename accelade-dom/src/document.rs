//! Document tree and element operations
//!
//! A [`Document`] is a shared handle to an arena of nodes. All operations
//! take `&self`; borrows of the arena never outlive a single call, so event
//! listeners are free to mutate the document they are dispatched from.

use crate::event::{Event, Listener, ListenerId};
use crate::node::{ElementData, NodeData, NodeId, NodeKind, NodeType, RegisteredListener};
use crate::parse::{parse_fragment, ParsedNode};
use crate::serialize::{write_children, write_node};
use crate::{DomError, DomResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

struct Tree {
    nodes: HashMap<NodeId, NodeData>,
    next_id: u64,
    next_listener: u64,
    root: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Tree {
    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, NodeData::new(kind));
        id
    }

    fn node(&self, id: NodeId) -> DomResult<&NodeData> {
        self.nodes.get(&id).ok_or(DomError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut NodeData> {
        self.nodes.get_mut(&id).ok_or(DomError::NodeNotFound(id))
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        self.node_mut(id)?
            .element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(&node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn insert(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> DomResult<()> {
        match self.node(parent)?.kind.node_type() {
            NodeType::Element | NodeType::Document => {}
            _ => {
                return Err(DomError::HierarchyRequest(format!(
                    "{} cannot have children",
                    parent
                )))
            }
        }
        if self.node(child)?.kind.node_type() == NodeType::Document {
            return Err(DomError::HierarchyRequest(
                "the document node cannot be inserted".to_string(),
            ));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest(format!(
                "{} is an ancestor of {}",
                child, parent
            )));
        }
        if let Some(reference) = before {
            if self.node(reference)?.parent != Some(parent) {
                return Err(DomError::HierarchyRequest(format!(
                    "{} is not a child of {}",
                    reference, parent
                )));
            }
        }

        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = before
            .and_then(|r| siblings.iter().position(|c| *c == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Drop a detached subtree from the arena
    fn purge(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                self.purge(child);
            }
        }
    }

    fn materialize(&mut self, parsed: ParsedNode) -> NodeId {
        match parsed {
            ParsedNode::Text(text) => self.alloc(NodeKind::Text(text)),
            ParsedNode::Comment(text) => self.alloc(NodeKind::Comment(text)),
            ParsedNode::Element {
                tag,
                attributes,
                children,
            } => {
                let mut data = ElementData::new(&tag);
                for (name, value) in &attributes {
                    data.set_attribute(name, value);
                }
                let id = self.alloc(NodeKind::Element(data));
                for child in children {
                    let child_id = self.materialize(child);
                    if let Some(node) = self.nodes.get_mut(&child_id) {
                        node.parent = Some(id);
                    }
                    if let Some(node) = self.nodes.get_mut(&id) {
                        node.children.push(child_id);
                    }
                }
                id
            }
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(node) = self.nodes.get(&id) {
            match &node.kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Comment(_) => {}
                NodeKind::Element(_) | NodeKind::Document => {
                    for child in &node.children {
                        self.collect_text(*child, out);
                    }
                }
            }
        }
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(&id) {
            for child in &node.children {
                out.push(*child);
                self.collect_descendants(*child, out);
            }
        }
    }
}

/// Shared handle to an in-memory document
#[derive(Clone)]
pub struct Document {
    tree: Rc<RefCell<Tree>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.tree.borrow();
        f.debug_struct("Document")
            .field("nodes", &tree.nodes.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }
}

impl Document {
    /// Create a document with an empty `<html><head></head><body></body></html>` skeleton
    pub fn new() -> Self {
        let mut tree = Tree {
            nodes: HashMap::new(),
            next_id: 1,
            next_listener: 1,
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
        };
        let root = tree.alloc(NodeKind::Document);
        let html = tree.alloc(NodeKind::Element(ElementData::new("html")));
        let head = tree.alloc(NodeKind::Element(ElementData::new("head")));
        let body = tree.alloc(NodeKind::Element(ElementData::new("body")));
        tree.root = root;
        tree.head = head;
        tree.body = body;

        // The skeleton is well-formed, so these inserts cannot fail
        let _ = tree.insert(root, html, None);
        let _ = tree.insert(html, head, None);
        let _ = tree.insert(html, body, None);

        Self {
            tree: Rc::new(RefCell::new(tree)),
        }
    }

    /// Parse `html` into the body of a fresh document
    pub fn from_body_html(html: &str) -> DomResult<Self> {
        let doc = Self::new();
        doc.append_html(doc.body(), html)?;
        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        self.tree.borrow().root
    }

    pub fn head(&self) -> NodeId {
        self.tree.borrow().head
    }

    pub fn body(&self) -> NodeId {
        self.tree.borrow().body
    }

    /// Number of nodes held by the arena, attached or not
    pub fn node_count(&self) -> usize {
        self.tree.borrow().nodes.len()
    }

    // ===== Node creation =====

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.tree
            .borrow_mut()
            .alloc(NodeKind::Element(ElementData::new(tag)))
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.tree.borrow_mut().alloc(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&self, text: &str) -> NodeId {
        self.tree
            .borrow_mut()
            .alloc(NodeKind::Comment(text.to_string()))
    }

    /// Parse an HTML fragment into detached nodes
    pub fn parse_fragment(&self, html: &str) -> DomResult<Vec<NodeId>> {
        let parsed = parse_fragment(html)?;
        let mut tree = self.tree.borrow_mut();
        Ok(parsed.into_iter().map(|p| tree.materialize(p)).collect())
    }

    /// Parse an HTML fragment and append the resulting nodes to `parent`
    pub fn append_html(&self, parent: NodeId, html: &str) -> DomResult<Vec<NodeId>> {
        let nodes = self.parse_fragment(html)?;
        for node in &nodes {
            self.append_child(parent, *node)?;
        }
        Ok(nodes)
    }

    // ===== Tree structure =====

    pub fn exists(&self, node: NodeId) -> bool {
        self.tree.borrow().nodes.contains_key(&node)
    }

    pub fn node_type(&self, node: NodeId) -> Option<NodeType> {
        self.tree
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.kind.node_type())
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.node_type(node) == Some(NodeType::Element)
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.tree.borrow_mut().insert(parent, child, None)
    }

    /// Insert `child` before `reference`, or at the end when `reference` is `None`
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.tree.borrow_mut().insert(parent, child, reference)
    }

    /// Detach a node from its parent; the node stays alive for reinsertion
    pub fn remove(&self, node: NodeId) -> DomResult<()> {
        self.tree.borrow_mut().detach(node)
    }

    /// Put `replacement` where `node` is and detach `node`
    pub fn replace_with(&self, node: NodeId, replacement: NodeId) -> DomResult<()> {
        if node == replacement {
            return Ok(());
        }
        let mut tree = self.tree.borrow_mut();
        let parent = tree
            .node(node)?
            .parent
            .ok_or_else(|| DomError::HierarchyRequest(format!("{} has no parent", node)))?;
        tree.insert(parent, replacement, Some(node))?;
        tree.detach(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.borrow().nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|c| *c == node)?;
        siblings.get(index + 1).copied()
    }

    /// Whether `node` is `ancestor` or inside it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.tree.borrow().is_inclusive_ancestor(ancestor, node)
    }

    /// Whether the node is reachable from the document root
    pub fn is_connected(&self, node: NodeId) -> bool {
        let root = self.root();
        self.contains(root, node)
    }

    /// All nodes below `node` in document order
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.tree.borrow().collect_descendants(node, &mut out);
        out
    }

    /// `node` followed by its element descendants, in document order
    pub fn elements_within(&self, node: NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let mut all = vec![node];
        tree.collect_descendants(node, &mut all);
        all.into_iter()
            .filter(|id| tree.nodes.get(id).and_then(|n| n.element()).is_some())
            .collect()
    }

    /// Elements within `node` (inclusive) carrying attribute `name`
    pub fn elements_with_attribute(&self, node: NodeId, name: &str) -> Vec<NodeId> {
        self.elements_within(node)
            .into_iter()
            .filter(|id| self.has_attribute(*id, name))
            .collect()
    }

    /// Content of `<meta name="..." content="...">` anywhere in the document
    pub fn meta_content(&self, name: &str) -> Option<String> {
        self.elements_within(self.root())
            .into_iter()
            .filter(|id| self.tag_name(*id).as_deref() == Some("meta"))
            .find(|id| self.get_attribute(*id, "name").as_deref() == Some(name))
            .and_then(|id| self.get_attribute(id, "content"))
    }

    // ===== Node data =====

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.tree
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.element())
            .map(|el| el.tag.clone())
    }

    /// Data of a text or comment node
    pub fn node_text(&self, node: NodeId) -> Option<String> {
        match self.tree.borrow().nodes.get(&node).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) | Some(NodeKind::Comment(text)) => Some(text.clone()),
            _ => None,
        }
    }

    /// Replace the data of a text or comment node
    pub fn set_node_text(&self, node: NodeId, text: &str) -> DomResult<()> {
        let mut tree = self.tree.borrow_mut();
        match &mut tree.node_mut(node)?.kind {
            NodeKind::Text(data) | NodeKind::Comment(data) => {
                if *data != text {
                    *data = text.to_string();
                }
                Ok(())
            }
            _ => Err(DomError::HierarchyRequest(format!(
                "{} is not a character data node",
                node
            ))),
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.tree.borrow().collect_text(node, &mut out);
        out
    }

    /// Replace all children with a single text node
    ///
    /// An existing lone text child is updated in place.
    pub fn set_text_content(&self, node: NodeId, text: &str) -> DomResult<()> {
        let mut tree = self.tree.borrow_mut();
        tree.element_mut(node)?;
        let children = tree.node(node)?.children.clone();

        if let [only] = children.as_slice() {
            let only = *only;
            if tree.node(only)?.kind.node_type() == NodeType::Text {
                if text.is_empty() {
                    tree.detach(only)?;
                    tree.purge(only);
                } else if let NodeKind::Text(data) = &mut tree.node_mut(only)?.kind {
                    if *data != text {
                        *data = text.to_string();
                    }
                }
                return Ok(());
            }
        }

        for child in children {
            tree.detach(child)?;
            tree.purge(child);
        }
        if !text.is_empty() {
            let text_node = tree.alloc(NodeKind::Text(text.to_string()));
            tree.insert(node, text_node, None)?;
        }
        Ok(())
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        if let Some(data) = tree.nodes.get(&node) {
            let raw = data
                .element()
                .map(|el| crate::node::RAW_TEXT_ELEMENTS.contains(&el.tag.as_str()))
                .unwrap_or(false);
            write_children(&tree.nodes, data, raw, &mut out);
        }
        out
    }

    /// Replace all children with the nodes parsed from `html`
    pub fn set_inner_html(&self, node: NodeId, html: &str) -> DomResult<()> {
        if !self.is_element(node) {
            return Err(DomError::NotAnElement(node));
        }
        let parsed = parse_fragment(html)?;
        let mut tree = self.tree.borrow_mut();
        for child in tree.node(node)?.children.clone() {
            tree.detach(child)?;
            tree.purge(child);
        }
        for p in parsed {
            let child = tree.materialize(p);
            tree.insert(node, child, None)?;
        }
        Ok(())
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        write_node(&self.tree.borrow().nodes, node, &mut out);
        out
    }

    // ===== Attributes =====

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.element())
            .and_then(|el| el.attribute(name))
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.get_attribute(node, name).is_some()
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.tree
            .borrow_mut()
            .element_mut(node)?
            .set_attribute(name, value);
        Ok(())
    }

    /// Returns whether the attribute was present
    pub fn remove_attribute(&self, node: NodeId, name: &str) -> DomResult<bool> {
        Ok(self.tree.borrow_mut().element_mut(node)?.remove_attribute(name))
    }

    /// All attributes in source order, `style` last when present
    pub fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        let tree = self.tree.borrow();
        let Some(el) = tree.nodes.get(&node).and_then(|n| n.element()) else {
            return Vec::new();
        };
        let mut attrs = el.attributes.clone();
        if let Some(style) = el.attribute("style") {
            attrs.push(("style".to_string(), style));
        }
        attrs
    }

    // ===== Class list =====

    pub fn class_list(&self, node: NodeId) -> Vec<String> {
        self.tree
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.element())
            .map(|el| el.classes())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.class_list(node).iter().any(|c| c == class)
    }

    /// Add or remove `class`; other classes are untouched
    pub fn toggle_class(&self, node: NodeId, class: &str, on: bool) -> DomResult<()> {
        let mut tree = self.tree.borrow_mut();
        let el = tree.element_mut(node)?;
        let mut classes = el.classes();
        let present = classes.iter().any(|c| c == class);
        if on && !present {
            classes.push(class.to_string());
            el.set_classes(&classes);
        } else if !on && present {
            classes.retain(|c| c != class);
            el.set_classes(&classes);
        }
        Ok(())
    }

    pub fn add_class(&self, node: NodeId, class: &str) -> DomResult<()> {
        self.toggle_class(node, class, true)
    }

    pub fn remove_class(&self, node: NodeId, class: &str) -> DomResult<()> {
        self.toggle_class(node, class, false)
    }

    // ===== Inline style =====

    pub fn style_property(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.element())
            .and_then(|el| {
                el.style
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| v.clone())
            })
    }

    pub fn set_style_property(&self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        let mut tree = self.tree.borrow_mut();
        let el = tree.element_mut(node)?;
        match el.style.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => el.style.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn remove_style_property(&self, node: NodeId, name: &str) -> DomResult<()> {
        self.tree
            .borrow_mut()
            .element_mut(node)?
            .style
            .retain(|(n, _)| n != name);
        Ok(())
    }

    // ===== Form controls =====

    /// `type` of an input (lowercased, `text` by default), or the tag name of other elements
    pub fn input_type(&self, node: NodeId) -> String {
        match self.tag_name(node).as_deref() {
            Some("input") => self
                .get_attribute(node, "type")
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "text".to_string()),
            Some(tag) => tag.to_string(),
            None => String::new(),
        }
    }

    /// Current `value` property of a form control
    pub fn value(&self, node: NodeId) -> String {
        let from_property = self
            .tree
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.element())
            .and_then(|el| el.value.clone());
        if let Some(value) = from_property {
            return value;
        }
        match self.tag_name(node).as_deref() {
            Some("textarea") => self.text_content(node),
            Some("select") => {
                let options: Vec<NodeId> = self
                    .elements_within(node)
                    .into_iter()
                    .filter(|id| self.tag_name(*id).as_deref() == Some("option"))
                    .collect();
                options
                    .iter()
                    .find(|id| self.has_attribute(**id, "selected"))
                    .or_else(|| options.first())
                    .map(|id| self.option_value(*id))
                    .unwrap_or_default()
            }
            Some("input") if self.input_type(node) == "checkbox" || self.input_type(node) == "radio" => {
                self.get_attribute(node, "value").unwrap_or_else(|| "on".to_string())
            }
            _ => self.get_attribute(node, "value").unwrap_or_default(),
        }
    }

    fn option_value(&self, option: NodeId) -> String {
        self.get_attribute(option, "value")
            .unwrap_or_else(|| self.text_content(option).trim().to_string())
    }

    pub fn set_value(&self, node: NodeId, value: &str) -> DomResult<()> {
        self.tree.borrow_mut().element_mut(node)?.value = Some(value.to_string());
        Ok(())
    }

    pub fn checked(&self, node: NodeId) -> bool {
        let tree = self.tree.borrow();
        tree.nodes
            .get(&node)
            .and_then(|n| n.element())
            .map(|el| el.checked.unwrap_or_else(|| el.attribute("checked").is_some()))
            .unwrap_or(false)
    }

    /// Set the `checked` property; checking a radio unchecks its named group
    pub fn set_checked(&self, node: NodeId, checked: bool) -> DomResult<()> {
        self.tree.borrow_mut().element_mut(node)?.checked = Some(checked);

        if checked && self.input_type(node) == "radio" {
            if let Some(name) = self.get_attribute(node, "name") {
                let mut scope = node;
                while let Some(parent) = self.parent(scope) {
                    scope = parent;
                }
                for other in self.elements_within(scope) {
                    if other != node
                        && self.input_type(other) == "radio"
                        && self.get_attribute(other, "name").as_deref() == Some(name.as_str())
                    {
                        self.tree.borrow_mut().element_mut(other)?.checked = Some(false);
                    }
                }
            }
        }
        Ok(())
    }

    // ===== Markers =====

    /// Set an expando marker; returns `false` when it was already present
    pub fn mark(&self, node: NodeId, key: &str) -> DomResult<bool> {
        Ok(self
            .tree
            .borrow_mut()
            .element_mut(node)?
            .markers
            .insert(key.to_string()))
    }

    pub fn has_marker(&self, node: NodeId, key: &str) -> bool {
        self.tree
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.element())
            .map(|el| el.markers.contains(key))
            .unwrap_or(false)
    }

    pub fn unmark(&self, node: NodeId, key: &str) -> bool {
        self.tree
            .borrow_mut()
            .element_mut(node)
            .map(|el| el.markers.remove(key))
            .unwrap_or(false)
    }

    // ===== Events =====

    pub fn add_event_listener(
        &self,
        node: NodeId,
        event: &str,
        listener: Listener,
    ) -> DomResult<ListenerId> {
        let mut tree = self.tree.borrow_mut();
        let id = ListenerId(tree.next_listener);
        tree.next_listener += 1;
        tree.node_mut(node)?.listeners.push(RegisteredListener {
            id,
            event: event.to_string(),
            listener,
        });
        Ok(id)
    }

    /// Returns whether a listener was removed
    pub fn remove_event_listener(&self, node: NodeId, id: ListenerId) -> bool {
        let mut tree = self.tree.borrow_mut();
        match tree.nodes.get_mut(&node) {
            Some(data) => {
                let before = data.listeners.len();
                data.listeners.retain(|l| l.id != id);
                before != data.listeners.len()
            }
            None => false,
        }
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.tree
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.listeners.iter().filter(|l| l.event == event).count())
            .unwrap_or(0)
    }

    /// Dispatch `event`, bubbling from its target to the root
    ///
    /// Returns `false` when a listener called `prevent_default`.
    pub fn dispatch_event(&self, event: &Event) -> bool {
        let mut current = Some(event.target);
        while let Some(node) = current {
            let listeners: Vec<Listener> = {
                let tree = self.tree.borrow();
                match tree.nodes.get(&node) {
                    Some(data) => data
                        .listeners
                        .iter()
                        .filter(|l| l.event == event.kind)
                        .map(|l| l.listener.clone())
                        .collect(),
                    None => Vec::new(),
                }
            };

            event.set_current_target(node);
            for listener in listeners {
                listener(event);
            }
            if event.propagation_stopped() {
                break;
            }
            current = self.parent(node);
        }
        !event.default_prevented()
    }

    /// Dispatch a plain event of `kind` at `target`
    pub fn dispatch(&self, target: NodeId, kind: &str) -> bool {
        self.dispatch_event(&Event::new(kind, target))
    }
}
