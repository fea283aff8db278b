//! DOM events and listeners

use crate::node::NodeId;
use std::cell::Cell;
use std::rc::Rc;

/// Listener registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Callback invoked when a matching event reaches a node
pub type Listener = Rc<dyn Fn(&Event)>;

/// A dispatched event
///
/// Events bubble from the target to the document root. Listeners see the
/// node they were registered on through [`Event::current_target`].
#[derive(Debug)]
pub struct Event {
    pub kind: String,
    pub target: NodeId,
    pub detail: Option<serde_json::Value>,
    current_target: Cell<NodeId>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    pub fn new(kind: impl Into<String>, target: NodeId) -> Self {
        Self {
            kind: kind.into(),
            target,
            detail: None,
            current_target: Cell::new(target),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    pub(crate) fn set_current_target(&self, node: NodeId) {
        self.current_target.set(node);
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}
