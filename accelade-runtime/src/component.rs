//! Component bootstrapping
//!
//! A component root is an element carrying `data-accelade`, with its
//! payload in sibling attributes:
//!
//! ```html
//! <div data-accelade data-accelade-id="counter"
//!      data-accelade-state='{"count": 0}'
//!      data-accelade-sync="count">
//!   <span a-text="count"></span>
//! </div>
//! ```
//!
//! [`Page::boot`] mounts every root on the page. A component that fails to
//! mount is logged and skipped; the others still mount.

use crate::adapter::HostEnvironment;
use crate::binding::{scan::COMPONENT_ATTRIBUTE, BindingController, CustomMethod};
use crate::error::{AcceladeError, Result};
use crate::path::{self, State};
use crate::registry::AdapterRegistry;
use crate::store::StateStore;
use accelade_dom::{Document, NodeId};
use accelade_types::{ComponentId, SubstrateId};
use serde_json::Value as Json;
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, info, warn};

pub const ID_ATTRIBUTE: &str = "data-accelade-id";
pub const STATE_ATTRIBUTE: &str = "data-accelade-state";
pub const SYNC_ATTRIBUTE: &str = "data-accelade-sync";
pub const FRAMEWORK_ATTRIBUTE: &str = "data-accelade-framework";
pub const CLOAK_ATTRIBUTE: &str = "data-accelade-cloak";

/// Parse a `data-accelade-state` payload; it must be a JSON object
pub fn parse_state(source: &str) -> Result<State> {
    if source.trim().is_empty() {
        return Ok(State::new());
    }
    match serde_json::from_str::<Json>(source) {
        Ok(Json::Object(state)) => Ok(state),
        Ok(other) => Err(AcceladeError::InvalidState(format!(
            "expected an object, found {}",
            json_type(&other)
        ))),
        Err(err) => Err(AcceladeError::InvalidState(err.to_string())),
    }
}

fn json_type(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

/// Comma-separated property names of `data-accelade-sync`
pub fn parse_sync(source: &str) -> Vec<String> {
    source
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// One mounted component: its store and its binding controller
pub struct Component {
    id: ComponentId,
    root: NodeId,
    document: Document,
    store: Rc<dyn StateStore>,
    controller: Box<dyn BindingController>,
    sync: Vec<String>,
    script: Option<String>,
    disposed: Cell<bool>,
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("substrate", &self.substrate())
            .field("sync", &self.sync)
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

impl Component {
    /// Mount the component rooted at `root`
    pub fn mount(env: &HostEnvironment, registry: &AdapterRegistry, root: NodeId) -> Result<Self> {
        let doc = &env.document;
        if !doc.is_element(root) || !doc.has_attribute(root, COMPONENT_ATTRIBUTE) {
            return Err(AcceladeError::NotAComponentRoot(root));
        }

        let id = doc
            .get_attribute(root, ID_ATTRIBUTE)
            .filter(|id| !id.trim().is_empty())
            .map(ComponentId::new)
            .unwrap_or_else(|| ComponentId::new(format!("accelade-{}", root.0)));

        let state = match doc.get_attribute(root, STATE_ATTRIBUTE) {
            Some(source) => parse_state(&source).unwrap_or_else(|err| {
                warn!(component = %id, "{err}; starting with empty state");
                State::new()
            }),
            None => State::new(),
        };
        let sync = doc
            .get_attribute(root, SYNC_ATTRIBUTE)
            .map(|source| parse_sync(&source))
            .unwrap_or_default();

        let adapter = match doc.get_attribute(root, FRAMEWORK_ATTRIBUTE) {
            Some(name) if !name.trim().is_empty() => registry.get_adapter_named(env, &name),
            _ => registry.get_adapter(env, None),
        };

        let store = adapter.create_state_store();
        store.init(state);
        let controller = adapter.create_binding_controller(env);
        if let Err(err) = controller.init(root, store.clone()) {
            controller.dispose();
            store.dispose();
            return Err(err);
        }

        let convention = adapter.convention();
        for attribute in [CLOAK_ATTRIBUTE, convention.cloak_attribute.as_str()] {
            for node in doc.elements_with_attribute(root, attribute) {
                doc.remove_attribute(node, attribute)?;
            }
        }

        let script = doc
            .elements_within(root)
            .into_iter()
            .find(|node| {
                doc.tag_name(*node).as_deref() == Some("script")
                    && doc.has_attribute(*node, &convention.script_attribute)
            })
            .map(|node| doc.text_content(node));

        info!(
            component = %id,
            substrate = %adapter.substrate(),
            bindings = controller.core().binding_count(),
            "component mounted"
        );
        Ok(Self {
            id,
            root,
            document: doc.clone(),
            store,
            controller,
            sync,
            script,
            disposed: Cell::new(false),
        })
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn substrate(&self) -> SubstrateId {
        self.store.substrate()
    }

    pub fn store(&self) -> &Rc<dyn StateStore> {
        &self.store
    }

    pub fn controller(&self) -> &dyn BindingController {
        self.controller.as_ref()
    }

    /// Property names kept in sync with the server
    pub fn sync_keys(&self) -> &[String] {
        &self.sync
    }

    /// Source of the component's custom script tag
    pub fn script_source(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Make `name` callable from event handlers
    pub fn register_method(&self, name: impl Into<String>, method: Rc<CustomMethod>) {
        self.controller.core().actions().register(name, method);
    }

    /// Current values of the synced properties
    pub fn sync_properties(&self) -> State {
        self.sync
            .iter()
            .filter_map(|key| self.store.get(key).map(|value| (key.clone(), value)))
            .collect()
    }

    /// Apply server-confirmed values in one `set_many`
    ///
    /// Only synced properties and keys already in the state are accepted.
    /// Returns the number of updates applied.
    pub fn apply_server_update(&self, updates: State) -> usize {
        if self.disposed.get() {
            return 0;
        }
        let accepted: State = updates
            .into_iter()
            .filter(|(key, _)| {
                let root = path::root_key(key);
                let known = self.sync.iter().any(|s| s == key || s == root) || self.store.has(root);
                if !known {
                    debug!(component = %self.id, key = %key, "ignoring server update for unknown key");
                }
                known
            })
            .collect();
        let count = accepted.len();
        if count > 0 {
            self.store.set_many(accepted);
        }
        count
    }

    /// Dispose the controller, then the store; safe to call more than once
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.controller.dispose();
        self.store.dispose();
        debug!(component = %self.id, "component disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

/// Every component mounted on a page
#[derive(Debug, Default)]
pub struct Page {
    components: Vec<Component>,
}

impl Page {
    /// Mount every `[data-accelade]` root, outermost first
    pub fn boot(env: &HostEnvironment, registry: &AdapterRegistry) -> Self {
        let doc = &env.document;
        let roots = doc.elements_with_attribute(doc.root(), COMPONENT_ATTRIBUTE);
        let mut components = Vec::with_capacity(roots.len());
        for root in roots {
            match Component::mount(env, registry, root) {
                Ok(component) => components.push(component),
                Err(err) => warn!(%root, "Failed to mount component: {err}"),
            }
        }
        info!(components = components.len(), "page booted");
        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Dispose every component, innermost first
    pub fn dispose(&self) {
        for component in self.components.iter().rev() {
            component.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_state() {
        assert_eq!(parse_state(r#"{"a": 1}"#).unwrap().get("a"), Some(&json!(1)));
        assert!(parse_state("").unwrap().is_empty());
        assert!(matches!(parse_state("[1]"), Err(AcceladeError::InvalidState(msg)) if msg.contains("an array")));
        assert!(parse_state("{oops").is_err());
    }

    #[test]
    fn test_parse_sync() {
        assert_eq!(parse_sync(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_sync("").is_empty());
    }

    #[test]
    fn test_mount_requires_a_component_root() {
        let doc = Document::new();
        let plain = doc.append_html(doc.body(), "<div></div>").unwrap()[0];
        let env = HostEnvironment::new(doc);
        let registry = AdapterRegistry::new();
        assert!(matches!(
            Component::mount(&env, &registry, plain),
            Err(AcceladeError::NotAComponentRoot(_))
        ));
    }
}
