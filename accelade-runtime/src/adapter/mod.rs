//! Substrate adapters
//!
//! An adapter couples one [`StateStore`] implementation with the matching
//! [`BindingController`] and knows how to recognize its substrate on a
//! page. Five adapters are built in:
//!
//! | substrate | detected by | priority |
//! |---|---|---|
//! | `vue` | global `Vue`, or an element with `data-v-app` | 40 |
//! | `react` | global `React`, or an element with `data-reactroot` | 30 |
//! | `angular` | global `ng`, or an element with `ng-version` | 20 |
//! | `svelte` | global `__svelte`, or a `svelte-*` class | 10 |
//! | `vanilla` | always (fallback) | 0 |

pub mod convention;

pub use convention::{AttrPattern, Declaration, MarkupConvention};

use crate::binding::{create_controller, BindingController};
use crate::config::AcceladeConfig;
use crate::expr::Evaluator;
use crate::store::{create_store, StateStore};
use accelade_dom::{Document, NodeId};
use accelade_types::{BindingKind, SubstrateId};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// Host Environment
// ============================================================================

/// What the page offers to adapters: the document, the names of the
/// script globals present, and the runtime configuration
#[derive(Clone)]
pub struct HostEnvironment {
    pub document: Document,
    pub globals: HashSet<String>,
    pub config: AcceladeConfig,
    pub evaluator: Rc<Evaluator>,
}

impl fmt::Debug for HostEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut globals: Vec<&String> = self.globals.iter().collect();
        globals.sort();
        f.debug_struct("HostEnvironment")
            .field("globals", &globals)
            .field("config", &self.config)
            .finish()
    }
}

impl HostEnvironment {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, AcceladeConfig::default())
    }

    pub fn with_config(document: Document, config: AcceladeConfig) -> Self {
        Self {
            evaluator: Rc::new(Evaluator::from_config(&config)),
            document,
            globals: HashSet::new(),
            config,
        }
    }

    /// Declare a script global as present
    pub fn with_global(mut self, name: impl Into<String>) -> Self {
        self.globals.insert(name.into());
        self
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.globals.contains(name)
    }

    /// Whether any element in the document satisfies `predicate`
    pub fn any_element(&self, predicate: impl Fn(NodeId) -> bool) -> bool {
        self.document
            .elements_within(self.document.root())
            .into_iter()
            .any(predicate)
    }

    pub fn has_element_with_attribute(&self, name: &str) -> bool {
        self.any_element(|node| self.document.has_attribute(node, name))
    }
}

// ============================================================================
// Adapter Trait
// ============================================================================

/// A substrate: its store, its controller, and its markup vocabulary
pub trait Adapter {
    fn substrate(&self) -> SubstrateId;

    /// Detection priority; higher wins
    fn priority(&self) -> i32;

    fn convention(&self) -> &MarkupConvention;

    /// Whether the substrate appears to be in use on the page
    fn is_substrate_present(&self, env: &HostEnvironment) -> bool;

    fn create_state_store(&self) -> Rc<dyn StateStore>;

    fn create_binding_controller(&self, env: &HostEnvironment) -> Box<dyn BindingController>;

    fn name(&self) -> &'static str {
        self.substrate().as_str()
    }

    fn attribute_prefix(&self) -> &str {
        &self.convention().prefix
    }

    /// Prefix of the first event pattern, e.g. `@` or `(`
    fn event_prefix(&self) -> &str {
        self.convention()
            .events
            .first()
            .map(|p| p.prefix.as_str())
            .unwrap_or_default()
    }

    fn script_selector(&self) -> String {
        self.convention().script_selector()
    }

    fn binding_attribute_map(&self) -> Vec<(BindingKind, String)> {
        self.convention().bindings.clone()
    }
}

impl fmt::Debug for dyn Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("substrate", &self.substrate())
            .field("priority", &self.priority())
            .finish()
    }
}

// ============================================================================
// Built-in Adapters
// ============================================================================

type Detect = fn(&HostEnvironment) -> bool;

/// One of the five built-in substrates
pub struct BuiltinAdapter {
    substrate: SubstrateId,
    priority: i32,
    convention: MarkupConvention,
    detect: Detect,
}

impl BuiltinAdapter {
    pub fn new(substrate: SubstrateId) -> Self {
        let (priority, detect): (i32, Detect) = match substrate {
            SubstrateId::Vue => (40, detect_vue),
            SubstrateId::React => (30, detect_react),
            SubstrateId::Angular => (20, detect_angular),
            SubstrateId::Svelte => (10, detect_svelte),
            SubstrateId::Vanilla => (0, |_| true),
        };
        Self {
            substrate,
            priority,
            convention: MarkupConvention::for_substrate(substrate),
            detect,
        }
    }
}

impl Adapter for BuiltinAdapter {
    fn substrate(&self) -> SubstrateId {
        self.substrate
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn convention(&self) -> &MarkupConvention {
        &self.convention
    }

    fn is_substrate_present(&self, env: &HostEnvironment) -> bool {
        (self.detect)(env)
    }

    fn create_state_store(&self) -> Rc<dyn StateStore> {
        create_store(self.substrate)
    }

    fn create_binding_controller(&self, env: &HostEnvironment) -> Box<dyn BindingController> {
        create_controller(self.substrate, env, self.convention.clone())
    }
}

fn detect_vue(env: &HostEnvironment) -> bool {
    env.has_global("Vue") || env.has_element_with_attribute("data-v-app")
}

fn detect_react(env: &HostEnvironment) -> bool {
    env.has_global("React") || env.has_element_with_attribute("data-reactroot")
}

fn detect_angular(env: &HostEnvironment) -> bool {
    env.has_global("ng") || env.has_element_with_attribute("ng-version")
}

fn detect_svelte(env: &HostEnvironment) -> bool {
    env.has_global("__svelte")
        || env.any_element(|node| {
            env.document
                .class_list(node)
                .iter()
                .any(|class| class.starts_with("svelte-"))
        })
}

/// Get a built-in adapter by substrate name
pub fn adapter_by_name(name: &str) -> Option<Box<dyn Adapter>> {
    name.parse::<SubstrateId>()
        .ok()
        .map(|substrate| Box::new(BuiltinAdapter::new(substrate)) as Box<dyn Adapter>)
}

/// Names of the built-in adapters
pub fn available_adapters() -> Vec<&'static str> {
    SubstrateId::ALL.iter().map(|s| s.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(html: &str) -> HostEnvironment {
        let doc = Document::new();
        doc.append_html(doc.body(), html).unwrap();
        HostEnvironment::new(doc)
    }

    #[test]
    fn test_detection_predicates() {
        let vue = BuiltinAdapter::new(SubstrateId::Vue);
        assert!(vue.is_substrate_present(&env(r#"<div data-v-app></div>"#)));
        assert!(vue.is_substrate_present(&env("").with_global("Vue")));
        assert!(!vue.is_substrate_present(&env("<div></div>")));

        let svelte = BuiltinAdapter::new(SubstrateId::Svelte);
        assert!(svelte.is_substrate_present(&env(r#"<p class="x svelte-1ab2"></p>"#)));
        assert!(!svelte.is_substrate_present(&env(r#"<p class="not-svelte-1ab2"></p>"#)));

        let angular = BuiltinAdapter::new(SubstrateId::Angular);
        assert!(angular.is_substrate_present(&env(r#"<app-root ng-version="17"></app-root>"#)));

        assert!(BuiltinAdapter::new(SubstrateId::Vanilla).is_substrate_present(&env("")));
    }

    #[test]
    fn test_adapter_surface() {
        let adapter = adapter_by_name("angular").unwrap();
        assert_eq!(adapter.name(), "angular");
        assert_eq!(adapter.priority(), 20);
        assert_eq!(adapter.attribute_prefix(), "ng-");
        assert_eq!(adapter.event_prefix(), "(");
        assert_eq!(adapter.script_selector(), "script[ng-script]");
        assert!(adapter
            .binding_attribute_map()
            .contains(&(BindingKind::If, "*ngIf".to_string())));
        assert_eq!(adapter.create_state_store().substrate(), SubstrateId::Angular);

        assert!(adapter_by_name("ember").is_none());
        assert_eq!(available_adapters().len(), 5);
    }

    #[test]
    fn test_controller_matches_substrate() {
        let env = env("");
        for substrate in SubstrateId::ALL {
            let adapter = BuiltinAdapter::new(substrate);
            assert_eq!(adapter.create_binding_controller(&env).substrate(), substrate);
        }
    }
}
