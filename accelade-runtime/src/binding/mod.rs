//! DOM binding controllers
//!
//! A controller takes a component root and its store, discovers the
//! binding declarations under the root, and keeps the DOM in step with the
//! state from then on. All controllers share the render functions in
//! [`render`] and the bookkeeping in [`ControllerCore`]; they differ only in
//! how a change reaches the renders:
//!
//! - **vanilla**, **react**, **svelte**: one subscription on the store's
//!   handle re-runs every binding
//! - **vue**, **angular**: each binding runs inside its own tracked
//!   [`Effect`] and re-runs only when a key it read changes
//!
//! After [`BindingController::dispose`] no DOM mutation originates from the
//! controller, whatever the store does.

pub mod actions;
mod angular;
mod react;
pub mod render;
pub mod scan;
mod svelte;
mod vanilla;
mod vue;

pub use actions::{Actions, CustomMethod, MethodContext};
pub use angular::AngularController;
pub use react::ReactController;
pub use render::{Render, RenderContext};
pub use svelte::SvelteController;
pub use vanilla::VanillaController;
pub use vue::VueController;

use crate::adapter::{Declaration, HostEnvironment, MarkupConvention};
use crate::error::{AcceladeError, Result};
use crate::expr::{Evaluator, Scope};
use crate::store::{ReactiveHandle, StateStore};
use accelade_dom::{Document, Listener, ListenerId, NodeId};
use accelade_reactive::{Effect, Unsubscribe};
use accelade_types::{BindingKind, SubstrateId};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, warn};

/// Marker set on an element once a binding kind is attached to it
pub const BOUND_MARKER_PREFIX: &str = "accelade-bound:";

/// One live binding
#[derive(Clone)]
pub struct Binding {
    pub node: NodeId,
    pub kind: BindingKind,
    /// Expression, state key, or handler
    pub expression: String,
    pub render: Render,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("node", &self.node)
            .field("kind", &self.kind)
            .field("expression", &self.expression)
            .finish()
    }
}

/// Re-run every render against `scope`
///
/// Renders are collected first so that a render may register bindings or
/// trigger disposal without tripping over the list.
pub(crate) fn run_bindings(bindings: &RefCell<Vec<Binding>>, scope: &dyn Scope) {
    let renders: Vec<Render> = bindings.borrow().iter().map(|b| b.render.clone()).collect();
    for render in renders {
        render(scope);
    }
}

/// Bookkeeping shared by every controller
pub struct ControllerCore {
    substrate: SubstrateId,
    ctx: RenderContext,
    convention: MarkupConvention,
    actions: Rc<Actions>,
    root: Cell<Option<NodeId>>,
    store: RefCell<Option<Rc<dyn StateStore>>>,
    handle: RefCell<Option<ReactiveHandle>>,
    bindings: Rc<RefCell<Vec<Binding>>>,
    listeners: RefCell<Vec<(NodeId, ListenerId)>>,
    cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
    effects: RefCell<Vec<Effect>>,
    subscriptions: RefCell<Vec<Unsubscribe>>,
    claimed: RefCell<HashSet<(NodeId, String)>>,
}

impl ControllerCore {
    pub fn new(substrate: SubstrateId, env: &HostEnvironment, convention: MarkupConvention) -> Self {
        Self::with_parts(substrate, env.document.clone(), env.evaluator.clone(), convention)
    }

    pub fn with_parts(
        substrate: SubstrateId,
        document: Document,
        evaluator: Rc<Evaluator>,
        convention: MarkupConvention,
    ) -> Self {
        Self {
            substrate,
            actions: Rc::new(Actions::new(evaluator.clone())),
            ctx: RenderContext::new(document, evaluator),
            convention,
            root: Cell::new(None),
            store: RefCell::new(None),
            handle: RefCell::new(None),
            bindings: Rc::new(RefCell::new(Vec::new())),
            listeners: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
            effects: RefCell::new(Vec::new()),
            subscriptions: RefCell::new(Vec::new()),
            claimed: RefCell::new(HashSet::new()),
        }
    }

    pub fn substrate(&self) -> SubstrateId {
        self.substrate
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn document(&self) -> &Document {
        &self.ctx.document
    }

    pub fn evaluator(&self) -> &Rc<Evaluator> {
        &self.ctx.evaluator
    }

    pub fn convention(&self) -> &MarkupConvention {
        &self.convention
    }

    pub fn actions(&self) -> &Rc<Actions> {
        &self.actions
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root.get()
    }

    pub fn store(&self) -> Option<Rc<dyn StateStore>> {
        self.store.borrow().clone()
    }

    pub fn handle(&self) -> Option<ReactiveHandle> {
        self.handle.borrow().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.store.borrow().is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.ctx.is_disposed()
    }

    pub fn bindings(&self) -> Vec<Binding> {
        self.bindings.borrow().clone()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn effect_count(&self) -> usize {
        self.effects.borrow().len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    pub fn placeholder(&self, node: NodeId) -> Option<NodeId> {
        self.ctx.placeholders.borrow().get(&node).copied()
    }

    pub fn placeholder_count(&self) -> usize {
        self.ctx.placeholders.borrow().len()
    }

    /// Take ownership of `root` and `store`, returning the store's handle
    pub fn attach(&self, root: NodeId, store: Rc<dyn StateStore>) -> Result<ReactiveHandle> {
        if self.is_disposed() {
            return Err(AcceladeError::Disposed);
        }
        if self.is_initialized() {
            return Err(AcceladeError::AlreadyInitialized);
        }
        let handle = store.reactive_handle();
        if store.substrate() != self.substrate || handle.substrate() != self.substrate {
            return Err(AcceladeError::SubstrateMismatch {
                store: store.substrate(),
                controller: self.substrate,
            });
        }
        if !self.document().is_element(root) {
            return Err(accelade_dom::DomError::NotAnElement(root).into());
        }

        self.actions.set_initial(store.get_state());
        self.root.set(Some(root));
        *self.store.borrow_mut() = Some(store);
        *self.handle.borrow_mut() = Some(handle.clone());
        Ok(handle)
    }

    /// Claim `(node, key)`; `false` when it is already bound
    ///
    /// Elements carry the claim as an expando marker so a second controller
    /// pass over the same markup sees it too.
    pub fn claim(&self, node: NodeId, key: &str) -> bool {
        if self.document().is_element(node) {
            let marker = format!("{}{}", BOUND_MARKER_PREFIX, key);
            match self.document().mark(node, &marker) {
                Ok(true) => {
                    let doc = self.document().clone();
                    self.add_cleanup(Box::new(move || {
                        doc.unmark(node, &marker);
                    }));
                    true
                }
                Ok(false) => false,
                Err(err) => {
                    warn!(%node, "Cannot mark node: {err}");
                    false
                }
            }
        } else {
            self.claimed.borrow_mut().insert((node, key.to_string()))
        }
    }

    pub fn push_binding(&self, binding: Binding) {
        debug!(node = %binding.node, kind = %binding.kind, expression = %binding.expression, "binding");
        self.bindings.borrow_mut().push(binding);
    }

    /// A callback that re-runs every binding of this controller
    pub fn refresher(&self) -> Render {
        let bindings = self.bindings.clone();
        let disposed = self.ctx.disposed.clone();
        Rc::new(move |scope: &dyn Scope| {
            if !disposed.get() {
                run_bindings(&bindings, scope);
            }
        })
    }

    pub fn run_all(&self, scope: &dyn Scope) {
        if !self.is_disposed() {
            run_bindings(&self.bindings, scope);
        }
    }

    pub fn add_effect(&self, effect: Effect) {
        self.effects.borrow_mut().push(effect);
    }

    pub fn add_subscription(&self, subscription: Unsubscribe) {
        self.subscriptions.borrow_mut().push(subscription);
    }

    pub fn add_cleanup(&self, cleanup: Box<dyn FnOnce()>) {
        self.cleanups.borrow_mut().push(cleanup);
    }

    /// Add a DOM listener that is removed on dispose
    pub fn listen(&self, node: NodeId, event: &str, listener: Listener) {
        match self.document().add_event_listener(node, event, listener) {
            Ok(id) => self.listeners.borrow_mut().push((node, id)),
            Err(err) => warn!(%node, event, "Cannot add listener: {err}"),
        }
    }

    /// Stop everything; safe to call more than once
    pub fn teardown(&self) {
        if self.ctx.disposed.replace(true) {
            return;
        }

        // Dropping an effect stops it
        let effects = std::mem::take(&mut *self.effects.borrow_mut());
        drop(effects);

        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        for subscription in subscriptions {
            subscription.unsubscribe();
        }

        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for (node, id) in listeners {
            self.document().remove_event_listener(node, id);
        }

        let cleanups = std::mem::take(&mut *self.cleanups.borrow_mut());
        for cleanup in cleanups {
            cleanup();
        }

        self.ctx.placeholders.borrow_mut().clear();
        self.bindings.borrow_mut().clear();
        self.claimed.borrow_mut().clear();
        self.root.set(None);
        *self.handle.borrow_mut() = None;
        *self.store.borrow_mut() = None;
        debug!(substrate = %self.substrate, "controller disposed");
    }
}

/// Contract of every binding controller
///
/// Implementors supply [`BindingController::install`], which starts
/// propagation for one binding, plus `init` and `update`. The `bind_*`
/// methods build the render for each kind and hand it to `install`.
pub trait BindingController {
    fn core(&self) -> &ControllerCore;

    /// Render `binding` once and keep it rendering on changes
    fn install(&self, binding: Binding);

    /// Attach to `root` and `store`, bind everything under `root` and
    /// render it
    fn init(&self, root: NodeId, store: Rc<dyn StateStore>) -> Result<()>;

    /// Re-render every binding; a no-op where changes propagate on their own
    fn update(&self);

    fn dispose(&self) {
        self.core().teardown();
    }

    fn substrate(&self) -> SubstrateId {
        self.core().substrate()
    }

    fn is_disposed(&self) -> bool {
        self.core().is_disposed()
    }

    /// Claim, then install; `claim_key` distinguishes kinds on one node
    ///
    /// Returns whether the binding was installed.
    fn bind(&self, node: NodeId, kind: BindingKind, claim_key: &str, expression: &str, render: Render) -> bool {
        let core = self.core();
        if core.is_disposed() || !core.is_initialized() {
            warn!(%node, kind = %kind, "Binding ignored: controller is not running");
            return false;
        }
        if !core.claim(node, claim_key) {
            debug!(%node, kind = %kind, "already bound");
            return false;
        }
        self.install(Binding {
            node,
            kind,
            expression: expression.to_string(),
            render,
        });
        true
    }

    fn bind_text(&self, node: NodeId, expression: &str) {
        let render = render::text(self.core().context(), node, expression);
        self.bind(node, BindingKind::Text, "text", expression, render);
    }

    fn bind_html(&self, node: NodeId, expression: &str) {
        let render = render::html(self.core().context(), node, expression);
        self.bind(node, BindingKind::Html, "html", expression, render);
    }

    fn bind_show(&self, node: NodeId, expression: &str) {
        let render = render::show(self.core().context(), node, expression);
        self.bind(node, BindingKind::Show, "show", expression, render);
    }

    fn bind_if(&self, node: NodeId, expression: &str) {
        let core = self.core();
        if core.placeholder(node).is_some() {
            return;
        }
        let render = render::conditional(core.context(), node, expression);
        self.bind(node, BindingKind::If, "if", expression, render);
    }

    fn bind_attr(&self, node: NodeId, name: &str, expression: &str) {
        let render = render::attr(self.core().context(), node, name, expression);
        self.bind(node, BindingKind::Attr, &format!("attr:{}", name), expression, render);
    }

    fn bind_class(&self, node: NodeId, expression: &str) {
        let render = render::class(self.core().context(), node, expression);
        self.bind(node, BindingKind::Class, "class", expression, render);
    }

    fn bind_style(&self, node: NodeId, expression: &str) {
        let render = render::style(self.core().context(), node, expression);
        self.bind(node, BindingKind::Style, "style", expression, render);
    }

    fn bind_interpolation(&self, node: NodeId, template: &str) {
        let render = render::interpolation(self.core().context(), node, template);
        self.bind(node, BindingKind::Text, "interpolation", template, render);
    }

    /// Two-way binding to the state key `key`
    fn bind_model(&self, node: NodeId, key: &str) {
        let core = self.core();
        let Some(store) = core.store() else {
            warn!(%node, "Model binding ignored: controller is not running");
            return;
        };
        let key = key.trim();
        let control = render::ControlKind::of(core.document(), node);
        let listener = render::model_listener(core.context(), node, key, store);
        let renderer = render::model(core.context(), node, key);

        if self.bind(node, BindingKind::Model, "model", key, renderer) {
            core.listen(node, control.event(), listener);
        }
    }

    /// Native listener for `event`, dispatching `handler` to the actions
    fn bind_event(&self, node: NodeId, event: &str, handler: &str, modifiers: &[String]) {
        let core = self.core();
        let Some(store) = core.store() else {
            warn!(%node, "Event binding ignored: controller is not running");
            return;
        };
        if core.is_disposed() || !core.claim(node, &format!("event:{}", event)) {
            return;
        }
        let listener = render::event_listener(core.context(), core.actions().clone(), store, handler, modifiers);
        core.listen(node, event, listener);
        debug!(%node, event, handler, "event bound");
    }

    /// Bind one classified attribute
    fn bind_declaration(&self, node: NodeId, declaration: &Declaration, value: &str) {
        match declaration {
            Declaration::Binding(BindingKind::Text) => self.bind_text(node, value),
            Declaration::Binding(BindingKind::Html) => self.bind_html(node, value),
            Declaration::Binding(BindingKind::Show) => self.bind_show(node, value),
            Declaration::Binding(BindingKind::If) => self.bind_if(node, value),
            Declaration::Binding(BindingKind::Model) => self.bind_model(node, value),
            Declaration::Binding(BindingKind::Class) => self.bind_class(node, value),
            Declaration::Binding(BindingKind::Style) => self.bind_style(node, value),
            Declaration::Binding(kind @ (BindingKind::Attr | BindingKind::Event)) => {
                debug!(%node, kind = %kind, "declaration needs a name");
            }
            Declaration::Attr(name) => self.bind_attr(node, name, value),
            Declaration::Event { name, modifiers } => self.bind_event(node, name, value, modifiers),
        }
    }
}

/// Create the controller for `substrate`
pub fn create_controller(
    substrate: SubstrateId,
    env: &HostEnvironment,
    convention: MarkupConvention,
) -> Box<dyn BindingController> {
    match substrate {
        SubstrateId::Vanilla => Box::new(VanillaController::new(env, convention)),
        SubstrateId::Vue => Box::new(VueController::new(env, convention)),
        SubstrateId::React => Box::new(ReactController::new(env, convention)),
        SubstrateId::Svelte => Box::new(SvelteController::new(env, convention)),
        SubstrateId::Angular => Box::new(AngularController::new(env, convention)),
    }
}
