//! Adapter registry and substrate detection
//!
//! The registry moves from *unconfigured* to *detected* on the first
//! detection and stays there until [`AdapterRegistry::reset`]; an explicit
//! [`AdapterRegistry::set_override`] pins a substrate instead. Detection
//! checks, in order:
//!
//! 1. the `framework` key of the runtime configuration
//! 2. `<meta name="accelade-framework" content="...">`
//! 3. registered detection predicates, highest priority first (fallback
//!    excluded)
//! 4. the fallback substrate
//!
//! Adapter instances are created on first request and cached.

use crate::adapter::{Adapter, BuiltinAdapter, HostEnvironment};
use accelade_types::SubstrateId;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Meta tag naming the page's substrate
pub const FRAMEWORK_META: &str = "accelade-framework";

pub type AdapterFactory = Rc<dyn Fn() -> Rc<dyn Adapter>>;
pub type DetectFn = Rc<dyn Fn(&HostEnvironment) -> bool>;

/// One registered substrate
#[derive(Clone)]
pub struct Registration {
    pub substrate: SubstrateId,
    pub priority: i32,
    factory: AdapterFactory,
    detect: DetectFn,
}

impl Registration {
    pub fn new(substrate: SubstrateId, priority: i32, factory: AdapterFactory, detect: DetectFn) -> Self {
        Self {
            substrate,
            priority,
            factory,
            detect,
        }
    }

    /// Registration for a built-in adapter, using its own priority and
    /// predicate
    pub fn builtin(substrate: SubstrateId) -> Self {
        let probe = Rc::new(BuiltinAdapter::new(substrate));
        let priority = probe.priority();
        let detect: DetectFn = Rc::new(move |env: &HostEnvironment| probe.is_substrate_present(env));
        let factory: AdapterFactory = Rc::new(move || Rc::new(BuiltinAdapter::new(substrate)) as Rc<dyn Adapter>);
        Self::new(substrate, priority, factory, detect)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("substrate", &self.substrate)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Where the registry stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Unconfigured,
    Detected(SubstrateId),
    Overridden(SubstrateId),
}

pub struct AdapterRegistry {
    registrations: Vec<Registration>,
    fallback: SubstrateId,
    state: Cell<RegistryState>,
    instances: RefCell<HashMap<SubstrateId, Rc<dyn Adapter>>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("registrations", &self.registrations)
            .field("state", &self.state.get())
            .finish()
    }
}

impl AdapterRegistry {
    /// A registry holding only the fallback adapter
    pub fn new() -> Self {
        Self {
            registrations: vec![Registration::builtin(SubstrateId::FALLBACK)],
            fallback: SubstrateId::FALLBACK,
            state: Cell::new(RegistryState::Unconfigured),
            instances: RefCell::new(HashMap::new()),
        }
    }

    /// A registry holding all five built-in adapters
    pub fn with_builtin_adapters() -> Self {
        let mut registry = Self::new();
        for substrate in SubstrateId::ALL {
            if !substrate.is_fallback() {
                registry.register(Registration::builtin(substrate));
            }
        }
        registry
    }

    /// Add or replace the registration for a substrate
    pub fn register(&mut self, registration: Registration) {
        let substrate = registration.substrate;
        self.registrations.retain(|r| r.substrate != substrate);
        self.registrations.push(registration);
        self.registrations.sort_by(|a, b| b.priority.cmp(&a.priority));
        self.instances.borrow_mut().remove(&substrate);
        debug!(%substrate, "adapter registered");
    }

    pub fn is_registered(&self, substrate: SubstrateId) -> bool {
        self.registrations.iter().any(|r| r.substrate == substrate)
    }

    /// Registered substrates, highest priority first
    pub fn substrates(&self) -> Vec<SubstrateId> {
        self.registrations.iter().map(|r| r.substrate).collect()
    }

    pub fn fallback(&self) -> SubstrateId {
        self.fallback
    }

    pub fn state(&self) -> RegistryState {
        self.state.get()
    }

    /// Pin the substrate, bypassing detection
    pub fn set_override(&self, substrate: SubstrateId) {
        if self.is_registered(substrate) {
            self.state.set(RegistryState::Overridden(substrate));
        } else {
            warn!(%substrate, "Cannot override with an unregistered adapter");
        }
    }

    /// The page's substrate; memoized until [`AdapterRegistry::reset`]
    pub fn detect(&self, env: &HostEnvironment) -> SubstrateId {
        match self.state.get() {
            RegistryState::Detected(substrate) | RegistryState::Overridden(substrate) => substrate,
            RegistryState::Unconfigured => {
                let substrate = self.run_detection(env);
                info!(%substrate, "substrate detected");
                self.state.set(RegistryState::Detected(substrate));
                substrate
            }
        }
    }

    fn run_detection(&self, env: &HostEnvironment) -> SubstrateId {
        match env.config.requested_substrate() {
            Some(Ok(substrate)) if self.is_registered(substrate) => return substrate,
            Some(Ok(substrate)) => warn!(%substrate, "Configured framework has no registered adapter"),
            Some(Err(err)) => warn!("Configured framework is not recognized: {err}"),
            None => {}
        }

        if let Some(name) = env.document.meta_content(FRAMEWORK_META) {
            match name.trim().parse::<SubstrateId>() {
                Ok(substrate) if self.is_registered(substrate) => return substrate,
                _ => warn!(framework = %name, "Meta framework marker names no registered adapter"),
            }
        }

        self.registrations
            .iter()
            .filter(|r| r.substrate != self.fallback)
            .find(|r| (r.detect)(env))
            .map(|r| r.substrate)
            .unwrap_or(self.fallback)
    }

    /// The adapter for `requested`, or for the detected substrate
    ///
    /// Unregistered requests degrade to the fallback.
    pub fn get_adapter(&self, env: &HostEnvironment, requested: Option<SubstrateId>) -> Rc<dyn Adapter> {
        let substrate = match requested {
            Some(substrate) if self.is_registered(substrate) => substrate,
            Some(substrate) => {
                warn!(%substrate, fallback = %self.fallback, "No adapter registered; using fallback");
                self.fallback
            }
            None => self.detect(env),
        };
        self.instance(substrate)
    }

    /// Like [`AdapterRegistry::get_adapter`], by name
    pub fn get_adapter_named(&self, env: &HostEnvironment, name: &str) -> Rc<dyn Adapter> {
        match name.trim().parse::<SubstrateId>() {
            Ok(substrate) => self.get_adapter(env, Some(substrate)),
            Err(err) => {
                warn!(fallback = %self.fallback, "{err}; using fallback");
                self.instance(self.fallback)
            }
        }
    }

    fn instance(&self, substrate: SubstrateId) -> Rc<dyn Adapter> {
        if let Some(adapter) = self.instances.borrow().get(&substrate) {
            return adapter.clone();
        }
        let adapter = match self.registrations.iter().find(|r| r.substrate == substrate) {
            Some(registration) => (registration.factory)(),
            None => Rc::new(BuiltinAdapter::new(self.fallback)) as Rc<dyn Adapter>,
        };
        self.instances.borrow_mut().insert(substrate, adapter.clone());
        adapter
    }

    pub fn cached_instances(&self) -> usize {
        self.instances.borrow().len()
    }

    /// Forget the detection result and every cached instance
    pub fn reset(&self) {
        self.state.set(RegistryState::Unconfigured);
        self.instances.borrow_mut().clear();
    }
}
