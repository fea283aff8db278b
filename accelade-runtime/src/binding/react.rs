//! Controller for the react substrate
//!
//! Bindings render from the store's immutable snapshot. A single snapshot
//! listener re-renders everything when the version moves; batched writes
//! publish one snapshot and so cost one pass.

use super::{scan, Binding, BindingController, ControllerCore};
use crate::adapter::{HostEnvironment, MarkupConvention};
use crate::error::{AcceladeError, Result};
use crate::path::State;
use crate::store::{ReactiveHandle, StateStore};
use accelade_dom::NodeId;
use accelade_reactive::ExternalStore;
use accelade_types::SubstrateId;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::trace;

pub struct ReactController {
    core: ControllerCore,
    external: RefCell<Option<ExternalStore<State>>>,
    rendered_version: Rc<Cell<u64>>,
}

impl ReactController {
    pub fn new(env: &HostEnvironment, convention: MarkupConvention) -> Self {
        Self {
            core: ControllerCore::new(SubstrateId::React, env, convention),
            external: RefCell::new(None),
            rendered_version: Rc::new(Cell::new(0)),
        }
    }

    /// Snapshot version the DOM currently reflects
    pub fn rendered_version(&self) -> u64 {
        self.rendered_version.get()
    }
}

impl BindingController for ReactController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn install(&self, binding: Binding) {
        if let Some(external) = self.external.borrow().as_ref() {
            let snapshot = external.get_snapshot();
            (binding.render)(&*snapshot);
        }
        self.core.push_binding(binding);
    }

    fn init(&self, root: NodeId, store: Rc<dyn StateStore>) -> Result<()> {
        let external = match self.core.attach(root, store)? {
            ReactiveHandle::External(external) => external,
            other => {
                return Err(AcceladeError::SubstrateMismatch {
                    store: other.substrate(),
                    controller: SubstrateId::React,
                })
            }
        };
        *self.external.borrow_mut() = Some(external.clone());
        scan::bind_all(self, root);
        self.rendered_version.set(external.version());

        let refresh = self.core.refresher();
        let source = external.clone();
        let rendered = self.rendered_version.clone();
        let subscription = external.subscribe(move || {
            let version = source.version();
            if version == rendered.get() {
                return;
            }
            trace!(version, "rendering snapshot");
            rendered.set(version);
            let snapshot = source.get_snapshot();
            refresh(&*snapshot);
        });
        self.core.add_subscription(subscription);
        Ok(())
    }

    fn update(&self) {
        let Some(external) = self.external.borrow().clone() else {
            return;
        };
        self.rendered_version.set(external.version());
        let snapshot = external.get_snapshot();
        self.core.run_all(&*snapshot);
    }

    fn dispose(&self) {
        self.core.teardown();
        *self.external.borrow_mut() = None;
    }
}
