//! Controller for the svelte substrate

use super::{scan, Binding, BindingController, ControllerCore};
use crate::adapter::{HostEnvironment, MarkupConvention};
use crate::error::{AcceladeError, Result};
use crate::path::State;
use crate::store::{ReactiveHandle, StateStore};
use accelade_dom::NodeId;
use accelade_reactive::Writable;
use accelade_types::SubstrateId;
use std::cell::RefCell;
use std::rc::Rc;

/// Re-renders every binding from each value the store's writable emits
pub struct SvelteController {
    core: ControllerCore,
    writable: RefCell<Option<Writable<State>>>,
}

impl SvelteController {
    pub fn new(env: &HostEnvironment, convention: MarkupConvention) -> Self {
        Self {
            core: ControllerCore::new(SubstrateId::Svelte, env, convention),
            writable: RefCell::new(None),
        }
    }
}

impl BindingController for SvelteController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn install(&self, binding: Binding) {
        if let Some(writable) = self.writable.borrow().as_ref() {
            (binding.render)(&writable.get());
        }
        self.core.push_binding(binding);
    }

    fn init(&self, root: NodeId, store: Rc<dyn StateStore>) -> Result<()> {
        let writable = match self.core.attach(root, store)? {
            ReactiveHandle::Writable(writable) => writable,
            other => {
                return Err(AcceladeError::SubstrateMismatch {
                    store: other.substrate(),
                    controller: SubstrateId::Svelte,
                })
            }
        };
        *self.writable.borrow_mut() = Some(writable.clone());
        scan::bind_all(self, root);

        // Subscribing delivers the current value, which re-renders once
        let refresh = self.core.refresher();
        let subscription = writable.subscribe(move |state: &State| refresh(state));
        self.core.add_subscription(subscription);
        Ok(())
    }

    fn update(&self) {
        if let Some(writable) = self.writable.borrow().clone() {
            self.core.run_all(&writable.get());
        }
    }

    fn dispose(&self) {
        self.core.teardown();
        *self.writable.borrow_mut() = None;
    }
}
