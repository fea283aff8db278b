//! Controller for the angular substrate
//!
//! Bindings render inside effects that read the per-key signals, the same
//! way the vue controller uses its reactive object. The aggregate stream
//! is left to external observers.

use super::{scan, Binding, BindingController, ControllerCore};
use crate::adapter::{HostEnvironment, MarkupConvention};
use crate::error::{AcceladeError, Result};
use crate::store::{ReactiveHandle, SignalState, StateStore};
use accelade_dom::NodeId;
use accelade_reactive::Effect;
use accelade_types::SubstrateId;
use std::cell::RefCell;
use std::rc::Rc;

pub struct AngularController {
    core: ControllerCore,
    signals: RefCell<Option<SignalState>>,
}

impl AngularController {
    pub fn new(env: &HostEnvironment, convention: MarkupConvention) -> Self {
        Self {
            core: ControllerCore::new(SubstrateId::Angular, env, convention),
            signals: RefCell::new(None),
        }
    }
}

impl BindingController for AngularController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn install(&self, binding: Binding) {
        if let Some(signals) = self.signals.borrow().clone() {
            let render = binding.render.clone();
            self.core.add_effect(Effect::new(move || render(&signals)));
        }
        self.core.push_binding(binding);
    }

    fn init(&self, root: NodeId, store: Rc<dyn StateStore>) -> Result<()> {
        let signals = match self.core.attach(root, store)? {
            ReactiveHandle::Signals(signals) => signals,
            other => {
                return Err(AcceladeError::SubstrateMismatch {
                    store: other.substrate(),
                    controller: SubstrateId::Angular,
                })
            }
        };
        *self.signals.borrow_mut() = Some(signals);
        scan::bind_all(self, root);
        Ok(())
    }

    fn update(&self) {
        if let Some(signals) = self.signals.borrow().clone() {
            self.core.run_all(&signals);
        }
    }

    fn dispose(&self) {
        self.core.teardown();
        *self.signals.borrow_mut() = None;
    }
}
