//! Controller for the vue substrate
//!
//! Each binding renders inside its own [`Effect`]. The effect re-runs when
//! a top-level key it read is written, so an update touches only the
//! bindings that depend on it.

use super::{scan, Binding, BindingController, ControllerCore};
use crate::adapter::{HostEnvironment, MarkupConvention};
use crate::error::{AcceladeError, Result};
use crate::store::{ReactiveHandle, ReactiveObject, StateStore};
use accelade_dom::NodeId;
use accelade_reactive::Effect;
use accelade_types::SubstrateId;
use std::cell::RefCell;
use std::rc::Rc;

pub struct VueController {
    core: ControllerCore,
    object: RefCell<Option<ReactiveObject>>,
}

impl VueController {
    pub fn new(env: &HostEnvironment, convention: MarkupConvention) -> Self {
        Self {
            core: ControllerCore::new(SubstrateId::Vue, env, convention),
            object: RefCell::new(None),
        }
    }
}

impl BindingController for VueController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn install(&self, binding: Binding) {
        if let Some(object) = self.object.borrow().clone() {
            let render = binding.render.clone();
            self.core.add_effect(Effect::new(move || render(&object)));
        }
        self.core.push_binding(binding);
    }

    fn init(&self, root: NodeId, store: Rc<dyn StateStore>) -> Result<()> {
        let object = match self.core.attach(root, store)? {
            ReactiveHandle::Reactive(object) => object,
            other => {
                return Err(AcceladeError::SubstrateMismatch {
                    store: other.substrate(),
                    controller: SubstrateId::Vue,
                })
            }
        };
        *self.object.borrow_mut() = Some(object);
        scan::bind_all(self, root);
        Ok(())
    }

    /// Effects keep themselves current; this forces one pass anyway
    fn update(&self) {
        if let Some(object) = self.object.borrow().clone() {
            self.core.run_all(&object);
        }
    }

    fn dispose(&self) {
        self.core.teardown();
        *self.object.borrow_mut() = None;
    }
}
