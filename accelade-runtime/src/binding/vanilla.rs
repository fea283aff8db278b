//! Controller for the vanilla substrate
//!
//! The store's proxy signals `on_refresh` once per write call; one
//! subscription re-renders every binding against the proxy, so a
//! `set_many` costs a single pass.

use super::{scan, Binding, BindingController, ControllerCore};
use crate::adapter::{HostEnvironment, MarkupConvention};
use crate::error::{AcceladeError, Result};
use crate::store::{ReactiveHandle, StateProxy, StateStore};
use accelade_dom::NodeId;
use accelade_types::SubstrateId;
use std::cell::RefCell;
use std::rc::Rc;

pub struct VanillaController {
    core: ControllerCore,
    proxy: RefCell<Option<StateProxy>>,
}

impl VanillaController {
    pub fn new(env: &HostEnvironment, convention: MarkupConvention) -> Self {
        Self {
            core: ControllerCore::new(SubstrateId::Vanilla, env, convention),
            proxy: RefCell::new(None),
        }
    }

    fn proxy(&self) -> Option<StateProxy> {
        self.proxy.borrow().clone()
    }
}

impl BindingController for VanillaController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn install(&self, binding: Binding) {
        if let Some(proxy) = self.proxy() {
            (binding.render)(&proxy);
        }
        self.core.push_binding(binding);
    }

    fn init(&self, root: NodeId, store: Rc<dyn StateStore>) -> Result<()> {
        let proxy = match self.core.attach(root, store)? {
            ReactiveHandle::Proxy(proxy) => proxy,
            other => {
                return Err(AcceladeError::SubstrateMismatch {
                    store: other.substrate(),
                    controller: SubstrateId::Vanilla,
                })
            }
        };
        *self.proxy.borrow_mut() = Some(proxy.clone());
        scan::bind_all(self, root);

        let refresh = self.core.refresher();
        let scope = proxy.clone();
        let subscription = proxy.on_refresh(Rc::new(move || refresh(&scope)));
        self.core.add_subscription(subscription);
        Ok(())
    }

    fn update(&self) {
        if let Some(proxy) = self.proxy() {
            self.core.run_all(&proxy);
        }
    }

    fn dispose(&self) {
        self.core.teardown();
        *self.proxy.borrow_mut() = None;
    }
}
