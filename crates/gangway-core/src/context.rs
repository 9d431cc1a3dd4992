//! Bridge context
//!
//! The context is an explicit value owned by the embedding: it carries the
//! guest runtime handle, the class template cache, the rooted-handle
//! registry, and the owner back-reference registry. Several independent
//! contexts can coexist, each with its own caches; dropping a context
//! tears its bridge down. Proxies hold a weak reference to the context
//! interior and degrade safely if they outlive it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use gangway_sdk::{GuestClass, GuestRuntime, HostValue};

use crate::construct::{construct, ConstructOptions};
use crate::error::BridgeError;
use crate::invoke;
use crate::owner::OwnerRegistry;
use crate::proxy::ProxyObject;
use crate::roots::RootRegistry;
use crate::template::{ClassTemplate, TemplateCache};

/// Shared interior of a bridge context.
///
/// Everything in here is single-threaded by construction — `Rc`/`RefCell`,
/// deliberately `!Send`. The model forbids concurrent access; the type
/// system enforces it so no lock is needed or wanted.
pub(crate) struct BridgeShared {
    pub(crate) runtime: Rc<dyn GuestRuntime>,
    pub(crate) templates: RefCell<TemplateCache>,
    pub(crate) roots: RefCell<RootRegistry>,
    pub(crate) owners: RefCell<OwnerRegistry>,
}

/// One bridge instance tying a guest runtime into the host engine.
///
/// Cloning is cheap and yields another handle to the same bridge; the
/// bridge itself is torn down when the last handle drops.
pub struct BridgeContext {
    shared: Rc<BridgeShared>,
}

impl Clone for BridgeContext {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl BridgeContext {
    /// Create a context around a guest runtime.
    pub fn new(runtime: Rc<dyn GuestRuntime>) -> Self {
        Self {
            shared: Rc::new(BridgeShared {
                runtime,
                templates: RefCell::new(TemplateCache::new()),
                roots: RefCell::new(RootRegistry::new()),
                owners: RefCell::new(OwnerRegistry::new()),
            }),
        }
    }

    pub(crate) fn shared(&self) -> &Rc<BridgeShared> {
        &self.shared
    }

    /// The guest runtime this context bridges.
    pub fn runtime(&self) -> &Rc<dyn GuestRuntime> {
        &self.shared.runtime
    }

    /// Get the class template for `class`, building it on first reference.
    pub fn template(&self, class: GuestClass) -> Rc<ClassTemplate> {
        self.shared
            .templates
            .borrow_mut()
            .get_or_create(self.shared.runtime.as_ref(), class)
    }

    /// Construct a guest instance of `class` (the "new"-style entry).
    pub fn construct(
        &self,
        class: GuestClass,
        args: &[HostValue],
    ) -> Result<HostValue, BridgeError> {
        self.construct_with(class, args, ConstructOptions::default())
    }

    /// Construct with an owner back-reference and/or an opaque payload.
    pub fn construct_with(
        &self,
        class: GuestClass,
        args: &[HostValue],
        options: ConstructOptions,
    ) -> Result<HostValue, BridgeError> {
        let template = self.template(class);
        construct(&self.shared, &template, args, options)
    }

    /// Invoke `method` on a proxy with host arguments.
    ///
    /// If the last argument is a host callable it becomes the call's
    /// callback block. A name missing from the proxy's template surfaces
    /// as [`BridgeError::UnknownMethod`].
    ///
    /// # Panics
    ///
    /// Dispatching against a host value that is not a live bridge proxy is
    /// a programming-contract violation and panics.
    pub fn invoke(
        &self,
        target: &HostValue,
        method: &str,
        args: &[HostValue],
    ) -> Result<HostValue, BridgeError> {
        let Some(proxy_ref) = target.as_proxy() else {
            panic!(
                "method dispatch on a non-proxy host value ({})",
                target.shape_name()
            );
        };
        let Some(proxy) = proxy_ref.as_any().downcast_ref::<ProxyObject>() else {
            panic!("method dispatch on a foreign proxy implementation");
        };
        let template = proxy.template();
        let Some(slot) = template.method(method) else {
            return Err(BridgeError::UnknownMethod {
                class: template.name().to_string(),
                method: method.to_string(),
            });
        };
        invoke::invoke_slot(self.shared.runtime.as_ref(), proxy, slot, args)
    }

    /// Release owner slots whose owner has died; returns how many this
    /// pass released. The embedding calls this at its collector's pace.
    pub fn sweep_owners(&self) -> usize {
        self.shared.owners.borrow_mut().sweep()
    }

    /// Total owner slots released since the context was created.
    pub fn owners_released(&self) -> u64 {
        self.shared.owners.borrow().released_total()
    }

    /// Number of distinct guest handles currently rooted.
    pub fn rooted_handles(&self) -> usize {
        self.shared.roots.borrow().rooted_handles()
    }

    /// Number of class templates built so far.
    pub fn templates_built(&self) -> usize {
        self.shared.templates.borrow().len()
    }
}

impl fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeContext")
            .field("templates", &self.shared.templates.borrow().len())
            .field("rooted_handles", &self.shared.roots.borrow().rooted_handles())
            .field("owner_slots", &self.shared.owners.borrow().len())
            .finish()
    }
}
