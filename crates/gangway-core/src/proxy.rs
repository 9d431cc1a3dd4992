//! Proxy object lifecycle
//!
//! A proxy is a host object exclusively owning one guest object handle for
//! its entire Live lifetime. The handle is rooted for exactly the
//! Constructing→Live→Disposing span and unrooted once on disposal. A proxy
//! may also carry a weak back-reference to an owner host object; that
//! reference is released by the owner sweep on its own schedule, never by
//! proxy disposal.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use gangway_sdk::{GuestClass, GuestHandle, HostValue, ProxyRef};

use crate::context::BridgeShared;
use crate::owner::OwnerKey;
use crate::template::ClassTemplate;

/// Lifecycle states of a proxy.
///
/// The pre-construction "uninitialized" state has no representation here:
/// a proxy value only exists once instantiation has produced a guest
/// handle to attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// Guest handle attached, rooting in progress.
    Constructing,
    /// Rooted and usable.
    Live,
    /// Disposal in progress.
    Disposing,
    /// The handle is no longer rooted. Terminal.
    Disposed,
}

/// Host object exclusively wrapping one guest object handle.
pub struct ProxyObject {
    handle: GuestHandle,
    template: Rc<ClassTemplate>,
    owner: Option<OwnerKey>,
    state: Cell<ProxyState>,
    shared: Weak<BridgeShared>,
}

impl ProxyObject {
    /// Attach `handle` to a fresh proxy and root it for the Live duration.
    ///
    /// Rooting happens before this returns, so no guest collection can
    /// reclaim the instance between instantiation and attachment.
    pub(crate) fn attach(
        shared: &Rc<BridgeShared>,
        template: Rc<ClassTemplate>,
        handle: GuestHandle,
        owner: Option<OwnerKey>,
    ) -> Rc<Self> {
        let proxy = Rc::new(Self {
            handle,
            template,
            owner,
            state: Cell::new(ProxyState::Constructing),
            shared: Rc::downgrade(shared),
        });
        shared
            .roots
            .borrow_mut()
            .root(shared.runtime.as_ref(), handle);
        proxy.state.set(ProxyState::Live);
        proxy
    }

    /// The wrapped guest object.
    pub fn guest_handle(&self) -> GuestHandle {
        self.handle
    }

    /// Identity of the guest class this proxy was built from.
    pub fn class(&self) -> GuestClass {
        self.template.class()
    }

    /// The template whose dispatch table serves this proxy.
    pub fn template(&self) -> &Rc<ClassTemplate> {
        &self.template
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProxyState {
        self.state.get()
    }

    /// Whether the proxy is Live.
    pub fn is_live(&self) -> bool {
        self.state.get() == ProxyState::Live
    }

    /// The owner supplied at construction, if one was and it is still
    /// alive on the host side.
    pub fn owner(&self) -> Option<HostValue> {
        let key = self.owner?;
        let shared = self.shared.upgrade()?;
        let owners = shared.owners.borrow();
        owners.upgrade(key)
    }

    /// Unroot the guest handle.
    ///
    /// Idempotent; later calls are no-ops. When the bridge context has
    /// already been torn down, only the state changes — the guest runtime
    /// went away with the context.
    pub fn dispose(&self) {
        if self.state.get() != ProxyState::Live {
            return;
        }
        self.state.set(ProxyState::Disposing);
        if let Some(shared) = self.shared.upgrade() {
            shared
                .roots
                .borrow_mut()
                .unroot(shared.runtime.as_ref(), self.handle);
        }
        self.state.set(ProxyState::Disposed);
    }
}

impl ProxyRef for ProxyObject {
    fn guest_handle(&self) -> GuestHandle {
        self.handle
    }

    fn is_live(&self) -> bool {
        self.state.get() == ProxyState::Live
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for ProxyObject {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for ProxyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyObject")
            .field("class", &self.template.name())
            .field("handle", &self.handle)
            .field("state", &self.state.get())
            .finish()
    }
}
