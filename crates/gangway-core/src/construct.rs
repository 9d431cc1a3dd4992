//! Construction protocol
//!
//! The single place where the two invocation shapes — a genuine construct
//! call and a plain function-style call — are distinguished. Both produce
//! a Live proxy through the same flow; the plain call is sugar, never a
//! second code path. Everything downstream operates uniformly on the
//! resulting proxy.

use std::rc::Rc;

use gangway_sdk::{
    GuestError, GuestHandle, GuestRuntime, HostException, HostValue, OpaquePayload,
};
use smallvec::SmallVec;

use crate::context::{BridgeContext, BridgeShared};
use crate::error::BridgeError;
use crate::proxy::ProxyObject;
use crate::template::ClassTemplate;

/// Options for a construct call.
#[derive(Debug, Default)]
pub struct ConstructOptions {
    /// Host object whose liveness the guest instance depends on, recorded
    /// as a weak back-reference. `None` or `HostValue::Null` means no
    /// owner.
    pub owner: Option<HostValue>,
    /// Opaque native payload. When present, instantiation wraps it into a
    /// guest data-holder and runs the initializer instead of the guest's
    /// plain "new instance" protocol.
    pub payload: Option<OpaquePayload>,
}

impl ClassTemplate {
    /// Construct a guest instance and return its Live proxy (the
    /// "called with `new`" entry).
    pub fn construct(
        self: &Rc<Self>,
        ctx: &BridgeContext,
        args: &[HostValue],
    ) -> Result<HostValue, BridgeError> {
        self.construct_with(ctx, args, ConstructOptions::default())
    }

    /// Construct with an owner back-reference and/or an opaque payload.
    pub fn construct_with(
        self: &Rc<Self>,
        ctx: &BridgeContext,
        args: &[HostValue],
        options: ConstructOptions,
    ) -> Result<HostValue, BridgeError> {
        construct(ctx.shared(), self, args, options)
    }

    /// Plain function-style call: sugar over the construct entry with the
    /// same arguments and the same semantics.
    pub fn call(
        self: &Rc<Self>,
        ctx: &BridgeContext,
        args: &[HostValue],
    ) -> Result<HostValue, BridgeError> {
        self.construct(ctx, args)
    }
}

/// The one construction flow behind both entries.
pub(crate) fn construct(
    shared: &Rc<BridgeShared>,
    template: &Rc<ClassTemplate>,
    args: &[HostValue],
    options: ConstructOptions,
) -> Result<HostValue, BridgeError> {
    let runtime = shared.runtime.as_ref();

    // Owner back-reference first. Its lifetime follows the owner itself,
    // not the outcome of this construction: a failed construct leaves the
    // slot for the sweep to release when the owner dies.
    let owner_key = match options.owner {
        None => None,
        Some(HostValue::Null) => None,
        Some(owner) => {
            let weak = owner.downgrade().ok_or_else(|| BridgeError::Construction {
                class: template.name().to_string(),
                exception: HostException::new(
                    "TypeError",
                    format!(
                        "owner must be weak-referenceable, got {}",
                        owner.shape_name()
                    ),
                ),
            })?;
            Some(shared.owners.borrow_mut().insert(weak))
        }
    };

    let mut guest_args: SmallVec<[GuestHandle; 8]> = SmallVec::with_capacity(args.len());
    for arg in args {
        guest_args.push(runtime.to_guest(arg)?);
    }

    let result = match options.payload {
        Some(payload) => runtime.wrap_payload(template.class(), payload, &guest_args),
        None => runtime.new_instance(template.class(), &guest_args),
    };
    let handle = result.map_err(|err| construction_error(runtime, template, err))?;

    // Attach immediately: the proxy roots the handle before any other
    // operation can trigger a guest collection.
    let proxy = ProxyObject::attach(shared, Rc::clone(template), handle, owner_key);
    Ok(HostValue::Proxy(proxy))
}

/// A guest raise during instantiation fails the whole construction; no
/// proxy becomes observable and nothing was rooted.
fn construction_error(
    runtime: &dyn GuestRuntime,
    template: &ClassTemplate,
    err: GuestError,
) -> BridgeError {
    let exception = match err {
        GuestError::Raised(error) => runtime.error_to_host(error),
        // No block is supplied during construction; an interrupt here means
        // the runtime broke the block protocol.
        GuestError::HostInterrupt => {
            panic!("guest runtime reported a host interrupt during construction")
        }
    };
    BridgeError::Construction {
        class: template.name().to_string(),
        exception,
    }
}
