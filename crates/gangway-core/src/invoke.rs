//! Method invocation and callback redirection
//!
//! One invocation marshals its positional arguments left-to-right, detects
//! a trailing host callable, dispatches to the guest, and routes a guest
//! raise back to the host translated exactly once. When a callback is
//! present, the guest's block protocol re-enters the host synchronously on
//! the same stack: host→guest→host→guest, no queue, no other thread.

use gangway_sdk::{
    BlockHandler, GuestCallResult, GuestError, GuestHandle, GuestRuntime, HostCallable,
    HostException, HostValue, MarshalError,
};
use smallvec::SmallVec;

use crate::error::BridgeError;
use crate::proxy::ProxyObject;
use crate::template::MethodSlot;

/// Host-side failure parked by the block trampoline while the guest call
/// unwinds with `GuestError::HostInterrupt`.
enum Interrupt {
    /// The host callback raised.
    Exception(HostException),
    /// Marshaling inside the trampoline hit an unsupported shape.
    Marshal(MarshalError),
}

/// Ephemeral state for one method invocation.
struct CallContext<'a> {
    /// Positional arguments, marshaled left-to-right.
    guest_args: SmallVec<[GuestHandle; 8]>,
    /// Trailing host callable, when the call carries one.
    callback: Option<&'a HostCallable>,
    /// Single error slot for the trampoline.
    interrupt: Option<Interrupt>,
}

impl<'a> CallContext<'a> {
    /// Split a trailing callable off `args` and marshal the rest.
    ///
    /// With a trailing callable the positional arity is N−1; the callable
    /// itself never goes through the marshaler.
    fn prepare(runtime: &dyn GuestRuntime, args: &'a [HostValue]) -> Result<Self, BridgeError> {
        let (callback, positional) = match args.split_last() {
            Some((HostValue::Callable(callback), rest)) => (Some(callback), rest),
            _ => (None, args),
        };
        let mut guest_args = SmallVec::with_capacity(positional.len());
        for arg in positional {
            guest_args.push(runtime.to_guest(arg)?);
        }
        Ok(Self {
            guest_args,
            callback,
            interrupt: None,
        })
    }
}

/// Relays guest block invocations into the host callback.
struct BlockRelay<'a> {
    runtime: &'a dyn GuestRuntime,
    callback: &'a HostCallable,
    interrupt: &'a mut Option<Interrupt>,
}

impl BlockRelay<'_> {
    /// Park a host failure and unwind the guest call.
    fn park(&mut self, interrupt: Interrupt) -> GuestCallResult {
        *self.interrupt = Some(interrupt);
        Err(GuestError::HostInterrupt)
    }
}

impl BlockHandler for BlockRelay<'_> {
    fn invoke(&mut self, args: &[GuestHandle]) -> GuestCallResult {
        let mut host_args = Vec::with_capacity(args.len());
        for arg in args {
            match self.runtime.to_host(*arg) {
                Ok(value) => host_args.push(value),
                Err(err) => return self.park(Interrupt::Marshal(err)),
            }
        }
        let result = match self.callback.invoke(&host_args) {
            Ok(value) => value,
            Err(exception) => return self.park(Interrupt::Exception(exception)),
        };
        match self.runtime.to_guest(&result) {
            Ok(handle) => Ok(handle),
            Err(err) => self.park(Interrupt::Marshal(err)),
        }
    }
}

/// Invoke one dispatch slot on a proxy.
///
/// # Panics
///
/// Dispatching against a proxy that is not Live is a programming-contract
/// violation and panics; a disposed proxy holds no rooted handle to call
/// through.
pub(crate) fn invoke_slot(
    runtime: &dyn GuestRuntime,
    proxy: &ProxyObject,
    slot: &MethodSlot,
    args: &[HostValue],
) -> Result<HostValue, BridgeError> {
    assert!(
        proxy.is_live(),
        "method dispatch on a proxy that is not Live (handle {:?}, state {:?})",
        proxy.guest_handle(),
        proxy.state()
    );

    let mut cx = CallContext::prepare(runtime, args)?;
    let result = match cx.callback {
        None => runtime.call_method(proxy.guest_handle(), slot.method(), &cx.guest_args),
        Some(callback) => {
            let mut relay = BlockRelay {
                runtime,
                callback,
                interrupt: &mut cx.interrupt,
            };
            runtime.call_method_with_block(
                proxy.guest_handle(),
                slot.method(),
                &cx.guest_args,
                &mut relay,
            )
        }
    };
    resolve(runtime, slot, result, cx.interrupt)
}

/// Turn the guest call outcome into the host-visible result, translating a
/// guest raise exactly once and recovering a parked host failure.
fn resolve(
    runtime: &dyn GuestRuntime,
    slot: &MethodSlot,
    result: GuestCallResult,
    interrupt: Option<Interrupt>,
) -> Result<HostValue, BridgeError> {
    match result {
        Ok(value) => Ok(runtime.to_host(value)?),
        Err(GuestError::Raised(error)) => Err(BridgeError::Invocation {
            method: slot.name().to_string(),
            exception: runtime.error_to_host(error),
        }),
        Err(GuestError::HostInterrupt) => match interrupt {
            Some(Interrupt::Exception(exception)) => Err(BridgeError::Invocation {
                method: slot.name().to_string(),
                exception,
            }),
            Some(Interrupt::Marshal(err)) => Err(BridgeError::Unsupported(err)),
            None => panic!("guest runtime reported a host interrupt with no pending host error"),
        },
    }
}
