//! GuestRuntime trait — abstract guest-runtime operations
//!
//! Defines the interface an embedded guest runtime implements. The bridge
//! programs against this trait without depending on the guest's object
//! model: reflection, instantiation, dispatch, collector coordination,
//! value marshaling, and exception translation all go through here.

use crate::error::{HostException, MarshalError};
use crate::handle::{GuestClass, GuestHandle, MethodId, OpaquePayload};
use crate::value::HostValue;

/// Error shape of a failed guest call.
#[derive(Debug)]
pub enum GuestError {
    /// The guest raised an exception object.
    Raised(GuestHandle),
    /// A host callback supplied as a block failed. This value only unwinds
    /// the guest call; the pending host error is held by the invoker's
    /// call context, not here.
    HostInterrupt,
}

/// Result of a guest instantiation or method call.
pub type GuestCallResult = Result<GuestHandle, GuestError>;

/// Trampoline the guest's block-invocation protocol redirects into.
///
/// When a guest method invokes the block it was given, the runtime calls
/// [`BlockHandler::invoke`] synchronously on the same stack and hands the
/// returned guest value back to the guest method. Control always returns
/// up the stack it came down on; there is no queue and no other thread.
pub trait BlockHandler {
    /// Invoke the block with guest-side arguments.
    fn invoke(&mut self, args: &[GuestHandle]) -> GuestCallResult;
}

/// Abstract guest-runtime context.
///
/// This trait is the single entry point for every guest-side operation the
/// bridge performs. The embedding provides the concrete implementation;
/// the bridge only ever sees `&dyn GuestRuntime`.
///
/// All calls are synchronous and run on the one thread shared by host and
/// guest. A call that does not return hangs the process; that is the
/// documented model, not a bug in the implementor.
pub trait GuestRuntime {
    // ========================================================================
    // Reflection
    // ========================================================================

    /// Class name for diagnostics. Never used for identity.
    fn display_name(&self, class: GuestClass) -> String;

    /// Public instance methods of the class, in declaration order, as they
    /// exist at the moment of the call.
    fn public_instance_methods(&self, class: GuestClass) -> Vec<MethodId>;

    /// Host-visible name of a method.
    fn method_name(&self, method: MethodId) -> String;

    // ========================================================================
    // Instantiation
    // ========================================================================

    /// Construct a new instance with positional arguments via the guest's
    /// own "new instance" protocol.
    fn new_instance(&self, class: GuestClass, args: &[GuestHandle]) -> GuestCallResult;

    /// Wrap an opaque native payload into a lightweight guest data-holder,
    /// then run the class initializer with positional arguments.
    fn wrap_payload(
        &self,
        class: GuestClass,
        payload: OpaquePayload,
        args: &[GuestHandle],
    ) -> GuestCallResult;

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Synchronous method call with exactly the given arguments.
    fn call_method(
        &self,
        receiver: GuestHandle,
        method: MethodId,
        args: &[GuestHandle],
    ) -> GuestCallResult;

    /// Method call supplying `block` through the guest's block-invocation
    /// protocol. Every block invocation re-enters the host synchronously
    /// via the handler, on the same stack.
    fn call_method_with_block(
        &self,
        receiver: GuestHandle,
        method: MethodId,
        args: &[GuestHandle],
        block: &mut dyn BlockHandler,
    ) -> GuestCallResult;

    // ========================================================================
    // Collector coordination
    // ========================================================================

    /// Register `handle` so the guest collector keeps its referent alive.
    fn root(&self, handle: GuestHandle);

    /// Drop the registration made by [`GuestRuntime::root`].
    fn unroot(&self, handle: GuestHandle);

    // ========================================================================
    // Value marshaling
    // ========================================================================

    /// Convert a host value into a guest value.
    fn to_guest(&self, value: &HostValue) -> Result<GuestHandle, MarshalError>;

    /// Convert a guest value into a host value.
    fn to_host(&self, handle: GuestHandle) -> Result<HostValue, MarshalError>;

    // ========================================================================
    // Exceptions
    // ========================================================================

    /// Translate a raised guest error object into a host exception.
    fn error_to_host(&self, error: GuestHandle) -> HostException;
}
