//! Gangway SDK - types and collaborator traits for guest-runtime embedding
//!
//! This crate defines the surface the Gangway bridge programs against,
//! without depending on bridge internals:
//! - Opaque guest identities: [`GuestHandle`], [`GuestClass`], [`MethodId`]
//! - The host-side value model: [`HostValue`] and friends
//! - The [`GuestRuntime`] collaborator trait and the [`BlockHandler`]
//!   trampoline for callback blocks
//! - Boundary error types: [`HostException`], [`MarshalError`]
//!
//! Embeddings implement [`GuestRuntime`] for their guest runtime and hand
//! it to a `gangway-core` bridge context; nothing here calls back into the
//! bridge.

#![warn(missing_docs)]

mod error;
mod handle;
mod runtime;
mod value;

pub use error::{HostException, MarshalError};
pub use handle::{GuestClass, GuestHandle, MethodId, OpaquePayload};
pub use runtime::{BlockHandler, GuestCallResult, GuestError, GuestRuntime};
pub use value::{HostCallable, HostObject, HostValue, ProxyRef, WeakHostValue};
