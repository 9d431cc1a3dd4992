//! Gangway bridge engine
//!
//! Embeds a dynamically-typed, reflection-capable guest runtime behind
//! native host objects. Host code constructs guest objects through cached
//! class templates, calls guest methods with ordinary host values,
//! receives guest raises as host exceptions, and passes host callables
//! into guest methods as callback blocks.
//!
//! - **Templates** (`template`): per-class constructor blueprints with a
//!   fixed dispatch table, built once and cached by class identity
//! - **Proxies** (`proxy`): host objects each exclusively owning one guest
//!   handle, rooted for their Live lifetime
//! - **Construction** (`construct`): the one flow behind both the `new`
//!   entry and the plain-call entry
//! - **Invocation** (internal): argument marshaling, trailing-callback
//!   detection, and synchronous block redirection
//! - **Lifetime** (`roots`, `owner`): the rooted-handle registry and the
//!   owner back-reference registry
//! - **Context** (`context`): the explicit bridge instance owning all of
//!   the above
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use gangway_core::BridgeContext;
//! use gangway_sdk::HostValue;
//!
//! let ctx = BridgeContext::new(Rc::new(my_runtime));
//! let counter = ctx.construct(counter_class, &[])?;
//! let prior = ctx.invoke(&counter, "increment", &[HostValue::Int(5)])?;
//! ```
//!
//! Everything is synchronous and single-threaded: guest calls block the
//! host, and a callback block re-enters the host on the same stack.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod construct;
pub mod context;
pub mod error;
mod invoke;
pub mod owner;
pub mod proxy;
pub mod roots;
pub mod template;

pub use construct::ConstructOptions;
pub use context::BridgeContext;
pub use error::BridgeError;
pub use owner::{OwnerKey, OwnerRegistry};
pub use proxy::{ProxyObject, ProxyState};
pub use roots::RootRegistry;
pub use template::{ClassTemplate, MethodSlot, TemplateCache};
