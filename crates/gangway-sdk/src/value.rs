//! Host-side value model at the bridge boundary
//!
//! `HostValue` is the shape host values take when they cross into the
//! bridge: primitives, strings, lists, plain host objects, host callables,
//! and proxies wrapping guest objects. The proxy variant carries the
//! reserved marker identifying a host object as proxy-backed — any
//! component can test for it and recover the wrapped guest handle, e.g.
//! when a marshaler unwraps a proxy-valued argument.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::HostException;
use crate::handle::GuestHandle;

// ============================================================================
// ProxyRef
// ============================================================================

/// Marker trait for proxy-backed host objects.
///
/// The bridge's proxy type is the only intended implementor. Components
/// query it through [`HostValue::is_proxy`] / [`HostValue::as_proxy`].
pub trait ProxyRef: fmt::Debug {
    /// The guest object this proxy wraps.
    fn guest_handle(&self) -> GuestHandle;

    /// Whether the proxy is Live (constructed and not yet disposed).
    fn is_live(&self) -> bool;

    /// Downcast support for the bridge's dispatch entry.
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// HostCallable
// ============================================================================

/// A host function value.
///
/// When supplied as the last argument of a proxied method call, a callable
/// becomes the call's callback block and is re-entered synchronously
/// whenever the guest method invokes its block.
#[derive(Clone)]
pub struct HostCallable {
    f: Rc<dyn Fn(&[HostValue]) -> Result<HostValue, HostException>>,
}

impl HostCallable {
    /// Wrap a host function.
    pub fn new(f: impl Fn(&[HostValue]) -> Result<HostValue, HostException> + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    /// Invoke the callable with host arguments.
    pub fn invoke(&self, args: &[HostValue]) -> Result<HostValue, HostException> {
        (self.f)(args)
    }

    /// Identity comparison (same underlying function value).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.f) as *const (),
            Rc::as_ptr(&other.f) as *const (),
        )
    }
}

impl fmt::Debug for HostCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostCallable({:p})", Rc::as_ptr(&self.f))
    }
}

// ============================================================================
// HostObject
// ============================================================================

/// A plain host object: a property bag with identity.
///
/// Stands in for any non-proxy host-engine object the bridge needs to refer
/// to, most importantly as the owner in an owner back-reference.
#[derive(Debug, Default)]
pub struct HostObject {
    properties: RefCell<HashMap<String, HostValue>>,
}

impl HostObject {
    /// Create an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property by name.
    pub fn get(&self, name: &str) -> Option<HostValue> {
        self.properties.borrow().get(name).cloned()
    }

    /// Set a property.
    pub fn set(&self, name: impl Into<String>, value: HostValue) {
        self.properties.borrow_mut().insert(name.into(), value);
    }
}

// ============================================================================
// HostValue
// ============================================================================

/// Host value at the bridge boundary.
#[derive(Debug, Clone)]
pub enum HostValue {
    /// Absent value. Also the "no owner" sentinel at construction.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// String.
    Str(String),
    /// Ordered list of host values.
    List(Vec<HostValue>),
    /// A plain host object.
    Object(Rc<HostObject>),
    /// A host function.
    Callable(HostCallable),
    /// A proxy wrapping one guest object.
    Proxy(Rc<dyn ProxyRef>),
}

impl HostValue {
    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value is a host callable.
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Callable(_))
    }

    /// Get as a callable reference.
    pub fn as_callable(&self) -> Option<&HostCallable> {
        match self {
            Self::Callable(callable) => Some(callable),
            _ => None,
        }
    }

    /// Whether this value is a proxy-backed host object.
    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }

    /// Get the proxy marker, if this value is proxy-backed.
    pub fn as_proxy(&self) -> Option<&Rc<dyn ProxyRef>> {
        match self {
            Self::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }

    /// Get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Get as integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Get as float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Get as string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Get as object reference.
    pub fn as_object(&self) -> Option<&Rc<HostObject>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Name of this value's shape, for diagnostics and marshal errors.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Object(_) => "object",
            Self::Callable(_) => "callable",
            Self::Proxy(_) => "proxy",
        }
    }

    /// Downgrade to a weak reference, for shapes that carry identity.
    ///
    /// Primitives have no identity to refer back to and return `None`.
    pub fn downgrade(&self) -> Option<WeakHostValue> {
        match self {
            Self::Object(object) => Some(WeakHostValue::Object(Rc::downgrade(object))),
            Self::Proxy(proxy) => Some(WeakHostValue::Proxy(Rc::downgrade(proxy))),
            _ => None,
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Callable(a), Self::Callable(b)) => a.ptr_eq(b),
            (Self::Proxy(a), Self::Proxy(b)) => std::ptr::eq(
                Rc::as_ptr(a) as *const (),
                Rc::as_ptr(b) as *const (),
            ),
            _ => false,
        }
    }
}

// ============================================================================
// WeakHostValue
// ============================================================================

/// Weak form of an identity-bearing [`HostValue`].
///
/// Used for owner back-references: holding one never keeps the referent
/// alive on the host side.
#[derive(Debug, Clone)]
pub enum WeakHostValue {
    /// Weak reference to a plain host object.
    Object(Weak<HostObject>),
    /// Weak reference to a proxy.
    Proxy(Weak<dyn ProxyRef>),
}

impl WeakHostValue {
    /// Recover the strong value, if the referent is still alive.
    pub fn upgrade(&self) -> Option<HostValue> {
        match self {
            Self::Object(weak) => weak.upgrade().map(HostValue::Object),
            Self::Proxy(weak) => weak.upgrade().map(HostValue::Proxy),
        }
    }

    /// Whether the referent has been collected.
    pub fn is_dead(&self) -> bool {
        match self {
            Self::Object(weak) => weak.strong_count() == 0,
            Self::Proxy(weak) => weak.strong_count() == 0,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
