//! Scripted guest runtime used by the integration tests.
//!
//! Implements `GuestRuntime` over a small in-memory heap with
//! closure-backed classes and instrumented root/unroot counters, so tests
//! can observe exactly what the bridge asked of the guest collector.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use gangway_sdk::{
    BlockHandler, GuestCallResult, GuestClass, GuestError, GuestHandle, GuestRuntime,
    HostCallable, HostException, HostValue, MarshalError, MethodId, OpaquePayload,
};

/// One value on the scripted guest heap.
pub enum GuestData {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<GuestHandle>),
    Instance {
        class: GuestClass,
        fields: HashMap<String, GuestHandle>,
        payload: Option<OpaquePayload>,
    },
    Error {
        name: String,
        message: String,
    },
}

/// Method body: receives the runtime, the receiver, positional arguments,
/// and the block handler when the call came through the block protocol.
pub type MethodFn = Rc<
    dyn Fn(
        &ScriptedRuntime,
        GuestHandle,
        &[GuestHandle],
        Option<&mut dyn BlockHandler>,
    ) -> GuestCallResult,
>;

/// Initializer body: runs against the freshly allocated instance.
pub type InitFn = Rc<dyn Fn(&ScriptedRuntime, GuestHandle, &[GuestHandle]) -> Result<(), GuestError>>;

struct ClassDef {
    name: String,
    methods: Vec<MethodId>,
    init: Option<InitFn>,
}

struct MethodDef {
    name: String,
    body: MethodFn,
}

/// Scripted guest runtime with an instrumented collector interface.
#[derive(Default)]
pub struct ScriptedRuntime {
    heap: RefCell<HashMap<GuestHandle, GuestData>>,
    classes: RefCell<HashMap<GuestClass, ClassDef>>,
    methods: RefCell<HashMap<MethodId, MethodDef>>,
    next_handle: Cell<u64>,
    next_class: Cell<u64>,
    next_method: Cell<u64>,
    root_calls: Cell<u64>,
    unroot_calls: Cell<u64>,
    rooted: RefCell<HashSet<GuestHandle>>,
}

impl ScriptedRuntime {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    // ========================================================================
    // Class and method definition
    // ========================================================================

    pub fn define_class(&self, name: &str) -> GuestClass {
        let class = GuestClass::new(self.next_class.get());
        self.next_class.set(self.next_class.get() + 1);
        self.classes.borrow_mut().insert(
            class,
            ClassDef {
                name: name.to_string(),
                methods: Vec::new(),
                init: None,
            },
        );
        class
    }

    pub fn set_initializer(
        &self,
        class: GuestClass,
        init: impl Fn(&ScriptedRuntime, GuestHandle, &[GuestHandle]) -> Result<(), GuestError>
            + 'static,
    ) {
        let mut classes = self.classes.borrow_mut();
        let def = classes.get_mut(&class).expect("undefined class");
        def.init = Some(Rc::new(init));
    }

    pub fn define_method(
        &self,
        class: GuestClass,
        name: &str,
        body: impl Fn(
                &ScriptedRuntime,
                GuestHandle,
                &[GuestHandle],
                Option<&mut dyn BlockHandler>,
            ) -> GuestCallResult
            + 'static,
    ) -> MethodId {
        let method = MethodId::new(self.next_method.get());
        self.next_method.set(self.next_method.get() + 1);
        self.methods.borrow_mut().insert(
            method,
            MethodDef {
                name: name.to_string(),
                body: Rc::new(body),
            },
        );
        let mut classes = self.classes.borrow_mut();
        let def = classes.get_mut(&class).expect("undefined class");
        def.methods.push(method);
        method
    }

    // ========================================================================
    // Heap access for test assertions and method bodies
    // ========================================================================

    pub fn alloc(&self, data: GuestData) -> GuestHandle {
        let handle = GuestHandle::new(self.next_handle.get());
        self.next_handle.set(self.next_handle.get() + 1);
        self.heap.borrow_mut().insert(handle, data);
        handle
    }

    pub fn alloc_int(&self, value: i64) -> GuestHandle {
        self.alloc(GuestData::Int(value))
    }

    pub fn alloc_str(&self, value: &str) -> GuestHandle {
        self.alloc(GuestData::Str(value.to_string()))
    }

    pub fn alloc_null(&self) -> GuestHandle {
        self.alloc(GuestData::Null)
    }

    pub fn int_value(&self, handle: GuestHandle) -> i64 {
        match self.heap.borrow().get(&handle) {
            Some(GuestData::Int(value)) => *value,
            _ => panic!("guest value {handle:?} is not an Int"),
        }
    }

    pub fn str_value(&self, handle: GuestHandle) -> String {
        match self.heap.borrow().get(&handle) {
            Some(GuestData::Str(value)) => value.clone(),
            _ => panic!("guest value {handle:?} is not a Str"),
        }
    }

    pub fn field(&self, instance: GuestHandle, name: &str) -> Option<GuestHandle> {
        match self.heap.borrow().get(&instance) {
            Some(GuestData::Instance { fields, .. }) => fields.get(name).copied(),
            _ => panic!("guest value {instance:?} is not an Instance"),
        }
    }

    pub fn set_field(&self, instance: GuestHandle, name: &str, value: GuestHandle) {
        match self.heap.borrow_mut().get_mut(&instance) {
            Some(GuestData::Instance { fields, .. }) => {
                fields.insert(name.to_string(), value);
            }
            _ => panic!("guest value {instance:?} is not an Instance"),
        }
    }

    pub fn int_field(&self, instance: GuestHandle, name: &str) -> i64 {
        let handle = self
            .field(instance, name)
            .unwrap_or_else(|| panic!("instance {instance:?} has no field {name}"));
        self.int_value(handle)
    }

    pub fn set_int_field(&self, instance: GuestHandle, name: &str, value: i64) {
        let handle = self.alloc_int(value);
        self.set_field(instance, name, handle);
    }

    pub fn payload_usize(&self, instance: GuestHandle) -> Option<usize> {
        match self.heap.borrow().get(&instance) {
            Some(GuestData::Instance {
                payload: Some(payload),
                ..
            }) => payload.downcast_ref::<usize>().copied(),
            _ => None,
        }
    }

    /// Allocate a guest error object and return it as a raised error.
    pub fn raise(&self, name: &str, message: &str) -> GuestError {
        let handle = self.alloc(GuestData::Error {
            name: name.to_string(),
            message: message.to_string(),
        });
        GuestError::Raised(handle)
    }

    // ========================================================================
    // Collector instrumentation
    // ========================================================================

    pub fn root_calls(&self) -> u64 {
        self.root_calls.get()
    }

    pub fn unroot_calls(&self) -> u64 {
        self.unroot_calls.get()
    }

    pub fn live_roots(&self) -> usize {
        self.rooted.borrow().len()
    }

    pub fn is_rooted(&self, handle: GuestHandle) -> bool {
        self.rooted.borrow().contains(&handle)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn instantiate(
        &self,
        class: GuestClass,
        payload: Option<OpaquePayload>,
        args: &[GuestHandle],
    ) -> GuestCallResult {
        let init = {
            let classes = self.classes.borrow();
            let def = classes.get(&class).expect("undefined class");
            def.init.clone()
        };
        let instance = self.alloc(GuestData::Instance {
            class,
            fields: HashMap::new(),
            payload,
        });
        if let Some(init) = init {
            init(self, instance, args)?;
        }
        Ok(instance)
    }

    fn method_body(&self, method: MethodId) -> MethodFn {
        let methods = self.methods.borrow();
        let def = methods.get(&method).expect("undefined method");
        Rc::clone(&def.body)
    }
}

impl GuestRuntime for ScriptedRuntime {
    fn display_name(&self, class: GuestClass) -> String {
        self.classes
            .borrow()
            .get(&class)
            .map(|def| def.name.clone())
            .unwrap_or_else(|| "<anonymous>".to_string())
    }

    fn public_instance_methods(&self, class: GuestClass) -> Vec<MethodId> {
        self.classes
            .borrow()
            .get(&class)
            .map(|def| def.methods.clone())
            .unwrap_or_default()
    }

    fn method_name(&self, method: MethodId) -> String {
        self.methods
            .borrow()
            .get(&method)
            .map(|def| def.name.clone())
            .unwrap_or_default()
    }

    fn new_instance(&self, class: GuestClass, args: &[GuestHandle]) -> GuestCallResult {
        self.instantiate(class, None, args)
    }

    fn wrap_payload(
        &self,
        class: GuestClass,
        payload: OpaquePayload,
        args: &[GuestHandle],
    ) -> GuestCallResult {
        self.instantiate(class, Some(payload), args)
    }

    fn call_method(
        &self,
        receiver: GuestHandle,
        method: MethodId,
        args: &[GuestHandle],
    ) -> GuestCallResult {
        let body = self.method_body(method);
        body(self, receiver, args, None)
    }

    fn call_method_with_block(
        &self,
        receiver: GuestHandle,
        method: MethodId,
        args: &[GuestHandle],
        block: &mut dyn BlockHandler,
    ) -> GuestCallResult {
        let body = self.method_body(method);
        body(self, receiver, args, Some(block))
    }

    fn root(&self, handle: GuestHandle) {
        self.root_calls.set(self.root_calls.get() + 1);
        self.rooted.borrow_mut().insert(handle);
    }

    fn unroot(&self, handle: GuestHandle) {
        self.unroot_calls.set(self.unroot_calls.get() + 1);
        self.rooted.borrow_mut().remove(&handle);
    }

    fn to_guest(&self, value: &HostValue) -> Result<GuestHandle, MarshalError> {
        match value {
            HostValue::Null => Ok(self.alloc(GuestData::Null)),
            HostValue::Bool(b) => Ok(self.alloc(GuestData::Bool(*b))),
            HostValue::Int(i) => Ok(self.alloc(GuestData::Int(*i))),
            HostValue::Float(f) => Ok(self.alloc(GuestData::Float(*f))),
            HostValue::Str(s) => Ok(self.alloc(GuestData::Str(s.clone()))),
            HostValue::List(items) => {
                let mut handles = Vec::with_capacity(items.len());
                for item in items {
                    handles.push(self.to_guest(item)?);
                }
                Ok(self.alloc(GuestData::List(handles)))
            }
            // A proxy-valued argument unwraps to the guest object it wraps.
            HostValue::Proxy(proxy) => Ok(proxy.guest_handle()),
            HostValue::Object(_) | HostValue::Callable(_) => Err(
                MarshalError::UnsupportedHostShape {
                    shape: value.shape_name(),
                },
            ),
        }
    }

    fn to_host(&self, handle: GuestHandle) -> Result<HostValue, MarshalError> {
        let heap = self.heap.borrow();
        match heap.get(&handle) {
            Some(GuestData::Null) => Ok(HostValue::Null),
            Some(GuestData::Bool(b)) => Ok(HostValue::Bool(*b)),
            Some(GuestData::Int(i)) => Ok(HostValue::Int(*i)),
            Some(GuestData::Float(f)) => Ok(HostValue::Float(*f)),
            Some(GuestData::Str(s)) => Ok(HostValue::Str(s.clone())),
            Some(GuestData::List(items)) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.to_host(*item)?);
                }
                Ok(HostValue::List(values))
            }
            _ => Err(MarshalError::UnsupportedGuestShape { handle }),
        }
    }

    fn error_to_host(&self, error: GuestHandle) -> HostException {
        match self.heap.borrow().get(&error) {
            Some(GuestData::Error { name, message }) => HostException::new(name, message),
            _ => HostException::new("GuestError", "unknown guest error"),
        }
    }
}

// ============================================================================
// Shared fixtures
// ============================================================================

/// A `Counter` class: `increment(n)` returns the prior total and adds `n`;
/// `total()` reads the running total. The optional constructor argument
/// seeds the total.
pub fn define_counter(rt: &Rc<ScriptedRuntime>) -> GuestClass {
    let class = rt.define_class("Counter");
    rt.set_initializer(class, |rt, instance, args| {
        let start = args.first().map(|h| rt.int_value(*h)).unwrap_or(0);
        rt.set_int_field(instance, "total", start);
        Ok(())
    });
    rt.define_method(class, "increment", |rt, receiver, args, _block| {
        let n = rt.int_value(args[0]);
        let prior = rt.int_field(receiver, "total");
        rt.set_int_field(receiver, "total", prior + n);
        Ok(rt.alloc_int(prior))
    });
    rt.define_method(class, "total", |rt, receiver, _args, _block| {
        Ok(rt.alloc_int(rt.int_field(receiver, "total")))
    });
    class
}

/// Wrap a host closure as a callable `HostValue`.
pub fn host_fn(
    f: impl Fn(&[HostValue]) -> Result<HostValue, HostException> + 'static,
) -> HostValue {
    HostValue::Callable(HostCallable::new(f))
}

/// Downcast a proxy-valued `HostValue` to the bridge's proxy type.
pub fn proxy_object(value: &HostValue) -> &gangway_core::ProxyObject {
    value
        .as_proxy()
        .expect("value is not a proxy")
        .as_any()
        .downcast_ref::<gangway_core::ProxyObject>()
        .expect("foreign proxy implementation")
}
