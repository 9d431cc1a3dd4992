//! Class template synthesis and caching
//!
//! A class template is the host-visible constructor blueprint for one
//! guest class: its display name plus a fixed dispatch table with one slot
//! per public instance method. The table is a snapshot taken when the
//! template is first built — templates are memoized by class identity and
//! never rebuilt, so methods added to the guest class afterwards stay
//! invisible to host callers.

use std::rc::Rc;

use gangway_sdk::{GuestClass, GuestRuntime, MethodId};
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};

/// One entry in a template's dispatch table.
///
/// Bound to a fixed guest method identifier at build time; invocation
/// resolves through the slot, never through a fresh name lookup.
#[derive(Debug, Clone)]
pub struct MethodSlot {
    name: String,
    method: MethodId,
}

impl MethodSlot {
    /// Host-visible method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The guest method this slot dispatches to.
    pub fn method(&self) -> MethodId {
        self.method
    }
}

/// Host-visible constructor blueprint for one guest class.
///
/// Method names are used verbatim. When two guest methods share a host
/// name, the later-installed slot replaces the earlier one (last wins);
/// enumeration order still reflects first installation.
#[derive(Debug)]
pub struct ClassTemplate {
    class: GuestClass,
    name: String,
    methods: IndexMap<String, MethodSlot, FxBuildHasher>,
}

impl ClassTemplate {
    /// Snapshot the class's public instance methods into a new template.
    pub(crate) fn build(runtime: &dyn GuestRuntime, class: GuestClass) -> Self {
        let name = runtime.display_name(class);
        let mut methods: IndexMap<String, MethodSlot, FxBuildHasher> = IndexMap::default();
        for method in runtime.public_instance_methods(class) {
            let method_name = runtime.method_name(method);
            methods.insert(
                method_name.clone(),
                MethodSlot {
                    name: method_name,
                    method,
                },
            );
        }
        Self {
            class,
            name,
            methods,
        }
    }

    /// Identity of the guest class this template was built from.
    pub fn class(&self) -> GuestClass {
        self.class
    }

    /// Display name of the guest class.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a dispatch slot by host-visible name.
    pub fn method(&self, name: &str) -> Option<&MethodSlot> {
        self.methods.get(name)
    }

    /// Method names on the template surface, in snapshot order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Number of dispatch slots.
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

/// Memoized template cache, keyed by class identity.
///
/// One template per guest class per cache, built lazily on first reference
/// and never invalidated.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: FxHashMap<GuestClass, Rc<ClassTemplate>>,
}

impl TemplateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the template for `class`, building it on first reference.
    pub fn get_or_create(
        &mut self,
        runtime: &dyn GuestRuntime,
        class: GuestClass,
    ) -> Rc<ClassTemplate> {
        if let Some(template) = self.templates.get(&class) {
            return Rc::clone(template);
        }
        let template = Rc::new(ClassTemplate::build(runtime, class));
        self.templates.insert(class, Rc::clone(&template));
        template
    }

    /// Whether a template has been built for `class`.
    pub fn contains(&self, class: GuestClass) -> bool {
        self.templates.contains_key(&class)
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
