//! Module registry for type-name based creation

use indexmap::IndexMap;
use latent_dom::{Document, NodeId};
use rustc_hash::FxHashMap;

use super::metadata::option_flag;
use super::{MetaData, Module, ModuleFactory, ModuleOptions};
use crate::error::{ModuleError, Result};

/// Attribute listing the module types already created for an element
pub const MODULES_CREATED_ATTR: &str = "data-modules-created";

/// Option key that turns off the sub-module property hook for a module
const SUB_MODULES_DISABLED: &str = "subModulesDisabled";

/// What a constructor gets to build a module from
#[derive(Debug, Clone, Copy)]
pub struct ModuleSpec<'a> {
    pub element: NodeId,
    pub type_name: &'a str,
    pub options: &'a ModuleOptions,
}

/// Boxed module constructor
pub type ModuleConstructor = Box<dyn Fn(&ModuleSpec<'_>) -> Box<dyn Module>>;

/// Constructor table plus the modules created through it
///
/// Modules created for an element are kept in creation order, so iteration
/// over [`ModuleRegistry::created_elements`] reflects activation order.
#[derive(Default)]
pub struct ModuleRegistry {
    constructors: FxHashMap<String, ModuleConstructor>,
    instances: IndexMap<NodeId, Vec<Box<dyn Module>>>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("types", &self.constructors.keys().collect::<Vec<_>>())
            .field("elements", &self.instances.len())
            .finish()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `type_name`
    ///
    /// Registering the same type twice replaces the earlier constructor.
    pub fn register<F, M>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn(&ModuleSpec<'_>) -> M + 'static,
        M: Module,
    {
        let type_name = type_name.into();
        if self.constructors.contains_key(&type_name) {
            tracing::warn!("Module type {} registered twice, replacing", type_name);
        }
        self.constructors.insert(
            type_name,
            Box::new(move |spec| Box::new(constructor(spec)) as Box<dyn Module>),
        );
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Modules created for `element` (empty if none)
    pub fn modules(&self, element: NodeId) -> &[Box<dyn Module>] {
        self.instances
            .get(&element)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Elements that have modules, in creation order
    pub fn created_elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.instances.keys().copied()
    }

    /// Total number of top-level modules held
    pub fn module_count(&self) -> usize {
        self.instances.values().map(Vec::len).sum()
    }

    /// Drop every module created for `element`
    pub fn remove_modules(&mut self, element: NodeId) -> Vec<Box<dyn Module>> {
        self.instances.shift_remove(&element).unwrap_or_default()
    }

    /// Run the constructor for `type_name` and fill its sub-module slots
    ///
    /// The module is not initialized yet.
    fn construct(
        &mut self,
        document: &mut Document,
        element: NodeId,
        type_name: &str,
        options: &ModuleOptions,
    ) -> Result<Box<dyn Module>> {
        let mut module = {
            let constructor = self
                .constructors
                .get(type_name)
                .ok_or_else(|| ModuleError::UnknownType(type_name.to_string()))?;
            constructor(&ModuleSpec {
                element,
                type_name,
                options,
            })
        };

        // Sub-modules are in place before the owner is initialized
        if !option_flag(options, SUB_MODULES_DISABLED) {
            if let Some(properties) = module.sub_module_properties() {
                properties.init_sub_modules(document, self, element)?;
            }
        }

        Ok(module)
    }
}

impl ModuleFactory for ModuleRegistry {
    fn create_modules(&mut self, document: &mut Document, element: NodeId) -> Result<usize> {
        if document.has_attribute(element, MODULES_CREATED_ATTR) {
            tracing::debug!("Modules already created for element {}", element.to_raw());
            return Ok(0);
        }

        let metadata = MetaData::from_element(document, element)?;
        if metadata.is_empty() {
            tracing::debug!("Element {} declares no modules", element.to_raw());
            return Ok(0);
        }

        // Every declared type is constructed before any of them is initialized
        let mut created = Vec::with_capacity(metadata.types.len());
        for type_name in &metadata.types {
            created.push(self.construct(document, element, type_name, &metadata.options)?);
        }
        for (module, type_name) in created.iter_mut().zip(&metadata.types) {
            module.init();
            tracing::debug!("Created module {} for element {}", type_name, element.to_raw());
        }

        let count = created.len();
        self.instances.entry(element).or_default().extend(created);
        self.mark_modules_created(document, element, &metadata);

        Ok(count)
    }

    fn create_module(
        &mut self,
        document: &mut Document,
        element: NodeId,
        type_name: &str,
        options: &ModuleOptions,
    ) -> Result<Box<dyn Module>> {
        let mut module = self.construct(document, element, type_name, options)?;
        module.init();
        tracing::debug!("Created module {} for element {}", type_name, element.to_raw());

        Ok(module)
    }

    fn mark_modules_created(
        &mut self,
        document: &mut Document,
        element: NodeId,
        metadata: &MetaData,
    ) {
        document.set_attribute(element, MODULES_CREATED_ATTR, metadata.types.join(" "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::MODULES_ATTR;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Widget {
        type_name: String,
        element: NodeId,
        initialized: bool,
    }

    impl Module for Widget {
        fn type_name(&self) -> &str {
            &self.type_name
        }

        fn init(&mut self) {
            self.initialized = true;
        }
    }

    fn widget_registry(types: &[&str], log: Rc<RefCell<Vec<String>>>) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        for ty in types {
            let log = Rc::clone(&log);
            registry.register(*ty, move |spec: &ModuleSpec<'_>| {
                log.borrow_mut().push(spec.type_name.to_string());
                Widget {
                    type_name: spec.type_name.to_string(),
                    element: spec.element,
                    initialized: false,
                }
            });
        }
        registry
    }

    #[test]
    fn test_create_modules_for_declared_types() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = widget_registry(&["gallery", "lightbox"], Rc::clone(&log));
        let mut doc = Document::new();
        let el = doc.append_element(doc.body(), "div");
        doc.set_attribute(el, MODULES_ATTR, "gallery lightbox");

        assert_eq!(registry.create_modules(&mut doc, el).unwrap(), 2);
        assert_eq!(*log.borrow(), vec!["gallery", "lightbox"]);
        assert_eq!(doc.attribute(el, MODULES_CREATED_ATTR), Some("gallery lightbox"));

        let modules = registry.modules(el);
        assert_eq!(modules.len(), 2);
        let gallery = modules[0].downcast_ref::<Widget>().unwrap();
        assert!(gallery.initialized);
        assert_eq!(gallery.element, el);
        assert_eq!(modules[1].type_name(), "lightbox");
    }

    #[test]
    fn test_create_modules_is_idempotent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = widget_registry(&["gallery"], Rc::clone(&log));
        let mut doc = Document::new();
        let el = doc.append_element(doc.body(), "div");
        doc.set_attribute(el, MODULES_ATTR, "gallery");

        registry.create_modules(&mut doc, el).unwrap();
        assert_eq!(registry.create_modules(&mut doc, el).unwrap(), 0);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(registry.module_count(), 1);
    }

    #[test]
    fn test_unknown_type() {
        let mut registry = ModuleRegistry::new();
        let mut doc = Document::new();
        let el = doc.append_element(doc.body(), "div");
        doc.set_attribute(el, MODULES_ATTR, "ghost");

        let err = registry.create_modules(&mut doc, el).unwrap_err();
        assert!(matches!(err, ModuleError::UnknownType(t) if t == "ghost"));
        assert!(!doc.has_attribute(el, MODULES_CREATED_ATTR));
        assert_eq!(registry.module_count(), 0);
    }

    #[test]
    fn test_failed_sibling_initializes_nothing() {
        struct Tracked {
            inits: Rc<RefCell<Vec<String>>>,
        }

        impl Module for Tracked {
            fn type_name(&self) -> &str {
                "gallery"
            }

            fn init(&mut self) {
                self.inits.borrow_mut().push("gallery".to_string());
            }
        }

        let inits = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        let shared = Rc::clone(&inits);
        registry.register("gallery", move |_: &ModuleSpec<'_>| Tracked {
            inits: Rc::clone(&shared),
        });

        let mut doc = Document::new();
        let el = doc.append_element(doc.body(), "div");
        doc.set_attribute(el, MODULES_ATTR, "gallery ghost");

        let err = registry.create_modules(&mut doc, el).unwrap_err();
        assert!(matches!(err, ModuleError::UnknownType(t) if t == "ghost"));
        assert!(inits.borrow().is_empty());
        assert!(!doc.has_attribute(el, MODULES_CREATED_ATTR));
        assert_eq!(registry.module_count(), 0);
    }

    #[test]
    fn test_element_without_modules() {
        let mut registry = ModuleRegistry::new();
        let mut doc = Document::new();
        let el = doc.append_element(doc.body(), "div");

        assert_eq!(registry.create_modules(&mut doc, el).unwrap(), 0);
        assert_eq!(registry.created_elements().count(), 0);
    }
}
