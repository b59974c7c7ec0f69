//! Sub-module properties
//!
//! A module can own named slots that are filled from markup before it is
//! initialized. Any descendant of the owner's element carrying
//! `data-module-property="name"` gets exactly one module created for it (its
//! single `data-modules` type), and that module is assigned onto the owner's
//! slot of the same name:
//!
//! ```text
//! <div data-modules="carousel">
//!   <div data-module-property="slides" data-modules="slide"></div>
//!   <div data-module-property="slides" data-modules="slide"></div>
//!   <nav data-module-property="pager" data-modules="pager"></nav>
//! </div>
//! ```
//!
//! With `slides` declared as a list slot and `pager` as a single slot, the
//! carousel ends up holding two slides in document order and one pager.

use indexmap::IndexMap;
use latent_dom::{Document, NodeId};

use super::{MetaData, Module, ModuleFactory, MODULES_CREATED_ATTR};
use crate::error::{ModuleError, Result};

/// Attribute naming the owner slot a sub-module is assigned to
pub const PROPERTY_ATTR: &str = "data-module-property";

/// A named slot on an owning module
pub enum PropertySlot {
    /// Holds at most one module
    Single(Option<Box<dyn Module>>),
    /// Collects modules in document order
    List(Vec<Box<dyn Module>>),
}

impl std::fmt::Debug for PropertySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertySlot::Single(m) => f
                .debug_tuple("Single")
                .field(&m.as_ref().map(|m| m.type_name()))
                .finish(),
            PropertySlot::List(list) => f
                .debug_tuple("List")
                .field(&list.iter().map(|m| m.type_name()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Declared sub-module slots of one module
#[derive(Debug, Default)]
pub struct SubModuleProperties {
    slots: IndexMap<String, PropertySlot>,
}

impl SubModuleProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an empty single slot
    pub fn with_single(mut self, name: impl Into<String>) -> Self {
        self.slots.insert(name.into(), PropertySlot::Single(None));
        self
    }

    /// Declare an empty list slot
    pub fn with_list(mut self, name: impl Into<String>) -> Self {
        self.slots.insert(name.into(), PropertySlot::List(Vec::new()));
        self
    }

    /// Module held by a single slot
    pub fn get(&self, name: &str) -> Option<&dyn Module> {
        match self.slots.get(name)? {
            PropertySlot::Single(module) => module.as_deref(),
            PropertySlot::List(_) => None,
        }
    }

    /// Modules held by a list slot (empty for unknown or single slots)
    pub fn list(&self, name: &str) -> &[Box<dyn Module>] {
        match self.slots.get(name) {
            Some(PropertySlot::List(list)) => list.as_slice(),
            _ => &[],
        }
    }

    pub fn slot(&self, name: &str) -> Option<&PropertySlot> {
        self.slots.get(name)
    }

    /// Check that `name` can take one more module
    fn check_assignable(&self, name: &str) -> Result<()> {
        match self.slots.get(name) {
            Some(PropertySlot::Single(Some(_))) => {
                Err(ModuleError::PropertyOccupied(name.to_string()))
            }
            Some(_) => Ok(()),
            None => Err(ModuleError::PropertyNotAssignable(name.to_string())),
        }
    }

    /// Assign `module` onto the slot `name`
    pub fn assign(&mut self, name: &str, module: Box<dyn Module>) -> Result<()> {
        match self.slots.get_mut(name) {
            Some(PropertySlot::Single(slot @ None)) => {
                *slot = Some(module);
                Ok(())
            }
            Some(PropertySlot::Single(Some(_))) => {
                Err(ModuleError::PropertyOccupied(name.to_string()))
            }
            Some(PropertySlot::List(list)) => {
                list.push(module);
                Ok(())
            }
            None => Err(ModuleError::PropertyNotAssignable(name.to_string())),
        }
    }

    /// Create and assign every sub-module declared under `owner`
    ///
    /// Elements that already have their modules (including ones claimed by a
    /// nested owner during this pass) are skipped. The slot is checked before
    /// the module is created, so a rejected element never reaches the factory.
    /// Returns the number of sub-modules assigned.
    pub fn init_sub_modules(
        &mut self,
        document: &mut Document,
        factory: &mut dyn ModuleFactory,
        owner: NodeId,
    ) -> Result<usize> {
        let mut assigned = 0;

        for element in document.query_attribute(owner, PROPERTY_ATTR) {
            if document.has_attribute(element, MODULES_CREATED_ATTR) {
                continue;
            }

            let name = document
                .attribute(element, PROPERTY_ATTR)
                .map(str::trim)
                .unwrap_or_default()
                .to_string();
            if name.is_empty() {
                return Err(ModuleError::MissingPropertyName);
            }

            let metadata = MetaData::from_element(document, element)?;
            let type_name = match metadata.types.as_slice() {
                [] => return Err(ModuleError::MissingType),
                [single] => single.clone(),
                many => {
                    return Err(ModuleError::MultipleTypes {
                        property: name,
                        types: many.to_vec(),
                    })
                }
            };

            self.check_assignable(&name)?;
            let module = factory.create_module(document, element, &type_name, &metadata.options)?;
            self.assign(&name, module)?;
            factory.mark_modules_created(document, element, &metadata);

            tracing::debug!(
                "Assigned sub module {} to property {} of element {}",
                type_name,
                name,
                owner.to_raw()
            );
            assigned += 1;
        }

        Ok(assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleRegistry, ModuleSpec, MODULES_ATTR, OPTIONS_ATTR};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Slide {
        index: Option<u64>,
    }

    impl Module for Slide {
        fn type_name(&self) -> &str {
            "slide"
        }
    }

    struct Pager;

    impl Module for Pager {
        fn type_name(&self) -> &str {
            "pager"
        }
    }

    struct Carousel {
        properties: SubModuleProperties,
        slides_at_init: Rc<RefCell<Option<usize>>>,
    }

    impl Module for Carousel {
        fn type_name(&self) -> &str {
            "carousel"
        }

        fn init(&mut self) {
            *self.slides_at_init.borrow_mut() = Some(self.properties.list("slides").len());
        }

        fn sub_module_properties(&mut self) -> Option<&mut SubModuleProperties> {
            Some(&mut self.properties)
        }
    }

    fn registry(slides_at_init: Rc<RefCell<Option<usize>>>) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register("carousel", move |_: &ModuleSpec<'_>| Carousel {
            properties: SubModuleProperties::new()
                .with_list("slides")
                .with_single("pager"),
            slides_at_init: Rc::clone(&slides_at_init),
        });
        registry.register("slide", |spec: &ModuleSpec<'_>| Slide {
            index: spec.options.get("index").and_then(|v| v.as_u64()),
        });
        registry.register("pager", |_: &ModuleSpec<'_>| Pager);
        registry
    }

    fn sub_element(doc: &mut Document, parent: NodeId, property: &str, types: &str) -> NodeId {
        let el = doc.append_element(parent, "div");
        doc.set_attribute(el, PROPERTY_ATTR, property);
        doc.set_attribute(el, MODULES_ATTR, types);
        el
    }

    fn carousel(doc: &mut Document) -> NodeId {
        let el = doc.append_element(doc.body(), "div");
        doc.set_attribute(el, MODULES_ATTR, "carousel");
        el
    }

    #[test]
    fn test_list_property_in_document_order() {
        let seen = Rc::new(RefCell::new(None));
        let mut registry = registry(Rc::clone(&seen));
        let mut doc = Document::new();
        let owner = carousel(&mut doc);
        let first = sub_element(&mut doc, owner, "slides", "slide");
        doc.set_attribute(first, OPTIONS_ATTR, r#"{"index": 0}"#);
        let wrapper = doc.append_element(owner, "div");
        let second = sub_element(&mut doc, wrapper, "slides", "slide");
        doc.set_attribute(second, OPTIONS_ATTR, r#"{"index": 1}"#);

        registry.create_modules(&mut doc, owner).unwrap();

        // Filled before init ran
        assert_eq!(*seen.borrow(), Some(2));

        let owner_module = registry.modules(owner)[0].downcast_ref::<Carousel>().unwrap();
        let slides = owner_module.properties.list("slides");
        assert_eq!(slides.len(), 2);
        let indices: Vec<_> = slides
            .iter()
            .map(|m| m.downcast_ref::<Slide>().unwrap().index)
            .collect();
        assert_eq!(indices, vec![Some(0), Some(1)]);
        assert_eq!(doc.attribute(first, MODULES_CREATED_ATTR), Some("slide"));
        assert_eq!(doc.attribute(second, MODULES_CREATED_ATTR), Some("slide"));
    }

    #[test]
    fn test_single_property() {
        let mut registry = registry(Rc::new(RefCell::new(None)));
        let mut doc = Document::new();
        let owner = carousel(&mut doc);
        sub_element(&mut doc, owner, "pager", "pager");

        registry.create_modules(&mut doc, owner).unwrap();

        let owner_module = registry.modules(owner)[0].downcast_ref::<Carousel>().unwrap();
        let pager = owner_module.properties.get("pager").unwrap();
        assert_eq!(pager.type_name(), "pager");
    }

    #[test]
    fn test_single_property_occupied() {
        let mut registry = registry(Rc::new(RefCell::new(None)));
        let mut doc = Document::new();
        let owner = carousel(&mut doc);
        sub_element(&mut doc, owner, "pager", "pager");
        let extra = sub_element(&mut doc, owner, "pager", "pager");

        let err = registry.create_modules(&mut doc, owner).unwrap_err();
        assert!(matches!(err, ModuleError::PropertyOccupied(name) if name == "pager"));
        // Rejected before creation
        assert!(!doc.has_attribute(extra, MODULES_CREATED_ATTR));
        assert!(!doc.has_attribute(owner, MODULES_CREATED_ATTR));
    }

    #[test]
    fn test_undeclared_property() {
        let mut registry = registry(Rc::new(RefCell::new(None)));
        let mut doc = Document::new();
        let owner = carousel(&mut doc);
        sub_element(&mut doc, owner, "thumbnails", "slide");

        let err = registry.create_modules(&mut doc, owner).unwrap_err();
        assert!(matches!(err, ModuleError::PropertyNotAssignable(name) if name == "thumbnails"));
    }

    #[test]
    fn test_property_element_validation() {
        let mut registry = registry(Rc::new(RefCell::new(None)));

        let mut doc = Document::new();
        let owner = carousel(&mut doc);
        sub_element(&mut doc, owner, "  ", "slide");
        let err = registry.create_modules(&mut doc, owner).unwrap_err();
        assert!(matches!(err, ModuleError::MissingPropertyName));

        let mut doc = Document::new();
        let owner = carousel(&mut doc);
        sub_element(&mut doc, owner, "slides", "slide pager");
        let err = registry.create_modules(&mut doc, owner).unwrap_err();
        assert!(matches!(
            err,
            ModuleError::MultipleTypes { property, types }
                if property == "slides" && types == ["slide", "pager"]
        ));

        let mut doc = Document::new();
        let owner = carousel(&mut doc);
        sub_element(&mut doc, owner, "slides", "");
        let err = registry.create_modules(&mut doc, owner).unwrap_err();
        assert!(matches!(err, ModuleError::MissingType));
    }

    #[test]
    fn test_disabled_by_options() {
        let mut registry = registry(Rc::new(RefCell::new(None)));
        let mut doc = Document::new();
        let owner = carousel(&mut doc);
        doc.set_attribute(owner, OPTIONS_ATTR, r#"{"subModulesDisabled": true}"#);
        let slide = sub_element(&mut doc, owner, "slides", "slide");

        registry.create_modules(&mut doc, owner).unwrap();

        let owner_module = registry.modules(owner)[0].downcast_ref::<Carousel>().unwrap();
        assert!(owner_module.properties.list("slides").is_empty());
        assert!(!doc.has_attribute(slide, MODULES_CREATED_ATTR));
    }

    #[test]
    fn test_already_created_elements_are_skipped() {
        let mut registry = registry(Rc::new(RefCell::new(None)));
        let mut doc = Document::new();
        let owner = carousel(&mut doc);
        let slide = sub_element(&mut doc, owner, "slides", "slide");
        doc.set_attribute(slide, MODULES_CREATED_ATTR, "slide");

        registry.create_modules(&mut doc, owner).unwrap();

        let owner_module = registry.modules(owner)[0].downcast_ref::<Carousel>().unwrap();
        assert!(owner_module.properties.list("slides").is_empty());
    }
}
