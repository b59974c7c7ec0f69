//! Module subsystem
//!
//! Everything the scheduler hands off to once it decides an element should
//! come alive:
//!
//! - [`Module`] - behavior attached to an element
//! - [`MetaData`] - module types and options declared in markup
//! - [`ModuleFactory`] - the creation interface the activation gate calls
//! - [`ModuleRegistry`] - constructor table implementing the factory
//! - [`SubModuleProperties`] - markup-declared child modules assigned onto
//!   named slots of their owner
//! - [`ModuleManager`] - registry plus the (at most one) active lazy loader

mod manager;
mod metadata;
mod registry;
mod sub_module;

use std::any::Any;

use latent_dom::{Document, NodeId};

use crate::error::Result;

pub use manager::ModuleManager;
pub use metadata::{MetaData, ModuleOptions, MODULES_ATTR, OPTIONS_ATTR};
pub use registry::{ModuleConstructor, ModuleRegistry, ModuleSpec, MODULES_CREATED_ATTR};
pub use sub_module::{PropertySlot, SubModuleProperties, PROPERTY_ATTR};

/// Downcasting support for module trait objects
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behavior attached to an element
pub trait Module: AsAny {
    /// Registered type name this module was created under
    fn type_name(&self) -> &str;

    /// Called once the module and its sub-modules exist
    fn init(&mut self) {}

    /// Slots for markup-declared sub-modules, if this module has any
    ///
    /// Filled before [`Module::init`] runs.
    fn sub_module_properties(&mut self) -> Option<&mut SubModuleProperties> {
        None
    }
}

impl dyn Module {
    pub fn downcast_ref<T: Module>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Module>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Creates modules for elements
///
/// The activation gate only ever calls [`ModuleFactory::create_modules`];
/// the other two methods serve the sub-module property hook.
pub trait ModuleFactory {
    /// Create every module `element` declares, returning how many were created
    ///
    /// All declared types are constructed before any is initialized. If one
    /// fails, none of them is initialized or kept and `element` stays unmarked.
    fn create_modules(&mut self, document: &mut Document, element: NodeId) -> Result<usize>;

    /// Create (and initialize) one module of `type_name` for `element`
    fn create_module(
        &mut self,
        document: &mut Document,
        element: NodeId,
        type_name: &str,
        options: &ModuleOptions,
    ) -> Result<Box<dyn Module>>;

    /// Record that `element`'s declared modules exist
    fn mark_modules_created(
        &mut self,
        document: &mut Document,
        element: NodeId,
        metadata: &MetaData,
    );
}
