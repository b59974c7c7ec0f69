//! Module and lazy-loading error types

use thiserror::Error;

/// Errors raised while configuring lazy loading or creating modules
#[derive(Error, Debug)]
pub enum ModuleError {
    /// A `data-module-property` attribute has no property name
    #[error("Missing required argument: property name")]
    MissingPropertyName,

    /// A single sub-module slot already holds a module
    #[error("Error creating sub module. Property {0} already exists")]
    PropertyOccupied(String),

    /// The owning module declares no single or list slot with this name
    #[error("Cannot create module property {0}: property is neither a single nor a list slot")]
    PropertyNotAssignable(String),

    /// A sub-module element declares more than one module type
    #[error("Sub module element for property {property} declares more than one type: {types:?}")]
    MultipleTypes {
        property: String,
        types: Vec<String>,
    },

    /// An element declares no module type where one is required
    #[error("Element declares no module type in data-modules")]
    MissingType,

    /// No constructor is registered for a module type
    #[error("Unknown module type: {0}")]
    UnknownType(String),

    /// `data-module-options` could not be parsed into a JSON object
    #[error("Invalid module options: {0}")]
    InvalidOptions(String),

    /// Lazy-load options failed validation
    #[error("Invalid lazy-load configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for module operations
pub type Result<T> = std::result::Result<T, ModuleError>;
