//! Markup-declared module metadata

use latent_dom::{Document, NodeId};
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::error::{ModuleError, Result};

/// Whitespace-separated list of module types for an element
pub const MODULES_ATTR: &str = "data-modules";

/// JSON object of options passed to the element's modules
pub const OPTIONS_ATTR: &str = "data-module-options";

/// Options handed to module constructors
pub type ModuleOptions = Map<String, Value>;

/// Module types and options declared on one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaData {
    pub types: SmallVec<[String; 2]>,
    pub options: ModuleOptions,
}

impl MetaData {
    /// Read the metadata attributes of `element`
    pub fn from_element(document: &Document, element: NodeId) -> Result<Self> {
        Self::parse(
            document.attribute(element, MODULES_ATTR),
            document.attribute(element, OPTIONS_ATTR),
        )
    }

    /// Parse raw attribute values
    ///
    /// Missing or blank options parse as an empty object; anything else must
    /// be a JSON object.
    pub fn parse(types: Option<&str>, options: Option<&str>) -> Result<Self> {
        let types = types
            .map(|t| t.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default();

        let options = match options.map(str::trim) {
            None | Some("") => Map::new(),
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    return Err(ModuleError::InvalidOptions(format!(
                        "expected a JSON object, found {}",
                        json_kind(&other)
                    )))
                }
                Err(err) => return Err(ModuleError::InvalidOptions(err.to_string())),
            },
        };

        Ok(Self { types, options })
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Boolean option, `false` when absent or not a boolean
    pub fn option_flag(&self, key: &str) -> bool {
        option_flag(&self.options, key)
    }
}

pub(crate) fn option_flag(options: &ModuleOptions, key: &str) -> bool {
    options.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_types() {
        let meta = MetaData::parse(Some("  gallery   lightbox "), None).unwrap();
        assert_eq!(meta.types.as_slice(), ["gallery", "lightbox"]);
        assert!(meta.options.is_empty());
    }

    #[test]
    fn test_missing_attributes_are_empty() {
        let meta = MetaData::parse(None, Some("   ")).unwrap();
        assert!(meta.is_empty());
        assert!(meta.options.is_empty());
    }

    #[test]
    fn test_parse_options_object() {
        let meta = MetaData::parse(
            Some("carousel"),
            Some(r#"{ "subModulesDisabled": true, "speed": 3 }"#),
        )
        .unwrap();
        assert!(meta.option_flag("subModulesDisabled"));
        assert!(!meta.option_flag("speed"));
        assert!(!meta.option_flag("missing"));
    }

    #[test]
    fn test_options_must_be_object() {
        let err = MetaData::parse(Some("a"), Some("[1, 2]")).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidOptions(msg) if msg.contains("an array")));

        let err = MetaData::parse(Some("a"), Some("{ nope")).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidOptions(_)));
    }

    #[test]
    fn test_from_element() {
        let mut doc = Document::new();
        let el = doc.append_element(doc.body(), "div");
        doc.set_attribute(el, MODULES_ATTR, "slide");
        doc.set_attribute(el, OPTIONS_ATTR, r#"{"index": 2}"#);

        let meta = MetaData::from_element(&doc, el).unwrap();
        assert_eq!(meta.types.as_slice(), ["slide"]);
        assert_eq!(meta.options.get("index"), Some(&Value::from(2)));
    }
}
