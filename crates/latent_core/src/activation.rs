//! Activation gate
//!
//! Decides whether a lazy candidate's marker accepts a trigger and, if so,
//! hands the element to the module factory exactly once. The marker attribute
//! is removed before the factory runs, so a candidate can never be activated
//! twice even if creation fails or re-enters the scheduler.

use latent_dom::{Document, NodeId};
use regex::Regex;

use crate::error::Result;
use crate::module::ModuleFactory;

/// Attribute marking an element for lazy module creation
pub const LAZYLOAD_ATTR: &str = "data-module-lazyload";

/// Attribute recording the marker value after activation
pub const LAZYLOADED_ATTR: &str = "data-module-lazyloaded";

/// Marker value accepting every trigger
pub const ANY_TRIGGER: &str = "any";

/// Trigger name used when an element is scrolled into view
pub const SCROLL_TO_TRIGGER: &str = "scrollto";

/// A parsed marker value
#[derive(Debug, Clone)]
pub enum TriggerPattern {
    /// The `"any"` wildcard
    Any,
    /// A regular expression searched for in the trigger name
    Regex(Regex),
    /// A value that does not compile; never matches
    Invalid(String),
}

impl TriggerPattern {
    pub fn parse(value: &str) -> Self {
        if value == ANY_TRIGGER {
            return TriggerPattern::Any;
        }
        match Regex::new(value) {
            Ok(re) => TriggerPattern::Regex(re),
            Err(err) => {
                tracing::warn!("Malformed lazy-load trigger pattern {:?}: {}", value, err);
                TriggerPattern::Invalid(value.to_string())
            }
        }
    }

    pub fn matches(&self, trigger: &str) -> bool {
        match self {
            TriggerPattern::Any => true,
            TriggerPattern::Regex(re) => re.is_match(trigger),
            TriggerPattern::Invalid(_) => false,
        }
    }
}

/// Marker value of `element` if it is a lazy candidate
///
/// Present-but-empty markers do not count.
pub fn lazy_marker(document: &Document, element: NodeId) -> Option<&str> {
    document
        .attribute(element, LAZYLOAD_ATTR)
        .filter(|v| !v.is_empty())
}

/// Activate `element` if its marker accepts `trigger`
///
/// Returns `Ok(false)` when the element is not a candidate or the trigger does
/// not match; the marker is left in place in that case. On a match the marker
/// is removed, the factory creates the element's modules, and the loaded
/// marker records the original value. A factory error is returned with the
/// marker already gone; nothing retries.
pub fn try_activate(
    document: &mut Document,
    factory: &mut dyn ModuleFactory,
    element: NodeId,
    trigger: &str,
) -> Result<bool> {
    let Some(value) = lazy_marker(document, element).map(str::to_owned) else {
        return Ok(false);
    };

    if !TriggerPattern::parse(&value).matches(trigger) {
        return Ok(false);
    }

    document.remove_attribute(element, LAZYLOAD_ATTR);
    tracing::debug!(
        "Activating lazy element {} (marker {:?}, trigger {:?})",
        element.to_raw(),
        value,
        trigger
    );

    factory.create_modules(document, element)?;
    document.set_attribute(element, LAZYLOADED_ATTR, value);

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModuleError;
    use crate::module::{MetaData, Module, ModuleOptions};

    /// Factory recording every element it was asked to create
    #[derive(Default)]
    struct RecordingFactory {
        created: Vec<NodeId>,
        fail: bool,
    }

    impl ModuleFactory for RecordingFactory {
        fn create_modules(&mut self, _document: &mut Document, element: NodeId) -> Result<usize> {
            self.created.push(element);
            if self.fail {
                return Err(ModuleError::UnknownType("broken".into()));
            }
            Ok(1)
        }

        fn create_module(
            &mut self,
            _document: &mut Document,
            _element: NodeId,
            type_name: &str,
            _options: &ModuleOptions,
        ) -> Result<Box<dyn Module>> {
            Err(ModuleError::UnknownType(type_name.to_string()))
        }

        fn mark_modules_created(
            &mut self,
            _document: &mut Document,
            _element: NodeId,
            _metadata: &MetaData,
        ) {
        }
    }

    fn candidate(doc: &mut Document, marker: &str) -> NodeId {
        let el = doc.append_element(doc.body(), "div");
        doc.set_attribute(el, LAZYLOAD_ATTR, marker);
        el
    }

    #[test]
    fn test_any_accepts_every_trigger() {
        for trigger in ["scrollto", "mouseover", "click", "whatever"] {
            let mut doc = Document::new();
            let mut factory = RecordingFactory::default();
            let el = candidate(&mut doc, "any");

            assert!(try_activate(&mut doc, &mut factory, el, trigger).unwrap());
            assert_eq!(factory.created, vec![el]);
        }
    }

    #[test]
    fn test_pattern_match_activates() {
        let mut doc = Document::new();
        let mut factory = RecordingFactory::default();
        let el = candidate(&mut doc, "scroll|mouseover");

        assert!(try_activate(&mut doc, &mut factory, el, "mouseover").unwrap());
        assert!(!doc.has_attribute(el, LAZYLOAD_ATTR));
        assert_eq!(doc.attribute(el, LAZYLOADED_ATTR), Some("scroll|mouseover"));
    }

    #[test]
    fn test_pattern_mismatch_leaves_marker() {
        let mut doc = Document::new();
        let mut factory = RecordingFactory::default();
        let el = candidate(&mut doc, "click");

        assert!(!try_activate(&mut doc, &mut factory, el, "mouseover").unwrap());
        assert_eq!(doc.attribute(el, LAZYLOAD_ATTR), Some("click"));
        assert!(!doc.has_attribute(el, LAZYLOADED_ATTR));
        assert!(factory.created.is_empty());
    }

    #[test]
    fn test_activation_is_exactly_once() {
        let mut doc = Document::new();
        let mut factory = RecordingFactory::default();
        let el = candidate(&mut doc, "any");

        assert!(try_activate(&mut doc, &mut factory, el, "scrollto").unwrap());
        assert!(!try_activate(&mut doc, &mut factory, el, "scrollto").unwrap());
        assert_eq!(factory.created.len(), 1);
    }

    #[test]
    fn test_malformed_pattern_never_matches() {
        let mut doc = Document::new();
        let mut factory = RecordingFactory::default();
        let el = candidate(&mut doc, "click(");

        assert!(!try_activate(&mut doc, &mut factory, el, "click(").unwrap());
        assert!(matches!(TriggerPattern::parse("("), TriggerPattern::Invalid(_)));
        assert!(factory.created.is_empty());
    }

    #[test]
    fn test_empty_marker_is_not_a_candidate() {
        let mut doc = Document::new();
        let mut factory = RecordingFactory::default();
        let el = candidate(&mut doc, "");

        assert!(lazy_marker(&doc, el).is_none());
        assert!(!try_activate(&mut doc, &mut factory, el, "scrollto").unwrap());
    }

    #[test]
    fn test_factory_failure_still_consumes_marker() {
        let mut doc = Document::new();
        let mut factory = RecordingFactory {
            fail: true,
            ..Default::default()
        };
        let el = candidate(&mut doc, "any");

        assert!(try_activate(&mut doc, &mut factory, el, "scrollto").is_err());
        assert!(!doc.has_attribute(el, LAZYLOAD_ATTR));
        assert!(!doc.has_attribute(el, LAZYLOADED_ATTR));

        // No retry on the next trigger
        assert!(!try_activate(&mut doc, &mut factory, el, "scrollto").unwrap());
        assert_eq!(factory.created.len(), 1);
    }
}
