//! Lazy-load configuration
//!
//! Options are fixed once a controller starts. Callers pass a sparse
//! [`LazyLoadOverrides`] that is merged over [`LazyLoadOptions::default`] and
//! validated in one step.

use std::time::Duration;

use latent_dom::{event_types, NodeId};
use serde::Deserialize;
use smallvec::{smallvec, SmallVec};

use crate::error::{ModuleError, Result};

/// Default value of `scroll_stop_delay`
pub const DEFAULT_SCROLL_STOP_DELAY: Duration = Duration::from_millis(400);

/// Default poll interval while a scroll gesture is settling
pub const DEFAULT_SCROLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Configuration of one lazy-loading controller
#[derive(Debug, Clone, PartialEq)]
pub struct LazyLoadOptions {
    /// Scroll container to measure the viewport against
    ///
    /// `None` lets the controller pick between `<body>` and `<html>` once the
    /// page has actually been scrolled.
    pub scroll_element: Option<NodeId>,
    /// Accepted for configuration compatibility, not read by settle detection
    pub scroll_stop_delay: Duration,
    /// Poll interval used to detect that scrolling has stopped
    pub scroll_timeout: Duration,
    /// Pointer interaction event types listened for on the root element
    pub interaction_events: SmallVec<[String; 2]>,
}

impl Default for LazyLoadOptions {
    fn default() -> Self {
        Self {
            scroll_element: None,
            scroll_stop_delay: DEFAULT_SCROLL_STOP_DELAY,
            scroll_timeout: DEFAULT_SCROLL_TIMEOUT,
            interaction_events: smallvec![
                event_types::MOUSEOVER.to_string(),
                event_types::CLICK.to_string()
            ],
        }
    }
}

impl LazyLoadOptions {
    /// Merge `overrides` over the defaults and validate the result
    pub fn merged(overrides: &LazyLoadOverrides) -> Result<Self> {
        let mut options = Self::default();
        options.merge(overrides);
        options.validate()?;
        Ok(options)
    }

    /// Apply every field that `overrides` sets
    pub fn merge(&mut self, overrides: &LazyLoadOverrides) {
        if let Some(element) = overrides.scroll_element {
            self.scroll_element = Some(element);
        }
        if let Some(ms) = overrides.scroll_stop_delay_ms {
            self.scroll_stop_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.scroll_timeout_ms {
            self.scroll_timeout = Duration::from_millis(ms);
        }
        if let Some(events) = &overrides.interaction_events {
            self.interaction_events = events.iter().cloned().collect();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scroll_timeout.is_zero() {
            return Err(ModuleError::InvalidConfig(
                "scrollTimeout must be greater than zero".into(),
            ));
        }
        if self.interaction_events.iter().any(|e| e.trim().is_empty()) {
            return Err(ModuleError::InvalidConfig(
                "interactionEvents must not contain empty event names".into(),
            ));
        }
        Ok(())
    }
}

/// Sparse overrides for [`LazyLoadOptions`]
///
/// Deserializes from the camelCase keys used in markup and fixtures, with
/// durations in milliseconds:
///
/// ```rust
/// use latent_core::LazyLoadOverrides;
///
/// let overrides = LazyLoadOverrides::from_json(r#"{ "scrollTimeout": 100 }"#).unwrap();
/// assert_eq!(overrides.scroll_timeout_ms, Some(100));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LazyLoadOverrides {
    #[serde(skip)]
    pub scroll_element: Option<NodeId>,
    #[serde(rename = "scrollStopDelay")]
    pub scroll_stop_delay_ms: Option<u64>,
    #[serde(rename = "scrollTimeout")]
    pub scroll_timeout_ms: Option<u64>,
    pub interaction_events: Option<Vec<String>>,
}

impl LazyLoadOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse overrides from a JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ModuleError::InvalidConfig(e.to_string()))
    }

    pub fn scroll_element(mut self, element: NodeId) -> Self {
        self.scroll_element = Some(element);
        self
    }

    pub fn scroll_stop_delay(mut self, delay: Duration) -> Self {
        self.scroll_stop_delay_ms = Some(ceil_millis(delay));
        self
    }

    pub fn scroll_timeout(mut self, timeout: Duration) -> Self {
        self.scroll_timeout_ms = Some(ceil_millis(timeout));
        self
    }

    pub fn interaction_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interaction_events = Some(events.into_iter().map(Into::into).collect());
        self
    }
}

/// Whole milliseconds in `duration`, rounding any remainder up
fn ceil_millis(duration: Duration) -> u64 {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    if duration.subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LazyLoadOptions::default();
        assert_eq!(options.scroll_element, None);
        assert_eq!(options.scroll_stop_delay, Duration::from_millis(400));
        assert_eq!(options.scroll_timeout, Duration::from_millis(250));
        assert_eq!(options.interaction_events.as_slice(), ["mouseover", "click"]);
    }

    #[test]
    fn test_merge_only_touches_set_fields() {
        let overrides = LazyLoadOverrides::new().scroll_timeout(Duration::from_millis(50));
        let options = LazyLoadOptions::merged(&overrides).unwrap();

        assert_eq!(options.scroll_timeout, Duration::from_millis(50));
        assert_eq!(options.scroll_stop_delay, DEFAULT_SCROLL_STOP_DELAY);
        assert_eq!(options.interaction_events.len(), 2);
    }

    #[test]
    fn test_overrides_from_json() {
        let overrides = LazyLoadOverrides::from_json(
            r#"{ "scrollStopDelay": 900, "scrollTimeout": 120, "interactionEvents": ["focus"] }"#,
        )
        .unwrap();
        let options = LazyLoadOptions::merged(&overrides).unwrap();

        assert_eq!(options.scroll_stop_delay, Duration::from_millis(900));
        assert_eq!(options.scroll_timeout, Duration::from_millis(120));
        assert_eq!(options.interaction_events.as_slice(), ["focus"]);
    }

    #[test]
    fn test_sub_millisecond_durations_round_up() {
        let overrides = LazyLoadOverrides::new()
            .scroll_timeout(Duration::from_micros(500))
            .scroll_stop_delay(Duration::from_micros(1500));
        assert_eq!(overrides.scroll_timeout_ms, Some(1));
        assert_eq!(overrides.scroll_stop_delay_ms, Some(2));

        let options = LazyLoadOptions::merged(&overrides).unwrap();
        assert_eq!(options.scroll_timeout, Duration::from_millis(1));

        let exact = LazyLoadOverrides::new().scroll_timeout(Duration::from_millis(120));
        assert_eq!(exact.scroll_timeout_ms, Some(120));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let overrides = LazyLoadOverrides::new().scroll_timeout(Duration::ZERO);
        let err = LazyLoadOptions::merged(&overrides).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_event_name_rejected() {
        let overrides = LazyLoadOverrides::new().interaction_events(["click", " "]);
        assert!(LazyLoadOptions::merged(&overrides).is_err());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = LazyLoadOverrides::from_json("{ scrollTimeout: }").unwrap_err();
        assert!(matches!(err, ModuleError::InvalidConfig(_)));
    }
}
