//! Page fixtures
//!
//! A fixture is a TOML file describing a page (viewport, elements with their
//! geometry and module markup, lazy-load options) plus a script of steps to
//! play against it:
//!
//! ```toml
//! [viewport]
//! height = 600
//! content_height = 4000
//!
//! [options]
//! scrollTimeout = 100
//!
//! [[element]]
//! id = "gallery"
//! top = 2400
//! height = 300
//! modules = "gallery"
//! lazyload = "any"
//!
//! [[step]]
//! action = "scroll"
//! top = 2200
//!
//! [[step]]
//! action = "wait_ms"
//! ms = 500
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use latent_core::{
    LazyLoadOptions, LazyLoadOverrides, MetaData, ModuleRegistry, Page, TriggerPattern,
    LAZYLOAD_ATTR, MODULES_ATTR, OPTIONS_ATTR, PROPERTY_ATTR,
};
use latent_dom::{Geometry, NodeId};
use serde::Deserialize;

/// A parsed fixture file
#[derive(Debug, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default, rename = "element")]
    pub elements: Vec<ElementConfig>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// Which element scrolls the page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageScroller {
    #[default]
    Html,
    Body,
}

/// Size of the browser window and the scrollable page
#[derive(Debug, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    /// Total page width (defaults to the viewport width)
    #[serde(default)]
    pub content_width: Option<f32>,
    #[serde(default = "default_content_height")]
    pub content_height: f32,
    #[serde(default)]
    pub scroller: PageScroller,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            content_width: None,
            content_height: default_content_height(),
            scroller: PageScroller::default(),
        }
    }
}

fn default_width() -> f32 {
    1024.0
}

fn default_height() -> f32 {
    768.0
}

fn default_content_height() -> f32 {
    4000.0
}

/// Lazy-load options, with the scroll element given by element id
#[derive(Debug, Default, Deserialize)]
pub struct OptionsConfig {
    #[serde(default, rename = "scrollElement")]
    pub scroll_element: Option<String>,
    #[serde(flatten)]
    pub overrides: LazyLoadOverrides,
}

/// One element of the page
#[derive(Debug, Deserialize)]
pub struct ElementConfig {
    pub id: String,
    /// Parent element id (defaults to `<body>`)
    #[serde(default)]
    pub parent: Option<String>,
    /// Element whose offsets this element's position is relative to
    #[serde(default)]
    pub offset_parent: Option<String>,
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub top: f32,
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: f32,
    /// Scrollable content height; makes the element a scroll container
    #[serde(default)]
    pub scroll_height: Option<f32>,
    /// `data-module-lazyload` value
    #[serde(default)]
    pub lazyload: Option<String>,
    /// `data-modules` value
    #[serde(default)]
    pub modules: Option<String>,
    /// `data-module-options` value (raw JSON)
    #[serde(default)]
    pub options: Option<String>,
    /// `data-module-property` value
    #[serde(default)]
    pub property: Option<String>,
}

fn default_tag() -> String {
    "div".to_string()
}

/// A scripted host action
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Scroll the page, or the element `target`
    Scroll {
        top: f32,
        #[serde(default)]
        left: f32,
        #[serde(default)]
        target: Option<String>,
    },
    Hover {
        target: String,
    },
    Click {
        target: String,
    },
    WaitMs {
        ms: u64,
    },
    /// Stop lazy loading
    Stop,
}

impl Step {
    fn target(&self) -> Option<&str> {
        match self {
            Step::Scroll { target, .. } => target.as_deref(),
            Step::Hover { target } | Step::Click { target } => Some(target.as_str()),
            Step::WaitMs { .. } | Step::Stop => None,
        }
    }
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Display name (the `name` key, or a fallback)
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed fixture")
    }

    /// Every distinct module type named by the elements, sorted
    pub fn module_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .elements
            .iter()
            .filter_map(|e| e.modules.as_deref())
            .flat_map(str::split_whitespace)
            .map(str::to_owned)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        types.sort();
        types
    }

    /// Collect every problem with the fixture
    ///
    /// An empty list means the fixture can be run.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();

        for element in &self.elements {
            if !seen.insert(element.id.as_str()) {
                problems.push(format!("duplicate element id '{}'", element.id));
            }
        }

        for (index, element) in self.elements.iter().enumerate() {
            // Parents must be declared earlier so the tree can be built in order
            let earlier: HashSet<&str> =
                self.elements[..index].iter().map(|e| e.id.as_str()).collect();
            if let Some(parent) = &element.parent {
                if !earlier.contains(parent.as_str()) {
                    problems.push(format!(
                        "element '{}': parent '{}' is not declared before it",
                        element.id, parent
                    ));
                }
            }
            if let Some(offset_parent) = &element.offset_parent {
                if !seen.contains(offset_parent.as_str()) {
                    problems.push(format!(
                        "element '{}': unknown offset parent '{}'",
                        element.id, offset_parent
                    ));
                }
            }
            if let Some(marker) = &element.lazyload {
                if let TriggerPattern::Invalid(_) = TriggerPattern::parse(marker) {
                    problems.push(format!(
                        "element '{}': trigger pattern '{}' does not compile",
                        element.id, marker
                    ));
                }
            }
            let metadata = MetaData::parse(element.modules.as_deref(), element.options.as_deref());
            if let Err(err) = metadata {
                problems.push(format!("element '{}': {}", element.id, err));
            }
        }

        if let Some(id) = &self.options.scroll_element {
            if !seen.contains(id.as_str()) {
                problems.push(format!("options: unknown scroll element '{}'", id));
            }
        }
        if let Err(err) = LazyLoadOptions::merged(&self.options.overrides) {
            problems.push(format!("options: {}", err));
        }

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(target) = step.target() {
                if !seen.contains(target) {
                    problems.push(format!("step {}: unknown target '{}'", index + 1, target));
                }
            }
        }

        problems
    }

    /// Build the page described by the fixture
    ///
    /// Returns the page together with the node of every element id.
    pub fn build_page(&self, registry: ModuleRegistry) -> Result<(Page, HashMap<String, NodeId>)> {
        let problems = self.problems();
        if !problems.is_empty() {
            bail!("invalid fixture: {}", problems.join("; "));
        }

        let mut page = Page::new(registry);
        let doc = page.document_mut();
        let viewport = &self.viewport;
        let window = Geometry::scroller(
            viewport.width,
            viewport.height,
            viewport.content_width.unwrap_or(viewport.width),
            viewport.content_height,
        );
        // The root element always reports the window's client box
        let html = doc.document_element();
        doc.set_geometry(html, window);
        if viewport.scroller == PageScroller::Body {
            let body = doc.body();
            doc.set_geometry(body, window);
        }

        let mut nodes = HashMap::new();
        for element in &self.elements {
            let parent = match &element.parent {
                Some(id) => lookup(&nodes, id)?,
                None => doc.body(),
            };
            let node = doc.append_element(parent, element.tag.as_str());
            let width = element.width.unwrap_or(viewport.width);

            let geometry = match element.scroll_height {
                Some(content_height) => {
                    let mut g = Geometry::scroller(width, element.height, width, content_height);
                    g.offset_top = element.top;
                    g.offset_left = element.left;
                    g
                }
                None => Geometry::offset(element.top, element.left, width, element.height),
            };
            doc.set_geometry(node, geometry);

            let attributes = [
                (LAZYLOAD_ATTR, &element.lazyload),
                (MODULES_ATTR, &element.modules),
                (OPTIONS_ATTR, &element.options),
                (PROPERTY_ATTR, &element.property),
            ];
            for (name, value) in attributes {
                if let Some(value) = value {
                    doc.set_attribute(node, name, value.as_str());
                }
            }

            nodes.insert(element.id.clone(), node);
        }

        for element in &self.elements {
            if let Some(offset_parent) = &element.offset_parent {
                let node = lookup(&nodes, &element.id)?;
                doc.set_offset_parent(node, Some(lookup(&nodes, offset_parent)?));
            }
        }

        Ok((page, nodes))
    }

    /// Lazy-load overrides with the scroll element resolved to its node
    pub fn overrides(&self, nodes: &HashMap<String, NodeId>) -> LazyLoadOverrides {
        let mut overrides = self.options.overrides.clone();
        overrides.scroll_element = self
            .options
            .scroll_element
            .as_ref()
            .and_then(|id| nodes.get(id).copied());
        overrides
    }
}

/// Node of the element `id`
pub fn lookup(nodes: &HashMap<String, NodeId>, id: &str) -> Result<NodeId> {
    nodes
        .get(id)
        .copied()
        .with_context(|| format!("unknown element '{}'", id))
}
