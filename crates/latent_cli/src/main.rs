//! Latent CLI
//!
//! Play page fixtures through the lazy-loading scheduler and report which
//! modules came alive, and when.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use latent_core::{
    LazyLoadOptions, Module, ModuleRegistry, ModuleSpec, Page, DEFAULT_SCROLL_STOP_DELAY,
    DEFAULT_SCROLL_TIMEOUT, LAZYLOADED_ATTR, LAZYLOAD_ATTR, MODULES_ATTR, OPTIONS_ATTR,
    PROPERTY_ATTR,
};
use latent_dom::{event_types, NodeId};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod fixture;

use fixture::{lookup, Fixture, PageScroller, Step};

#[derive(Parser)]
#[command(name = "latent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lazy-loading viewport scheduler", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a page fixture and report module activations
    Run {
        /// Fixture file (TOML)
        fixture: String,
    },

    /// Validate a page fixture without running it
    Check {
        /// Fixture file (TOML)
        fixture: String,
    },

    /// Show defaults and the markup attributes
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run { fixture } => cmd_run(&fixture),
        Commands::Check { fixture } => cmd_check(&fixture),
        Commands::Info => cmd_info(),
    }
}

/// Module that only records that it was created
struct Recorded {
    type_name: String,
}

impl Module for Recorded {
    fn type_name(&self) -> &str {
        &self.type_name
    }
}

type CreationLog = Rc<RefCell<Vec<(String, NodeId)>>>;

fn recording_registry(types: &[String], log: &CreationLog) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    for type_name in types {
        let log = Rc::clone(log);
        registry.register(type_name.as_str(), move |spec: &ModuleSpec<'_>| {
            log.borrow_mut().push((spec.type_name.to_string(), spec.element));
            Recorded {
                type_name: spec.type_name.to_string(),
            }
        });
    }
    registry
}

fn cmd_run(path: &str) -> Result<()> {
    let fixture = Fixture::load(Path::new(path))?;
    let log: CreationLog = Rc::new(RefCell::new(Vec::new()));
    let registry = recording_registry(&fixture.module_types(), &log);
    let (mut page, nodes) = fixture.build_page(registry)?;
    let names: HashMap<NodeId, &str> = nodes.iter().map(|(id, &n)| (n, id.as_str())).collect();

    info!(
        "Running {} ({} elements, {} steps)",
        fixture.title(),
        fixture.elements.len(),
        fixture.steps.len()
    );

    let root = page.document().body();
    page.lazy_load_modules(root, &fixture.overrides(&nodes))
        .context("Failed to start lazy loading")?;

    let mut reported = report_created(&page, &log, &names, 0);

    for step in &fixture.steps {
        match step {
            Step::Scroll { top, left, target } => {
                let node = match target {
                    Some(id) => lookup(&nodes, id)?,
                    None => match fixture.viewport.scroller {
                        PageScroller::Html => page.document().document_element(),
                        PageScroller::Body => page.document().body(),
                    },
                };
                page.scroll_to(node, *left, *top);
            }
            Step::Hover { target } => {
                page.dispatch(lookup(&nodes, target)?, event_types::MOUSEOVER);
            }
            Step::Click { target } => {
                page.dispatch(lookup(&nodes, target)?, event_types::CLICK);
            }
            Step::WaitMs { ms } => page.advance(Duration::from_millis(*ms)),
            Step::Stop => page.stop_lazy_loading_modules(),
        }
        reported = report_created(&page, &log, &names, reported);
    }

    println!();
    if let Some(loader) = page.manager().lazy_loader() {
        let stats = loader.stats();
        println!(
            "Scans: {}  Activations: {}  Failures: {}",
            stats.scans, stats.activations, stats.failures
        );
    }

    let mut pending: Vec<&str> = nodes
        .iter()
        .filter(|&(_, &node)| page.document().has_attribute(node, LAZYLOAD_ATTR))
        .map(|(id, _)| id.as_str())
        .collect();
    pending.sort_unstable();
    if pending.is_empty() {
        println!("Every lazy element was activated");
    } else {
        println!("Still lazy: {}", pending.join(", "));
    }

    Ok(())
}

/// Print creations logged since `from`, returning the new log length
fn report_created(
    page: &Page,
    log: &CreationLog,
    names: &HashMap<NodeId, &str>,
    from: usize,
) -> usize {
    let log = log.borrow();
    for (type_name, node) in &log[from..] {
        let name = names.get(node).copied().unwrap_or("?");
        let via = match page.document().attribute(*node, LAZYLOADED_ATTR) {
            Some(marker) => format!("lazyload \"{}\"", marker),
            None => "sub-module".to_string(),
        };
        println!(
            "[{:>6} ms] {} created on {} ({})",
            page.now().as_millis(),
            type_name,
            name,
            via
        );
    }
    log.len()
}

fn cmd_check(path: &str) -> Result<()> {
    let fixture = Fixture::load(Path::new(path))?;

    info!("Checking fixture: {}", fixture.title());

    let problems = fixture.problems();
    if !problems.is_empty() {
        for problem in &problems {
            warn!("{}", problem);
        }
        anyhow::bail!("{} problem(s) found in {}", problems.len(), path);
    }

    let lazy = fixture.elements.iter().filter(|e| e.lazyload.is_some()).count();
    println!(
        "{}: {} elements ({} lazy), {} steps, module types {:?}",
        fixture.title(),
        fixture.elements.len(),
        lazy,
        fixture.steps.len(),
        fixture.module_types()
    );

    Ok(())
}

fn cmd_info() -> Result<()> {
    let defaults = LazyLoadOptions::default();

    println!("Latent lazy-loading scheduler");
    println!("=============================");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Defaults:");
    println!("  - scrollTimeout: {} ms", DEFAULT_SCROLL_TIMEOUT.as_millis());
    println!("  - scrollStopDelay: {} ms", DEFAULT_SCROLL_STOP_DELAY.as_millis());
    println!("  - interactionEvents: {:?}", defaults.interaction_events.as_slice());
    println!();
    println!("Markup:");
    println!("  - {}: \"any\" or a trigger pattern", LAZYLOAD_ATTR);
    println!("  - {}: marker value after activation", LAZYLOADED_ATTR);
    println!("  - {}: module types", MODULES_ATTR);
    println!("  - {}: JSON options object", OPTIONS_ATTR);
    println!("  - {}: sub-module property name", PROPERTY_ATTR);

    Ok(())
}
