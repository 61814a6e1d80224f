//! Renderer discovery and lookup.
//!
//! The registry is built once per process from the built-in renderers and
//! the manifests found in the plugin directory. Renderers whose declared
//! capability requirements are not met by the probed [`CapabilitySet`] are
//! left out and reported as *skipped*; manifests that fail to load are
//! reported as *rejected*. Neither stops discovery.

use std::{
    fmt, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::IndexMap;
use log::{debug, info, warn};

use expositor_core::{
    capability::{Capability, CapabilitySet},
    request::OutputKind,
};

use crate::{
    renderer::Renderer,
    renderers::{self, LoadError, manifest},
};

/// Name of the renderer listed first.
pub const DEFAULT_RENDERER: &str = "simple_summary";

const MANIFEST_EXTENSION: &str = "toml";

/// Where a renderer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Builtin,
    Manifest(PathBuf),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Builtin => f.write_str("built-in"),
            Origin::Manifest(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A registered renderer and its declared metadata.
#[derive(Clone)]
pub struct RendererDescriptor {
    renderer: Arc<dyn Renderer>,
    origin: Origin,
}

impl RendererDescriptor {
    fn new(renderer: Arc<dyn Renderer>, origin: Origin) -> Self {
        Self { renderer, origin }
    }

    pub fn name(&self) -> &str {
        self.renderer.name()
    }

    pub fn title(&self) -> String {
        self.renderer.title()
    }

    pub fn requirements(&self) -> &[Capability] {
        self.renderer.requirements()
    }

    pub fn output_kind(&self) -> OutputKind {
        self.renderer.output_kind()
    }

    pub fn output_base(&self) -> &str {
        self.renderer.output_base()
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }
}

impl fmt::Debug for RendererDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererDescriptor")
            .field("name", &self.name())
            .field("output_kind", &self.output_kind())
            .field("requirements", &self.requirements())
            .field("origin", &self.origin)
            .finish()
    }
}

/// A renderer that loaded but cannot run with the current engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub name: String,
    pub missing: Vec<Capability>,
    pub origin: Origin,
}

/// A manifest that could not be loaded.
#[derive(Debug)]
pub struct Rejected {
    pub path: PathBuf,
    pub error: LoadError,
}

/// What discovery saw.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Names of registered renderers, in discovery order.
    pub found: Vec<String>,
    pub skipped: Vec<Skipped>,
    pub rejected: Vec<Rejected>,
}

impl DiscoveryReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.rejected.is_empty()
    }
}

/// The registry plus the report that produced it.
#[derive(Debug)]
pub struct Discovery {
    pub registry: Registry,
    pub report: DiscoveryReport,
}

/// Available renderers keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    renderers: IndexMap<String, RendererDescriptor>,
}

impl Registry {
    /// The built-in renderers whose requirements `capabilities` satisfies.
    pub fn builtin(capabilities: &CapabilitySet) -> Discovery {
        let mut builder = Builder::new(capabilities);
        builder.add_builtins();
        builder.finish()
    }

    /// Manifest renderers from `plugin_dir` only.
    ///
    /// A missing directory yields an empty registry.
    pub fn discover(plugin_dir: &Path, capabilities: &CapabilitySet) -> Discovery {
        let mut builder = Builder::new(capabilities);
        builder.add_manifests(plugin_dir);
        builder.finish()
    }

    /// Built-in renderers followed by the manifests in `plugin_dir`.
    ///
    /// A manifest may not reuse a built-in name.
    pub fn discover_all(plugin_dir: &Path, capabilities: &CapabilitySet) -> Discovery {
        let mut builder = Builder::new(capabilities);
        builder.add_builtins();
        builder.add_manifests(plugin_dir);
        builder.finish()
    }

    /// Add an in-process renderer, replacing any renderer with the same name.
    ///
    /// Capability requirements are not checked.
    pub fn register(&mut self, renderer: Arc<dyn Renderer>) {
        let name = renderer.name().to_string();
        self.renderers
            .insert(name, RendererDescriptor::new(renderer, Origin::Builtin));
    }

    pub fn get(&self, name: &str) -> Option<&RendererDescriptor> {
        self.renderers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.renderers.contains_key(name)
    }

    /// Names in display order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RendererDescriptor> {
        self.renderers.values()
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

struct Builder<'a> {
    capabilities: &'a CapabilitySet,
    renderers: IndexMap<String, RendererDescriptor>,
    report: DiscoveryReport,
    /// Every name seen so far, registered or skipped.
    seen: Vec<String>,
}

impl<'a> Builder<'a> {
    fn new(capabilities: &'a CapabilitySet) -> Self {
        Self {
            capabilities,
            renderers: IndexMap::new(),
            report: DiscoveryReport::default(),
            seen: Vec::new(),
        }
    }

    fn add_builtins(&mut self) {
        for renderer in renderers::builtin() {
            self.add(renderer, Origin::Builtin);
        }
    }

    fn add_manifests(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(dir = dir.display().to_string(); "No plugin directory");
                return;
            }
            Err(err) => {
                warn!(dir = dir.display().to_string(), err = err.to_string(); "Cannot read plugin directory, no manifests loaded");
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext == MANIFEST_EXTENSION)
            })
            .collect();
        paths.sort();

        for path in paths {
            match manifest::load(&path) {
                Ok(renderer) if self.seen.iter().any(|n| n == renderer.name()) => {
                    let name = renderer.name().to_string();
                    self.reject(path, LoadError::Duplicate(name));
                }
                Ok(renderer) => self.add(renderer, Origin::Manifest(path)),
                Err(error) => self.reject(path, error),
            }
        }
    }

    fn add(&mut self, renderer: Arc<dyn Renderer>, origin: Origin) {
        let name = renderer.name().to_string();
        self.seen.push(name.clone());

        let missing = self.capabilities.missing(renderer.requirements());
        if !missing.is_empty() {
            info!(
                renderer = name.as_str(),
                missing:? = missing,
                origin = origin.to_string();
                "Renderer found but skipped: required engines are unavailable"
            );
            self.report.skipped.push(Skipped {
                name,
                missing,
                origin,
            });
            return;
        }

        debug!(renderer = name.as_str(), origin = origin.to_string(); "Registered renderer");
        self.report.found.push(name.clone());
        self.renderers
            .insert(name, RendererDescriptor::new(renderer, origin));
    }

    fn reject(&mut self, path: PathBuf, error: LoadError) {
        warn!(path = path.display().to_string(), err = error.to_string(); "Rejected renderer manifest");
        self.report.rejected.push(Rejected { path, error });
    }

    fn finish(mut self) -> Discovery {
        self.renderers.sort_by(|a, _, b, _| {
            (a != DEFAULT_RENDERER)
                .cmp(&(b != DEFAULT_RENDERER))
                .then_with(|| a.cmp(b))
        });
        Discovery {
            registry: Registry {
                renderers: self.renderers,
            },
            report: self.report,
        }
    }
}
