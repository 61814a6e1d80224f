//! Detection of optional external rendering engines.
//!
//! Renderers may declare that they need an external engine to produce an
//! image. Which engines are present is decided once, at process start, by
//! [`probe`] and recorded in an immutable [`CapabilitySet`] that is then
//! passed explicitly to the registry and dispatcher.

use std::{
    ffi::{OsStr, OsString},
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named external engine a renderer may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// The graph-layout engine (`dot`) together with its in-process binding.
    Graphviz,
    /// The diagram command-line engine (`mmdc`).
    MermaidCli,
}

impl Capability {
    /// All known capabilities, in a stable order.
    pub const ALL: [Capability; 2] = [Capability::Graphviz, Capability::MermaidCli];

    /// Returns the name used in manifests and log output.
    pub fn name(self) -> &'static str {
        match self {
            Capability::Graphviz => "graphviz",
            Capability::MermaidCli => "mermaid_cli",
        }
    }

    /// Returns the default executable name looked up on the search path.
    pub fn executable(self) -> &'static str {
        match self {
            Capability::Graphviz => "dot",
            Capability::MermaidCli => "mmdc",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a capability name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown capability `{0}` (expected one of: graphviz, mermaid_cli)")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "graphviz" | "dot" => Ok(Capability::Graphviz),
            "mermaid_cli" | "mermaid" | "mmdc" => Ok(Capability::MermaidCli),
            _ => Err(UnknownCapability(s.to_string())),
        }
    }
}

/// Process-wide record of which external engines are present.
///
/// Computed once and never mutated afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    graphviz: bool,
    mermaid_cli: bool,
}

impl CapabilitySet {
    /// Create a set from explicit flags.
    pub fn new(graphviz: bool, mermaid_cli: bool) -> Self {
        Self {
            graphviz,
            mermaid_cli,
        }
    }

    /// A set in which no engine is available.
    pub fn none() -> Self {
        Self::default()
    }

    /// A set in which every engine is available.
    pub fn all() -> Self {
        Self::new(true, true)
    }

    /// Returns `true` if the given engine is present.
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Graphviz => self.graphviz,
            Capability::MermaidCli => self.mermaid_cli,
        }
    }

    /// Returns `true` if every listed requirement is present.
    pub fn satisfies(&self, requirements: &[Capability]) -> bool {
        requirements.iter().all(|c| self.has(*c))
    }

    /// Returns the listed requirements that are absent, preserving order.
    pub fn missing(&self, requirements: &[Capability]) -> Vec<Capability> {
        requirements
            .iter()
            .copied()
            .filter(|c| !self.has(*c))
            .collect()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |present: bool| if present { "available" } else { "missing" };
        write!(
            f,
            "graphviz: {}, mermaid_cli: {}",
            mark(self.graphviz),
            mark(self.mermaid_cli)
        )
    }
}

/// Configurable capability probe.
///
/// The defaults look up `dot` and `mmdc` on the `PATH` of the current process.
/// Tests and configuration can override the search path or executable names.
///
/// # Example
///
/// ```
/// use expositor_core::capability::{Capability, Probe};
///
/// let caps = Probe::new().search_path("").run();
/// assert!(!caps.has(Capability::MermaidCli));
/// ```
#[derive(Debug, Clone)]
pub struct Probe {
    search_path: Option<OsString>,
    graphviz_executable: String,
    mermaid_executable: String,
}

impl Default for Probe {
    fn default() -> Self {
        Self {
            search_path: None,
            graphviz_executable: Capability::Graphviz.executable().to_string(),
            mermaid_executable: Capability::MermaidCli.executable().to_string(),
        }
    }
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given search path instead of the `PATH` environment variable.
    pub fn search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Override the graph-layout executable name.
    pub fn graphviz_executable(mut self, name: impl Into<String>) -> Self {
        self.graphviz_executable = name.into();
        self
    }

    /// Override the diagram CLI executable name.
    pub fn mermaid_executable(mut self, name: impl Into<String>) -> Self {
        self.mermaid_executable = name.into();
        self
    }

    /// Perform the lookups and build the capability set.
    pub fn run(&self) -> CapabilitySet {
        let search_path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))
            .unwrap_or_default();

        let dot = resolve_executable(&self.graphviz_executable, &search_path);
        let mmdc = resolve_executable(&self.mermaid_executable, &search_path);

        // The graph-layout binding is compiled in through the `graphviz` feature.
        let binding = cfg!(feature = "graphviz");

        debug!(
            dot:? = dot,
            mmdc:? = mmdc,
            graphviz_binding = binding;
            "Probed external engines"
        );

        CapabilitySet::new(binding && dot.is_some(), mmdc.is_some())
    }
}

/// Probe the current process environment.
pub fn probe() -> CapabilitySet {
    Probe::new().run()
}

/// Resolve an executable name against a search path.
///
/// Absolute and relative paths containing a separator are checked directly.
pub fn resolve_executable(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let path = Path::new(name);
    if path.components().count() > 1 || path.is_absolute() {
        return is_executable(path).then(|| path.to_path_buf());
    }

    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidates(&dir, name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    let exts = std::env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.CMD;.BAT".to_string());
    std::iter::once(dir.join(name))
        .chain(exts.split(';').map(|ext| dir.join(format!("{name}{ext}"))))
        .collect()
}

#[cfg(not(windows))]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
