//! Expositor - renderer plugins that turn code explanations into prose and diagrams.
//!
//! A language model first writes a base explanation of some source code.
//! Renderers then turn that explanation into a final artifact: cleaned-up
//! prose, or a DOT / Mermaid diagram rendered to an image by an external
//! engine. Renderers are discovered at startup, filtered by the engines the
//! host actually has, and run one at a time through a [`Dispatcher`] that
//! contains their failures.

pub mod config;
pub mod dispatch;
pub mod emit;
pub mod invoke;
pub mod model;
pub mod registry;
pub mod renderer;
pub mod renderers;

mod error;

pub use expositor_core::{capability, class_model, request};

pub use dispatch::{DispatchError, Dispatcher, Sandbox};
pub use error::ExpositorError;
pub use registry::{Discovery, Registry};

use std::sync::Arc;

use log::{debug, info};

use expositor_core::{capability::CapabilitySet, request::RenderResult};

use config::AppConfig;
use invoke::RenderInvoker;
use model::{GenerationOptions, LanguageModel};
use renderer::SUCCESS_PREFIX;
use renderers::{ClassGraph, prompts};

const CLASS_DIAGRAM_RENDERER: &str = "uml_class_diagram";

/// Entry point tying configuration, discovery and dispatch together.
///
/// # Examples
///
/// ```rust,no_run
/// use expositor::{Expositor, capability, config::AppConfig};
///
/// let expositor = Expositor::new(AppConfig::default());
/// let discovery = expositor.discover(&capability::probe());
///
/// for descriptor in discovery.registry.iter() {
///     println!("{} - {}", descriptor.name(), descriptor.title());
/// }
/// ```
#[derive(Debug, Default)]
pub struct Expositor {
    config: AppConfig,
}

impl Expositor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Built-in renderers plus the manifests in the configured plugin directory.
    pub fn discover(&self, capabilities: &CapabilitySet) -> Discovery {
        let discovery = Registry::discover_all(self.config.plugins().directory(), capabilities);
        info!(
            found = discovery.report.found.len(),
            skipped = discovery.report.skipped.len(),
            rejected = discovery.report.rejected.len();
            "Renderer discovery finished"
        );
        discovery
    }

    pub fn invoker(&self) -> RenderInvoker {
        RenderInvoker::new(self.config.engines(), self.config.output().format())
    }

    pub fn sandbox(&self) -> Sandbox {
        Sandbox::new(self.config.output().directory())
    }

    /// A dispatcher over `registry`, with the output directory created.
    pub fn dispatcher(
        &self,
        registry: Registry,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Dispatcher, ExpositorError> {
        let sandbox = self.sandbox();
        std::fs::create_dir_all(sandbox.root())?;
        Ok(Dispatcher::new(registry, model, self.invoker(), sandbox))
    }

    /// Ask `model` for the base explanation of `source`.
    pub fn explain_source(
        &self,
        model: &dyn LanguageModel,
        source: &str,
    ) -> Result<String, ExpositorError> {
        info!(model = model.name(), source_len = source.len(); "Requesting base explanation");
        let prompt = prompts::base_explanation(source);
        let explanation = model.generate(&prompt, &GenerationOptions::default())?;
        let explanation = explanation.trim();
        if explanation.is_empty() {
            return Err(ExpositorError::EmptyExplanation);
        }
        Ok(explanation.to_string())
    }

    /// Draw a class notation document without involving a model.
    ///
    /// Parse errors, an `output_base` that is not a plain file name and an
    /// image outside the output directory are returned as errors. Engine
    /// failures come back as a text result carrying the DOT source, the same
    /// way the class diagram renderer reports them.
    pub fn render_notation(
        &self,
        notation: &str,
        output_base: &str,
    ) -> Result<RenderResult, ExpositorError> {
        let sandbox = self.sandbox();
        let base = sandbox.unique_base(output_base)?;
        sandbox.check(&base)?;

        let graph = ClassGraph::from_notation(notation)
            .map_err(|err| ExpositorError::new_parse_error(err, notation))?;
        debug!(classes = graph.emission.nodes, edges = graph.emission.edges; "Class notation parsed");

        match graph.render(&self.invoker(), &base) {
            Ok(path) => {
                sandbox.check(&path)?;
                let message = format!(
                    "{SUCCESS_PREFIX} UML class diagram image saved to: {}",
                    path.display()
                );
                Ok(RenderResult::image(path, message))
            }
            Err(err) => Ok(RenderResult::text(err.report(CLASS_DIAGRAM_RENDERER))),
        }
    }
}
