//! Renderers that ask the model for DOT or Mermaid and hand it to an engine.

use log::{debug, info};

use expositor_core::{capability::Capability, request::OutputKind};
use expositor_parser::extract::Marker;

use super::prompts::{self, Prompt};
use crate::{
    invoke::Engine,
    model::GenerationOptions,
    renderer::{self, RenderContext, Renderer, RendererError, RendererOutput},
};

/// A prompt, a marker to extract by and an engine to render with.
#[derive(Debug, Clone)]
pub struct DiagramRenderer {
    name: String,
    title: Option<String>,
    engine: Engine,
    marker: Marker,
    prompt: Prompt,
    options: GenerationOptions,
    requirements: Vec<Capability>,
    output_base: String,
}

impl DiagramRenderer {
    /// A Graphviz renderer extracting a `digraph`.
    ///
    /// Requires [`Capability::Graphviz`].
    pub fn dot(name: impl Into<String>, prompt: Prompt) -> Self {
        Self::new(name, Engine::Graphviz, Marker::digraph(), prompt)
            .with_requirements(vec![Capability::Graphviz])
    }

    /// A Mermaid renderer. No capability is required: without the CLI the
    /// render fails and the source is returned as text.
    pub fn mermaid(name: impl Into<String>, marker: Marker, prompt: Prompt) -> Self {
        Self::new(name, Engine::MermaidCli, marker, prompt)
    }

    fn new(name: impl Into<String>, engine: Engine, marker: Marker, prompt: Prompt) -> Self {
        let name = name.into();
        Self {
            output_base: format!("{name}_output"),
            name,
            title: None,
            engine,
            marker,
            prompt,
            options: GenerationOptions::default(),
            requirements: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_requirements(mut self, requirements: Vec<Capability>) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_output_base(mut self, output_base: impl Into<String>) -> Self {
        self.output_base = output_base.into();
        self
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }
}

impl Renderer for DiagramRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| renderer::default_title(&self.name))
    }

    fn requirements(&self) -> &[Capability] {
        &self.requirements
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Image
    }

    fn output_base(&self) -> &str {
        &self.output_base
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<RendererOutput, RendererError> {
        let output_base = ctx.require_output_base()?;
        let prompt = self.prompt.build(ctx.request);
        let raw = renderer::generate(ctx, &prompt, &self.options)?;

        let source = renderer::extract_block(&raw, &self.marker)?;
        debug!(
            renderer = self.name.as_str(),
            language = self.engine.language(),
            len = source.len();
            "Extracted diagram source"
        );

        let path = ctx
            .invoker
            .render(&source, self.engine, output_base)
            .map_err(RendererError::render)?;
        info!(renderer = self.name.as_str(), path = path.display().to_string(); "Diagram rendered");

        let message = format!(
            "{} {} image saved to: {}",
            renderer::SUCCESS_PREFIX,
            self.title(),
            path.display()
        );
        Ok(RendererOutput::Image { path, message })
    }
}

pub(crate) fn call_graph() -> DiagramRenderer {
    DiagramRenderer::dot("call_graph", Prompt::Builtin(prompts::call_graph))
        .with_options(GenerationOptions::new(0.05))
}

pub(crate) fn dependency_graph() -> DiagramRenderer {
    DiagramRenderer::dot("dependency_graph", Prompt::Builtin(prompts::dependency_graph))
        .with_options(GenerationOptions::new(0.1))
}

pub(crate) fn flowchart_graphical() -> DiagramRenderer {
    DiagramRenderer::dot(
        "flowchart_graphical",
        Prompt::Builtin(prompts::flowchart_graphical),
    )
    .with_title("Flowchart")
    .with_options(GenerationOptions::new(0.1))
    .with_output_base("flowchart_output")
}

pub(crate) fn sequence_diagram() -> DiagramRenderer {
    DiagramRenderer::mermaid(
        "sequence_diagram_mermaid",
        Marker::new("sequenceDiagram"),
        Prompt::Builtin(prompts::sequence_diagram),
    )
    .with_title("Sequence Diagram")
    .with_options(GenerationOptions::new(0.1))
}

pub(crate) fn activity_diagram() -> DiagramRenderer {
    DiagramRenderer::mermaid(
        "activity_diagram_mermaid",
        Marker::any_of(["graph TD", "graph LR", "activityDiagram"]),
        Prompt::Builtin(prompts::activity_diagram),
    )
    .with_title("Activity Diagram")
    .with_options(GenerationOptions::new(0.05).with_context_window(8192))
}

pub(crate) fn architecture_diagram() -> DiagramRenderer {
    DiagramRenderer::mermaid(
        "architecture_diagram_mermaid",
        Marker::any_of(["graph TD", "graph LR"]),
        Prompt::Builtin(prompts::architecture_diagram),
    )
    .with_title("Architecture Diagram")
    .with_options(GenerationOptions::new(0.1))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use expositor_core::request::RenderRequest;

    use super::*;
    use crate::{config::EngineConfig, invoke::RenderInvoker, model::testing::ScriptedModel};

    fn run(
        renderer: &DiagramRenderer,
        model: &ScriptedModel,
        invoker: &RenderInvoker,
        output_base: Option<&Path>,
    ) -> Result<RendererOutput, RendererError> {
        let request = RenderRequest::new(renderer.name(), "explanation", "source");
        let ctx = RenderContext {
            request: &request,
            model,
            invoker,
            output_base,
        };
        renderer.render(&ctx)
    }

    #[test]
    fn test_builtin_metadata() {
        let call_graph = call_graph();
        assert_eq!(call_graph.requirements(), [Capability::Graphviz]);
        assert_eq!(call_graph.output_base(), "call_graph_output");
        assert_eq!(call_graph.output_kind(), OutputKind::Image);

        assert_eq!(flowchart_graphical().output_base(), "flowchart_output");

        let sequence = sequence_diagram();
        assert!(sequence.requirements().is_empty());
        assert_eq!(sequence.output_base(), "sequence_diagram_mermaid_output");
        assert_eq!(sequence.engine(), Engine::MermaidCli);
    }

    #[test]
    fn test_requires_output_base() {
        let model = ScriptedModel::replying("digraph G { a -> b; }");

        let err = run(&call_graph(), &model, &RenderInvoker::default(), None).unwrap_err();

        assert!(matches!(err, RendererError::MissingOutputPath));
    }

    #[test]
    fn test_prose_answer_is_extraction_error() {
        let model = ScriptedModel::replying("I cannot draw this graph.");
        let dir = tempfile::tempdir().unwrap();

        let err = run(
            &call_graph(),
            &model,
            &RenderInvoker::default(),
            Some(&dir.path().join("cg")),
        )
        .unwrap_err();

        let report = err.report("call_graph");
        assert!(report.contains("E001"));
        assert!(report.contains("I cannot draw this graph."));
    }

    #[test]
    fn test_missing_mermaid_cli_falls_back_to_source() {
        let model = ScriptedModel::replying(
            "Here you go:\n```mermaid\nsequenceDiagram\n    Alice->>Bob: hi\n```\nDone.",
        );
        let config = EngineConfig::new("expositor-test-no-such-engine", "white", 5);
        let invoker = RenderInvoker::new(&config, Default::default());
        let dir = tempfile::tempdir().unwrap();

        let err = run(
            &sequence_diagram(),
            &model,
            &invoker,
            Some(&dir.path().join("seq")),
        )
        .unwrap_err();

        let report = err.report("sequence_diagram_mermaid");
        assert!(report.ends_with(
            "Returning Mermaid syntax instead:\n\n```mermaid\nsequenceDiagram\n    Alice->>Bob: hi\n```"
        ));
    }
}
