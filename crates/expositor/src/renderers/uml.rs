//! UML class diagrams: class notation, parsed and emitted as DOT.

use std::path::{Path, PathBuf};

use log::{info, warn};

use expositor_core::{capability::Capability, request::OutputKind};
use expositor_parser::{class_notation, error::ParseError, extract::Marker};

use super::prompts;
use crate::{
    emit::{self, Emission},
    invoke::{Engine, RenderInvoker},
    model::GenerationOptions,
    renderer::{self, RenderContext, Renderer, RendererError, RendererOutput},
};

/// DOT for a class notation document, plus notes about what was left out.
#[derive(Debug, Clone)]
pub struct ClassGraph {
    pub emission: Emission,
    pub notes: Vec<String>,
}

impl ClassGraph {
    /// Parse `notation` and emit it.
    pub fn from_notation(notation: &str) -> Result<Self, ParseError> {
        let parsed = class_notation::parse(notation)?;
        let emission = emit::emit(&parsed.diagram);

        let mut notes: Vec<String> = parsed.warnings.iter().map(ToString::to_string).collect();
        notes.extend(emission.dropped.iter().map(|rel| {
            format!(
                "Skipped {} relationship {} -> {}: endpoint is not a declared class",
                rel.kind(),
                rel.source(),
                rel.target()
            )
        }));
        for note in &notes {
            warn!(note = note.as_str(); "Class notation issue");
        }

        Ok(Self { emission, notes })
    }

    /// Render the graph with Graphviz.
    pub fn render(
        &self,
        invoker: &RenderInvoker,
        output_base: &Path,
    ) -> Result<PathBuf, RendererError> {
        invoker
            .render(&self.emission.dot, Engine::Graphviz, output_base)
            .map_err(|failure| RendererError::Render {
                failure,
                notes: self.notes.clone(),
            })
    }
}

/// Asks the model for class notation and draws it.
#[derive(Debug, Clone)]
pub struct UmlClassDiagram {
    options: GenerationOptions,
}

impl Default for UmlClassDiagram {
    fn default() -> Self {
        Self {
            options: GenerationOptions::new(0.0).with_context_window(8192),
        }
    }
}

impl Renderer for UmlClassDiagram {
    fn name(&self) -> &str {
        "uml_class_diagram"
    }

    fn title(&self) -> String {
        "UML Class Diagram".to_string()
    }

    fn requirements(&self) -> &[Capability] {
        &[Capability::Graphviz]
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Image
    }

    fn output_base(&self) -> &str {
        "uml_class_diagram_output"
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<RendererOutput, RendererError> {
        let output_base = ctx.require_output_base()?;
        let raw = renderer::generate(ctx, &prompts::uml_class_diagram(ctx.request), &self.options)?;

        let notation = renderer::extract_block(&raw, &Marker::class_notation())?;
        let graph = ClassGraph::from_notation(&notation)
            .map_err(|err| RendererError::extraction(err, raw.as_str()))?;
        info!(
            classes = graph.emission.nodes,
            relationships = graph.emission.edges;
            "Parsed class notation"
        );

        let path = graph.render(ctx.invoker, output_base)?;
        let message = format!(
            "{} UML class diagram image saved to: {}",
            renderer::SUCCESS_PREFIX,
            path.display()
        );
        Ok(RendererOutput::Image { path, message })
    }
}
