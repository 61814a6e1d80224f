use expositor_core::request::OutputKind;

use crate::renderer::{RenderContext, Renderer, RendererError, RendererOutput};

/// Returns the base explanation as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleSummary;

impl Renderer for SimpleSummary {
    fn name(&self) -> &str {
        "simple_summary"
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Text
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<RendererOutput, RendererError> {
        Ok(RendererOutput::text(ctx.request.explanation()))
    }
}
