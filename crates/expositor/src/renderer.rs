//! The renderer abstraction.
//!
//! A [`Renderer`] turns a base explanation (plus the source it explains) into
//! a final artifact. Each renderer declares the external engines it needs and
//! whether it normally produces an image or text; the registry uses those
//! declarations to decide availability, and the dispatcher uses them to
//! allocate output paths.

use std::path::{Path, PathBuf};

use thiserror::Error;

use expositor_core::{
    capability::Capability,
    request::{ImageFormat, OutputKind, RenderRequest},
};
use expositor_parser::{error::ParseError, extract};

use crate::{
    invoke::{RenderFailure, RenderInvoker},
    model::{LanguageModel, ModelError},
};

/// Prefix of the legacy image sentinel.
pub const SUCCESS_PREFIX: &str = "Success:";
const SAVED_TO: &str = " saved to: ";

/// Everything a renderer may use during one render.
pub struct RenderContext<'a> {
    pub request: &'a RenderRequest,
    pub model: &'a dyn LanguageModel,
    pub invoker: &'a RenderInvoker,
    /// Unique output path stub, allocated for image renderers.
    pub output_base: Option<&'a Path>,
}

impl RenderContext<'_> {
    /// The output stub, or [`RendererError::MissingOutputPath`].
    pub fn require_output_base(&self) -> Result<&Path, RendererError> {
        self.output_base.ok_or(RendererError::MissingOutputPath)
    }
}

/// What a renderer returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererOutput {
    Image { path: PathBuf, message: String },
    Text(String),
}

impl RendererOutput {
    pub fn text(content: impl Into<String>) -> Self {
        RendererOutput::Text(content.into())
    }

    /// Interpret a plain message using the `Success: ... saved to: <path>` convention.
    ///
    /// Only messages that start with the sentinel and name a `.png` or `.svg`
    /// path become images; anything else is text.
    pub fn from_message(message: &str) -> Self {
        let trimmed = message.trim();
        let path = trimmed
            .strip_prefix(SUCCESS_PREFIX)
            .and_then(|rest| rest.rsplit_once(SAVED_TO))
            .map(|(_, path)| Path::new(path.trim()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(ImageFormat::from_extension)
                    .is_some()
            });

        match path {
            Some(path) => RendererOutput::Image {
                path: path.to_path_buf(),
                message: trimmed.to_string(),
            },
            None => RendererOutput::Text(message.to_string()),
        }
    }
}

/// Ways a renderer can fail.
///
/// None of these escape the dispatcher; each is reported to the user as text
/// through [`RendererError::report`].
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("{err}")]
    Extraction { err: ParseError, raw: String },

    #[error("{failure}")]
    Render {
        failure: RenderFailure,
        /// Extra text placed before the fallback source.
        notes: Vec<String>,
    },

    #[error("{0} is required but was not provided")]
    MissingInput(&'static str),

    #[error("no output path was allocated for an image renderer")]
    MissingOutputPath,

    #[error("command failed: {0}")]
    Command(String),
}

impl RendererError {
    pub fn extraction(err: ParseError, raw: impl Into<String>) -> Self {
        RendererError::Extraction {
            err,
            raw: raw.into(),
        }
    }

    pub fn render(failure: RenderFailure) -> Self {
        RendererError::Render {
            failure,
            notes: Vec::new(),
        }
    }

    /// Human-readable text for the user, including any usable artifact.
    pub fn report(&self, renderer: &str) -> String {
        match self {
            RendererError::Extraction { err, raw } => {
                let mut out = format!("Error [{renderer}]: {err}");
                for diag in err.diagnostics() {
                    if let Some(help) = diag.help() {
                        out.push_str(&format!("\n  = help: {help}"));
                    }
                }
                out.push_str(&format!(
                    "\n\nRaw LLM output:\n```\n{}\n```",
                    raw.trim_end()
                ));
                out
            }
            RendererError::Render { failure, notes } => {
                let language = failure.engine().language();
                let mut out = format!("Error [{renderer}]: {failure}\n\n");
                for note in notes {
                    out.push_str(note);
                    out.push_str("\n\n");
                }
                out.push_str(&format!(
                    "Returning {} syntax instead:\n\n```{language}\n{}\n```",
                    display_language(language),
                    failure.source_text().trim_end()
                ));
                out
            }
            other => format!("Error [{renderer}]: {other}"),
        }
    }
}

fn display_language(language: &str) -> &str {
    match language {
        "dot" => "DOT",
        "mermaid" => "Mermaid",
        other => other,
    }
}

/// A plugin that renders an explanation.
pub trait Renderer: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &str;

    /// Display title.
    fn title(&self) -> String {
        default_title(self.name())
    }

    /// External engines this renderer cannot work without.
    fn requirements(&self) -> &[Capability] {
        &[]
    }

    fn output_kind(&self) -> OutputKind;

    /// File name stem used when allocating image output paths.
    fn output_base(&self) -> &str {
        self.name()
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<RendererOutput, RendererError>;
}

/// `call_graph` -> `Call Graph`.
pub fn default_title(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Call the model and reject blank answers.
pub(crate) fn generate(
    ctx: &RenderContext<'_>,
    prompt: &str,
    options: &crate::model::GenerationOptions,
) -> Result<String, RendererError> {
    let response = ctx.model.generate(prompt, options)?;
    if response.trim().is_empty() {
        return Err(RendererError::EmptyResponse);
    }
    Ok(response)
}

/// Extract and re-validate a sub-language block, keeping the raw output on failure.
pub(crate) fn extract_block(raw: &str, marker: &extract::Marker) -> Result<String, RendererError> {
    let block = extract::extract(raw, marker).map_err(|err| RendererError::extraction(err, raw))?;
    extract::validate(&block.text, marker).map_err(|err| RendererError::extraction(err, raw))?;
    Ok(block.text)
}

#[cfg(test)]
mod tests {
    use expositor_parser::error::{Diagnostic, ErrorCode};

    use super::*;
    use crate::invoke::{Engine, FailureReason};

    #[test]
    fn test_default_title() {
        assert_eq!(default_title("call_graph"), "Call Graph");
        assert_eq!(default_title("uml_class_diagram"), "Uml Class Diagram");
        assert_eq!(default_title("simple_summary"), "Simple Summary");
    }

    #[test]
    fn test_from_message_image() {
        let output =
            RendererOutput::from_message("Success: Call graph image saved to: /app/out/cg_1a2b.png");

        assert_eq!(
            output,
            RendererOutput::Image {
                path: PathBuf::from("/app/out/cg_1a2b.png"),
                message: "Success: Call graph image saved to: /app/out/cg_1a2b.png".to_string(),
            }
        );
    }

    #[test]
    fn test_from_message_text() {
        let mention = "The renderer saved to: /tmp/x.png earlier";
        assert_eq!(RendererOutput::from_message(mention), RendererOutput::text(mention));

        let wrong_ext = "Success: report saved to: /tmp/report.txt";
        assert_eq!(RendererOutput::from_message(wrong_ext), RendererOutput::text(wrong_ext));
    }

    #[test]
    fn test_render_report_contains_fallback_source() {
        let failure = RenderFailure::new(
            Engine::MermaidCli,
            "sequenceDiagram\n  A->>B: hi",
            FailureReason::EngineMissing {
                program: "mmdc".to_string(),
            },
        );

        let report = RendererError::render(failure).report("sequence_diagram_mermaid");

        assert!(report.starts_with("Error [sequence_diagram_mermaid]: Mermaid CLI rendering failed"));
        assert!(report.ends_with(
            "Returning Mermaid syntax instead:\n\n```mermaid\nsequenceDiagram\n  A->>B: hi\n```"
        ));
    }

    #[test]
    fn test_extraction_report_contains_raw_output() {
        let err = Diagnostic::error("no block starting with `digraph` found")
            .with_code(ErrorCode::E001)
            .with_help("output begins with: Sorry")
            .into();

        let report = RendererError::extraction(err, "Sorry, no graph.").report("call_graph");

        assert!(report.starts_with("Error [call_graph]: error[E001]: no block"));
        assert!(report.contains("= help: output begins with: Sorry"));
        assert!(report.ends_with("Raw LLM output:\n```\nSorry, no graph.\n```"));
    }
}
