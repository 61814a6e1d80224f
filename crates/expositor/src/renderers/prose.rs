//! Renderers whose output is model-written prose.

use log::debug;

use expositor_core::request::{OutputKind, RenderRequest};
use expositor_parser::prose;

use super::prompts::{self, Prompt};
use crate::{
    model::GenerationOptions,
    renderer::{self, RenderContext, Renderer, RendererError, RendererOutput},
};

/// Text placed above the cleaned answer.
#[derive(Debug, Clone, Default)]
pub enum Heading {
    #[default]
    None,
    Fixed(String),
    /// Names the requirements file the report was checked against.
    Requirements,
}

impl Heading {
    fn render(&self, request: &RenderRequest) -> Option<String> {
        match self {
            Heading::None => None,
            Heading::Fixed(text) => Some(text.clone()),
            Heading::Requirements => request.requirements().map(|r| {
                format!(
                    "Functional Gap Analysis Report (Code vs. Requirements from '{}'):",
                    r.path
                )
            }),
        }
    }
}

/// Asks the model for prose and cleans up the answer.
#[derive(Debug, Clone)]
pub struct ProseRenderer {
    name: String,
    title: Option<String>,
    prompt: Prompt,
    options: GenerationOptions,
    preambles: Vec<String>,
    heading: Heading,
    needs_requirements: bool,
    /// Returned instead of an error when nothing survives cleanup.
    empty_message: Option<String>,
}

impl ProseRenderer {
    pub fn new(name: impl Into<String>, prompt: Prompt) -> Self {
        let needs_requirements = prompt.uses_requirements();
        Self {
            name: name.into(),
            title: None,
            prompt,
            options: GenerationOptions::default(),
            preambles: Vec::new(),
            heading: Heading::None,
            needs_requirements,
            empty_message: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_preambles<I, S>(mut self, preambles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preambles = preambles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_heading(mut self, heading: Heading) -> Self {
        self.heading = heading;
        self
    }

    pub fn requiring_requirements(mut self) -> Self {
        self.needs_requirements = true;
        self
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = Some(message.into());
        self
    }
}

impl Renderer for ProseRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| renderer::default_title(&self.name))
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Text
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<RendererOutput, RendererError> {
        if self.needs_requirements {
            let provided = ctx
                .request
                .requirements()
                .is_some_and(|r| !r.text.trim().is_empty());
            if !provided {
                return Err(RendererError::MissingInput("a requirements document"));
            }
        }

        let prompt = self.prompt.build(ctx.request);
        debug!(renderer = self.name.as_str(), prompt_len = prompt.len(); "Requesting prose");
        let response = renderer::generate(ctx, &prompt, &self.options)?;

        let preambles: Vec<&str> = self.preambles.iter().map(String::as_str).collect();
        let body = match prose::clean(&response, &preambles) {
            Some(body) => body,
            None => {
                return match &self.empty_message {
                    Some(message) => Ok(RendererOutput::text(message.clone())),
                    None => Err(RendererError::EmptyResponse),
                };
            }
        };

        match self.heading.render(ctx.request) {
            Some(heading) => Ok(RendererOutput::text(format!("{heading}\n\n{body}"))),
            None => Ok(RendererOutput::text(body)),
        }
    }
}

pub(crate) fn key_components() -> ProseRenderer {
    ProseRenderer::new("key_components", Prompt::Builtin(prompts::key_components))
}

pub(crate) fn metaphor_analogy() -> ProseRenderer {
    ProseRenderer::new("metaphor_analogy", Prompt::Builtin(prompts::metaphor_analogy))
        .with_title("Metaphor / Analogy")
        .with_options(GenerationOptions::new(0.7))
}

pub(crate) fn edge_cases() -> ProseRenderer {
    ProseRenderer::new("edge_cases", Prompt::Builtin(prompts::edge_cases))
        .with_preambles(["Edge Cases for Automated Testing:", "Edge Cases:"])
}

pub(crate) fn flowchart_text() -> ProseRenderer {
    ProseRenderer::new("flowchart_text", Prompt::Builtin(prompts::flowchart_text))
        .with_title("Flowchart (Text)")
        .with_options(GenerationOptions::new(0.1))
        .with_preambles(["Flowchart:"])
}

pub(crate) fn code_rap() -> ProseRenderer {
    ProseRenderer::new("code_rap", Prompt::Builtin(prompts::code_rap))
        .with_options(GenerationOptions::new(0.7))
        .with_preambles([
            "Rap Lyrics:",
            "Here's a rap about the code:",
            "Code Rap:",
            "Alright, check the mic, one two, this is how the code do:",
        ])
        .with_heading(Heading::Fixed("Code Explainer Rap:".to_string()))
        .with_empty_message("LLM did not return any rap lyrics.")
}

pub(crate) fn functional_gap_analysis() -> ProseRenderer {
    ProseRenderer::new(
        "functional_gap_analysis",
        Prompt::Builtin(prompts::functional_gap_analysis),
    )
    .with_options(GenerationOptions::new(0.2).with_context_window(8192))
    .with_preambles(["Gap Analysis Report:", "Here is the gap analysis report:"])
    .with_heading(Heading::Requirements)
    .requiring_requirements()
}
