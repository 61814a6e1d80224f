//! Declarative renderer manifests.
//!
//! Every `*.toml` file in the plugin directory describes one extra renderer.
//! A manifest reuses one of the built-in renderer shapes:
//!
//! - `prose`: a prompt template answered with text.
//! - `dot`: a prompt template answered with a `digraph`, rendered by Graphviz.
//! - `mermaid`: a prompt template answered with Mermaid, rendered by the CLI.
//! - `command`: an external program that receives the explanation on stdin.
//!
//! # Example
//!
//! ```toml
//! name = "state_machine"
//! kind = "mermaid"
//! markers = ["stateDiagram-v2", "stateDiagram"]
//! temperature = 0.1
//! prompt = """
//! Draw the states of this code as a Mermaid state diagram.
//! {explanation}
//! {source}
//! """
//! ```
//!
//! Prompt templates may use the `{explanation}`, `{source}` and
//! `{requirements}` placeholders.

use std::{
    io::Write as _,
    path::Path,
    process::{Command, Stdio},
    sync::Arc,
    thread,
};

use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use expositor_core::{
    capability::{Capability, UnknownCapability},
    request::OutputKind,
};
use expositor_parser::extract::Marker;

use super::{
    diagram::DiagramRenderer,
    prompts::Prompt,
    prose::ProseRenderer,
};
use crate::{
    dispatch,
    invoke::process,
    model::GenerationOptions,
    renderer::{self, RenderContext, Renderer, RendererError, RendererOutput},
};

/// Why a manifest could not be turned into a renderer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid manifest: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("`{kind}` renderers need a `{field}` entry")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error(transparent)]
    UnknownCapability(#[from] UnknownCapability),

    #[error("invalid renderer name `{0}`: use lowercase letters, digits, `_` or `-`")]
    InvalidName(String),

    #[error("invalid output_base `{0}`: expected a plain file name stem")]
    InvalidOutputBase(String),

    #[error("a renderer named `{0}` is already registered")]
    Duplicate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ManifestKind {
    Prose,
    Dot,
    Mermaid,
    Command,
}

impl ManifestKind {
    fn as_str(self) -> &'static str {
        match self {
            ManifestKind::Prose => "prose",
            ManifestKind::Dot => "dot",
            ManifestKind::Mermaid => "mermaid",
            ManifestKind::Command => "command",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    name: String,
    title: Option<String>,
    kind: ManifestKind,
    prompt: Option<String>,
    marker: Option<String>,
    #[serde(default)]
    markers: Vec<String>,
    temperature: Option<f32>,
    context_window: Option<u32>,
    #[serde(default)]
    preambles: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
    output_base: Option<String>,
    output: Option<OutputKind>,
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
}

impl Manifest {
    fn options(&self) -> GenerationOptions {
        let options = self
            .temperature
            .map_or_else(GenerationOptions::default, GenerationOptions::new);
        match self.context_window {
            Some(tokens) => options.with_context_window(tokens),
            None => options,
        }
    }

    fn prompt(&self) -> Result<Prompt, LoadError> {
        self.prompt
            .clone()
            .filter(|p| !p.trim().is_empty())
            .map(Prompt::Template)
            .ok_or(LoadError::MissingField {
                kind: self.kind.as_str(),
                field: "prompt",
            })
    }

    fn marker(&self) -> Result<Marker, LoadError> {
        let mut keywords = self.markers.clone();
        if let Some(marker) = &self.marker {
            keywords.insert(0, marker.clone());
        }
        let marker = Marker::any_of(keywords);
        if marker.keywords().is_empty() {
            return Err(LoadError::MissingField {
                kind: self.kind.as_str(),
                field: "marker",
            });
        }
        Ok(marker)
    }

    fn requirements(&self) -> Result<Vec<Capability>, LoadError> {
        let mut requirements = Vec::new();
        for name in &self.requires {
            let capability: Capability = name.parse()?;
            if !requirements.contains(&capability) {
                requirements.push(capability);
            }
        }
        Ok(requirements)
    }
}

/// Load the manifest at `path`.
pub fn load(path: &Path) -> Result<Arc<dyn Renderer>, LoadError> {
    let text = std::fs::read_to_string(path)?;
    let renderer = parse(&text)?;
    debug!(path = path.display().to_string(), renderer = renderer.name(); "Loaded renderer manifest");
    Ok(renderer)
}

/// Build a renderer from manifest text.
pub fn parse(text: &str) -> Result<Arc<dyn Renderer>, LoadError> {
    let manifest: Manifest = toml::from_str(text)?;
    if !is_valid_name(&manifest.name) {
        return Err(LoadError::InvalidName(manifest.name));
    }
    if let Some(base) = &manifest.output_base {
        if !dispatch::is_valid_base(base) {
            return Err(LoadError::InvalidOutputBase(base.clone()));
        }
    }
    let mut requirements = manifest.requirements()?;

    let renderer: Arc<dyn Renderer> = match manifest.kind {
        ManifestKind::Prose => {
            let mut prose = ProseRenderer::new(manifest.name.clone(), manifest.prompt()?)
                .with_options(manifest.options())
                .with_preambles(manifest.preambles.clone());
            if let Some(title) = &manifest.title {
                prose = prose.with_title(title.clone());
            }
            Arc::new(prose)
        }
        ManifestKind::Dot | ManifestKind::Mermaid => {
            let prompt = manifest.prompt()?;
            let mut diagram = if manifest.kind == ManifestKind::Dot {
                if !requirements.contains(&Capability::Graphviz) {
                    requirements.insert(0, Capability::Graphviz);
                }
                let marker = if manifest.marker.is_none() && manifest.markers.is_empty() {
                    Marker::digraph()
                } else {
                    manifest.marker()?.with_balanced_braces()
                };
                DiagramRenderer::dot(manifest.name.clone(), prompt).with_marker(marker)
            } else {
                DiagramRenderer::mermaid(manifest.name.clone(), manifest.marker()?, prompt)
            };
            diagram = diagram
                .with_options(manifest.options())
                .with_requirements(requirements);
            if let Some(title) = &manifest.title {
                diagram = diagram.with_title(title.clone());
            }
            if let Some(base) = &manifest.output_base {
                diagram = diagram.with_output_base(base.clone());
            }
            Arc::new(diagram)
        }
        ManifestKind::Command => {
            let program = manifest
                .command
                .clone()
                .filter(|c| !c.trim().is_empty())
                .ok_or(LoadError::MissingField {
                    kind: "command",
                    field: "command",
                })?;
            Arc::new(CommandRenderer {
                output_base: manifest
                    .output_base
                    .clone()
                    .unwrap_or_else(|| format!("{}_output", manifest.name)),
                name: manifest.name,
                title: manifest.title,
                program,
                args: manifest.args,
                output_kind: manifest.output.unwrap_or(OutputKind::Text),
                requirements,
            })
        }
    };
    Ok(renderer)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Runs an external program and interprets what it prints.
///
/// The explanation is written to the program's stdin. Arguments may contain
/// `{output_base}` (the allocated output stub, image renderers only) and
/// `{renderer}`. Standard output is read with
/// [`RendererOutput::from_message`]. The program is killed after the engine
/// timeout.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    name: String,
    title: Option<String>,
    program: String,
    args: Vec<String>,
    output_kind: OutputKind,
    requirements: Vec<Capability>,
    output_base: String,
}

impl CommandRenderer {
    fn expand_args(&self, output_base: Option<&Path>) -> Vec<String> {
        let output_base = output_base
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{output_base}", &output_base)
                    .replace("{renderer}", &self.name)
            })
            .collect()
    }
}

impl Renderer for CommandRenderer {
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
        self.output_kind
    }

    fn output_base(&self) -> &str {
        &self.output_base
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<RendererOutput, RendererError> {
        let args = self.expand_args(ctx.output_base);
        debug!(program = self.program.as_str(), args:? = args; "Running renderer command");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RendererError::Command(format!("{}: {e}", self.program)))?;

        let writer = child.stdin.take().map(|mut stdin| {
            let input = ctx.request.explanation().to_string();
            thread::spawn(move || {
                // A program that ignores its input may close stdin early.
                let _ = stdin.write_all(input.as_bytes());
            })
        });

        let stdout = process::drain(child.stdout.take());
        let stderr = process::drain(child.stderr.take());

        let timeout = ctx.invoker.timeout();
        let status = process::wait_with_deadline(&mut child, timeout)
            .map_err(|e| RendererError::Command(format!("{}: {e}", self.program)))?;
        let Some(status) = status else {
            warn!(program = self.program.as_str(), timeout:? = timeout; "Renderer command killed");
            return Err(RendererError::Command(format!(
                "{} timed out after {}s",
                self.program,
                timeout.unwrap_or_default().as_secs_f32()
            )));
        };
        if let Some(writer) = writer {
            let _ = writer.join();
        }

        if !status.success() {
            return Err(RendererError::Command(format!(
                "{} exited with {status}: {}",
                self.program,
                process::collect(stderr)
            )));
        }

        Ok(RendererOutput::from_message(&process::collect(stdout)))
    }
}
