//! Handing sub-language text to an external rendering engine.
//!
//! [`RenderInvoker::render`] never panics and never loses the input: every
//! failure is a [`RenderFailure`] that carries the original sub-language text,
//! so callers can fall back to showing the source instead of an image.

mod graphviz;
mod mermaid;
pub(crate) mod process;

use std::{
    fmt, io,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{debug, warn};
use thiserror::Error;

use expositor_core::{capability::Capability, request::ImageFormat};

use crate::config::EngineConfig;

/// The external engines an invoker can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Graph-layout engine, called through the in-process binding.
    Graphviz,
    /// Diagram command-line engine, spawned as a subprocess.
    MermaidCli,
}

impl Engine {
    pub fn capability(self) -> Capability {
        match self {
            Engine::Graphviz => Capability::Graphviz,
            Engine::MermaidCli => Capability::MermaidCli,
        }
    }

    /// Fence language tag for the engine's input language.
    pub fn language(self) -> &'static str {
        match self {
            Engine::Graphviz => "dot",
            Engine::MermaidCli => "mermaid",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Graphviz => write!(f, "Graphviz"),
            Engine::MermaidCli => write!(f, "Mermaid CLI"),
        }
    }
}

/// Why an engine did not produce an image.
#[derive(Debug, Error)]
pub enum FailureReason {
    #[error("`{program}` was not found")]
    EngineMissing { program: String },

    #[error("process exited with {}\nstdout: {stdout}\nstderr: {stderr}", code_text(.code))]
    NonZeroExit {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("process did not finish within {0:?} and was killed")]
    TimedOut(Duration),

    #[error("engine reported success but `{0}` was not written")]
    MissingOutput(PathBuf),

    #[error("layout failed: {0}")]
    Layout(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn code_text(code: &Option<i32>) -> String {
    code.map_or_else(|| "no exit code".to_string(), |c| format!("return code {c}"))
}

/// A failed render, carrying the sub-language text it was given.
#[derive(Debug, Error)]
#[error("{engine} rendering failed: {reason}")]
pub struct RenderFailure {
    engine: Engine,
    source_text: String,
    #[source]
    reason: FailureReason,
}

impl RenderFailure {
    pub fn new(engine: Engine, source_text: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            engine,
            source_text: source_text.into(),
            reason,
        }
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// The sub-language text exactly as it was passed to [`RenderInvoker::render`].
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn reason(&self) -> &FailureReason {
        &self.reason
    }

    pub fn is_engine_missing(&self) -> bool {
        matches!(self.reason, FailureReason::EngineMissing { .. })
    }
}

/// Runs external engines with a fixed output format and engine settings.
#[derive(Debug, Clone)]
pub struct RenderInvoker {
    format: ImageFormat,
    mermaid_command: String,
    background: String,
    timeout: Option<Duration>,
}

impl Default for RenderInvoker {
    fn default() -> Self {
        Self::new(&EngineConfig::default(), ImageFormat::default())
    }
}

impl RenderInvoker {
    pub fn new(config: &EngineConfig, format: ImageFormat) -> Self {
        Self {
            format,
            mermaid_command: config.mermaid_command().to_string(),
            background: config.background().to_string(),
            timeout: config.timeout(),
        }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// How long an external process may run before it is killed.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Render `source` with `engine` to `output_base` plus the format extension.
    ///
    /// The parent directory of the output is created if needed.
    pub fn render(
        &self,
        source: &str,
        engine: Engine,
        output_base: &Path,
    ) -> Result<PathBuf, RenderFailure> {
        let output = output_path(output_base, self.format);
        debug!(
            engine = engine.to_string(),
            output = output.display().to_string();
            "Invoking rendering engine"
        );

        let result = prepare_parent(&output).and_then(|()| match engine {
            Engine::Graphviz => graphviz::render(source, &output, self.format),
            Engine::MermaidCli => mermaid::render(
                source,
                &output,
                &self.mermaid_command,
                &self.background,
                self.timeout,
            ),
        });

        match result {
            Ok(()) if output.is_file() => Ok(output),
            Ok(()) => Err(RenderFailure::new(
                engine,
                source,
                FailureReason::MissingOutput(output),
            )),
            Err(reason) => {
                warn!(engine = engine.to_string(), reason = reason.to_string(); "Rendering failed");
                Err(RenderFailure::new(engine, source, reason))
            }
        }
    }
}

/// `base` with `.png` or `.svg` appended.
pub fn output_path(base: &Path, format: ImageFormat) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(".");
    path.push(format.extension());
    PathBuf::from(path)
}

fn prepare_parent(output: &Path) -> Result<(), FailureReason> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(FailureReason::Io)
        }
        _ => Ok(()),
    }
}
