//! CLI logic for Expositor.
//!
//! `list` shows what discovery found, `explain` runs one renderer against a
//! source tree through a language model, and `render` draws a class notation
//! file offline.

pub mod error_adapter;

mod args;
mod config;
mod ollama;
mod source;

pub use args::{Args, Command, ExplainArgs, RenderArgs};
pub use source::{SourceError, SourceTree, read_source};

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{info, warn};
use thiserror::Error;

use expositor::{
    Expositor, ExpositorError,
    capability::{CapabilitySet, Probe},
    config::{AppConfig, ModelConfig, OutputConfig},
    request::{RenderRequest, RenderResult},
};

use config::ConfigError;
use ollama::OllamaModel;

/// Renderer that compares the source against a requirements document.
const GAP_ANALYSIS_RENDERER: &str = "functional_gap_analysis";

/// Looked up next to the source when `--requirements` is not given.
const DEFAULT_REQUIREMENTS_FILE: &str = "functional-requirements.txt";

const OLLAMA_PROVIDER: &str = "ollama";

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Expositor(#[from] ExpositorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("unsupported model provider `{0}`")]
    UnsupportedProvider(String),

    #[error("failed to encode the result as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run the Expositor CLI application.
///
/// # Errors
///
/// Returns [`Error`] for configuration, source reading, model and class
/// notation parse failures. Renderer failures are not errors; they are
/// printed as the text result.
pub fn run(args: &Args) -> Result<(), Error> {
    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(dir) = &args.output_dir {
        let format = app_config.output().format();
        app_config = app_config.with_output(OutputConfig::new(dir, format));
    }

    match &args.command {
        Command::List => list(app_config),
        Command::Explain(explain_args) => explain(app_config, explain_args),
        Command::Render(render_args) => render(app_config, render_args),
    }
}

fn probe(config: &AppConfig) -> CapabilitySet {
    let capabilities = Probe::new()
        .mermaid_executable(config.engines().mermaid_command())
        .run();
    info!(capabilities = capabilities.to_string(); "Probed rendering engines");
    capabilities
}

fn list(config: AppConfig) -> Result<(), Error> {
    let expositor = Expositor::new(config);
    let discovery = expositor.discover(&probe(expositor.config()));

    println!("Available renderers:");
    for descriptor in discovery.registry.iter() {
        let requires = descriptor
            .requirements()
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {:<30} {:<32} {:<6} {}",
            descriptor.name(),
            descriptor.title(),
            descriptor.output_kind(),
            if requires.is_empty() { "-" } else { &requires }
        );
    }

    let report = &discovery.report;
    if !report.skipped.is_empty() {
        println!("\nSkipped (missing engines):");
        for skipped in &report.skipped {
            let missing = skipped
                .missing
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(", ");
            println!("  {:<30} needs {missing} ({})", skipped.name, skipped.origin);
        }
    }
    if !report.rejected.is_empty() {
        println!("\nRejected manifests:");
        for rejected in &report.rejected {
            println!("  {}: {}", rejected.path.display(), rejected.error);
        }
    }
    Ok(())
}

fn explain(config: AppConfig, args: &ExplainArgs) -> Result<(), Error> {
    let model_config = config.model();
    let model_config = ModelConfig::new(
        model_config.provider(),
        args.host.as_deref().unwrap_or(model_config.host()),
        args.model.as_deref().unwrap_or(model_config.name()),
    );
    if model_config.provider() != OLLAMA_PROVIDER {
        return Err(Error::UnsupportedProvider(model_config.provider().to_string()));
    }
    let config = config.with_model(model_config);

    let expositor = Expositor::new(config);
    let discovery = expositor.discover(&probe(expositor.config()));

    let tree = read_source(&args.source)?;
    info!(
        source = args.source.display().to_string(),
        files = tree.files.len(),
        renderer = args.renderer.as_str();
        "Explaining source"
    );

    let model_config = expositor.config().model();
    let model = Arc::new(OllamaModel::new(model_config.host(), model_config.name()));
    let explanation = expositor.explain_source(model.as_ref(), &tree.content)?;

    let processed_files = tree
        .files
        .iter()
        .map(|file| relative_name(&args.source, file))
        .collect();
    let mut request = RenderRequest::new(&args.renderer, explanation, tree.content)
        .with_provider(model_config.provider())
        .with_processed_files(processed_files);

    if let Some(path) = requirements_path(args) {
        match source::read_document(&path) {
            Ok(text) => {
                request = request.with_requirements(text, path.display().to_string());
            }
            Err(err) => {
                warn!(path = path.display().to_string(), err = err.to_string(); "Requirements document unavailable");
            }
        }
    }

    let dispatcher = expositor.dispatcher(discovery.registry, model)?;
    let result = dispatcher.run(&request);
    print_result(&result, args.json)
}

fn render(config: AppConfig, args: &RenderArgs) -> Result<(), Error> {
    let notation = fs::read_to_string(&args.file).map_err(|source| Error::Io {
        path: args.file.clone(),
        source,
    })?;

    let expositor = Expositor::new(config);
    let result = expositor.render_notation(&notation, &args.output_base)?;
    print_result(&result, args.json)
}

/// The explicit `--requirements` path, or the default document next to the
/// source for the gap analysis.
fn requirements_path(args: &ExplainArgs) -> Option<PathBuf> {
    if let Some(path) = &args.requirements {
        return Some(path.clone());
    }
    if args.renderer != GAP_ANALYSIS_RENDERER {
        return None;
    }
    let dir = if args.source.is_dir() {
        args.source.as_path()
    } else {
        args.source.parent().unwrap_or_else(|| Path::new("."))
    };
    Some(dir.join(DEFAULT_REQUIREMENTS_FILE))
}

fn relative_name(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let relative = if relative.as_os_str().is_empty() {
        file
    } else {
        relative
    };
    relative.display().to_string()
}

fn print_result(result: &RenderResult, json: bool) -> Result<(), Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    match result {
        RenderResult::Image { message, .. } => println!("{message}"),
        RenderResult::Text { content } => println!("{content}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explain_args(source: &Path, renderer: &str) -> ExplainArgs {
        ExplainArgs {
            source: source.to_path_buf(),
            renderer: renderer.to_string(),
            requirements: None,
            host: None,
            model: None,
            json: false,
        }
    }

    #[test]
    fn test_requirements_default_only_for_gap_analysis() {
        let dir = tempfile::tempdir().unwrap();

        let args = explain_args(dir.path(), GAP_ANALYSIS_RENDERER);
        assert_eq!(
            requirements_path(&args),
            Some(dir.path().join(DEFAULT_REQUIREMENTS_FILE))
        );

        let args = explain_args(dir.path(), "simple_summary");
        assert_eq!(requirements_path(&args), None);

        let mut args = explain_args(dir.path(), "simple_summary");
        args.requirements = Some(PathBuf::from("reqs.md"));
        assert_eq!(requirements_path(&args), Some(PathBuf::from("reqs.md")));
    }

    #[test]
    fn test_requirements_default_next_to_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.py");
        fs::write(&file, "print(1)").unwrap();

        let args = explain_args(&file, GAP_ANALYSIS_RENDERER);

        assert_eq!(
            requirements_path(&args),
            Some(dir.path().join(DEFAULT_REQUIREMENTS_FILE))
        );
    }

    #[test]
    fn test_relative_name() {
        assert_eq!(
            relative_name(Path::new("/src"), Path::new("/src/pkg/mod.rs")),
            Path::new("pkg").join("mod.rs").display().to_string()
        );
        assert_eq!(
            relative_name(Path::new("/src/app.py"), Path::new("/src/app.py")),
            "/src/app.py"
        );
    }

    #[test]
    fn test_unsupported_provider() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default().with_model(ModelConfig::new(
            "gemini",
            "https://example.invalid",
            "gemini-pro",
        ));

        let err = explain(config, &explain_args(dir.path(), "simple_summary")).unwrap_err();

        assert!(matches!(err, Error::UnsupportedProvider(p) if p == "gemini"));
    }
}
