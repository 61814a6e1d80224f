//! Command-line argument definitions for the Expositor CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Explain source code with language-model renderers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory images are written to, overriding the configuration
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the available renderers and the ones that were skipped
    List,

    /// Explain a source file or directory with one renderer
    Explain(ExplainArgs),

    /// Draw a class notation file as a UML class diagram, without a model
    Render(RenderArgs),
}

#[derive(clap::Args, Debug)]
pub struct ExplainArgs {
    /// Source file or directory to explain
    pub source: PathBuf,

    /// Renderer to apply to the base explanation
    #[arg(short, long, default_value = "simple_summary")]
    pub renderer: String,

    /// Functional requirements document for the gap analysis
    #[arg(long)]
    pub requirements: Option<PathBuf>,

    /// Model service URL, overriding the configuration
    #[arg(long)]
    pub host: Option<String>,

    /// Model name, overriding the configuration
    #[arg(short, long)]
    pub model: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Class notation file
    pub file: PathBuf,

    /// File name stem of the image
    #[arg(long, default_value = "uml_class_diagram_output")]
    pub output_base: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}
