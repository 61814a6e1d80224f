//! Configuration types for the rendering pipeline.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file; every section and field is optional.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration.
//! - [`OutputConfig`] - Where images go and in which format.
//! - [`EngineConfig`] - How external rendering engines are invoked.
//! - [`ModelConfig`] - Which language model to talk to.
//! - [`PluginConfig`] - Where renderer manifests are discovered.
//!
//! # Example
//!
//! ```
//! # use expositor::config::AppConfig;
//! let config: AppConfig = toml::from_str(r#"
//!     [engines]
//!     timeout_secs = 5
//! "#).unwrap();
//!
//! assert_eq!(config.engines().timeout().map(|t| t.as_secs()), Some(5));
//! assert_eq!(config.engines().mermaid_command(), "mmdc");
//! ```

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use expositor_core::request::ImageFormat;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    output: OutputConfig,

    #[serde(default)]
    engines: EngineConfig,

    #[serde(default)]
    model: ModelConfig,

    #[serde(default)]
    plugins: PluginConfig,
}

impl AppConfig {
    pub fn new(
        output: OutputConfig,
        engines: EngineConfig,
        model: ModelConfig,
        plugins: PluginConfig,
    ) -> Self {
        Self {
            output,
            engines,
            model,
            plugins,
        }
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    pub fn engines(&self) -> &EngineConfig {
        &self.engines
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    pub fn plugins(&self) -> &PluginConfig {
        &self.plugins
    }

    /// Replace the output section.
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// Replace the model section.
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    /// Replace the plugins section.
    pub fn with_plugins(mut self, plugins: PluginConfig) -> Self {
        self.plugins = plugins;
        self
    }
}

/// Image output settings.
///
/// `directory` is the sandbox root: every image a renderer produces must
/// resolve to a path inside it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    directory: PathBuf,
    format: ImageFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("static/generated_images"),
            format: ImageFormat::default(),
        }
    }
}

impl OutputConfig {
    pub fn new(directory: impl Into<PathBuf>, format: ImageFormat) -> Self {
        Self {
            directory: directory.into(),
            format,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// External engine invocation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    mermaid_command: String,
    background: String,
    /// Seconds before a diagram CLI process is killed; `0` waits forever.
    timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mermaid_command: "mmdc".to_string(),
            background: "white".to_string(),
            timeout_secs: 60,
        }
    }
}

impl EngineConfig {
    pub fn new(
        mermaid_command: impl Into<String>,
        background: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            mermaid_command: mermaid_command.into(),
            background: background.into(),
            timeout_secs,
        }
    }

    pub fn mermaid_command(&self) -> &str {
        &self.mermaid_command
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    /// Returns `None` when the timeout is disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Language-model connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    provider: String,
    host: String,
    name: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            host: "http://localhost:11434".to_string(),
            name: "llama3".to_string(),
        }
    }
}

impl ModelConfig {
    pub fn new(
        provider: impl Into<String>,
        host: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            host: host.into(),
            name: name.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Renderer manifest discovery settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    directory: PathBuf,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("plugins"),
        }
    }
}

impl PluginConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}
