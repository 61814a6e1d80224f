//! Per-invocation render input and normalized output.

use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

/// Hint describing what a renderer normally produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Image,
    Text,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Image => write!(f, "image"),
            OutputKind::Text => write!(f, "text"),
        }
    }
}

/// Image format produced by the external engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }

    /// Recognize an image format from a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "svg" => Some(ImageFormat::Svg),
            _ => None,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| format!("unsupported image format `{s}`"))
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A single render invocation.
///
/// Constructed per request and owned by the dispatcher for its duration.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    explanation: String,
    source: String,
    renderer: String,
    provider: String,
    requirements: Option<Requirements>,
    output_base: Option<PathBuf>,
    processed_files: Vec<String>,
}

/// A requirements document supplied alongside the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirements {
    pub text: String,
    pub path: String,
}

impl RenderRequest {
    /// Create a request for `renderer` with the base explanation and the source text.
    pub fn new(
        renderer: impl Into<String>,
        explanation: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            explanation: explanation.into(),
            source: source.into(),
            renderer: renderer.into(),
            provider: "ollama".to_string(),
            ..Self::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_requirements(mut self, text: impl Into<String>, path: impl Into<String>) -> Self {
        self.requirements = Some(Requirements {
            text: text.into(),
            path: path.into(),
        });
        self
    }

    /// Precompute the output path stub instead of letting the dispatcher allocate one.
    pub fn with_output_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.output_base = Some(base.into());
        self
    }

    pub fn with_processed_files(mut self, files: Vec<String>) -> Self {
        self.processed_files = files;
        self
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn renderer(&self) -> &str {
        &self.renderer
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn requirements(&self) -> Option<&Requirements> {
        self.requirements.as_ref()
    }

    pub fn output_base(&self) -> Option<&PathBuf> {
        self.output_base.as_ref()
    }

    pub fn processed_files(&self) -> &[String] {
        &self.processed_files
    }
}

/// The only value the dispatcher hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderResult {
    /// An image written inside the output directory.
    Image { path: PathBuf, message: String },
    /// Text content, including every failure description.
    Text { content: String },
}

impl RenderResult {
    pub fn image(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RenderResult::Image {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        RenderResult::Text {
            content: content.into(),
        }
    }

    pub fn kind(&self) -> OutputKind {
        match self {
            RenderResult::Image { .. } => OutputKind::Image,
            RenderResult::Text { .. } => OutputKind::Text,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, RenderResult::Image { .. })
    }

    /// Returns the text content, if this is a text result.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RenderResult::Text { content } => Some(content),
            RenderResult::Image { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = RenderRequest::new("functional_gap_analysis", "explains", "fn main() {}")
            .with_requirements("must log in", "reqs.md")
            .with_processed_files(vec!["main.rs".to_string()]);

        assert_eq!(request.renderer(), "functional_gap_analysis");
        assert_eq!(request.provider(), "ollama");
        assert_eq!(request.requirements().map(|r| r.path.as_str()), Some("reqs.md"));
        assert!(request.output_base().is_none());
        assert_eq!(request.processed_files(), ["main.rs"]);
    }

    #[test]
    fn test_render_result_kind() {
        let image = RenderResult::image("/out/a.png", "done");
        let text = RenderResult::text("hello");

        assert_eq!(image.kind(), OutputKind::Image);
        assert!(image.as_text().is_none());
        assert_eq!(text.kind(), OutputKind::Text);
        assert_eq!(text.as_text(), Some("hello"));
    }

    #[test]
    fn test_image_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!("svg".parse::<ImageFormat>(), Ok(ImageFormat::Svg));
        assert!(ImageFormat::from_extension("gif").is_none());
    }
}
