//! Locating a sub-language block inside free-form model output.
//!
//! Model output is not guaranteed to follow the requested format. It may wrap
//! the block in a fence with or without a language tag, add prose before or
//! after it, or omit the fence entirely. [`extract`] tries a fixed sequence of
//! strategies, each available on its own:
//!
//! 1. [`from_fence`]: the first fenced block whose interior starts with the marker.
//! 2. [`from_prefix`]: the whole (trimmed) text, if it starts with the marker.
//! 3. [`from_line_scan`]: everything from the first line starting with the marker.
//!
//! Matching against the marker ignores ASCII case. When every strategy fails,
//! the error carries an excerpt of the raw text.

use std::fmt;

use log::debug;

use crate::{
    class_notation,
    error::{Diagnostic, ErrorCode, ParseError},
    span::Span,
};

const FENCE: &str = "```";
const EXCERPT_CHARS: usize = 100;

/// The keyword(s) an extracted block must start with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    keywords: Vec<String>,
    matcher: Matcher,
    balanced_braces: bool,
}

/// How a line is tested against a [`Marker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Matcher {
    /// Literal keyword prefix, ignoring ASCII case.
    Keywords,
    /// A class notation header, emphasis allowed anywhere around the keyword.
    ClassNotation,
}

impl Marker {
    /// A marker with a single keyword.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self::any_of([keyword.into()])
    }

    /// A marker satisfied by any of `keywords`.
    pub fn any_of<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.trim().is_empty())
                .collect(),
            matcher: Matcher::Keywords,
            balanced_braces: false,
        }
    }

    /// Truncate the extracted text after the brace that closes the first `{`.
    pub fn with_balanced_braces(mut self) -> Self {
        self.balanced_braces = true;
        self
    }

    /// Graphviz directed graphs.
    pub fn digraph() -> Self {
        Self::new("digraph").with_balanced_braces()
    }

    /// The structured class notation.
    ///
    /// Matches the same `CLASS:` and `RELATIONSHIP:` headers the class
    /// notation parser accepts, such as `**CLASS: User**` or `__class__:`.
    pub fn class_notation() -> Self {
        Self {
            matcher: Matcher::ClassNotation,
            ..Self::any_of(["CLASS:", "RELATIONSHIP:"])
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns `true` if `text` starts with one of the keywords, ignoring ASCII case.
    pub fn matches_start(&self, text: &str) -> bool {
        match self.matcher {
            Matcher::Keywords => self.keywords.iter().any(|kw| starts_with_ignore_case(text, kw)),
            Matcher::ClassNotation => class_notation::is_block_start(text),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.keywords.iter().map(|k| format!("`{k}`")).collect();
        f.write_str(&quoted.join(" or "))
    }
}

/// Which strategy located the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Fenced,
    Prefix,
    LineScan,
}

/// A successfully extracted block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub strategy: Strategy,
}

/// Extract the block starting with `marker` from `raw`.
pub fn extract(raw: &str, marker: &Marker) -> Result<Extracted, ParseError> {
    if raw.trim().is_empty() {
        return Err(Diagnostic::error("model output is empty")
            .with_code(ErrorCode::E003)
            .into());
    }

    let found = from_fence(raw, marker)
        .map(|text| (text, Strategy::Fenced))
        .or_else(|| from_prefix(raw, marker).map(|text| (text, Strategy::Prefix)))
        .or_else(|| from_line_scan(raw, marker).map(|text| (text, Strategy::LineScan)));

    let Some((text, strategy)) = found else {
        return Err(not_found(raw, marker));
    };

    let text = if marker.balanced_braces {
        truncate_balanced(text)
    } else {
        text
    };

    debug!(strategy:? = strategy, bytes = text.len(); "Extracted sub-language block");

    Ok(Extracted {
        text: text.to_string(),
        strategy,
    })
}

/// Re-check that extracted text starts with `marker`.
pub fn validate(text: &str, marker: &Marker) -> Result<(), ParseError> {
    if marker.matches_start(text.trim_start()) {
        return Ok(());
    }
    Err(Diagnostic::error(format!(
        "extracted text does not start with {marker}"
    ))
    .with_code(ErrorCode::E002)
    .with_label(Span::new(0..text.len()), "extracted here")
    .with_help(format!("text begins with: {}", excerpt(text)))
    .into())
}

/// First fenced block whose trimmed interior starts with `marker`.
///
/// The opening fence may carry a language tag. An unterminated fence runs to
/// the end of the text.
pub fn from_fence<'a>(raw: &'a str, marker: &Marker) -> Option<&'a str> {
    let lines = line_offsets(raw);
    let mut i = 0;

    while i < lines.len() {
        let (_, line) = lines[i];
        if !line.trim_start().starts_with(FENCE) {
            i += 1;
            continue;
        }

        let body_start = lines.get(i + 1).map_or(raw.len(), |(offset, _)| *offset);
        let close = lines[i + 1..]
            .iter()
            .position(|(_, l)| l.trim() == FENCE)
            .map(|p| i + 1 + p);
        let body_end = close.map_or(raw.len(), |c| lines[c].0);

        let body = raw[body_start..body_end].trim();
        if marker.matches_start(body) {
            return Some(body);
        }

        match close {
            Some(c) => i = c + 1,
            None => break,
        }
    }

    None
}

/// The trimmed text itself, if it starts with `marker`.
pub fn from_prefix<'a>(raw: &'a str, marker: &Marker) -> Option<&'a str> {
    let trimmed = raw.trim();
    marker.matches_start(trimmed).then_some(trimmed)
}

/// Everything from the first line starting with `marker`.
///
/// A closing fence line after the match ends the block.
pub fn from_line_scan<'a>(raw: &'a str, marker: &Marker) -> Option<&'a str> {
    let lines = line_offsets(raw);
    let start = lines
        .iter()
        .position(|(_, line)| marker.matches_start(line.trim_start()))?;

    let (offset, line) = lines[start];
    let begin = offset + (line.len() - line.trim_start().len());
    let end = lines[start + 1..]
        .iter()
        .find(|(_, l)| l.trim() == FENCE)
        .map_or(raw.len(), |(o, _)| *o);

    Some(raw[begin..end].trim_end())
}

/// Cut `text` right after the `}` matching its first `{`.
///
/// Braces inside double-quoted strings are ignored. Text without a balanced
/// pair is returned unchanged.
pub fn truncate_balanced(text: &str) -> &str {
    let mut depth = 0usize;
    let mut opened = false;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => {
                depth += 1;
                opened = true;
            }
            '}' if opened => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[..=i];
                }
            }
            _ => {}
        }
    }

    text
}

/// The first characters of `raw`, for diagnostics.
pub fn excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    if trimmed.chars().count() > EXCERPT_CHARS {
        out.push_str("...");
    }
    out
}

fn not_found(raw: &str, marker: &Marker) -> ParseError {
    Diagnostic::error(format!("no block starting with {marker} found"))
        .with_code(ErrorCode::E001)
        .with_label(Span::new(0..raw.len()), "model output")
        .with_help(format!("output begins with: {}", excerpt(raw)))
        .into()
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Each line with the byte offset it starts at. Line terminators are excluded.
fn line_offsets(raw: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    raw.split_inclusive('\n')
        .map(|segment| {
            let start = offset;
            offset += segment.len();
            (start, segment.trim_end_matches(['\n', '\r']))
        })
        .collect()
}
