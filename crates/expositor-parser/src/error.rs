//! Error and diagnostic system for the Expositor parsers.
//!
//! This module provides:
//! - Error codes for documentation and searchability
//! - Labeled spans pointing into the model output being parsed
//! - Severity levels
//! - Diagnostic collector for accumulating errors and warnings
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, source
//! locations, and help text. Fatal outcomes are wrapped in [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use expositor_parser::error::{Diagnostic, ErrorCode};
//! # use expositor_parser::Span;
//!
//! let diag = Diagnostic::warning("relationship references unknown kind `realization`")
//!     .with_code(ErrorCode::E101)
//!     .with_label(Span::new(40..58), "unknown kind")
//!     .with_help("use one of: inheritance, aggregation, composition, association, dependency");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub use collector::DiagnosticCollector;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
