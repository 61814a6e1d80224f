//! Parsers for model output.
//!
//! This crate turns free-form language-model output into something the
//! rendering pipeline can use:
//!
//! - [`extract`]: locates a DOT, Mermaid or class-notation block inside
//!   surrounding prose and fences
//! - [`class_notation`]: parses the structured class notation into a
//!   [`ClassDiagram`](expositor_core::class_model::ClassDiagram)
//! - [`prose`]: strips fences and preambles from prose answers
//!
//! Failures are reported as [`error::ParseError`]s made of
//! [`error::Diagnostic`]s.
//!
//! # Example
//!
//! ```
//! use expositor_parser::{class_notation, extract::{self, Marker}};
//!
//! let raw = "Sure!\n```\nCLASS: Order\nMETHODS:\n+total(): f64\n```";
//! let block = extract::extract(raw, &Marker::class_notation()).unwrap();
//! let parsed = class_notation::parse(&block.text).unwrap();
//!
//! assert_eq!(parsed.diagram.class("Order").unwrap().methods(), ["+total(): f64"]);
//! ```

pub mod class_notation;
pub mod error;
pub mod extract;
pub mod prose;
mod span;

pub use span::Span;
