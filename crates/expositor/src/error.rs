//! Error types for pipeline operations.

use std::io;

use thiserror::Error;

use expositor_parser::error::ParseError;

use crate::{dispatch::DispatchError, model::ModelError};

/// The main error type returned by [`crate::Expositor`].
///
/// The `Parse` variant keeps the text that was parsed so callers can render
/// diagnostics with source snippets.
#[derive(Debug, Error)]
pub enum ExpositorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("base explanation failed: {0}")]
    Model(#[from] ModelError),

    #[error("model returned an empty base explanation")]
    EmptyExplanation,
}

impl ExpositorError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
