//! Error codes for the Expositor diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Sub-language extraction
//! - `E1xx` - Structured class notation

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Extraction Errors (E0xx)
    // =========================================================================
    /// No sub-language block found.
    ///
    /// None of the fenced-block, prefix, or line-scan strategies located text
    /// starting with the expected marker.
    E001,

    /// Marker mismatch.
    ///
    /// Extracted text does not start with the expected marker.
    E002,

    /// Empty input.
    ///
    /// The model returned nothing but whitespace.
    E003,

    // =========================================================================
    // Class Notation Errors (E1xx)
    // =========================================================================
    /// No class declarations.
    ///
    /// Not a single `CLASS:` header was recognized, so no diagram is possible.
    E100,

    /// Unknown relationship kind.
    ///
    /// A `RELATIONSHIP:` line used a `type=` value outside the supported set.
    E101,

    /// Malformed relationship.
    ///
    /// A line starting with `RELATIONSHIP:` did not follow
    /// `Source -> Target [type=kind, label="text"]`.
    E102,

    /// Section header outside a class.
    ///
    /// An `ATTRIBUTES:` or `METHODS:` header appeared before any class header
    /// or after a separator.
    E103,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "no sub-language block found",
            ErrorCode::E002 => "marker mismatch",
            ErrorCode::E003 => "empty input",
            ErrorCode::E100 => "no class declarations",
            ErrorCode::E101 => "unknown relationship kind",
            ErrorCode::E102 => "malformed relationship",
            ErrorCode::E103 => "section header outside a class",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E103.to_string(), "E103");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "no sub-language block found");
        assert_eq!(ErrorCode::E100.description(), "no class declarations");
    }
}
