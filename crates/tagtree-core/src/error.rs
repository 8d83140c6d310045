use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::span::Span;

/// Error kinds for categorizing parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input ended where a character or terminator was required
    UnexpectedEnd,
    /// An owned string could not be allocated
    AllocationFailure,
    /// Malformed tag or attribute syntax
    InvalidSyntax,
    /// Elements nested deeper than the configured limit
    NestingTooDeep,
}

/// A parse error with its location in the source.
///
/// Any parse error aborts the whole parse; no partial tree is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {}", .span.start)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,
    /// Source location where the error was detected
    pub span: Span,
    /// Error categorization
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind,
        }
    }

    /// Create an error for unexpected end of input while scanning for `expected`.
    pub fn unexpected_end(expected: &str, offset: usize) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedEnd,
            format!("unexpected end of input, expected {}", expected),
            Span::at(offset),
        )
    }

    /// Create an error for invalid syntax.
    pub fn invalid_syntax(context: &str, span: Span) -> Self {
        Self::new(
            ParseErrorKind::InvalidSyntax,
            format!("invalid syntax: {}", context),
            span,
        )
    }

    /// Create an error for a failed string allocation.
    pub fn allocation_failure(span: Span) -> Self {
        Self::new(
            ParseErrorKind::AllocationFailure,
            format!("failed to allocate {} bytes", span.len()),
            span,
        )
    }

    /// Create an error for nesting beyond `limit`.
    pub fn nesting_too_deep(limit: usize, span: Span) -> Self {
        Self::new(
            ParseErrorKind::NestingTooDeep,
            format!("elements nested deeper than {}", limit),
            span,
        )
    }

    /// Check whether this is an unexpected-end error.
    pub fn is_unexpected_end(&self) -> bool {
        self.kind == ParseErrorKind::UnexpectedEnd
    }
}

/// Errors from the file-based entry points.
#[derive(Debug, Error)]
pub enum Error {
    /// The input was read but could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The input file could not be read
    #[error("failed to read '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// The parse error, if this is one.
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            Error::FileRead { .. } => None,
        }
    }

    /// Check if the input could not be loaded at all.
    pub fn is_file_read(&self) -> bool {
        matches!(self, Error::FileRead { .. })
    }
}

/// Result type alias for the file-based entry points.
pub type Result<T> = std::result::Result<T, Error>;
