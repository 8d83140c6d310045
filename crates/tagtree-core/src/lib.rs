//! # tagtree core
//!
//! A small recursive-descent parser for a well-formed subset of XML-like
//! markup. It builds an owned tree of elements with typed attributes.
//!
//! ## Quick Start
//!
//! ```rust
//! use tagtree_core::{AttrValue, Parser};
//!
//! let input = r#"<?xml version="1.0"?>
//! <config debug="true">
//!     <window width="800" title="Main &amp; only"/>
//! </config>"#;
//!
//! let mut parser = Parser::new();
//! let doc = parser.parse(input).unwrap();
//!
//! let config = doc.find_node("config").unwrap();
//! let window = config.find_node_child("window").unwrap();
//! assert_eq!(window.find_attribute("width").unwrap().value, AttrValue::Number(800.0));
//! assert_eq!(
//!     window.find_attribute("title").unwrap().value.as_str(),
//!     Some("Main & only")
//! );
//! ```
//!
//! ## Errors
//!
//! Malformed input fails the whole parse; no partial tree is returned:
//!
//! ```rust
//! use tagtree_core::{ParseErrorKind, Parser};
//!
//! let mut parser = Parser::new();
//! let err = parser.parse(r#"<a x="1"#).unwrap_err();
//! assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
//! assert!(parser.last_error().is_some());
//! ```
//!
//! ## Value inference
//!
//! - `ValueInference::Strict` - numbers need a digit, booleans are exact
//! - `ValueInference::Legacy` - `""`, `"-"` and `"."` count as zero, and any
//!   prefix of `true`/`false` is a boolean

use std::path::Path;

pub mod ast;
pub mod cursor;
pub mod entities;
pub mod error;
pub mod parser;
pub mod scan;
pub mod span;

pub use ast::{free, AttrValue, Attribute, Descendants, Document, Node, NodesNamed};
pub use error::{Error, ParseError, ParseErrorKind};
pub use parser::{Parser, ParserConfig, DEFAULT_MAX_DEPTH};
pub use scan::ValueInference;

/// Parse `input` with the default configuration.
pub fn parse(input: &str) -> Result<Document, ParseError> {
    Parser::new().parse(input)
}

/// Read and parse the file at `path` with the default configuration.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document, Error> {
    Parser::new().parse_file(path)
}
