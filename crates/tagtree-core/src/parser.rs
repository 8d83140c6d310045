//! Recursive-descent block parser.
//!
//! The block parser scans one window of the input (the whole buffer at the
//! top level, then each element's inner content) and returns the elements
//! found directly in it, recursing into each element for its children.
//! Any error aborts the whole parse: `?` carries it out through every level
//! and the partially built vectors are dropped on the way.

use std::fs;
use std::path::Path;

use log::{debug, trace, warn};

use crate::ast::{AttrValue, Attribute, Document, Node};
use crate::cursor::Cursor;
use crate::entities;
use crate::error::{Error, ParseError, Result};
use crate::scan::{
    copy_span, is_decimal_number, is_name_byte, is_tag_name_end, span_to_bool, span_to_number,
    ValueInference,
};
use crate::span::Span;

/// Default limit on element nesting.
///
/// Each level costs a `parse_block`/`parse_element` frame pair; this depth
/// stays within a 2 MiB thread stack in unoptimized builds.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Rule for classifying attribute values.
    pub inference: ValueInference,
    /// Deepest element nesting accepted; top-level elements are at depth 1.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            inference: ValueInference::Strict,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Markup parser with configurable value inference.
///
/// The parser keeps a description of the last failure, cleared at the start
/// of every call, for callers that report errors after the fact.
#[derive(Debug, Default)]
pub struct Parser {
    config: ParserConfig,
    last_error: Option<String>,
}

impl Parser {
    /// Create a parser with the default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser from a full configuration.
    #[inline]
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            last_error: None,
        }
    }

    /// Set how attribute values are classified.
    pub fn with_inference(mut self, inference: ValueInference) -> Self {
        self.config.inference = inference;
        self
    }

    /// Set the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// The active configuration.
    #[inline]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Description of the error from the most recent call, if it failed.
    #[inline]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Parse `input` into a document.
    pub fn parse(&mut self, input: &str) -> std::result::Result<Document, ParseError> {
        self.last_error = None;

        let builder = TreeBuilder {
            input,
            config: self.config,
        };
        match builder.parse_document() {
            Ok(doc) => {
                debug!(
                    "parsed {} top-level element(s) from {} bytes",
                    doc.nodes.len(),
                    input.len()
                );
                Ok(doc)
            }
            Err(e) => {
                debug!("parse failed: {}", e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Read the file at `path` and parse it.
    ///
    /// Valid UTF-8 is parsed as is. Anything else is read as Latin-1, one
    /// char per byte, so no byte is lost.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<Document> {
        self.last_error = None;
        let path = path.as_ref();

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(source) => {
                let err = Error::FileRead {
                    path: path.to_path_buf(),
                    source,
                };
                self.last_error = Some(err.to_string());
                return Err(err);
            }
        };
        debug!("read {} bytes from {}", bytes.len(), path.display());

        let source = match String::from_utf8(bytes) {
            Ok(source) => source,
            Err(e) => {
                warn!(
                    "{} is not valid UTF-8 ({}); reading as Latin-1",
                    path.display(),
                    e.utf8_error()
                );
                e.as_bytes().iter().map(|&b| char::from(b)).collect()
            }
        };

        Ok(self.parse(&source)?)
    }
}

/// One parse over one input buffer.
struct TreeBuilder<'a> {
    input: &'a str,
    config: ParserConfig,
}

impl<'a> TreeBuilder<'a> {
    fn parse_document(&self) -> std::result::Result<Document, ParseError> {
        let span = Span::new(0, self.input.len());
        let nodes = self.parse_block(span, 0)?;
        Ok(Document { nodes, span })
    }

    /// Parse the elements directly inside `window`.
    ///
    /// Text between elements is skipped, as are declarations, comments and
    /// stray closing tags.
    fn parse_block(
        &self,
        window: Span,
        depth: usize,
    ) -> std::result::Result<Vec<Node>, ParseError> {
        let mut cursor = Cursor::with_window(self.input, window);
        let mut nodes = Vec::new();

        while let Some(lt) = cursor.find_byte(b'<') {
            cursor.seek(lt + 1);
            match cursor.peek() {
                None => return Err(ParseError::unexpected_end("tag name", cursor.pos())),
                Some(b'?') => {
                    cursor.skip_past_byte(b'>', "'>' closing declaration")?;
                }
                Some(b'!') => skip_bang(&mut cursor)?,
                Some(b'/') => {
                    trace!("skipping stray closing tag at {}", lt);
                    cursor.skip_past_byte(b'>', "'>' closing tag")?;
                }
                Some(_) => {
                    let node = self.parse_element(&mut cursor, lt, depth)?;
                    nodes.push(node);
                }
            }
        }

        Ok(nodes)
    }

    /// Parse one element whose `<` is at `lt`; the cursor is on the name.
    fn parse_element(
        &self,
        cursor: &mut Cursor<'a>,
        lt: usize,
        depth: usize,
    ) -> std::result::Result<Node, ParseError> {
        if depth >= self.config.max_depth {
            return Err(ParseError::nesting_too_deep(
                self.config.max_depth,
                Span::new(lt, lt + 1),
            ));
        }

        let name_span = cursor.take_while(|b| !is_tag_name_end(b));
        if cursor.is_eof() {
            return Err(ParseError::unexpected_end("'>' closing tag", cursor.pos()));
        }
        if name_span.is_empty() {
            return Err(ParseError::invalid_syntax(
                "empty tag name",
                Span::new(lt, cursor.pos() + 1),
            ));
        }
        let name_text = cursor.slice(name_span);
        let name = copy_span(name_text, name_span)?;
        let attributes = self.parse_attributes(cursor)?;

        if cursor.eat(b'/') {
            cursor.expect(b'>', "'>' after '/'")?;
            trace!("element <{}/> at {}", name, lt);
            return Ok(Node {
                name,
                text: String::new(),
                attributes,
                children: Vec::new(),
                span: Span::new(lt, cursor.pos()),
                content_span: None,
            });
        }
        cursor.expect(b'>', "'>' closing tag")?;

        let content_start = cursor.pos();
        let (content_end, close_end) = find_closing_tag(cursor, name_text)?;
        let content = Span::new(content_start, content_end);

        let children = self.parse_block(content, depth + 1)?;
        let raw = cursor.slice(content);
        let text = if children.is_empty() {
            entities::decode(raw, content)?
        } else {
            copy_span(raw, content)?
        };
        cursor.seek(close_end);

        trace!(
            "element <{}> at {}..{} with {} attribute(s), {} child(ren)",
            name,
            lt,
            close_end,
            attributes.len(),
            children.len()
        );

        Ok(Node {
            name,
            text,
            attributes,
            children,
            span: Span::new(lt, close_end),
            content_span: Some(content),
        })
    }

    /// Parse attributes up to the `>` or `/` that ends the opening tag.
    fn parse_attributes(
        &self,
        cursor: &mut Cursor<'a>,
    ) -> std::result::Result<Vec<Attribute>, ParseError> {
        let mut attributes = Vec::new();
        loop {
            cursor.skip_whitespace();
            match cursor.peek() {
                None => return Err(ParseError::unexpected_end("'>' closing tag", cursor.pos())),
                Some(b'>') | Some(b'/') => return Ok(attributes),
                Some(_) => attributes.push(self.parse_attribute(cursor)?),
            }
        }
    }

    /// Parse one `name="value"` pair.
    ///
    /// The name is the leading run of name bytes; everything between it and
    /// the opening quote is skipped, so `data-x="1"` is an attribute `data`.
    fn parse_attribute(&self, cursor: &mut Cursor<'a>) -> std::result::Result<Attribute, ParseError> {
        let start = cursor.pos();
        let name_span = cursor.take_while(is_name_byte);
        if name_span.is_empty() {
            return Err(ParseError::invalid_syntax(
                "expected attribute name",
                Span::new(start, start + 1),
            ));
        }

        cursor.take_while(|b| b != b'"' && b != b'\'' && b != b'>');
        let quote = cursor.bump("opening quote")?;
        if quote == b'>' {
            return Err(ParseError::invalid_syntax(
                "attribute without a quoted value",
                Span::new(start, cursor.pos()),
            ));
        }
        let value_start = cursor.pos();
        let value_end = cursor.skip_past_byte(quote, "closing quote")?;
        let value_span = Span::new(value_start, value_end);

        let name = copy_span(cursor.slice(name_span), name_span)?;
        let value = self.classify_value(cursor.slice(value_span), value_span)?;

        Ok(Attribute {
            name,
            value,
            span: Span::new(start, cursor.pos()),
        })
    }

    /// Number, then boolean, then decoded string.
    fn classify_value(&self, raw: &str, span: Span) -> std::result::Result<AttrValue, ParseError> {
        let inference = self.config.inference;
        if is_decimal_number(raw.as_bytes(), inference) {
            return Ok(AttrValue::Number(span_to_number(raw)));
        }
        if let Some(b) = span_to_bool(raw.as_bytes(), inference) {
            return Ok(AttrValue::Boolean(b));
        }
        Ok(AttrValue::String(entities::decode(raw, span)?))
    }
}

/// Skip `<!-- ... -->` or `<!...>`; the cursor is on the `!`.
///
/// The `-->` search starts right after the `!`, so `<!-->` closes itself.
fn skip_bang(cursor: &mut Cursor<'_>) -> std::result::Result<(), ParseError> {
    if cursor.starts_with(b"!--") {
        cursor.seek(cursor.pos() + 1);
        cursor.skip_past_seq(b"-->", "'-->' closing comment")?;
    } else {
        cursor.skip_past_byte(b'>', "'>' closing declaration")?;
    }
    Ok(())
}

/// Check whether the cursor is on `name` followed by a tag-name terminator.
#[inline]
fn at_tag_name(cursor: &Cursor<'_>, name: &[u8]) -> bool {
    cursor.starts_with(name) && cursor.peek_at(name.len()).is_some_and(is_tag_name_end)
}

/// Move past the `>` of an opening tag, honouring quoted attribute values.
///
/// Returns whether the tag was self-closing.
fn skip_open_tag(cursor: &mut Cursor<'_>) -> std::result::Result<bool, ParseError> {
    let mut quote = None;
    let mut prev = 0u8;
    loop {
        let b = cursor.bump("'>' closing tag")?;
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Ok(prev == b'/'),
                _ => {}
            },
        }
        prev = b;
    }
}

/// Find the `</name>` that closes the element whose content starts at the
/// cursor.
///
/// Closing tags with other names are content. Opening tags with the same
/// name nest, so they need their own closing tag first. Returns the offset
/// of the closing tag's `<` and the offset just past its `>`.
fn find_closing_tag(
    cursor: &Cursor<'_>,
    name: &str,
) -> std::result::Result<(usize, usize), ParseError> {
    let mut scan = cursor.clone();
    let name = name.as_bytes();
    let mut open = 1usize;

    loop {
        let Some(lt) = scan.find_byte(b'<') else {
            return Err(ParseError::unexpected_end(
                &format!("closing tag </{}>", String::from_utf8_lossy(name)),
                scan.end(),
            ));
        };
        scan.seek(lt + 1);

        match scan.peek() {
            Some(b'!') => skip_bang(&mut scan)?,
            Some(b'?') => {
                scan.skip_past_byte(b'>', "'>' closing declaration")?;
            }
            Some(b'/') => {
                scan.seek(lt + 2);
                if !at_tag_name(&scan, name) {
                    continue;
                }
                scan.seek(lt + 2 + name.len());
                scan.skip_whitespace();
                scan.expect(b'>', "'>' closing tag")?;
                open -= 1;
                if open == 0 {
                    return Ok((lt, scan.pos()));
                }
            }
            Some(_) if at_tag_name(&scan, name) => {
                if !skip_open_tag(&mut scan)? {
                    open += 1;
                }
            }
            _ => {}
        }
    }
}
