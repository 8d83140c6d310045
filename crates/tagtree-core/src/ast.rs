//! Tree types produced by the parser.
//!
//! The tree is fully owned: every node owns its name, text, attributes and
//! children, so a `Document` can outlive the buffer it was parsed from.
//! Every element and attribute records the `Span` it was parsed from.
//!
//! # Leaf and branch text
//!
//! A node without children is a *leaf*; its `text` is the entity-decoded
//! inner content. A node with children is a *branch*; its `text` is the raw,
//! undecoded inner content, including the children's markup:
//!
//! ```rust
//! let doc = tagtree_core::parse("<a>x &amp; <b>1 &lt; 2</b></a>").unwrap();
//! let a = doc.find_node("a").unwrap();
//! assert_eq!(a.text, "x &amp; <b>1 &lt; 2</b>");
//! assert_eq!(a.children[0].text, "1 < 2");
//! ```
//!
//! Text sitting beside child elements is only reachable through the raw
//! branch text.

use std::iter::FusedIterator;

use crate::span::Span;

/// A parsed document: the top-level elements in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Top-level elements in document order.
    pub nodes: Vec<Node>,
    /// Source span covering the entire input.
    pub span: Span,
}

/// A single element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    /// Tag name.
    pub name: String,
    /// Decoded text for leaves, raw inner markup for branches.
    pub text: String,
    /// Attributes in declaration order. Names may repeat.
    pub attributes: Vec<Attribute>,
    /// Child elements in document order.
    pub children: Vec<Node>,
    /// Source span from the opening `<` to the closing `>`.
    pub span: Span,
    /// Inner content span; `None` for self-closing elements.
    pub content_span: Option<Span>,
}

/// A `name="value"` pair with an inferred value type.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Typed value.
    pub value: AttrValue,
    /// Source span of the whole `name="value"`.
    pub span: Span,
}

/// Typed attribute values.
///
/// Values are classified in a fixed order:
/// - Decimal numbers → `Number`
/// - `true`/`false` → `Boolean`
/// - Anything else → `String` (entity-decoded)
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// 64-bit floating point.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
    /// String value with entities decoded.
    String(String),
}

impl AttrValue {
    /// The number, if this is a `Number`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The flag, if this is a `Boolean`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The decoded text, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name: `number`, `boolean` or `string`.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Number(_) => "number",
            AttrValue::Boolean(_) => "boolean",
            AttrValue::String(_) => "string",
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::Boolean(b) => write!(f, "{}", b),
            AttrValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl Document {
    /// First top-level element named `name`.
    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Top-level elements named `name`, in document order.
    ///
    /// ```rust
    /// let doc = tagtree_core::parse("<a/><b/><a x=\"1\"/>").unwrap();
    /// assert_eq!(doc.nodes_named("a").count(), 2);
    /// ```
    pub fn nodes_named<'a>(&'a self, name: &'a str) -> NodesNamed<'a> {
        NodesNamed::new(&self.nodes, name)
    }

    /// Follow a `/`-separated path of element names from the top level.
    ///
    /// Each segment picks the first matching element. Empty segments are
    /// ignored, so `"/a/b"` and `"a/b"` are the same path.
    pub fn find_path(&self, path: &str) -> Option<&Node> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let mut node = self.find_node(segments.next()?)?;
        for segment in segments {
            node = node.find_node_child(segment)?;
        }
        Some(node)
    }

    /// Total number of elements at every depth.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(|n| 1 + n.descendants().count()).sum()
    }

    /// Release the document and its whole tree.
    ///
    /// Taking `self` by value means a document can only be freed once.
    pub fn free(self) {
        drop(self);
    }
}

impl Node {
    /// Check if this node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Check if this node was written as `<name/>`.
    #[inline]
    pub fn is_self_closing(&self) -> bool {
        self.content_span.is_none()
    }

    /// First direct child named `name`.
    pub fn find_node_child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|n| n.name == name)
    }

    /// Direct children named `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> NodesNamed<'a> {
        NodesNamed::new(&self.children, name)
    }

    /// First attribute named `name`.
    pub fn find_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Pre-order walk over every node below this one.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

/// Iterator over sibling nodes with a given name.
///
/// Created by [`Document::nodes_named`] and [`Node::children_named`]. It only
/// moves forward; ask for a new one to start over.
#[derive(Debug, Clone)]
pub struct NodesNamed<'a> {
    nodes: &'a [Node],
    name: &'a str,
    index: usize,
}

impl<'a> NodesNamed<'a> {
    fn new(nodes: &'a [Node], name: &'a str) -> Self {
        Self {
            nodes,
            name,
            index: 0,
        }
    }
}

impl<'a> Iterator for NodesNamed<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        while let Some(node) = self.nodes.get(self.index) {
            self.index += 1;
            if node.name == self.name {
                return Some(node);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.nodes.len().saturating_sub(self.index)))
    }
}

impl FusedIterator for NodesNamed<'_> {}

/// Pre-order iterator over a node's descendants.
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Release `document` if there is one.
///
/// Kept for callers that hold an optional document; `None` is a no-op.
pub fn free(document: Option<Document>) {
    if let Some(doc) = document {
        doc.free();
    }
}
