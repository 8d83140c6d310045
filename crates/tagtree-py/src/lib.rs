//! Python bindings for the tagtree markup parser.

use std::path::PathBuf;

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyList;
use pyo3::IntoPyObjectExt;
use tagtree_core::{
    span::Span as CoreSpan, AttrValue, Attribute, Document, Error as CoreError, Node,
    ParseError as CoreParseError, Parser as CoreParser, ParserConfig, ValueInference,
    DEFAULT_MAX_DEPTH,
};

// ============================================================================
// Span
// ============================================================================

/// Source location in the input text (byte offsets).
#[pyclass(frozen, get_all, name = "Span")]
#[derive(Clone)]
pub struct PySpan {
    pub start: usize,
    pub end: usize,
}

#[pymethods]
impl PySpan {
    fn __repr__(&self) -> String {
        format!("Span({}, {})", self.start, self.end)
    }

    #[getter]
    fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

impl From<CoreSpan> for PySpan {
    fn from(s: CoreSpan) -> Self {
        PySpan {
            start: s.start,
            end: s.end,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

fn parse_error_to_py(e: CoreParseError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn error_to_py(e: CoreError) -> PyErr {
    match e {
        CoreError::Parse(p) => parse_error_to_py(p),
        e @ CoreError::FileRead { .. } => PyIOError::new_err(e.to_string()),
    }
}

// ============================================================================
// Attribute
// ============================================================================

/// A `name="value"` pair with its inferred value.
///
/// `value` is a float, a bool or a str.
#[pyclass(frozen, name = "Attribute")]
pub struct PyAttribute {
    #[pyo3(get)]
    pub name: String,
    #[pyo3(get)]
    pub value: PyObject,
    /// One of "number", "boolean" or "string".
    #[pyo3(get)]
    pub kind: String,
    #[pyo3(get)]
    pub span: PySpan,
}

#[pymethods]
impl PyAttribute {
    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        let value = self.value.bind(py).repr()?;
        Ok(format!("Attribute({:?}, {})", self.name, value))
    }
}

fn convert_attr_value(py: Python<'_>, value: AttrValue) -> PyResult<PyObject> {
    match value {
        AttrValue::Number(n) => n.into_py_any(py),
        AttrValue::Boolean(b) => b.into_py_any(py),
        AttrValue::String(s) => s.into_py_any(py),
    }
}

fn convert_attribute(py: Python<'_>, attr: Attribute) -> PyResult<Py<PyAttribute>> {
    let kind = attr.value.type_name().to_string();
    Py::new(
        py,
        PyAttribute {
            name: attr.name,
            value: convert_attr_value(py, attr.value)?,
            kind,
            span: attr.span.into(),
        },
    )
}

// ============================================================================
// Node
// ============================================================================

/// One element of the tree.
///
/// `text` is entity-decoded for leaf elements and the raw inner markup for
/// elements with children.
#[pyclass(frozen, name = "Node")]
pub struct PyNode {
    #[pyo3(get)]
    pub name: String,
    #[pyo3(get)]
    pub text: String,
    #[pyo3(get)]
    pub span: PySpan,
    #[pyo3(get)]
    pub content_span: Option<PySpan>,
    attributes: Vec<Py<PyAttribute>>,
    children: Vec<Py<PyNode>>,
}

#[pymethods]
impl PyNode {
    #[getter]
    fn attributes<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        PyList::new(py, self.attributes.iter().map(|a| a.clone_ref(py)))
    }

    #[getter]
    fn children<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        PyList::new(py, self.children.iter().map(|c| c.clone_ref(py)))
    }

    /// True when the element has no child elements.
    #[getter]
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// First direct child named `name`, or None.
    #[pyo3(text_signature = "(self, name)")]
    fn find_node_child(&self, py: Python<'_>, name: &str) -> Option<Py<PyNode>> {
        first_named(py, &self.children, name)
    }

    /// Direct children named `name`, in document order.
    #[pyo3(text_signature = "(self, name)")]
    fn children_named(&self, py: Python<'_>, name: &str) -> Vec<Py<PyNode>> {
        all_named(py, &self.children, name)
    }

    /// First attribute named `name`, or None.
    #[pyo3(text_signature = "(self, name)")]
    fn find_attribute(&self, py: Python<'_>, name: &str) -> Option<Py<PyAttribute>> {
        self.attributes
            .iter()
            .find(|a| a.get().name == name)
            .map(|a| a.clone_ref(py))
    }

    fn __len__(&self) -> usize {
        self.children.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Node({:?}, attributes={}, children={})",
            self.name,
            self.attributes.len(),
            self.children.len()
        )
    }
}

fn first_named(py: Python<'_>, nodes: &[Py<PyNode>], name: &str) -> Option<Py<PyNode>> {
    nodes
        .iter()
        .find(|n| n.get().name == name)
        .map(|n| n.clone_ref(py))
}

fn all_named(py: Python<'_>, nodes: &[Py<PyNode>], name: &str) -> Vec<Py<PyNode>> {
    nodes
        .iter()
        .filter(|n| n.get().name == name)
        .map(|n| n.clone_ref(py))
        .collect()
}

fn convert_node(py: Python<'_>, node: Node) -> PyResult<Py<PyNode>> {
    let attributes = node
        .attributes
        .into_iter()
        .map(|a| convert_attribute(py, a))
        .collect::<PyResult<Vec<_>>>()?;
    let children = convert_nodes(py, node.children)?;

    Py::new(
        py,
        PyNode {
            name: node.name,
            text: node.text,
            span: node.span.into(),
            content_span: node.content_span.map(PySpan::from),
            attributes,
            children,
        },
    )
}

fn convert_nodes(py: Python<'_>, nodes: Vec<Node>) -> PyResult<Vec<Py<PyNode>>> {
    nodes.into_iter().map(|n| convert_node(py, n)).collect()
}

// ============================================================================
// PyDocument
// ============================================================================

/// A parsed document: the top-level elements in source order.
#[pyclass(frozen, name = "Document")]
pub struct PyDocument {
    #[pyo3(get)]
    pub span: PySpan,
    node_count: usize,
    nodes: Vec<Py<PyNode>>,
}

#[pymethods]
impl PyDocument {
    #[getter]
    fn nodes<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        PyList::new(py, self.nodes.iter().map(|n| n.clone_ref(py)))
    }

    /// Number of elements at every depth.
    #[getter]
    fn node_count(&self) -> usize {
        self.node_count
    }

    /// First top-level element named `name`, or None.
    #[pyo3(text_signature = "(self, name)")]
    fn find_node(&self, py: Python<'_>, name: &str) -> Option<Py<PyNode>> {
        first_named(py, &self.nodes, name)
    }

    /// Top-level elements named `name`, in document order.
    #[pyo3(text_signature = "(self, name)")]
    fn nodes_named(&self, py: Python<'_>, name: &str) -> Vec<Py<PyNode>> {
        all_named(py, &self.nodes, name)
    }

    /// Follow a `/`-separated path of names, taking the first match each step.
    #[pyo3(text_signature = "(self, path)")]
    fn find_path(&self, py: Python<'_>, path: &str) -> Option<Py<PyNode>> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let mut node = first_named(py, &self.nodes, segments.next()?)?;
        for segment in segments {
            node = first_named(py, &node.get().children, segment)?;
        }
        Some(node)
    }

    fn __len__(&self) -> usize {
        self.nodes.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Document(nodes={}, elements={})",
            self.nodes.len(),
            self.node_count
        )
    }
}

fn convert_document(py: Python<'_>, doc: Document) -> PyResult<PyDocument> {
    let node_count = doc.node_count();
    Ok(PyDocument {
        span: doc.span.into(),
        node_count,
        nodes: convert_nodes(py, doc.nodes)?,
    })
}

// ============================================================================
// Parser
// ============================================================================

/// Markup parser.
///
/// Args:
///     legacy_values: Use the permissive number and boolean checks
///     max_depth: Deepest element nesting accepted (default 128)
#[pyclass(name = "Parser")]
pub struct PyParser {
    inner: CoreParser,
}

#[pymethods]
impl PyParser {
    #[new]
    #[pyo3(
        signature = (legacy_values=false, max_depth=DEFAULT_MAX_DEPTH),
        text_signature = "(legacy_values=False, max_depth=128)"
    )]
    fn new(legacy_values: bool, max_depth: usize) -> Self {
        let inference = if legacy_values {
            ValueInference::Legacy
        } else {
            ValueInference::Strict
        };
        PyParser {
            inner: CoreParser::with_config(ParserConfig {
                inference,
                max_depth,
            }),
        }
    }

    /// Parse a markup string. Raises ValueError on error.
    #[pyo3(text_signature = "(self, input)")]
    fn parse(&mut self, py: Python<'_>, input: &str) -> PyResult<PyDocument> {
        let doc = self.inner.parse(input).map_err(parse_error_to_py)?;
        convert_document(py, doc)
    }

    /// Read and parse a file. Raises IOError or ValueError.
    #[pyo3(text_signature = "(self, path)")]
    fn parse_file(&mut self, py: Python<'_>, path: PathBuf) -> PyResult<PyDocument> {
        let doc = self.inner.parse_file(path).map_err(error_to_py)?;
        convert_document(py, doc)
    }

    /// Message of the last failure, or None if the last call succeeded.
    #[getter]
    fn last_error(&self) -> Option<String> {
        self.inner.last_error().map(str::to_owned)
    }

    #[getter]
    fn legacy_values(&self) -> bool {
        self.inner.config().inference == ValueInference::Legacy
    }

    #[getter]
    fn max_depth(&self) -> usize {
        self.inner.config().max_depth
    }

    fn __repr__(&self) -> String {
        format!(
            "Parser(legacy_values={}, max_depth={})",
            self.legacy_values(),
            self.max_depth()
        )
    }
}

// ============================================================================
// Module functions
// ============================================================================

/// Parse a markup string with the default settings.
///
/// Args:
///     input: Document string to parse
///
/// Returns:
///     Document: Parsed document
///
/// Raises:
///     ValueError: On parse error
#[pyfunction]
#[pyo3(text_signature = "(input)")]
fn parse(py: Python<'_>, input: &str) -> PyResult<PyDocument> {
    let doc = tagtree_core::parse(input).map_err(parse_error_to_py)?;
    convert_document(py, doc)
}

/// Read and parse a file with the default settings.
///
/// Raises:
///     IOError: If the file cannot be read
///     ValueError: On parse error
#[pyfunction]
#[pyo3(text_signature = "(path)")]
fn parse_file(py: Python<'_>, path: PathBuf) -> PyResult<PyDocument> {
    let doc = tagtree_core::parse_file(path).map_err(error_to_py)?;
    convert_document(py, doc)
}

// ============================================================================
// Module
// ============================================================================

/// tagtree - small markup parser with typed attributes.
#[pymodule]
fn pytt(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySpan>()?;
    m.add_class::<PyAttribute>()?;
    m.add_class::<PyNode>()?;
    m.add_class::<PyDocument>()?;
    m.add_class::<PyParser>()?;
    m.add_function(wrap_pyfunction!(parse, m)?)?;
    m.add_function(wrap_pyfunction!(parse_file, m)?)?;
    Ok(())
}
