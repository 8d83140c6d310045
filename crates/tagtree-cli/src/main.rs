//! tagtree CLI - Parse, validate, and query markup documents
//!
//! Usage:
//!   ttcli [OPTIONS] [COMMAND] <FILE>
//!
//! Commands:
//!   parse     Parse and display document structure (default)
//!   validate  Check document for errors
//!   stats     Show document statistics
//!   query     Print the elements at a `/`-separated path

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser as ClapParser, Subcommand};
use log::{debug, LevelFilter};
use serde::Serialize;
use tagtree_core::{
    span::Span, AttrValue, Attribute, Document, Node, Parser, ParserConfig, ValueInference,
    DEFAULT_MAX_DEPTH,
};

/// ttcli - markup document parser, validator and query tool
#[derive(ClapParser, Debug)]
#[command(
    name = "ttcli",
    version,
    about = "Parse, validate, and query markup documents",
    subcommand_negates_reqs = true,
    after_help = "Examples:\n  \
                  ttcli config.xml                  Parse and summarize a file\n  \
                  ttcli -v config.xml               Print the full element tree\n  \
                  ttcli -j config.xml               Output the tree as JSON\n  \
                  ttcli validate config.xml         Validate without output\n  \
                  ttcli stats config.xml            Show document statistics\n  \
                  ttcli query config/window a.xml   Print every config/window element"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Input file (parsed with the default command)
    #[arg(value_name = "FILE", required = true)]
    file: Option<PathBuf>,

    /// Show the full element tree
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Output in JSON format
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Use the permissive number and boolean checks
    #[arg(long = "legacy-values", global = true)]
    legacy_values: bool,

    /// Deepest element nesting accepted
    #[arg(long = "max-depth", value_name = "N", default_value_t = DEFAULT_MAX_DEPTH, global = true)]
    max_depth: usize,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(short = 'l', long = "loglevel", default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Parse and display document structure
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Check document for errors without output
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Show document statistics
    Stats {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the elements at a `/`-separated path of names
    Query {
        #[arg(value_name = "PATH")]
        path: String,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    /// The command to run, with `parse` standing in when none was given.
    fn command(&self) -> Option<Command> {
        match (&self.command, &self.file) {
            (Some(cmd), _) => Some(cmd.clone()),
            (None, Some(file)) => Some(Command::Parse { file: file.clone() }),
            (None, None) => None,
        }
    }

    fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            inference: if self.legacy_values {
                ValueInference::Legacy
            } else {
                ValueInference::Strict
            },
            max_depth: self.max_depth,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

/// Set up logging based on the log level argument.
fn setup_logging(level: &str) {
    let filter = match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Warn,
    };

    env_logger::Builder::new()
        .filter_level(filter)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let command = cli
        .command()
        .ok_or_else(|| "no input file specified".to_string())?;
    let config = cli.parser_config();
    debug!("running {:?} with {:?}", command, config);

    let mut parser = Parser::with_config(config);

    match command {
        Command::Parse { file } => cmd_parse(&mut parser, &file, cli),
        Command::Validate { file } => cmd_validate(&mut parser, &file, cli),
        Command::Stats { file } => cmd_stats(&mut parser, &file, cli),
        Command::Query { path, file } => cmd_query(&mut parser, &file, &path, cli),
    }
}

fn load(parser: &mut Parser, file: &Path) -> Result<Document, String> {
    parser.parse_file(file).map_err(|e| e.to_string())
}

// =============================================================================
// Parse Command
// =============================================================================

fn cmd_parse(parser: &mut Parser, file: &Path, cli: &Cli) -> Result<(), String> {
    let doc = load(parser, file)?;

    if cli.json {
        print_json(&convert_document(&doc))
    } else {
        if cli.verbose {
            print_document_verbose(&doc);
        } else {
            print_document_summary(&doc);
        }
        Ok(())
    }
}

// =============================================================================
// Validate Command
// =============================================================================

fn cmd_validate(parser: &mut Parser, file: &Path, cli: &Cli) -> Result<(), String> {
    match parser.parse_file(file) {
        Ok(doc) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({"valid": true, "elements": doc.node_count()})
                );
            } else {
                println!("Valid: {} element(s)", doc.node_count());
            }
            Ok(())
        }
        Err(e) => {
            if cli.json {
                let error = match e.as_parse_error() {
                    Some(p) => serde_json::json!({
                        "kind": format!("{:?}", p.kind),
                        "message": p.message,
                        "span": JsonSpan::from(p.span),
                    }),
                    None => serde_json::json!({"kind": "FileRead", "message": e.to_string()}),
                };
                println!("{}", serde_json::json!({"valid": false, "error": error}));
            } else {
                eprintln!("Invalid: {}", e);
            }
            Err("document is not valid".to_string())
        }
    }
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(parser: &mut Parser, file: &Path, cli: &Cli) -> Result<(), String> {
    let doc = load(parser, file)?;
    let stats = DocumentStats::from_document(&doc);

    if cli.json {
        return print_json(&stats);
    }

    println!("Document Statistics");
    println!("-------------------");
    println!("Bytes:          {}", stats.bytes);
    println!("Top-level:      {}", stats.top_level);
    println!();
    println!("Elements:");
    println!("  Total:          {}", stats.elements);
    println!("  Leaves:         {}", stats.leaves);
    println!("  Branches:       {}", stats.branches);
    println!("  Self-closing:   {}", stats.self_closing);
    println!("  Max depth:      {}", stats.max_depth);
    println!();
    println!("Attributes:");
    println!("  Total:          {}", stats.attributes);
    println!("  Numbers:        {}", stats.numbers);
    println!("  Booleans:       {}", stats.booleans);
    println!("  Strings:        {}", stats.strings);

    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
struct DocumentStats {
    bytes: usize,
    top_level: usize,
    elements: usize,
    leaves: usize,
    branches: usize,
    self_closing: usize,
    max_depth: usize,
    attributes: usize,
    numbers: usize,
    booleans: usize,
    strings: usize,
}

impl DocumentStats {
    fn from_document(doc: &Document) -> Self {
        let mut stats = Self {
            bytes: doc.span.len(),
            top_level: doc.nodes.len(),
            ..Self::default()
        };
        stats.count_nodes(&doc.nodes, 1);
        stats
    }

    fn count_nodes(&mut self, nodes: &[Node], depth: usize) {
        for node in nodes {
            self.elements += 1;
            self.max_depth = self.max_depth.max(depth);
            if node.is_self_closing() {
                self.self_closing += 1;
            }
            if node.is_leaf() {
                self.leaves += 1;
            } else {
                self.branches += 1;
            }
            for attr in &node.attributes {
                self.attributes += 1;
                match attr.value {
                    AttrValue::Number(_) => self.numbers += 1,
                    AttrValue::Boolean(_) => self.booleans += 1,
                    AttrValue::String(_) => self.strings += 1,
                }
            }
            self.count_nodes(&node.children, depth + 1);
        }
    }
}

// =============================================================================
// Query Command
// =============================================================================

fn cmd_query(parser: &mut Parser, file: &Path, path: &str, cli: &Cli) -> Result<(), String> {
    let doc = load(parser, file)?;
    let matches = query_path(&doc, path);
    debug!("query '{}' matched {} element(s)", path, matches.len());

    if cli.json {
        let nodes: Vec<JsonNode> = matches.into_iter().map(convert_node).collect();
        return print_json(&nodes);
    }

    if matches.is_empty() {
        return Err(format!("no elements match '{}'", path));
    }
    for node in matches {
        if cli.verbose {
            print_node_verbose(node, 0);
        } else {
            println!("{}", describe_node(node));
            if node.is_leaf() && !node.text.is_empty() {
                println!("  {}", preview(&node.text, 60));
            }
        }
    }
    Ok(())
}

/// Every element reached by `path`, following all same-named siblings at
/// each step.
fn query_path<'a>(doc: &'a Document, path: &'a str) -> Vec<&'a Node> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let Some(first) = segments.next() else {
        return Vec::new();
    };

    let mut current: Vec<&Node> = doc.nodes_named(first).collect();
    for segment in segments {
        current = current
            .into_iter()
            .flat_map(|n| n.children_named(segment))
            .collect();
    }
    current
}

// =============================================================================
// JSON Output
// =============================================================================

#[derive(Serialize)]
struct JsonDocument<'a> {
    span: JsonSpan,
    nodes: Vec<JsonNode<'a>>,
}

#[derive(Serialize)]
struct JsonNode<'a> {
    name: &'a str,
    text: &'a str,
    span: JsonSpan,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<JsonAttribute<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<JsonNode<'a>>,
}

#[derive(Serialize)]
struct JsonAttribute<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    value: serde_json::Value,
}

#[derive(Serialize)]
struct JsonSpan {
    start: usize,
    end: usize,
}

impl From<Span> for JsonSpan {
    fn from(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

fn convert_document(doc: &Document) -> JsonDocument<'_> {
    JsonDocument {
        span: doc.span.into(),
        nodes: doc.nodes.iter().map(convert_node).collect(),
    }
}

fn convert_node(node: &Node) -> JsonNode<'_> {
    JsonNode {
        name: &node.name,
        text: &node.text,
        span: node.span.into(),
        attributes: node.attributes.iter().map(convert_attribute).collect(),
        children: node.children.iter().map(convert_node).collect(),
    }
}

fn convert_attribute(attr: &Attribute) -> JsonAttribute<'_> {
    JsonAttribute {
        name: &attr.name,
        kind: attr.value.type_name(),
        value: convert_attr_value(&attr.value),
    }
}

fn convert_attr_value(value: &AttrValue) -> serde_json::Value {
    match value {
        AttrValue::Number(n) => serde_json::json!(*n),
        AttrValue::Boolean(b) => serde_json::Value::Bool(*b),
        AttrValue::String(s) => serde_json::Value::String(s.clone()),
    }
}

// =============================================================================
// Text Output
// =============================================================================

fn print_document_summary(doc: &Document) {
    println!("Elements: {} ({} top-level)", doc.node_count(), doc.nodes.len());
    for (i, node) in doc.nodes.iter().enumerate() {
        println!("  [{}] {}", i + 1, describe_node(node));
        for child in &node.children {
            println!("      {}", describe_node(child));
        }
    }
}

fn print_document_verbose(doc: &Document) {
    println!("=== Element Tree ===");
    println!();
    println!("Span: {}..{}", doc.span.start, doc.span.end);

    for (i, node) in doc.nodes.iter().enumerate() {
        println!();
        println!("[{}]", i + 1);
        print_node_verbose(node, 1);
    }
}

fn describe_node(node: &Node) -> String {
    let mut out = format!("<{}", node.name);
    for attr in &node.attributes {
        out.push(' ');
        out.push_str(&format_attribute(attr));
    }
    if node.is_self_closing() {
        out.push_str("/>");
    } else if node.is_leaf() {
        out.push('>');
    } else {
        out.push_str(&format!("> ({} children)", node.children.len()));
    }
    out
}

fn print_node_verbose(node: &Node, indent: usize) {
    let prefix = "  ".repeat(indent);

    println!(
        "{}{} @ {}..{}",
        prefix,
        describe_node(node),
        node.span.start,
        node.span.end
    );
    if node.is_leaf() {
        if !node.text.is_empty() {
            println!("{}  Text: {}", prefix, preview(&node.text, 60));
        }
    } else {
        for child in &node.children {
            print_node_verbose(child, indent + 1);
        }
    }
}

fn format_attribute(attr: &Attribute) -> String {
    match &attr.value {
        AttrValue::String(s) => format!("{}=\"{}\"", attr.name, s),
        value => format!("{}={}", attr.name, value),
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let shown: String = text.chars().take(max_chars).collect();
    let ellipsis = if text.chars().count() > max_chars {
        "..."
    } else {
        ""
    };
    format!("{}{}", shown.replace('\n', "\\n"), ellipsis)
}
