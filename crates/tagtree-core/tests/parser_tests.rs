//! Integration tests for the tagtree parser

use std::fs;
use std::path::PathBuf;

use tagtree_core::{
    free, AttrValue, Error, ParseErrorKind, Parser, ValueInference, DEFAULT_MAX_DEPTH,
};

fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "tagtree-{}-{}-{}",
        std::process::id(),
        name,
        contents.len()
    ));
    fs::write(&path, contents).unwrap();
    path
}

// ============================================================================
// Leaf and Branch Tests
// ============================================================================

#[test]
fn test_parse_leaf_text() {
    let mut parser = Parser::new();
    let doc = parser.parse("<a>hello</a>").unwrap();

    assert_eq!(doc.nodes.len(), 1);
    let a = &doc.nodes[0];
    assert_eq!(a.name, "a");
    assert_eq!(a.text, "hello");
    assert!(a.attributes.is_empty());
    assert!(a.children.is_empty());
    assert!(a.is_leaf());
}

#[test]
fn test_leaf_text_is_decoded() {
    let mut parser = Parser::new();
    let doc = parser.parse("<a>1 &lt; 2 &amp;&amp; 2 &gt; 0</a>").unwrap();

    assert_eq!(doc.nodes[0].text, "1 < 2 && 2 > 0");
}

#[test]
fn test_self_closing_and_empty_element() {
    let mut parser = Parser::new();

    let doc = parser.parse("<a/>").unwrap();
    assert_eq!(doc.nodes[0].name, "a");
    assert!(doc.nodes[0].children.is_empty());
    assert_eq!(doc.nodes[0].text, "");
    assert!(doc.nodes[0].is_self_closing());

    let doc = parser.parse("<a></a>").unwrap();
    assert_eq!(doc.nodes[0].name, "a");
    assert!(doc.nodes[0].children.is_empty());
    assert_eq!(doc.nodes[0].text, "");
    assert!(!doc.nodes[0].is_self_closing());
}

#[test]
fn test_self_closing_with_space() {
    let mut parser = Parser::new();
    let doc = parser.parse("<a x=\"1\" />").unwrap();

    assert_eq!(doc.nodes[0].attributes.len(), 1);
    assert!(doc.nodes[0].is_self_closing());
}

#[test]
fn test_parse_nested_children() {
    let mut parser = Parser::new();
    let doc = parser.parse("<a><b>1</b><c>2</c></a>").unwrap();

    let a = &doc.nodes[0];
    assert_eq!(a.children.len(), 2);
    assert_eq!(a.children[0].name, "b");
    assert_eq!(a.children[0].text, "1");
    assert_eq!(a.children[1].name, "c");
    assert_eq!(a.children[1].text, "2");
    assert_eq!(a.text, "<b>1</b><c>2</c>");
}

#[test]
fn test_branch_text_stays_raw() {
    let mut parser = Parser::new();
    let doc = parser.parse("<a>x &amp; y<b>&lt;</b></a>").unwrap();

    let a = &doc.nodes[0];
    assert_eq!(a.text, "x &amp; y<b>&lt;</b>");
    assert_eq!(a.children[0].text, "<");
}

#[test]
fn test_branch_text_keeps_whitespace() {
    let input = "<root>\n  <item id=\"1\"/>\n  <item id=\"2\"/>\n</root>";
    let mut parser = Parser::new();
    let doc = parser.parse(input).unwrap();

    let root = &doc.nodes[0];
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.text, "\n  <item id=\"1\"/>\n  <item id=\"2\"/>\n");
}

#[test]
fn test_same_name_nesting() {
    let mut parser = Parser::new();
    let doc = parser.parse("<a><a>x</a></a>").unwrap();

    assert_eq!(doc.nodes.len(), 1);
    let outer = &doc.nodes[0];
    assert_eq!(outer.name, "a");
    assert_eq!(outer.children.len(), 1);
    assert_eq!(outer.children[0].name, "a");
    assert_eq!(outer.children[0].text, "x");
}

#[test]
fn test_same_name_self_closing_children() {
    let mut parser = Parser::new();
    let doc = parser.parse("<a><a/><a k=\"/\"/></a>").unwrap();

    assert_eq!(doc.nodes.len(), 1);
    assert_eq!(doc.nodes[0].children.len(), 2);
}

#[test]
fn test_unrelated_closing_tag_is_content() {
    let mut parser = Parser::new();
    let doc = parser.parse("<a>x</b>y</a>").unwrap();

    let a = &doc.nodes[0];
    assert!(a.children.is_empty());
    assert_eq!(a.text, "x</b>y");
}

#[test]
fn test_closing_tag_with_trailing_space() {
    let mut parser = Parser::new();
    let doc = parser.parse("<a>x</a >").unwrap();

    assert_eq!(doc.nodes[0].text, "x");
}

#[test]
fn test_stray_text_between_elements_is_skipped() {
    let mut parser = Parser::new();
    let doc = parser.parse("hello <a>1</a> world <b/> !").unwrap();

    assert_eq!(doc.nodes.len(), 2);
    assert_eq!(doc.nodes[0].name, "a");
    assert_eq!(doc.nodes[1].name, "b");
}

#[test]
fn test_multibyte_text() {
    let mut parser = Parser::new();
    let doc = parser.parse("<p>h\u{e9}llo &amp; w\u{f6}rld</p>").unwrap();

    assert_eq!(doc.nodes[0].text, "h\u{e9}llo & w\u{f6}rld");
}

#[test]
fn test_tag_name_runs_to_terminator() {
    let mut parser = Parser::new();
    let doc = parser.parse("<ns:item-x>v</ns:item-x>").unwrap();

    assert_eq!(doc.nodes[0].name, "ns:item-x");
    assert_eq!(doc.nodes[0].text, "v");
}

// ============================================================================
// Comment and Declaration Tests
// ============================================================================

#[test]
fn test_comments_and_declarations_are_invisible() {
    let mut parser = Parser::new();
    let doc = parser
        .parse("<?xml version=\"1.0\"?><!-- note --><a/>")
        .unwrap();

    assert_eq!(doc.nodes.len(), 1);
    assert_eq!(doc.nodes[0].name, "a");
}

#[test]
fn test_doctype_is_skipped() {
    let mut parser = Parser::new();
    let doc = parser.parse("<!DOCTYPE note>\n<note>hi</note>").unwrap();

    assert_eq!(doc.nodes.len(), 1);
    assert_eq!(doc.nodes[0].text, "hi");
}

#[test]
fn test_overlapping_comment_terminator() {
    let mut parser = Parser::new();
    let doc = parser.parse("<!--><a/>").unwrap();

    assert_eq!(doc.nodes.len(), 1);
}

#[test]
fn test_closing_tag_inside_comment_is_ignored() {
    let mut parser = Parser::new();
    let doc = parser.parse("<a><!-- </a> --><b/></a>").unwrap();

    let a = &doc.nodes[0];
    assert_eq!(a.children.len(), 1);
    assert_eq!(a.children[0].name, "b");
}

// ============================================================================
// Attribute Tests
// ============================================================================

#[test]
fn test_attribute_type_inference() {
    let mut parser = Parser::new();
    let doc = parser
        .parse(r#"<a x="42" y="-3.5" z="true" w="false" s="hi"/>"#)
        .unwrap();

    let attrs = &doc.nodes[0].attributes;
    let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["x", "y", "z", "w", "s"]);
    assert_eq!(attrs[0].value, AttrValue::Number(42.0));
    assert_eq!(attrs[1].value, AttrValue::Number(-3.5));
    assert_eq!(attrs[2].value, AttrValue::Boolean(true));
    assert_eq!(attrs[3].value, AttrValue::Boolean(false));
    assert_eq!(attrs[4].value, AttrValue::String("hi".to_string()));
}

#[test]
fn test_string_attributes_are_decoded() {
    let mut parser = Parser::new();
    let doc = parser
        .parse(r#"<a s="a &amp; b" q='say "hi"' v="1.2.3"/>"#)
        .unwrap();

    let a = &doc.nodes[0];
    assert_eq!(a.find_attribute("s").unwrap().value.as_str(), Some("a & b"));
    assert_eq!(a.find_attribute("q").unwrap().value.as_str(), Some("say \"hi\""));
    assert_eq!(a.find_attribute("v").unwrap().value.as_str(), Some("1.2.3"));
}

#[test]
fn test_attribute_value_may_contain_angle_bracket() {
    let mut parser = Parser::new();
    let doc = parser.parse(r#"<a t="x>y">z</a>"#).unwrap();

    let a = &doc.nodes[0];
    assert_eq!(a.find_attribute("t").unwrap().value.as_str(), Some("x>y"));
    assert_eq!(a.text, "z");
}

#[test]
fn test_duplicate_attributes_are_kept() {
    let mut parser = Parser::new();
    let doc = parser.parse(r#"<a k="1" k="two"/>"#).unwrap();

    let a = &doc.nodes[0];
    assert_eq!(a.attributes.len(), 2);
    assert_eq!(a.find_attribute("k").unwrap().value, AttrValue::Number(1.0));
}

#[test]
fn test_attribute_whitespace_around_equals() {
    let mut parser = Parser::new();
    let doc = parser.parse("<a\n  k = \"v\"\n  n=\"2\">t</a>").unwrap();

    let a = &doc.nodes[0];
    assert_eq!(a.attributes.len(), 2);
    assert_eq!(a.find_attribute("k").unwrap().value.as_str(), Some("v"));
}

#[test]
fn test_attribute_name_is_leading_name_run() {
    let mut parser = Parser::new();
    let doc = parser.parse(r#"<a data-x="1" xml:lang="en"/>"#).unwrap();

    let a = &doc.nodes[0];
    assert_eq!(a.attributes.len(), 2);
    assert_eq!(a.attributes[0].name, "data");
    assert_eq!(a.attributes[0].value, AttrValue::Number(1.0));
    assert_eq!(a.attributes[1].name, "xml");
    assert_eq!(a.attributes[1].value.as_str(), Some("en"));
}

#[test]
fn test_attribute_skips_to_opening_quote() {
    let mut parser = Parser::new();
    let doc = parser.parse(r#"<a k:= 'v' n "2">t</a>"#).unwrap();

    let a = &doc.nodes[0];
    assert_eq!(a.find_attribute("k").unwrap().value.as_str(), Some("v"));
    assert_eq!(a.find_attribute("n").unwrap().value, AttrValue::Number(2.0));
    assert_eq!(a.text, "t");

    let err = parser.parse("<a data-x").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
}

#[test]
fn test_attr_value_accessors() {
    let doc = tagtree_core::parse(r#"<a n="1.5" b="false" s="x"/>"#).unwrap();
    let attrs = &doc.nodes[0].attributes;

    assert_eq!(attrs[0].value.as_number(), Some(1.5));
    assert_eq!(attrs[0].value.as_bool(), None);
    assert_eq!(attrs[1].value.as_bool(), Some(false));
    assert_eq!(attrs[1].value.as_str(), None);
    assert_eq!(attrs[2].value.as_str(), Some("x"));
    assert_eq!(attrs[2].value.as_number(), None);
}

#[test]
fn test_strict_inference_rejects_digitless_numbers() {
    let mut parser = Parser::new();
    let doc = parser.parse(r#"<a e="" t="t" m="-"/>"#).unwrap();

    let a = &doc.nodes[0];
    assert_eq!(a.attributes[0].value, AttrValue::String(String::new()));
    assert_eq!(a.attributes[1].value, AttrValue::String("t".to_string()));
    assert_eq!(a.attributes[2].value, AttrValue::String("-".to_string()));
}

#[test]
fn test_legacy_inference() {
    let mut parser = Parser::new().with_inference(ValueInference::Legacy);
    let doc = parser.parse(r#"<a e="" t="t" m="-" f="fal"/>"#).unwrap();

    let a = &doc.nodes[0];
    assert_eq!(a.attributes[0].value, AttrValue::Number(0.0));
    assert_eq!(a.attributes[1].value, AttrValue::Boolean(true));
    assert_eq!(a.attributes[2].value, AttrValue::Number(0.0));
    assert_eq!(a.attributes[3].value, AttrValue::Boolean(false));
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_unterminated_attribute_value() {
    let mut parser = Parser::new();
    let err = parser.parse(r#"<a x="1"#).unwrap_err();

    assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
    assert!(parser.last_error().is_some());
}

#[test]
fn test_unexpected_end_cases() {
    let inputs = [
        "<",
        "<a",
        "<a x=\"1\"",
        "<a x=",
        "<a>",
        "<a><b>x</b>",
        "<a>x</a",
        "<!-- never closed",
        "<?xml version=\"1.0\"",
        "<a/",
    ];
    for input in inputs {
        let mut parser = Parser::new();
        let err = parser.parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd, "input: {:?}", input);
    }
}

#[test]
fn test_error_inside_child_aborts_whole_parse() {
    let mut parser = Parser::new();
    let err = parser.parse(r#"<a><b>ok</b><c y="2></c></a>"#).unwrap_err();

    assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
}

#[test]
fn test_invalid_syntax_cases() {
    let inputs = ["<a x=1/>", "<a checked/>", "< a/>", "<a -x=\"1\"/>", "<a/ >"];
    for input in inputs {
        let mut parser = Parser::new();
        let err = parser.parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidSyntax, "input: {:?}", input);
    }
}

#[test]
fn test_nesting_limit() {
    let mut parser = Parser::new().with_max_depth(2);
    assert!(parser.parse("<a><b/></a>").is_ok());

    let err = parser.parse("<a><b><c/></b></a>").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::NestingTooDeep);
}

fn nested(depth: usize) -> String {
    format!("{}x{}", "<a>".repeat(depth), "</a>".repeat(depth))
}

#[test]
fn test_default_nesting_limit_fits_small_stack() {
    let handle = std::thread::Builder::new()
        .stack_size(2 << 20)
        .spawn(|| {
            let mut parser = Parser::new();
            let doc = parser.parse(&nested(DEFAULT_MAX_DEPTH)).unwrap();
            let depth = 1 + doc.nodes[0].descendants().count();

            let err = parser.parse(&nested(DEFAULT_MAX_DEPTH + 1)).unwrap_err();
            (depth, err.kind)
        })
        .unwrap();

    let (depth, kind) = handle.join().unwrap();
    assert_eq!(depth, DEFAULT_MAX_DEPTH);
    assert_eq!(kind, ParseErrorKind::NestingTooDeep);
}

#[test]
fn test_last_error_is_cleared() {
    let mut parser = Parser::new();
    assert!(parser.parse("<a").is_err());
    let message = parser.last_error().unwrap();
    assert!(message.contains("unexpected end of input"));

    assert!(parser.parse("<a/>").is_ok());
    assert!(parser.last_error().is_none());
}

#[test]
fn test_error_display_has_offset() {
    let err = tagtree_core::parse("<a>x").unwrap_err();
    assert!(err.to_string().ends_with("at byte 4"), "{}", err);
}

// ============================================================================
// Span Tests
// ============================================================================

#[test]
fn test_spans_slice_back_to_source() {
    let input = r#"<r><a x="1">t</a></r>"#;
    let doc = tagtree_core::parse(input).unwrap();

    let r = &doc.nodes[0];
    assert_eq!(r.span.slice(input), input);
    let a = &r.children[0];
    assert_eq!(a.span.slice(input), r#"<a x="1">t</a>"#);
    assert_eq!(a.content_span.unwrap().slice(input), "t");
    assert_eq!(a.attributes[0].span.slice(input), r#"x="1""#);
    assert_eq!(doc.span.len(), input.len());
}

// ============================================================================
// Lookup Tests
// ============================================================================

#[test]
fn test_find_node_and_children() {
    let doc = tagtree_core::parse("<r><a>1</a><b>2</b><a>3</a></r><s/>").unwrap();

    let r = doc.find_node("r").unwrap();
    assert_eq!(r.find_node_child("a").unwrap().text, "1");
    assert_eq!(r.find_node_child("b").unwrap().text, "2");
    assert!(r.find_node_child("s").is_none());
    assert!(doc.find_node("a").is_none());
    assert!(doc.find_node("R").is_none());
    assert!(doc.find_node("s").is_some());
}

#[test]
fn test_find_attribute_missing() {
    let doc = tagtree_core::parse(r#"<a k="v"/>"#).unwrap();
    assert!(doc.nodes[0].find_attribute("K").is_none());
    assert!(doc.nodes[0].find_attribute("missing").is_none());
}

#[test]
fn test_find_path() {
    let doc = tagtree_core::parse("<r><a><b>deep</b></a></r>").unwrap();

    assert_eq!(doc.find_path("r/a/b").unwrap().text, "deep");
    assert_eq!(doc.find_path("/r/a/b").unwrap().text, "deep");
    assert!(doc.find_path("r/b").is_none());
    assert!(doc.find_path("").is_none());
}

#[test]
fn test_iterate_matching_names() {
    let doc = tagtree_core::parse(r#"<a i="1"/><b/><a i="2"/>"#).unwrap();

    let ids: Vec<f64> = doc
        .nodes_named("a")
        .filter_map(|n| n.find_attribute("i")?.value.as_number())
        .collect();
    assert_eq!(ids, [1.0, 2.0]);

    let mut iter = doc.nodes_named("a");
    assert!(iter.next().is_some());
    assert!(iter.next().is_some());
    assert!(iter.next().is_none());
    assert!(iter.next().is_none());

    // A new iterator starts over
    assert_eq!(doc.nodes_named("a").count(), 2);
    assert_eq!(doc.nodes_named("zzz").count(), 0);
}

#[test]
fn test_iterate_matching_children() {
    let doc = tagtree_core::parse("<list><item>1</item><sep/><item>2</item></list>").unwrap();

    let list = doc.find_node("list").unwrap();
    let texts: Vec<&str> = list
        .children_named("item")
        .map(|n| n.text.as_str())
        .collect();
    assert_eq!(texts, ["1", "2"]);
}

#[test]
fn test_descendants_and_counts() {
    let doc = tagtree_core::parse("<a><b><c/></b><d/></a><e/>").unwrap();

    let names: Vec<&str> = doc.nodes[0]
        .descendants()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(names, ["b", "c", "d"]);
    assert_eq!(doc.node_count(), 5);
}

#[test]
fn test_free() {
    let doc = tagtree_core::parse("<a><b/></a>").unwrap();
    doc.free();

    free(None);
    free(Some(tagtree_core::parse("<a/>").unwrap()));
}

// ============================================================================
// File Tests
// ============================================================================

#[test]
fn test_parse_file() {
    let path = temp_file("ok.xml", b"<?xml version=\"1.0\"?>\n<cfg on=\"true\"/>\n");
    let doc = tagtree_core::parse_file(&path).unwrap();
    fs::remove_file(&path).ok();

    let cfg = doc.find_node("cfg").unwrap();
    assert_eq!(cfg.find_attribute("on").unwrap().value, AttrValue::Boolean(true));
}

#[test]
fn test_parse_file_missing() {
    let mut parser = Parser::new();
    let err = parser
        .parse_file("/nonexistent/tagtree/missing.xml")
        .unwrap_err();

    assert!(err.is_file_read());
    assert!(matches!(err, Error::FileRead { .. }));
    assert!(parser.last_error().unwrap().contains("missing.xml"));
}

#[test]
fn test_parse_file_reports_parse_errors() {
    let path = temp_file("bad.xml", b"<a><b></a>");
    let err = tagtree_core::parse_file(&path).unwrap_err();
    fs::remove_file(&path).ok();

    assert!(!err.is_file_read());
    assert_eq!(
        err.as_parse_error().unwrap().kind,
        ParseErrorKind::UnexpectedEnd
    );
}

#[test]
fn test_parse_file_invalid_utf8() {
    let path = temp_file("latin1.xml", b"<a>caf\xe9</a>");
    let doc = tagtree_core::parse_file(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(doc.nodes[0].text, "caf\u{e9}");
}
