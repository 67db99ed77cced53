use insta::assert_snapshot;
use itertools::Itertools;

use crate::{language, NodeKind, Options, Parser, Point, Tree};

fn parse(source: &str) -> Tree {
    Tree::parse(language(), source, &Options::default().no_color())
}

fn sexp(source: &str) -> String {
    parse(source).to_sexp()
}

#[test]
fn test_sexp() {
    assert_snapshot!(sexp("x :: 1 + 2 * 3;"), @"(source_file (global_def_item name: (identifier) value: (binary_expr lhs: (lit_expr (integer_lit)) op: (+) rhs: (binary_expr lhs: (lit_expr (integer_lit)) op: (*) rhs: (lit_expr (integer_lit))))))");

    assert_snapshot!(sexp("x :: { a; b }"), @"(source_file (global_def_item name: (identifier) value: (block_expr block: (block stmt: (path_expr (path first_seg: (identifier))) last_expr: (path_expr (path first_seg: (identifier)))))))");

    assert_snapshot!(sexp("n : u8 = -p.*;"), @"(source_file (global_def_item name: (identifier) typeexpr: (primitive_type) value: (left_unary_expr op: (-) (right_unary_expr (path_expr (path first_seg: (identifier))) deref: (.*)))))");

    assert_snapshot!(sexp("x :: l: {}"), @"(source_file (global_def_item name: (identifier) value: (labeled_expr label: (identifier) (block))))");
}

#[test]
fn test_literals_and_paths() {
    assert_snapshot!(sexp(r#"s :: c"a\n";"#), @"(source_file (global_def_item name: (identifier) value: (lit_expr (string_lit tag: (identifier) (string_content) (escape_sequence)))))");

    assert_snapshot!(sexp("p :: orb::io::print(&mut x, null);"), @"(source_file (global_def_item name: (identifier) value: (call_expr callee: (path_expr (path seg: (identifier) seg: (identifier))) args: (arguments (borrow_expr (mut_spec) (path_expr (path first_seg: (identifier)))) (null_expr)))))");

    assert_snapshot!(sexp("t : orb::Thing = a.b;"), @"(source_file (global_def_item name: (identifier) typeexpr: (path_expr (path seg: (identifier))) value: (field_expr (path_expr (path first_seg: (identifier))) field: (identifier))))");
}

#[test]
fn test_control_flow() {
    assert_snapshot!(sexp("x :: if a { b } else { c };"), @"(source_file (global_def_item name: (identifier) value: (if_expr cond: (path_expr (path first_seg: (identifier))) then: (block last_expr: (path_expr (path first_seg: (identifier)))) else: (block last_expr: (path_expr (path first_seg: (identifier)))))))");

    assert_snapshot!(sexp("x :: outer: for i in xs { break :outer; }"), @"(source_file (global_def_item name: (identifier) value: (labeled_expr label: (identifier) (for_expr var: (identifier) iterator: (path_expr (path first_seg: (identifier))) body: (block stmt: (break_expr label: (identifier)))))))");

    assert_snapshot!(sexp("x :: loop { while true { continue; } return 1; }"), @"(source_file (global_def_item name: (identifier) value: (loop_expr body: (block stmt: (while_expr cond: (bool_expr) body: (block stmt: (continue_expr))) stmt: (return_expr (lit_expr (integer_lit)))))))");
}

#[test]
fn test_comments() {
    let source = r#"// hi
main :: {
  // inner
  x = 1;
}
"#;
    assert_snapshot!(sexp(source), @"(source_file (comment) (global_def_item name: (identifier) value: (block_expr block: (block (comment) stmt: (assign_expr lhs: (path_expr (path first_seg: (identifier))) rhs: (lit_expr (integer_lit)))))))");

    let tree = parse(source);
    assert!(!tree.has_error());
    let comment = tree.root_node().child(0).unwrap();
    assert_eq!(comment.node_kind(), NodeKind::Comment);
    assert!(comment.is_named());
    assert_eq!(comment.utf8_text(source.as_bytes()).unwrap(), "// hi");
}

#[test]
fn test_missing_semicolon() {
    let tree = parse("x :: 5");
    assert!(tree.has_error());
    assert_snapshot!(tree.to_sexp(), @"(source_file (global_def_item name: (identifier) value: (lit_expr (integer_lit))) (ERROR))");

    let error = tree.root_node().child(1).unwrap();
    assert!(error.is_error());
    assert_eq!(error.byte_range(), 6..6);

    let messages = tree.error_messages();
    assert_eq!(messages.len(), 1);
    let location = messages.inner[0].location.as_ref().unwrap();
    assert_eq!(location.start, (0, 6));
    assert_eq!(messages.inner[0].reason, "expected `;` after expression");
}

#[test]
fn test_missing_semicolon_in_block() {
    let source = "x :: { a b };";
    let tree = parse(source);
    assert_snapshot!(tree.to_sexp(), @"(source_file (global_def_item name: (identifier) value: (block_expr block: (block stmt: (path_expr (path first_seg: (identifier))) (ERROR) last_expr: (path_expr (path first_seg: (identifier)))))))");

    let block = tree
        .root_node()
        .child(0)
        .unwrap()
        .child_by_field_name("value")
        .unwrap()
        .child(0)
        .unwrap();
    let error = block.child(1).unwrap();
    assert!(error.is_error());
    // right after `a`, not before it
    assert_eq!(error.byte_range(), 8..8);
    assert_eq!(tree.errors()[0].span.map(|s| s.start), Some(8));

    // after a call, the error belongs to the block rather than the arguments
    let tree = parse("x :: { f() c };");
    let block = tree
        .root_node()
        .child(0)
        .unwrap()
        .child_by_field_name("value")
        .unwrap()
        .child(0)
        .unwrap();
    assert_eq!(
        block.children().map(|c| c.kind()).join(" "),
        "call_expr ERROR path_expr"
    );
    assert_eq!(block.child(1).unwrap().byte_range(), 10..10);
    let call = block.child(0).unwrap();
    assert!(!call.has_error());
}

#[test]
fn test_lexer_error() {
    let tree = parse("a :: 1;\n$\nb :: 2;");
    assert!(tree.has_error());
    assert_eq!(tree.errors()[0].code, Some("E0001"));

    let root = tree.root_node();
    assert!(root.has_error());
    assert_eq!(
        root.children().map(|c| c.kind()).join(" "),
        "global_def_item ERROR global_def_item"
    );
    assert!(!root.child(0).unwrap().has_error());

    // the skipped `$` isn't part of the next item
    let source = "a :: 1;\n$\nb :: 2;";
    let tree = parse(source);
    let b = tree.root_node().child(2).unwrap();
    assert_eq!(b.byte_range(), 10..17);
    let name = b.child_by_field_name("name").unwrap();
    assert_eq!(name.utf8_text(source.as_bytes()).unwrap(), "b");

    // an unknown char at the end keeps the items before it
    let tree = parse("a :: 1;\n@");
    assert_snapshot!(tree.to_sexp(), @"(source_file (global_def_item name: (identifier) value: (lit_expr (integer_lit))) (ERROR))");
    assert_eq!(tree.root_node().child(1).unwrap().byte_range(), 8..9);
}

#[test]
fn test_trailing_tokens() {
    let tree = parse("a :: 1;\nb :: 2;\n}");
    assert_snapshot!(tree.to_sexp(), @"(source_file (global_def_item name: (identifier) value: (lit_expr (integer_lit))) (global_def_item name: (identifier) value: (lit_expr (integer_lit))) (ERROR))");
    assert_eq!(tree.root_node().child(2).unwrap().byte_range(), 16..17);

    let tree = parse("a :: 1; b :: 2; c");
    let root = tree.root_node();
    assert_eq!(
        root.children().map(|c| c.kind()).join(" "),
        "global_def_item global_def_item ERROR"
    );
    assert!(!root.child(1).unwrap().has_error());
    assert_eq!(tree.errors().len(), 1);
}

#[test]
fn test_recovery() {
    let tree = parse("a :: { 1 + }; b :: 2;");
    assert!(tree.has_error());

    let root = tree.root_node();
    let items = root
        .named_children()
        .filter(|c| c.node_kind() == NodeKind::GlobalDefItem)
        .collect_vec();
    assert_eq!(items.len(), 2);
    assert!(items[0].has_error());
    assert!(!items[1].has_error());

    // the parser error is represented by the error expression
    let errors = items[0]
        .child_by_field_name("value")
        .unwrap()
        .child(0)
        .unwrap()
        .named_children()
        .filter(|c| c.is_error())
        .count();
    assert_eq!(errors, 1);
}

#[test]
fn test_positions() {
    let source = "s :: \"héllo\";\nt :: 2;";
    let tree = parse(source);
    let root = tree.root_node();
    assert_eq!(root.byte_range(), 0..source.len());

    let value = root
        .child(0)
        .unwrap()
        .child_by_field_name("value")
        .unwrap();
    assert_eq!(value.byte_range(), 5..13);
    assert_eq!(value.utf8_text(source.as_bytes()).unwrap(), "\"héllo\"");

    let content = value.child(0).unwrap().child(0).unwrap();
    assert_eq!(content.kind(), "string_content");
    assert_eq!(content.utf8_text(source.as_bytes()).unwrap(), "héllo");

    let second = root.child(1).unwrap();
    assert_eq!(second.start_position(), Point::new(1, 0));
    assert_eq!(second.end_position(), Point::new(1, 7));
    assert_eq!(second.start_byte(), 15);
    assert_snapshot!(format!("{second:?}"), @"{Node global_def_item (1, 0) - (1, 7)}");
}

#[test]
fn test_navigation() {
    let tree = parse("a :: 1;\nb :: x + 2;");
    let root = tree.root_node();
    assert_eq!(root.child_count(), 2);
    assert_eq!(root.named_child_count(), 2);
    assert!(root.parent().is_none());

    let first = root.child(0).unwrap();
    let second = first.next_sibling().unwrap();
    assert_eq!(second.parent(), Some(root));
    assert!(second.next_sibling().is_none());
    assert_eq!(root.named_child(1), Some(second));

    let binary = second.child_by_field_name("value").unwrap();
    assert_eq!(binary.kind(), "binary_expr");
    assert_eq!(binary.child_count(), 3);
    assert_eq!(binary.named_child_count(), 2);
    assert_eq!(
        (0..3).map(|i| binary.field_name_for_child(i).unwrap()).join(" "),
        "lhs op rhs"
    );

    let op = binary.child_by_field_name("op").unwrap();
    assert!(!op.is_named());
    assert_eq!(op.kind(), "+");
    assert_eq!(op.kind_id(), tree.language().id_for_node_kind("+", false).unwrap());

    assert_eq!(second.children_by_field_name("name").count(), 1);
    assert!(binary.child_by_field_name("nope").is_none());
    assert!(root.child(2).is_none());
}

#[test]
fn test_empty_source() {
    let tree = parse("");
    assert_snapshot!(tree.to_sexp(), @"(source_file)");
    assert_eq!(tree.root_node().byte_range(), 0..0);
    assert!(!tree.has_error());

    let mut parser = Parser::new();
    parser.set_language(&language()).unwrap();
    let tree = parser.parse("   ").unwrap();
    assert_eq!(tree.root_node().end_position(), Point::new(0, 3));
}

#[test]
fn test_deep_nesting() {
    let depth = 3_000;
    let source = format!("x :: {}1{};", "(".repeat(depth), ")".repeat(depth));
    let tree = parse(&source);
    assert!(!tree.has_error());

    let sexp = tree.to_sexp();
    assert_eq!(sexp.matches("paren_expr").count(), depth);

    let mut node = tree.root_node().child(0).unwrap();
    for _ in 0..depth {
        node = node.named_children().last().unwrap();
    }
    assert_eq!(node.kind(), "paren_expr");
    assert_eq!(node.byte_range(), 5 + depth - 1..5 + depth + 2);
}
