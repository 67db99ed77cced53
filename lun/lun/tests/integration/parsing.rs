use insta::assert_snapshot;
use itertools::Itertools;

use lun::lr::{Literal, TokenKind};
use lun::{language, Parser, Tree};

fn tree(source: &str) -> Tree {
    let mut parser = Parser::new();
    parser.set_language(&language()).unwrap();
    parser.parse(source).unwrap()
}

/// S-expression of the value of the single definition of `source`.
fn value_sexp(source: &str) -> String {
    let tree = tree(source);
    assert!(!tree.has_error(), "{}", tree.error_messages());
    let value = tree
        .root_node()
        .child(0)
        .and_then(|item| item.child_by_field_name("value"))
        .unwrap();
    value.to_sexp()
}

#[test]
fn test_lex() {
    let tokens = lun::lex("5'u8").unwrap();
    let [token] = tokens.0.as_slice() else {
        panic!("expected a single token, got {tokens:?}");
    };
    let TokenKind::Literal(Literal::Integer(int)) = &token.kind else {
        panic!("expected an integer, got {token:?}");
    };
    assert_eq!(int.tag.as_deref(), Some("u8"));
    assert_eq!(int.value(), Some(5));

    // not a hex literal
    let tokens = lun::lex("0x_1").unwrap();
    assert_eq!(tokens.0.len(), 2);
    assert_eq!(tokens.0[1].kind, TokenKind::Ident("x_1".to_string()));

    let kinds = lun::lex("a::b").unwrap().0.into_iter().map(|t| t.kind).collect_vec();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::PathSep,
            TokenKind::Ident("b".to_string()),
        ]
    );
}

#[test]
fn test_precedence() {
    assert_snapshot!(value_sexp("x :: 1 + 2 * 3;"), @"(binary_expr lhs: (lit_expr (integer_lit)) op: (+) rhs: (binary_expr lhs: (lit_expr (integer_lit)) op: (*) rhs: (lit_expr (integer_lit))))");
}

#[test]
fn test_associativity() {
    assert_snapshot!(value_sexp("x :: a = b = c;"), @"(assign_expr lhs: (path_expr (path first_seg: (identifier))) rhs: (assign_expr lhs: (path_expr (path first_seg: (identifier))) rhs: (path_expr (path first_seg: (identifier)))))");
    assert_snapshot!(value_sexp("x :: a - b - c;"), @"(binary_expr lhs: (binary_expr lhs: (path_expr (path first_seg: (identifier))) op: (-) rhs: (path_expr (path first_seg: (identifier)))) op: (-) rhs: (path_expr (path first_seg: (identifier))))");
}

#[test]
fn test_semicolons() {
    assert!(!tree("x :: loop {}").has_error());
    assert!(!tree("x :: 5;").has_error());

    let tree = tree("x :: 5");
    assert!(tree.has_error());
    let messages = tree.error_messages();
    assert_snapshot!(messages.inner[0].reason, @"expected `;` after expression");
}

#[test]
fn test_block() {
    let tree = tree("x :: { a; b }");
    let block = tree
        .root_node()
        .child(0)
        .and_then(|item| item.child_by_field_name("value"))
        .and_then(|value| value.child_by_field_name("block"))
        .unwrap();

    assert_eq!(block.children_by_field_name("stmt").count(), 1);
    let last = block.child_by_field_name("last_expr").unwrap();
    assert_eq!(last.utf8_text(tree.source().as_bytes()).unwrap(), "b");
}

#[test]
fn test_unknown_character() {
    let tree = tree("x :: 1;\n@\n");
    assert!(tree.has_error());
    assert!(tree.root_node().children().any(|c| c.is_error()));
    // the definition before it is kept
    assert_eq!(tree.root_node().child(0).unwrap().kind(), "global_def_item");

    let messages = tree.error_messages();
    assert_eq!(messages.inner[0].code.as_deref(), Some("E0001"));
    assert_snapshot!(messages.inner[0].reason, @"unexpected @");
}

#[test]
fn test_ast_matches_tree() {
    let source = include_str!("project/nested/limits.lun");
    let tree = tree(source);
    assert!(!tree.has_error(), "{}", tree.error_messages());

    let ast = lun::parse(source).unwrap();
    assert_eq!(tree.ast(), Some(&ast));

    let names = tree
        .root_node()
        .named_children()
        .filter_map(|item| item.child_by_field_name("name"))
        .map(|name| name.utf8_text(source.as_bytes()).unwrap())
        .join(" ");
    assert_eq!(names, "max_depth count countdown");
}
