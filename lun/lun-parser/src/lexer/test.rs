use chumsky::Parser;
use insta::assert_snapshot;

use crate::lexer::lr::{IntegerLit, Literal, StringPart, TokenKind, Tokens};
use crate::lexer::{comment, integer, lex_source, lex_source_recovery, lexer, string};

fn kinds(source: &str) -> Vec<TokenKind> {
    lex_source(source)
        .unwrap()
        .0
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Ident(name.to_string())
}

fn keyword(name: &str) -> TokenKind {
    TokenKind::Keyword(name.to_string())
}

fn int(radix: u32, digits: &str) -> TokenKind {
    TokenKind::Literal(Literal::Integer(IntegerLit::new(radix, digits)))
}

#[test]
fn global_def() {
    assert_eq!(
        kinds("x: i32 = 1;"),
        vec![
            ident("x"),
            TokenKind::Control(':'),
            keyword("i32"),
            TokenKind::Control('='),
            int(10, "1"),
            TokenKind::Control(';'),
        ]
    );

    // `::` is a single token; the parser splits it when it separates a name
    // from its value
    assert_eq!(
        kinds("main :: {}"),
        vec![
            ident("main"),
            TokenKind::PathSep,
            TokenKind::Control('{'),
            TokenKind::Control('}'),
        ]
    );
}

#[test]
fn spans() {
    assert_snapshot!(format!("{:?}", Tokens(lexer().parse("a.*  +b").unwrap()).0), @r#"[0..1: Ident("a"), 1..3: Deref, 5..6: Control('+'), 6..7: Ident("b")]"#);
}

#[test]
fn operators() {
    assert_eq!(
        kinds("a<<b>=c&&d||e!=f"),
        vec![
            ident("a"),
            TokenKind::Shl,
            ident("b"),
            TokenKind::Gte,
            ident("c"),
            TokenKind::And,
            ident("d"),
            TokenKind::Or,
            ident("e"),
            TokenKind::Ne,
            ident("f"),
        ]
    );

    assert_eq!(
        kinds("&mut x.*"),
        vec![
            TokenKind::Control('&'),
            keyword("mut"),
            ident("x"),
            TokenKind::Deref,
        ]
    );
}

#[test]
fn keywords() {
    assert_eq!(
        kinds("orb fun returns"),
        vec![keyword("orb"), keyword("fun"), ident("returns")]
    );
    assert_eq!(kinds("void u128"), vec![keyword("void"), keyword("u128")]);
}

#[test]
fn numbers() {
    assert_eq!(
        integer().parse("0b1111_0000").unwrap(),
        IntegerLit::new(2, "1111_0000")
    );
    assert_eq!(integer().parse("0o777").unwrap().value(), Some(511));
    assert_eq!(integer().parse("0xdeadBEEF").unwrap().value(), Some(3735928559));
    assert_eq!(integer().parse("1_000_000").unwrap().value(), Some(1_000_000));

    let tagged = integer().parse("255'u8").unwrap();
    assert_eq!(tagged.tag.as_deref(), Some("u8"));
    assert_eq!(tagged.value(), Some(255));

    // hex digits can't be separated, so this is `0` followed by an identifier
    assert_eq!(kinds("0x_1"), vec![int(10, "0"), ident("x_1")]);
}

#[test]
fn strings() {
    let lit = string().parse(r#""a\tb""#).unwrap();
    assert_eq!(lit.tag, None);
    assert_eq!(lit.value(), "a\tb");
    assert_eq!(lit.parts.len(), 3);

    let escape = lit.parts[1].as_escape().unwrap();
    assert_eq!(escape.raw, r"\t");
    assert_eq!(escape.span, 2..4);

    let lit = string().parse(r#"c"\x41\u{1F600}\e""#).unwrap();
    assert_eq!(lit.tag.as_deref(), Some("c"));
    assert_eq!(lit.value(), "A\u{1F600}\x1B");
    assert!(lit.parts.iter().all(|p| matches!(p, StringPart::Escape(_))));

    // an empty string has no parts
    assert_eq!(string().parse(r#""""#).unwrap().parts, vec![]);

    // a tag must be directly followed by the quote
    assert_eq!(
        kinds(r#"c "x""#)[0],
        ident("c"),
        "a space separates the tag from the string"
    );
}

#[test]
fn string_errors() {
    // `\"` isn't an escape
    assert!(string().parse(r#""a\"b""#).is_err());

    // no new lines within strings
    assert!(string().parse("\"a\nb\"").is_err());

    // unknown escape
    assert!(lex_source(r#""\q""#).is_err());

    // out of range code point
    let (_, errors) = lex_source_recovery(r#"x = "\u{110000}";"#, 0);
    assert_eq!(errors.len(), 1);
}

#[test]
fn comments() {
    assert_eq!(
        comment().parse("// a comment\nx").unwrap(),
        "// a comment".to_string()
    );

    // a backslash continues the comment on the next line
    assert_eq!(
        comment().parse("// a \\\n b\nc").unwrap(),
        "// a \\\n b".to_string()
    );

    assert_eq!(
        comment().parse("/* one\ntwo */ x").unwrap(),
        "/* one\ntwo */".to_string()
    );

    // block comments don't nest
    assert_eq!(
        kinds("/* a /* b */ c */"),
        vec![
            TokenKind::Comment("/* a /* b */".to_string()),
            ident("c"),
            TokenKind::Control('*'),
            TokenKind::Control('/'),
        ]
    );
}

#[test]
fn recovery() {
    let (tokens, errors) = lex_source_recovery("a $ b", 0);
    let tokens = tokens.unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].kind, ident("b"));
    // the skipped char isn't part of the next token
    assert_eq!(tokens[1].span, 4..5);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, Some("E0001"));
    assert_snapshot!(errors[0].reason, @"unexpected $");
    assert_eq!(errors[0].span.map(|s| s.start..s.end), Some(2..3));

    // consecutive unknown chars are a single error
    let (tokens, errors) = lex_source_recovery("a $@ b", 0);
    assert_eq!(tokens.unwrap().len(), 2);
    assert_eq!(errors.len(), 1);
    assert_snapshot!(errors[0].reason, @"unexpected $@");
    assert_eq!(errors[0].span.map(|s| s.start..s.end), Some(2..4));

    // an unknown char at the end doesn't lose the tokens before it
    let (tokens, errors) = lex_source_recovery("a :: 1;\n@", 0);
    assert_eq!(tokens.unwrap().len(), 4);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].span.map(|s| s.start..s.end), Some(8..9));
}

#[test]
fn unterminated_block_comment() {
    let (tokens, errors) = lex_source_recovery("x :: 1; /* never closed", 0);
    let tokens = tokens.unwrap();
    assert_eq!(
        tokens.last().map(|t| &t.kind),
        Some(&TokenKind::Comment("/* never closed".to_string()))
    );
    assert_eq!(tokens.len(), 5);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, Some("E0001"));
    assert_snapshot!(errors[0].reason, @"unterminated block comment");
    assert_eq!(errors[0].span.map(|s| s.start..s.end), Some(8..23));

    assert!(lex_source("/*").is_err());
}

#[test]
fn lexer_errors_use_char_offsets() {
    let (_, errors) = lex_source_recovery("s = \"é\"; ¬", 3);
    assert_eq!(errors.len(), 1);
    let span = errors[0].span.unwrap();
    assert_eq!((span.start, span.end, span.source_id), (9, 10, 3));
    assert_snapshot!(errors[0].reason, @"unexpected ¬");
}
