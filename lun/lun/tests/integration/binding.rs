//! Loading the grammar through the public API, as hosts do.

use lun::{language, Language, Parser, LANGUAGE_VERSION};

fn load(language: &Language) -> Parser {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .unwrap_or_else(|e| panic!("Error loading Lun grammar: {e}"));
    parser
}

#[test]
fn can_load_grammar() {
    let parser = load(&language());
    assert_eq!(parser.language(), Some(language()));
}

#[test]
fn can_load_grammar_repeatedly() {
    let first = load(&language());
    let second = load(&language());
    assert_eq!(first.language(), second.language());

    let mut parser = Parser::new();
    for _ in 0..3 {
        parser
            .set_language(&language())
            .unwrap_or_else(|e| panic!("Error loading Lun grammar: {e}"));
    }

    let a = parser.parse("x :: 1;").unwrap();
    let b = parser.parse("x :: 1;").unwrap();
    assert_eq!(a.to_sexp(), b.to_sexp());
}

#[test]
fn rejects_incompatible_grammar() {
    let mut parser = Parser::new();
    let err = parser
        .set_language(&language().with_abi_version(LANGUAGE_VERSION + 1))
        .unwrap_err();
    assert_eq!(err.version, LANGUAGE_VERSION + 1);
    assert!(parser.language().is_none());
    assert!(parser.parse("x :: 1;").is_none());
}

#[test]
fn language_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Language>();
    assert_send_sync::<Parser>();
    assert_send_sync::<lun::Tree>();

    let handle = std::thread::spawn(|| load(&language()).parse("x :: 2;").map(|t| t.has_error()));
    assert_eq!(handle.join().unwrap(), Some(false));
}
