//! Lexer and parser for the Lun language.
//!
//! The lexer turns source into LR tokens ([lexer::lr]), which the parser
//! turns into an AST ([parser::ast]). Both recover from errors, so that a
//! partial AST is available alongside the errors.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

pub use self::lexer::{lex_source, lex_source_recovery};
pub use self::parser::parse_lr_to_ast;
use crate::error::Error;
use crate::lexer::lr::Token;
use crate::parser::ast::SourceFile;
use crate::span::Span;

/// Build a Lun AST from source.
pub fn parse_source(source: &str, source_id: u16) -> Result<SourceFile, Vec<Error>> {
    let (ast, errors) = parse_source_recovery(source, source_id);

    if !errors.is_empty() {
        return Err(errors);
    }
    ast.ok_or_else(|| vec![Error::new_assert("parser produced neither an AST nor errors")])
}

/// Build a Lun AST from source, recovering from errors. The AST is `None`
/// only when the source couldn't be parsed at all.
pub fn parse_source_recovery(source: &str, source_id: u16) -> (Option<SourceFile>, Vec<Error>) {
    let (_, ast, errors) = parse_source_with_tokens(source, source_id);
    (ast, errors)
}

/// Like [parse_source_recovery], but also returns the tokens the AST was
/// built from, including comments.
pub fn parse_source_with_tokens(
    source: &str,
    source_id: u16,
) -> (Vec<Token>, Option<SourceFile>, Vec<Error>) {
    let (tokens, mut errors) = lex_source_recovery(source, source_id);
    let tokens = tokens.unwrap_or_default();

    let (ast, parse_errors) = parse_lr_to_ast(source_id, tokens.clone());
    errors.extend(parse_errors);

    // the file spans the whole source, including trailing whitespace
    let ast = ast.map(|ast| SourceFile {
        span: Span::new(source_id, 0..source.chars().count()),
        ..ast
    });

    (tokens, ast, errors)
}
