use chumsky::{prelude::*, Stream};

use self::ast::{Ident, SourceFile};
use self::perror::PError;
use crate::error::Error;
use crate::lexer::lr::{Token, TokenKind};
use crate::span::Span;

pub mod ast;
mod expr;
mod item;
pub(crate) mod perror;

/// Build the AST from LR tokens. Comments are dropped.
pub fn parse_lr_to_ast(source_id: u16, lr: Vec<Token>) -> (Option<SourceFile>, Vec<Error>) {
    let end = lr.last().map_or(0, |t| t.span.end);
    let stream = prepare_stream(lr, source_id);

    let (items, parse_errors) = item::source_file().parse_recovery(stream);

    let errors: Vec<_> = parse_errors
        .into_iter()
        .map(perror::convert_parser_error)
        .collect();
    log::debug!("parse errors: {errors:?}");

    let ast = items.map(|items| SourceFile {
        items,
        span: Span::new(source_id, 0..end),
    });
    (ast, errors)
}

pub(crate) fn prepare_stream<'a>(
    tokens: Vec<Token>,
    source_id: u16,
) -> Stream<'a, TokenKind, Span, impl Iterator<Item = (TokenKind, Span)> + 'a> {
    let end = tokens.last().map_or(0, |t| t.span.end);

    let semantic_tokens = tokens
        .into_iter()
        .filter(|token| !matches!(token.kind, TokenKind::Comment(_)))
        .map(move |token| (token.kind, Span::new(source_id, token.span)));

    Stream::from_iter(Span::new(source_id, end..end + 1), semantic_tokens)
}

fn ident() -> impl Parser<TokenKind, Ident, Error = PError> + Clone {
    select! { TokenKind::Ident(name) => name }
        .map_with_span(|name, span| Ident { name, span })
        .map_err(|e: PError| {
            PError::expected_input_found(
                e.span(),
                [Some(TokenKind::Ident(String::new()))],
                e.found().cloned(),
            )
        })
}

fn keyword(kw: &'static str) -> impl Parser<TokenKind, (), Error = PError> + Clone {
    just(TokenKind::Keyword(kw.to_string())).ignored()
}

fn ctrl(char: char) -> impl Parser<TokenKind, (), Error = PError> + Clone {
    just(TokenKind::Control(char)).ignored()
}
