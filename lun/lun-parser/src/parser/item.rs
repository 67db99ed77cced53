use chumsky::prelude::*;

use super::ast::*;
use super::expr::{expr, missing_semicolon, type_expr};
use super::perror::{DisplayToken, PError};
use super::{ctrl, ident};
use crate::lexer::lr::TokenKind;

pub(crate) fn source_file() -> impl Parser<TokenKind, Vec<Item>, Error = PError> {
    item()
        .repeated()
        .then_ignore(trailing_tokens().or_not())
        .then_ignore(end())
}

/// Tokens after the last item which don't make up one. Items recover by
/// skipping to the next item, so these are only ever at the end. They're
/// reported, so the items before them are kept.
fn trailing_tokens() -> impl Parser<TokenKind, (), Error = PError> {
    any()
        .then_ignore(any().repeated())
        .validate(|first, span, emit| {
            let message = match &first {
                TokenKind::Ident(name) => format!("unfinished definition of `{name}`"),
                token => format!("expected a definition, but found {}", DisplayToken(token)),
            };
            emit(PError::custom(span, message))
        })
}

/// `name : ty? (':' | '=') value`, where `name :: value` is lexed with a
/// single `::` token.
fn item() -> impl Parser<TokenKind, Item, Error = PError> {
    let separator = ctrl(':').to(false).or(ctrl('=').to(true));

    let header = choice((
        just(TokenKind::PathSep).to((None, false)),
        ctrl(':').ignore_then(type_expr().or_not()).then(separator),
    ));

    ident()
        .then(header)
        .then(expr())
        .then(ctrl(';').or_not())
        .validate(|(((name, (ty, mutable)), value), semicolon), _, emit| {
            let semicolon = semicolon.is_some();
            if !semicolon && !value.kind.is_block_like() && !matches!(value.kind, ExprKind::Error)
            {
                emit(missing_semicolon(&value));
            }
            GlobalDef {
                name,
                ty,
                mutable,
                value,
                semicolon,
            }
        })
        .map_with_span(|def, span| Item {
            kind: ItemKind::GlobalDef(def),
            span,
        })
        .recover_with(skip_then_retry_until([]))
}
