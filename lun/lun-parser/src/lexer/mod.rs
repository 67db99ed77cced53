use chumsky::{error::Cheap, prelude::*};
use itertools::Itertools;

use self::lr::{
    EscapeSequence, IntegerLit, Literal, StringContent, StringLit, StringPart, Token, TokenKind,
    Tokens,
};
use crate::error::{Error, ErrorSource, Reason, WithErrorInfo};
use crate::span::Span;

pub mod lr;
#[cfg(test)]
mod test;

/// Words which can't be used as identifiers.
pub const KEYWORDS: &[&str] = &[
    "orb", "true", "false", "null", "if", "else", "while", "for", "in", "loop", "return", "break",
    "continue", "mut", "fun",
];

/// Names of the builtin types. These are keywords too.
pub const PRIMITIVE_TYPES: &[&str] = &[
    "isz", "i128", "i64", "i32", "i16", "i8", "usz", "u128", "u64", "u32", "u16", "u8", "f16",
    "f32", "f64", "f128", "bool", "str", "char", "never", "void",
];

/// Lex Lun source into tokens, including comments.
pub fn lex_source(source: &str) -> Result<Tokens, Vec<Error>> {
    lexer().parse(source).map(Tokens).map_err(|errors| {
        merge_adjacent(errors)
            .into_iter()
            .map(|e| convert_lexer_error(source, e, 0))
            .collect()
    })
}

/// Lex Lun source, recovering from errors. Returns the tokens that could be
/// lexed along with all the errors. Chars which don't start a token are
/// skipped, so the tokens around them are kept.
pub fn lex_source_recovery(source: &str, source_id: u16) -> (Option<Vec<Token>>, Vec<Error>) {
    let (tokens, lex_errors) = lexer().parse_recovery(source);

    let errors: Vec<_> = merge_adjacent(lex_errors)
        .into_iter()
        .map(|e| convert_lexer_error(source, e, source_id))
        .collect();

    log::debug!("lex errors: {errors:?}");
    (tokens, errors)
}

pub fn lexer() -> impl Parser<char, Vec<Token>, Error = Cheap<char>> {
    let whitespace = filter(|x: &char| x.is_whitespace())
        .repeated()
        .at_least(1)
        .ignored();

    let control_multi = choice((
        just("::").to(TokenKind::PathSep),
        just(".*").to(TokenKind::Deref),
        just("==").to(TokenKind::Eq),
        just("!=").to(TokenKind::Ne),
        just(">=").to(TokenKind::Gte),
        just("<=").to(TokenKind::Lte),
        just("&&").to(TokenKind::And),
        just("||").to(TokenKind::Or),
        just("<<").to(TokenKind::Shl),
        just(">>").to(TokenKind::Shr),
    ));

    let control = one_of("+-*/%<>=!&|^.,;:(){}").map(TokenKind::Control);

    let literal = literal().map(TokenKind::Literal);

    let ident = ident_part().map(|ident| {
        if is_keyword(&ident) {
            TokenKind::Keyword(ident)
        } else {
            TokenKind::Ident(ident)
        }
    });

    let token = choice((
        comment().map(TokenKind::Comment),
        control_multi,
        literal,
        control,
        ident,
    ))
    .map_with_span(|kind, span| Some(Token { kind, span }));

    // anything else is reported & skipped
    let unknown = any().validate(|c, span, emit| {
        emit(Cheap::expected_input_found(span, None, Some(c)));
        None
    });

    let ignored = whitespace.repeated();

    ignored
        .clone()
        .ignore_then(choice((token, unknown)))
        .repeated()
        .flatten()
        .then_ignore(ignored)
        .then_ignore(end())
}

/// Merges the errors of consecutive skipped chars, so `$$` is a single error.
fn merge_adjacent(errors: Vec<Cheap<char>>) -> Vec<Cheap<char>> {
    errors
        .into_iter()
        .coalesce(|a, b| {
            if a.label().is_none() && b.label().is_none() && a.span().end == b.span().start {
                Ok(Cheap::expected_input_found(
                    a.span().start..b.span().end,
                    None,
                    None,
                ))
            } else {
                Err((a, b))
            }
        })
        .collect()
}

pub fn is_keyword(ident: &str) -> bool {
    KEYWORDS.contains(&ident) || PRIMITIVE_TYPES.contains(&ident)
}

pub(crate) fn ident_part() -> impl Parser<char, String, Error = Cheap<char>> + Clone {
    filter(|c: &char| c.is_ascii_alphabetic() || *c == '_')
        .chain(filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_').repeated())
        .collect()
}

/// A line comment (where a backslash escapes the next char, including a new
/// line) or a block comment. Block comments don't nest; an unterminated one
/// runs to the end of the source and is reported.
pub(crate) fn comment() -> impl Parser<char, String, Error = Cheap<char>> + Clone {
    let line = just("//")
        .ignore_then(
            just('\\')
                .ignore_then(any())
                .map(|c| vec!['\\', c])
                .or(none_of("\\\n").map(|c| vec![c]))
                .repeated()
                .flatten(),
        )
        .collect::<String>()
        .map(|body| format!("//{body}"));

    let closed = take_until(just("*/"))
        .map(|(body, _)| (body.into_iter().collect::<String>(), true));
    let unterminated = any().repeated().collect::<String>().map(|body| (body, false));

    let block = just("/*")
        .ignore_then(closed.or(unterminated))
        .validate(|(body, closed): (String, bool), span, emit| {
            if closed {
                format!("/*{body}*/")
            } else {
                emit(
                    Cheap::expected_input_found(span, None, None)
                        .with_label("unterminated block comment"),
                );
                format!("/*{body}")
            }
        });

    line.or(block).labelled("comment")
}

pub(crate) fn literal() -> impl Parser<char, Literal, Error = Cheap<char>> + Clone {
    // strings go first, since a tagged string starts with an identifier
    choice((
        string().map(Literal::String),
        integer().map(Literal::Integer),
    ))
}

pub(crate) fn integer() -> impl Parser<char, IntegerLit, Error = Cheap<char>> + Clone {
    let binary = prefixed_digits("0b", |c| *c == '0' || *c == '1' || *c == '_')
        .map(|digits| IntegerLit::new(2, digits));
    let octal = prefixed_digits("0o", |c| ('0'..='7').contains(c) || *c == '_')
        .map(|digits| IntegerLit::new(8, digits));
    // Hex digits can't be separated
    let hex = prefixed_digits("0x", |c| c.is_ascii_hexdigit())
        .map(|digits| IntegerLit::new(16, digits));

    let decimal = filter(|c: &char| c.is_ascii_digit())
        .chain(filter(|c: &char| c.is_ascii_digit() || *c == '_').repeated())
        .collect::<String>()
        .map(|digits| IntegerLit::new(10, digits));

    let tag = just('\'')
        .ignore_then(
            filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
                .repeated()
                .at_least(1)
                .collect::<String>(),
        )
        .or_not();

    choice((binary, octal, hex, decimal))
        .then(tag)
        .map(|(mut lit, tag)| {
            lit.tag = tag;
            lit
        })
        .labelled("number")
}

fn prefixed_digits(
    prefix: &'static str,
    is_digit: fn(&char) -> bool,
) -> impl Parser<char, String, Error = Cheap<char>> + Clone {
    just(prefix).ignore_then(filter(is_digit).repeated().at_least(1).collect::<String>())
}

pub(crate) fn string() -> impl Parser<char, StringLit, Error = Cheap<char>> + Clone {
    let content = none_of("\\\"\n")
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map_with_span(|text, span| StringPart::Content(StringContent { text, span }));

    let escape = escaped_character().map_with_span(|(raw, value), span| {
        StringPart::Escape(EscapeSequence { raw, value, span })
    });

    ident_part()
        .or_not()
        .then(
            choice((escape, content))
                .repeated()
                .delimited_by(just('"'), just('"')),
        )
        .map(|(tag, parts)| StringLit { tag, parts })
        .labelled("string")
}

/// An escape sequence, returned both as written and decoded.
fn escaped_character() -> impl Parser<char, (String, char), Error = Cheap<char>> + Clone {
    let simple = filter_map(|span, c: char| {
        let value = match c {
            '0' => '\0',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0B',
            'a' => '\x07',
            'b' => '\x08',
            'e' => '\x1B',
            '\\' => '\\',
            _ => return Err(Cheap::expected_input_found(span, None, Some(c))),
        };
        Ok((format!("\\{c}"), value))
    });

    let hex = just('x')
        .ignore_then(
            filter(|c: &char| c.is_ascii_hexdigit())
                .repeated()
                .exactly(2)
                .collect::<String>(),
        )
        .validate(|digits, span, emit| {
            let value = decode_code_point(&digits).unwrap_or_else(|| {
                emit(Cheap::expected_input_found(span, None, None));
                '\u{FFFD}'
            });
            (format!("\\x{digits}"), value)
        });

    let unicode = just("u{")
        .ignore_then(
            filter(|c: &char| c.is_ascii_hexdigit())
                .repeated()
                .at_least(1)
                .collect::<String>(),
        )
        .then_ignore(just('}'))
        .validate(|digits, span, emit| {
            let value = decode_code_point(&digits).unwrap_or_else(|| {
                emit(Cheap::expected_input_found(span, None, None));
                '\u{FFFD}' // Unicode replacement character
            });
            (format!("\\u{{{digits}}}"), value)
        });

    just('\\')
        .ignore_then(choice((hex, unicode, simple)))
        .labelled("escape sequence")
}

fn decode_code_point(hex_digits: &str) -> Option<char> {
    u32::from_str_radix(hex_digits, 16)
        .ok()
        .and_then(char::from_u32)
}

pub(crate) fn convert_lexer_error(source: &str, e: Cheap<char>, source_id: u16) -> Error {
    let range = e.span();

    // labels of emitted errors are their messages
    if let Some(message) = e.label() {
        return Error::new_simple(message)
            .with_span(Some(Span::new(source_id, range)))
            .with_code("E0001")
            .with_source(ErrorSource::Lexer);
    }

    // We want to take the span based on the chars, not the bytes, so can't
    // just index into the str.
    let found: String = source
        .chars()
        .skip(range.start)
        .take(range.end.saturating_sub(range.start))
        .collect();
    let found = if found.is_empty() {
        "end of input".to_string()
    } else {
        found
    };

    Error::new(Reason::Unexpected { found })
        .with_span(Some(Span::new(source_id, range)))
        .with_code("E0001")
        .with_source(ErrorSource::Lexer)
}
