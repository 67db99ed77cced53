use chumsky::error::{Simple, SimpleReason};
use itertools::Itertools;

use crate::error::{Error, ErrorSource, Reason, WithErrorInfo};
use crate::lexer::lr::TokenKind;
use crate::span::Span;

pub(crate) type PError = Simple<TokenKind, Span>;

pub(crate) fn convert_parser_error(e: PError) -> Error {
    let mut span = e.span();

    if matches!(e.reason(), SimpleReason::Unexpected) && e.found().is_none() {
        // found end of input; the span points past the source, so move it
        // back onto the last char. Custom errors carry their own span.
        if span.start > 0 && span.end > 0 {
            span.start -= 1;
            span.end -= 1;
        }
    }

    construct_parser_error(e)
        .with_span(Some(span))
        .with_code("E0002")
        .with_source(ErrorSource::Parser)
}

fn construct_parser_error(e: PError) -> Error {
    match e.reason() {
        SimpleReason::Custom(message) => return Error::new_simple(message),
        SimpleReason::Unclosed { delimiter, .. } => {
            return Error::new_simple(format!("unclosed delimiter `{delimiter}`"))
        }
        SimpleReason::Unexpected => {}
    }

    fn token_to_string(t: Option<&TokenKind>) -> String {
        t.map(DisplayToken)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "end of input".to_string())
    }

    let mut expected = e
        .expected()
        .map(|t| token_to_string(t.as_ref()))
        .sorted()
        .dedup()
        .collect_vec();

    let while_parsing = e
        .label()
        .map(|l| format!(" while parsing {l}"))
        .unwrap_or_default();

    if expected.is_empty() || expected.len() > 10 {
        let label = token_to_string(e.found());
        return Error::new_simple(format!("unexpected {label}{while_parsing}"));
    }

    let expected = match expected.len() {
        1 => expected.remove(0),
        2 => expected.join(" or "),
        _ => {
            let last = expected.pop().unwrap_or_default();
            format!("one of {} or {last}", expected.join(", "))
        }
    };

    match e.found() {
        Some(found) => Error::new(Reason::Expected {
            who: e.label().map(|x| x.to_string()),
            expected,
            found: DisplayToken(found).to_string(),
        }),
        // We want a friendlier message than "found end of input"...
        None => Error::new(Reason::Simple(format!(
            "Expected {expected}, but didn't find anything before the end."
        ))),
    }
}

/// Formats a token the way it's written, quoted with backticks.
pub(crate) struct DisplayToken<'a>(pub(crate) &'a TokenKind);

impl std::fmt::Display for DisplayToken<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            TokenKind::Ident(s) if s.is_empty() => f.write_str("an identifier"),
            TokenKind::Ident(s) => write!(f, "`{s}`"),
            TokenKind::Keyword(s) => write!(f, "keyword `{s}`"),
            TokenKind::Literal(_) => f.write_str("a literal"),
            TokenKind::Comment(_) => f.write_str("a comment"),
            token => write!(f, "`{token}`"),
        }
    }
}

#[cfg(test)]
mod test {
    use chumsky::Error as _;
    use insta::assert_snapshot;

    use super::*;

    fn span(range: std::ops::Range<usize>) -> Span {
        Span::new(0, range)
    }

    #[test]
    fn test_expected_message() {
        let e = PError::expected_input_found(
            span(4..5),
            [Some(TokenKind::Control(';'))],
            Some(TokenKind::Ident("y".to_string())),
        );
        let error = convert_parser_error(e);
        assert_snapshot!(error.reason, @"expected `;`, but found `y`");
        assert_eq!(error.code, Some("E0002"));
        assert_eq!(error.span, Some(span(4..5)));

        let e = PError::expected_input_found(
            span(3..4),
            [
                Some(TokenKind::Control(')')),
                Some(TokenKind::Control(',')),
                Some(TokenKind::Ident(String::new())),
            ],
            Some(TokenKind::Control(';')),
        );
        assert_snapshot!(convert_parser_error(e).reason, @"expected one of `)`, `,` or an identifier, but found `;`");
    }

    #[test]
    fn test_end_of_input() {
        let e = PError::expected_input_found(span(6..7), [Some(TokenKind::Control(';'))], None);
        let error = convert_parser_error(e);
        assert_snapshot!(error.reason, @"Expected `;`, but didn't find anything before the end.");
        // moved back from past the end of the source
        assert_eq!(error.span, Some(span(5..6)));
    }

    #[test]
    fn test_custom() {
        let error = convert_parser_error(PError::custom(span(0..1), "expected `;` after value"));
        assert_snapshot!(error.reason, @"expected `;` after value");
        assert_eq!(error.span, Some(span(0..1)));

        // a zero-width span at the end of an expression stays where it is
        let error = convert_parser_error(PError::custom(span(8..8), "expected `;` after expression"));
        assert_eq!(error.span, Some(span(8..8)));
    }
}
