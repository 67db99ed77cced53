use std::str::FromStr;

use chumsky::prelude::*;

use super::ast::*;
use super::perror::PError;
use super::{ctrl, ident, keyword};
use crate::lexer::lr::TokenKind;

/// A full expression, including assignments.
pub(crate) fn expr() -> impl Parser<TokenKind, Expr, Error = PError> + Clone {
    recursive(|expr| {
        let operand = operators(primary(expr.clone(), true), expr);
        assignment(operand)
    })
}

/// The type of a global definition: either a primitive type or an expression
/// without assignment. A labeled expression can't start a type, since its
/// `:` would be taken for the one separating the type from the value.
pub(crate) fn type_expr() -> impl Parser<TokenKind, TypeExpr, Error = PError> + Clone {
    let primitive = filter_map(|span, token: TokenKind| {
        let primitive = match &token {
            TokenKind::Keyword(kw) => PrimitiveType::from_str(kw).ok(),
            _ => None,
        };
        primitive
            .map(|node| Spanned { node, span })
            .ok_or_else(|| PError::expected_input_found(span, None, Some(token)))
    });

    primitive
        .map(TypeExpr::Primitive)
        .or(operators(primary(expr(), false), expr()).map(TypeExpr::Expr))
}

fn primary<'a, E>(expr: E, allow_labels: bool) -> BoxedParser<'a, TokenKind, Expr, PError>
where
    E: Parser<TokenKind, Expr, Error = PError> + Clone + 'a,
{
    let literal = select! { TokenKind::Literal(lit) => ExprKind::Literal(lit) };

    let boolean = keyword("true")
        .to(ExprKind::Bool(true))
        .or(keyword("false").to(ExprKind::Bool(false)));

    let null = keyword("null").to(ExprKind::Null);

    let paren = ctrl('(')
        .ignore_then(expr.clone())
        .then_ignore(ctrl(')'))
        .map(|e| ExprKind::Paren(Box::new(e)))
        .recover_with(nested_delimiters(
            TokenKind::Control('('),
            TokenKind::Control(')'),
            [(TokenKind::Control('{'), TokenKind::Control('}'))],
            |_| ExprKind::Error,
        ));

    let path = keyword("orb")
        .map_with_span(|_, span| PathRoot::Orb(span))
        .or(ident().map(PathRoot::Ident))
        .then(just(TokenKind::PathSep).ignore_then(ident()).repeated())
        .map(|(root, segments)| ExprKind::Path(Path { root, segments }));

    let label_ref = ctrl(':').ignore_then(ident());

    let return_expr = keyword("return")
        .ignore_then(expr.clone().or_not())
        .map(|value| ExprKind::Return(value.map(Box::new)));

    let break_expr = keyword("break")
        .ignore_then(label_ref.clone().or_not())
        .then(expr.clone().or_not())
        .map(|(label, value)| {
            ExprKind::Break(BreakExpr {
                label,
                value: value.map(Box::new),
            })
        });

    let continue_expr = keyword("continue")
        .ignore_then(label_ref.or_not())
        .map(ExprKind::Continue);

    let block = block(expr.clone());

    let if_expr = recursive(|if_expr| {
        keyword("if")
            .ignore_then(expr.clone())
            .then(block.clone())
            .then(
                keyword("else")
                    .ignore_then(
                        if_expr
                            .map(Else::If)
                            .or(block.clone().map(Else::Block)),
                    )
                    .or_not(),
            )
            .map_with_span(|((cond, then), els), span| {
                ExprKind::If(IfExpr {
                    cond: Box::new(cond),
                    then,
                    els: els.map(Box::new),
                })
                .into_expr(span)
            })
    });

    let simple = choice((
        literal,
        boolean,
        null,
        paren,
        return_expr,
        break_expr,
        continue_expr,
        path,
    ))
    .map_with_span(ExprKind::into_expr);

    choice((block_like(expr, block, allow_labels), if_expr, simple)).boxed()
}

/// Blocks, loops, and (when `allow_labels`) labeled blocks or loops. These
/// may end a statement without a `;`.
fn block_like<'a, E, B>(expr: E, block: B, allow_labels: bool) -> BoxedParser<'a, TokenKind, Expr, PError>
where
    E: Parser<TokenKind, Expr, Error = PError> + Clone + 'a,
    B: Parser<TokenKind, Block, Error = PError> + Clone + 'a,
{
    let block_expr = block.clone().map(ExprKind::Block);

    let while_expr = keyword("while")
        .ignore_then(expr.clone())
        .then(block.clone())
        .map(|(cond, body)| {
            ExprKind::While(WhileExpr {
                cond: Box::new(cond),
                body,
            })
        });

    let for_expr = keyword("for")
        .ignore_then(ident())
        .then_ignore(keyword("in"))
        .then(expr)
        .then(block.clone())
        .map(|((var, iterator), body)| {
            ExprKind::For(ForExpr {
                var,
                iterator: Box::new(iterator),
                body,
            })
        });

    let loop_expr = keyword("loop")
        .ignore_then(block)
        .map(|body| ExprKind::Loop(LoopExpr { body }));

    let unlabeled = choice((block_expr, while_expr, for_expr, loop_expr))
        .map_with_span(ExprKind::into_expr)
        .boxed();

    if !allow_labels {
        return unlabeled;
    }

    ident()
        .then_ignore(ctrl(':'))
        .then(unlabeled.clone())
        .map_with_span(|(label, expr), span| {
            ExprKind::Labeled(LabeledExpr {
                label,
                expr: Box::new(expr),
            })
            .into_expr(span)
        })
        .or(unlabeled)
        .boxed()
}

/// `{ stmt* last_expr? }`
fn block<'a, E>(expr: E) -> BoxedParser<'a, TokenKind, Block, PError>
where
    E: Parser<TokenKind, Expr, Error = PError> + Clone + 'a,
{
    recursive(|block| {
        // In statement position, a block-like expression ends the statement,
        // so `loop {} -1` is a loop followed by `-1`.
        let stmt = block_like(expr.clone(), block, true)
            .or(expr)
            .then(ctrl(';').or_not().map(|semi| semi.is_some()));

        ctrl('{')
            .ignore_then(stmt.repeated())
            .then_ignore(ctrl('}'))
            .validate(into_block)
            .recover_with(nested_delimiters(
                TokenKind::Control('{'),
                TokenKind::Control('}'),
                [(TokenKind::Control('('), TokenKind::Control(')'))],
                |span: Span| Block {
                    stmts: vec![Stmt {
                        expr: ExprKind::Error.into_expr(inner_span(span)),
                        semicolon: false,
                    }],
                    last_expr: None,
                    span,
                },
            ))
    })
    .boxed()
}

/// Splits the expressions of a block into statements and its trailing
/// expression. Anything but the last expression needs a `;`, unless it's
/// block-like.
fn into_block(items: Vec<(Expr, bool)>, span: Span, emit: &mut dyn FnMut(PError)) -> Block {
    let count = items.len();
    let mut stmts = Vec::with_capacity(count);
    let mut last_expr = None;

    for (index, (expr, semicolon)) in items.into_iter().enumerate() {
        if !semicolon && index + 1 == count {
            last_expr = Some(Box::new(expr));
            break;
        }
        if !semicolon && !expr.kind.is_block_like() && !matches!(expr.kind, ExprKind::Error) {
            emit(missing_semicolon(&expr));
        }
        stmts.push(Stmt { expr, semicolon });
    }

    Block {
        stmts,
        last_expr,
        span,
    }
}

pub(crate) fn missing_semicolon(expr: &Expr) -> PError {
    let end = Span {
        start: expr.span.end,
        ..expr.span
    };
    PError::custom(end, "expected `;` after expression")
}

/// Postfix, prefix and binary operators over `primary`. `expr` parses call
/// arguments.
fn operators<'a, P, E>(primary: P, expr: E) -> BoxedParser<'a, TokenKind, Expr, PError>
where
    P: Parser<TokenKind, Expr, Error = PError> + Clone + 'a,
    E: Parser<TokenKind, Expr, Error = PError> + Clone + 'a,
{
    #[derive(Clone)]
    enum Postfix {
        Call(Arguments),
        Field(Ident),
        Deref,
    }

    #[derive(Clone)]
    enum Prefix {
        Unary(UnOp),
        Borrow(Option<Span>),
        // `&&` is lexed as a single token
        DoubleBorrow(Option<Span>),
    }

    let args = ctrl('(')
        .ignore_then(expr.separated_by(ctrl(',')).allow_trailing())
        .then_ignore(ctrl(')'))
        .map_with_span(|args, span| Arguments { args, span })
        .recover_with(nested_delimiters(
            TokenKind::Control('('),
            TokenKind::Control(')'),
            [(TokenKind::Control('{'), TokenKind::Control('}'))],
            |span: Span| Arguments {
                args: vec![ExprKind::Error.into_expr(inner_span(span))],
                span,
            },
        ));

    let postfix = choice((
        args.map(Postfix::Call),
        ctrl('.').ignore_then(ident()).map(Postfix::Field),
        just(TokenKind::Deref).to(Postfix::Deref),
    ))
    .map_with_span(|postfix, span| (postfix, span));

    let postfixed = primary
        .then(postfix.repeated())
        .foldl(|expr, (postfix, span)| {
            let span = Span::merge(expr.span, span);
            let kind = match postfix {
                Postfix::Call(args) => ExprKind::Call(CallExpr {
                    callee: Box::new(expr),
                    args,
                }),
                Postfix::Field(field) => ExprKind::Field(FieldExpr {
                    expr: Box::new(expr),
                    field,
                }),
                Postfix::Deref => ExprKind::Deref(Box::new(expr)),
            };
            kind.into_expr(span)
        })
        .boxed();

    let mut_kw = keyword("mut").map_with_span(|_, span| span);

    let prefix = choice((
        ctrl('-').to(Prefix::Unary(UnOp::Neg)),
        ctrl('!').to(Prefix::Unary(UnOp::Not)),
        ctrl('&')
            .ignore_then(mut_kw.clone().or_not())
            .map(Prefix::Borrow),
        just(TokenKind::And)
            .ignore_then(mut_kw.or_not())
            .map(Prefix::DoubleBorrow),
    ))
    .map_with_span(|prefix, span| (prefix, span));

    let unary = prefix
        .repeated()
        .then(postfixed)
        .foldr(|(prefix, span), expr| {
            let full = Span::merge(span, expr.span);
            match prefix {
                Prefix::Unary(op) => ExprKind::Unary(UnaryExpr {
                    op: Spanned { node: op, span },
                    expr: Box::new(expr),
                })
                .into_expr(full),
                Prefix::Borrow(mut_span) => ExprKind::Borrow(BorrowExpr {
                    mut_span,
                    expr: Box::new(expr),
                })
                .into_expr(full),
                Prefix::DoubleBorrow(mut_span) => {
                    let inner = ExprKind::Borrow(BorrowExpr {
                        mut_span,
                        expr: Box::new(expr),
                    })
                    .into_expr(Span {
                        start: span.start + 1,
                        ..full
                    });
                    ExprKind::Borrow(BorrowExpr {
                        mut_span: None,
                        expr: Box::new(inner),
                    })
                    .into_expr(full)
                }
            }
        })
        .boxed();

    let factor = binary_op_parser(
        unary,
        choice((
            ctrl('*').to(BinOp::Mul),
            ctrl('/').to(BinOp::Div),
            ctrl('%').to(BinOp::Mod),
        )),
    );
    let term = binary_op_parser(
        factor,
        ctrl('+').to(BinOp::Add).or(ctrl('-').to(BinOp::Sub)),
    );
    let shift = binary_op_parser(
        term,
        just(TokenKind::Shl)
            .to(BinOp::Shl)
            .or(just(TokenKind::Shr).to(BinOp::Shr)),
    );
    let bit_and = binary_op_parser(shift, ctrl('&').to(BinOp::BitAnd));
    let bit_xor = binary_op_parser(bit_and, ctrl('^').to(BinOp::BitXor));
    let bit_or = binary_op_parser(bit_xor, ctrl('|').to(BinOp::BitOr));
    let equality = binary_op_parser(
        bit_or,
        just(TokenKind::Eq)
            .to(BinOp::Eq)
            .or(just(TokenKind::Ne).to(BinOp::Ne)),
    );
    let comparison = binary_op_parser(
        equality,
        choice((
            ctrl('>').to(BinOp::Gt),
            just(TokenKind::Gte).to(BinOp::Gte),
            ctrl('<').to(BinOp::Lt),
            just(TokenKind::Lte).to(BinOp::Lte),
        )),
    );
    let and = binary_op_parser(comparison, just(TokenKind::And).to(BinOp::And));
    binary_op_parser(and, just(TokenKind::Or).to(BinOp::Or))
}

fn binary_op_parser<'a, Term, Op>(term: Term, op: Op) -> BoxedParser<'a, TokenKind, Expr, PError>
where
    Term: Parser<TokenKind, Expr, Error = PError> + Clone + 'a,
    Op: Parser<TokenKind, BinOp, Error = PError> + 'a,
{
    term.clone()
        .then(
            op.map_with_span(|node, span| Spanned { node, span })
                .then(term)
                .repeated(),
        )
        .foldl(|lhs, (op, rhs)| {
            let span = Span::merge(lhs.span, rhs.span);
            ExprKind::Binary(BinaryExpr {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            })
            .into_expr(span)
        })
        .boxed()
}

/// `a = b = c` is `a = (b = c)`.
fn assignment<'a, P>(operand: P) -> BoxedParser<'a, TokenKind, Expr, PError>
where
    P: Parser<TokenKind, Expr, Error = PError> + Clone + 'a,
{
    operand
        .clone()
        .then(ctrl('=').ignore_then(operand).repeated())
        .map(|(first, mut rest)| {
            let Some(mut rhs) = rest.pop() else {
                return first;
            };
            while let Some(lhs) = rest.pop() {
                rhs = into_assign(lhs, rhs);
            }
            into_assign(first, rhs)
        })
        .boxed()
}

fn into_assign(lhs: Expr, rhs: Expr) -> Expr {
    let span = Span::merge(lhs.span, rhs.span);
    ExprKind::Assign(AssignExpr {
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
    .into_expr(span)
}

/// The span between a pair of delimiters.
fn inner_span(span: Span) -> Span {
    if span.len() >= 2 {
        Span {
            start: span.start + 1,
            end: span.end - 1,
            ..span
        }
    } else {
        span
    }
}
