use enum_as_inner::EnumAsInner;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ops::{BinOp, UnOp};
use super::Ident;
use crate::lexer::lr::Literal;
use crate::span::Span;

/// Anything that has a value. Statements, blocks and loops are expressions
/// too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(
    Debug, EnumAsInner, PartialEq, Clone, Serialize, Deserialize, strum::AsRefStr, JsonSchema,
)]
pub enum ExprKind {
    Bool(bool),
    #[cfg_attr(
        feature = "serde_yaml",
        serde(with = "serde_yaml::with::singleton_map"),
        schemars(with = "Literal")
    )]
    Literal(Literal),
    Null,
    Paren(Box<Expr>),
    Path(Path),
    Binary(BinaryExpr),
    Assign(AssignExpr),
    /// Prefix `-` or `!`
    Unary(UnaryExpr),
    /// Postfix `.*`
    Deref(Box<Expr>),
    Borrow(BorrowExpr),
    Call(CallExpr),
    Field(FieldExpr),
    If(IfExpr),
    Return(Option<Box<Expr>>),
    Break(BreakExpr),
    Continue(Option<Ident>),
    Block(Block),
    While(WhileExpr),
    For(ForExpr),
    Loop(LoopExpr),
    Labeled(LabeledExpr),

    /// Placeholder for input that couldn't be parsed. Only produced when
    /// parsing with recovery, always alongside an error.
    Error,
}

impl ExprKind {
    pub fn into_expr(self, span: Span) -> Expr {
        Expr { kind: self, span }
    }

    /// Block-like expressions can end a statement without a `;`.
    pub fn is_block_like(&self) -> bool {
        matches!(
            self,
            ExprKind::Block(_)
                | ExprKind::While(_)
                | ExprKind::For(_)
                | ExprKind::Loop(_)
                | ExprKind::Labeled(_)
        )
    }
}

/// An operator along with where it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

/// A path such as `a`, `orb::a` or `a::b::c`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Path {
    pub root: PathRoot,
    pub segments: Vec<Ident>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum PathRoot {
    /// The `orb` keyword, the root of the current orb
    Orb(Span),
    Ident(Ident),
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.root {
            PathRoot::Orb(_) => f.write_str("orb")?,
            PathRoot::Ident(ident) => f.write_str(&ident.name)?,
        }
        for seg in &self.segments {
            write!(f, "::{}", seg.name)?;
        }
        Ok(())
    }
}

/// Expression with two operands and an operator, such as `1 + 2`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BinaryExpr {
    pub lhs: Box<Expr>,
    pub op: Spanned<BinOp>,
    pub rhs: Box<Expr>,
}

/// `lhs = rhs`. Right associative, and binds looser than anything else.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssignExpr {
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
}

/// Expression with one operand and an operator, such as `-1`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UnaryExpr {
    pub op: Spanned<UnOp>,
    pub expr: Box<Expr>,
}

/// `&expr` or `&mut expr`. `mut_span` is the span of the `mut` keyword.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BorrowExpr {
    pub mut_span: Option<Span>,
    pub expr: Box<Expr>,
}

impl BorrowExpr {
    pub fn is_mut(&self) -> bool {
        self.mut_span.is_some()
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Arguments,
}

/// The parenthesized arguments of a call, with the span of the parentheses.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Arguments {
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FieldExpr {
    pub expr: Box<Expr>,
    pub field: Ident,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IfExpr {
    pub cond: Box<Expr>,
    pub then: Block,
    pub els: Option<Box<Else>>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum Else {
    /// `else if ...`; the expression is always an [ExprKind::If]
    If(Expr),
    Block(Block),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BreakExpr {
    pub label: Option<Ident>,
    pub value: Option<Box<Expr>>,
}

/// `{ stmt* last_expr? }`
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub last_expr: Option<Box<Expr>>,
    pub span: Span,
}

/// An expression in statement position. Without a semicolon, the expression
/// is block-like.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Stmt {
    pub expr: Expr,
    pub semicolon: bool,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WhileExpr {
    pub cond: Box<Expr>,
    pub body: Block,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForExpr {
    pub var: Ident,
    pub iterator: Box<Expr>,
    pub body: Block,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoopExpr {
    pub body: Block,
}

/// `label: { ... }`, or a labeled loop. The inner expression is a
/// [ExprKind::Block], [ExprKind::While], [ExprKind::For] or
/// [ExprKind::Loop].
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LabeledExpr {
    pub label: Ident,
    pub expr: Box<Expr>,
}
