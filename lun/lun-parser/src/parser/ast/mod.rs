//! The AST of a Lun source file. The parser builds it from LR tokens; the
//! `lun` crate lowers it into a concrete syntax tree.

pub use expr::*;
pub use ident::*;
pub use item::*;
pub use ops::*;
pub use types::*;

// re-export, since literals are part of expressions
pub use crate::lexer::lr::Literal;
pub use crate::span::Span;

mod expr;
mod ident;
mod item;
mod ops;
mod types;
