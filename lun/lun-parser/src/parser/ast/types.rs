use enum_as_inner::EnumAsInner;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::expr::{Expr, Spanned};
use crate::span::Span;

/// The type of a global definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum TypeExpr {
    Primitive(Spanned<PrimitiveType>),
    Expr(Expr),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Primitive(p) => p.span,
            TypeExpr::Expr(e) => e.span,
        }
    }
}

/// Builtin types.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    JsonSchema,
)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveType {
    Isz,
    I128,
    I64,
    I32,
    I16,
    I8,
    Usz,
    U128,
    U64,
    U32,
    U16,
    U8,
    F16,
    F32,
    F64,
    F128,
    Bool,
    Str,
    Char,
    Never,
    Void,
}
