use enum_as_inner::EnumAsInner;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::expr::Expr;
use super::types::TypeExpr;
use super::Ident;
use crate::span::Span;

/// A whole Lun source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceFile {
    pub items: Vec<Item>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Item {
    pub kind: ItemKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum ItemKind {
    GlobalDef(GlobalDef),
}

/// A global definition:
///
/// - `name :: value` and `name : ty : value` define a constant,
/// - `name := value` and `name : ty = value` define a mutable global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GlobalDef {
    pub name: Ident,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ty: Option<TypeExpr>,
    pub mutable: bool,
    pub value: Expr,
    /// Whether the definition ended with a `;`
    pub semicolon: bool,
}

impl From<GlobalDef> for ItemKind {
    fn from(value: GlobalDef) -> Self {
        ItemKind::GlobalDef(value)
    }
}

impl SourceFile {
    pub fn global_defs(&self) -> impl Iterator<Item = &GlobalDef> {
        self.items.iter().filter_map(|item| item.kind.as_global_def())
    }
}
