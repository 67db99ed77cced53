use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A name, such as a definition, a label or a path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new<S: ToString>(name: S, span: Span) -> Self {
        Ident {
            name: name.to_string(),
            span,
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
