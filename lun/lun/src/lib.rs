//! # lun
//!
//! Parsing runtime for the Lun language. Wraps the grammar of
//! [lun_parser] behind a language handle and a parser, in the manner of
//! tree-sitter bindings.
//!
//! ```ascii
//!              Lun source
//!
//!      (lex)   │        json::from_tokens
//!              ▼     ────────►
//!            Tokens             Tokens JSON
//!              │
//!    (parse)   │        json::from_ast
//!              ▼     ────────►
//!             AST               AST JSON
//!              │     ◄────────
//!              │        json::to_ast
//!    (lower)   │
//!              ▼
//!            Tree ── Node ── to_sexp
//! ```
//!
//! ## Common use-cases
//!
//! - Load the grammar and parse some source:
//!
//!   ```
//!   let mut parser = lun::Parser::new();
//!   parser.set_language(&lun::language()).unwrap();
//!
//!   let tree = parser.parse("answer :: 42;").unwrap();
//!   assert_eq!(
//!       tree.root_node().to_sexp(),
//!       "(source_file (global_def_item name: (identifier) value: (lit_expr (integer_lit))))"
//!   );
//!   ```
//!
//! - Get the AST, failing on any error:
//!
//!   ```
//!   # fn main() -> Result<(), lun::ErrorMessages> {
//!   let ast = lun::parse("main :: { orb::io::print(\"hi\"); }")?;
//!   assert_eq!(ast.items.len(), 1);
//!   # Ok(())
//!   # }
//!   ```
//!
//! - Inspect Lun from the command line:
//!
//!   ```sh
//!   $ cargo install lun
//!   $ lun tree main.lun
//!   ```
//!
//! ## Feature flags
//!
//! * `cli`: enables the `lun` CLI binary. This is enabled by default. When
//!   consuming this crate from another rust library, it can be disabled.
//! * `serde_yaml`: Enables serialization of ASTs & tokens to YAML.

#![forbid(unsafe_code)]
// Our error type is large, since it contains several strings. We're not that
// performance sensitive, so it's fine to allow it.
#![allow(clippy::result_large_err)]

use std::{collections::HashMap, path::PathBuf};

use serde::{Deserialize, Serialize};

pub use error_message::{ErrorMessage, ErrorMessages, SourceLocation};
pub use language::{
    language, Field, Language, LanguageError, NodeKind, LANGUAGE_VERSION,
    MIN_COMPATIBLE_LANGUAGE_VERSION,
};
pub use lun_parser::error::{Error, ErrorSource, Errors, MessageKind, Reason, WithErrorInfo};
pub use lun_parser::lexer::lr;
pub use lun_parser::parser::ast;
pub use lun_parser::span::Span;
pub use parser::Parser;
pub use tree::{Node, Point, Tree};

mod error_message;
mod language;
mod parser;
mod tree;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Source id given to a single source, matching [SourceTree::from].
pub const DEFAULT_SOURCE_ID: u16 = 1;

/// Parse Lun source into an AST, failing on any lexer or parser error.
pub fn parse(source: &str) -> Result<ast::SourceFile, ErrorMessages> {
    parse_tree(&SourceTree::from(source), DEFAULT_SOURCE_ID)
}

/// Parse a source of a [SourceTree]. Errors are composed against the whole
/// tree.
pub fn parse_tree(sources: &SourceTree, source_id: u16) -> Result<ast::SourceFile, ErrorMessages> {
    let source = sources
        .get_path(source_id)
        .and_then(|path| sources.sources.get(path))
        .ok_or_else(|| {
            ErrorMessages::from(Error::new(Reason::NotFound {
                name: source_id.to_string(),
                namespace: "source id".to_string(),
            }))
        })?;

    lun_parser::parse_source(source, source_id)
        .map_err(|errors| ErrorMessages::from(errors).composed(sources))
}

/// Lex Lun source into tokens, including comments.
pub fn lex(source: &str) -> Result<lr::Tokens, ErrorMessages> {
    lun_parser::lex_source(source).map_err(ErrorMessages::from)
}

/// Options of a [Parser].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    /// Id given to the spans of the parsed source. Defaults to
    /// [DEFAULT_SOURCE_ID].
    pub source_id: u16,

    /// Whether to use ANSI colors in error messages.
    ///
    /// Note that we don't generally recommend threading a `color` option
    /// through an entire application. Instead, in order of preferences:
    /// - Use a library such as `anstream` to encapsulate presentation logic and
    ///   automatically disable colors when not connected to a TTY.
    /// - Set an environment variable such as `CLI_COLOR=0` to disable any
    ///   colors coming back from this library.
    /// - Strip colors from the output (possibly also with a library such as
    ///   `anstream`).
    pub display: DisplayOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            source_id: DEFAULT_SOURCE_ID,
            display: DisplayOptions::AnsiColor,
        }
    }
}

impl Options {
    pub fn with_source_id(mut self, source_id: u16) -> Self {
        self.source_id = source_id;
        self
    }

    pub fn with_display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }

    pub fn no_color(self) -> Self {
        self.with_display(DisplayOptions::Plain)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[non_exhaustive]
pub enum DisplayOptions {
    /// Plain text
    Plain,
    /// With ANSI colors
    AnsiColor,
}

/// JSON serialization and deserialization functions
pub mod json {
    use super::*;

    /// JSON serialization
    pub fn from_ast(ast: &ast::SourceFile) -> Result<String, ErrorMessages> {
        serde_json::to_string(ast).map_err(convert_json_err)
    }

    /// JSON deserialization
    pub fn to_ast(json: &str) -> Result<ast::SourceFile, ErrorMessages> {
        serde_json::from_str(json).map_err(convert_json_err)
    }

    /// JSON serialization
    pub fn from_tokens(tokens: &lr::Tokens) -> Result<String, ErrorMessages> {
        serde_json::to_string(tokens).map_err(convert_json_err)
    }

    /// JSON deserialization
    pub fn to_tokens(json: &str) -> Result<lr::Tokens, ErrorMessages> {
        serde_json::from_str(json).map_err(convert_json_err)
    }

    fn convert_json_err(err: serde_json::Error) -> ErrorMessages {
        ErrorMessages::from(Error::new_simple(err.to_string()))
    }
}

/// All paths are relative to the project root.
// We use `SourceTree` to represent both a single file (including a "file" piped
// from stdin), and a collection of files.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceTree {
    /// Path to the root of the source tree.
    pub root: Option<PathBuf>,

    /// Mapping from file paths into into their contents.
    /// Paths are relative to the root.
    pub sources: HashMap<PathBuf, String>,

    /// Index of source ids to paths. Used to keep [Span] lean.
    source_ids: HashMap<u16, PathBuf>,
}

impl SourceTree {
    pub fn single(path: PathBuf, content: String) -> Self {
        SourceTree::single_with_id(DEFAULT_SOURCE_ID, path, content)
    }

    pub fn single_with_id(source_id: u16, path: PathBuf, content: String) -> Self {
        SourceTree {
            sources: [(path.clone(), content)].into(),
            source_ids: [(source_id, path)].into(),
            root: None,
        }
    }

    pub fn new<I>(iter: I, root: Option<PathBuf>) -> Self
    where
        I: IntoIterator<Item = (PathBuf, String)>,
    {
        let mut res = SourceTree {
            sources: HashMap::new(),
            source_ids: HashMap::new(),
            root,
        };

        for (index, (path, content)) in iter.into_iter().enumerate() {
            res.sources.insert(path.clone(), content);
            res.source_ids.insert((index + 1) as u16, path);
        }
        res
    }

    pub fn insert(&mut self, path: PathBuf, content: String) {
        let last_id = self.source_ids.keys().max().cloned().unwrap_or(0);
        self.sources.insert(path.clone(), content);
        self.source_ids.insert(last_id + 1, path);
    }

    pub fn get_path(&self, source_id: u16) -> Option<&PathBuf> {
        self.source_ids.get(&source_id)
    }

    /// Source ids with their paths, ordered by id.
    pub fn source_ids(&self) -> impl Iterator<Item = (u16, &PathBuf)> {
        let mut ids: Vec<_> = self.source_ids.iter().map(|(id, p)| (*id, p)).collect();
        ids.sort_by_key(|(id, _)| *id);
        ids.into_iter()
    }
}

impl<S: ToString> From<S> for SourceTree {
    fn from(source: S) -> Self {
        SourceTree::single(PathBuf::from(""), source.to_string())
    }
}
