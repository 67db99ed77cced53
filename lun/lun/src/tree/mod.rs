//! Concrete syntax trees: a tree-sitter style view of a parse, with node
//! kinds and fields from the [Language] tables.

use std::fmt::{self, Debug, Display, Formatter};
use std::iter::once;
use std::path::PathBuf;
use std::str::Utf8Error;

use serde::Serialize;

use crate::ast::SourceFile;
use crate::lr::TokenKind;
use crate::{DisplayOptions, Error, ErrorMessages, Field, Language, NodeKind, Options, SourceTree};

mod lower;
#[cfg(test)]
mod test;

/// The result of parsing a source. Owns the source, the AST and the errors
/// found while parsing, so it's independent of the parser which built it.
pub struct Tree {
    language: Language,
    source: String,
    source_id: u16,
    display: DisplayOptions,
    ast: Option<SourceFile>,
    errors: Vec<Error>,
    nodes: Vec<NodeData>,
    index: SourceIndex,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    kind: NodeKind,
    /// Field of this node within its parent
    field: Option<Field>,
    start_byte: usize,
    end_byte: usize,
    parent: Option<usize>,
    children: Vec<usize>,
    has_error: bool,
}

impl NodeData {
    /// Whether the byte range lies within this node. An empty range must be
    /// strictly inside, so that a position at the edge of a node belongs to
    /// its parent.
    fn contains(&self, start: usize, end: usize) -> bool {
        if start == end {
            self.start_byte < start && end < self.end_byte
        } else {
            self.start_byte <= start && end <= self.end_byte
        }
    }
}

impl Tree {
    pub(crate) fn parse(language: Language, source: &str, options: &Options) -> Tree {
        let source_id = options.source_id;
        let (tokens, ast, errors) = lun_parser::parse_source_with_tokens(source, source_id);

        let comments: Vec<_> = tokens
            .into_iter()
            .filter(|t| matches!(t.kind, TokenKind::Comment(_)))
            .map(|t| t.span)
            .collect();

        let index = SourceIndex::new(source);
        let nodes = lower::lower(&index, ast.as_ref(), &comments, &errors);
        log::trace!(
            "lowered {} nodes, with {} comments & {} errors",
            nodes.len(),
            comments.len(),
            errors.len()
        );

        Tree {
            language,
            source: source.to_string(),
            source_id,
            display: options.display,
            ast,
            errors,
            nodes,
            index,
        }
    }

    pub fn root_node(&self) -> Node<'_> {
        Node { tree: self, id: 0 }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The AST, which is partial when the source has errors.
    pub fn ast(&self) -> Option<&SourceFile> {
        self.ast.as_ref()
    }

    pub fn into_ast(self) -> Option<SourceFile> {
        self.ast
    }

    /// Lexer & parser errors, in the order they were found.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty() || self.root_node().has_error()
    }

    /// Errors, with their locations & pretty displays.
    pub fn error_messages(&self) -> ErrorMessages {
        let sources =
            SourceTree::single_with_id(self.source_id, PathBuf::new(), self.source.clone());

        ErrorMessages::from(self.errors.clone())
            .composed(&sources)
            .with_display(&self.display)
    }

    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }

    fn node(&self, id: usize) -> Node<'_> {
        Node { tree: self, id }
    }
}

impl Debug for Tree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{Tree {:?}}}", self.root_node())
    }
}

/// A node of a [Tree]. Cheap to copy; borrows the tree.
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    tree: &'tree Tree,
    id: usize,
}

impl<'tree> Node<'tree> {
    /// Index of the node within its tree, unique for that tree.
    pub fn id(&self) -> usize {
        self.id
    }

    fn data(&self) -> &'tree NodeData {
        &self.tree.nodes[self.id]
    }

    pub fn kind(&self) -> &'static str {
        self.data().kind.name()
    }

    pub fn kind_id(&self) -> u16 {
        self.data().kind.id()
    }

    pub fn node_kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn is_named(&self) -> bool {
        self.data().kind.is_named()
    }

    pub fn is_error(&self) -> bool {
        self.data().kind == NodeKind::Error
    }

    /// Whether this node is, or contains, an `ERROR` node.
    pub fn has_error(&self) -> bool {
        self.data().has_error
    }

    pub fn start_byte(&self) -> usize {
        self.data().start_byte
    }

    pub fn end_byte(&self) -> usize {
        self.data().end_byte
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start_byte()..self.end_byte()
    }

    pub fn start_position(&self) -> Point {
        self.tree.index.point(self.start_byte())
    }

    pub fn end_position(&self) -> Point {
        self.tree.index.point(self.end_byte())
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn child(&self, i: usize) -> Option<Node<'tree>> {
        let id = *self.data().children.get(i)?;
        Some(self.tree.node(id))
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = Node<'tree>> + 'tree {
        let tree = self.tree;
        self.data().children.iter().map(move |id| tree.node(*id))
    }

    pub fn named_child_count(&self) -> usize {
        self.children().filter(|c| c.is_named()).count()
    }

    pub fn named_child(&self, i: usize) -> Option<Node<'tree>> {
        self.named_children().nth(i)
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'tree>> + 'tree {
        self.children().filter(|c| c.is_named())
    }

    /// Field under which this node is attached to its parent.
    pub fn field(&self) -> Option<Field> {
        self.data().field
    }

    pub fn child_by_field(&self, field: Field) -> Option<Node<'tree>> {
        self.children().find(|c| c.field() == Some(field))
    }

    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'tree>> {
        self.children()
            .find(|c| c.field().is_some_and(|f| f.name() == name))
    }

    pub fn children_by_field_name<'a>(
        &self,
        name: &'a str,
    ) -> impl Iterator<Item = Node<'tree>> + 'a
    where
        'tree: 'a,
    {
        self.children()
            .filter(move |c| c.field().is_some_and(|f| f.name() == name))
    }

    pub fn field_name_for_child(&self, i: usize) -> Option<&'static str> {
        self.child(i)?.field().map(Field::name)
    }

    pub fn parent(&self) -> Option<Node<'tree>> {
        self.data().parent.map(|id| self.tree.node(id))
    }

    pub fn next_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let siblings = &parent.data().children;
        let position = siblings.iter().position(|id| *id == self.id)?;
        parent.child(position + 1)
    }

    pub fn utf8_text<'a>(&self, source: &'a [u8]) -> Result<&'a str, Utf8Error> {
        std::str::from_utf8(&source[self.start_byte()..self.end_byte()])
    }

    /// The node as an S-expression, with fields. Comments are included.
    pub fn to_sexp(&self) -> String {
        let mut res = String::new();
        self.write_sexp(&mut res);
        res
    }

    fn write_sexp(&self, res: &mut String) {
        ensure_sufficient_stack(|| {
            res.push('(');
            res.push_str(self.kind());
            for child in self.children() {
                res.push(' ');
                if let Some(field) = child.field() {
                    res.push_str(field.name());
                    res.push_str(": ");
                }
                child.write_sexp(res);
            }
            res.push(')');
        })
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl Debug for Node<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Node {} {} - {}}}",
            self.kind(),
            self.start_position(),
            self.end_position()
        )
    }
}

/// Lowering & printing recurse once per level of nesting, which the source
/// doesn't bound.
const RED_ZONE: usize = 100 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, first growing the stack if less than [RED_ZONE] is left.
#[cfg(not(target_family = "wasm"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// wasm has a fixed stack, so there's nothing to grow.
#[cfg(target_family = "wasm")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// A position in a source, as a 0-based row and a 0-based column in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Point { row, column }
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Maps the char offsets of spans to byte offsets & positions.
#[derive(Debug, Clone)]
pub(crate) struct SourceIndex {
    char_to_byte: Vec<usize>,
    line_starts: Vec<usize>,
}

impl SourceIndex {
    fn new(source: &str) -> Self {
        let char_to_byte = source
            .char_indices()
            .map(|(i, _)| i)
            .chain(once(source.len()))
            .collect();
        let line_starts = once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        SourceIndex {
            char_to_byte,
            line_starts,
        }
    }

    /// Byte offset of a char offset. Offsets past the end are clamped.
    fn byte(&self, char_offset: usize) -> usize {
        let last = self.char_to_byte.len() - 1;
        self.char_to_byte[char_offset.min(last)]
    }

    fn char_count(&self) -> usize {
        self.char_to_byte.len() - 1
    }

    fn point(&self, byte: usize) -> Point {
        let row = self
            .line_starts
            .partition_point(|start| *start <= byte)
            .saturating_sub(1);
        Point {
            row,
            column: byte - self.line_starts[row],
        }
    }
}
