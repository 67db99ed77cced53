//! Lowering of the AST into the node arena of a [super::Tree].

use std::ops::Range;

use super::{ensure_sufficient_stack, NodeData, SourceIndex};
use crate::ast::*;
use crate::lr::{IntegerLit, Literal, StringLit, StringPart};
use crate::{Error, Field, NodeKind};

const ROOT: usize = 0;

/// Builds the nodes of a tree. The root is always the first node, and a
/// child always comes after its parent.
pub(super) fn lower(
    index: &SourceIndex,
    ast: Option<&SourceFile>,
    comments: &[Range<usize>],
    errors: &[Error],
) -> Vec<NodeData> {
    let mut lowerer = Lowerer {
        index,
        nodes: Vec::new(),
    };

    let root = lowerer.push(None, None, NodeKind::SourceFile, 0..index.char_count());
    if let Some(ast) = ast {
        for item in &ast.items {
            lowerer.item(root, item);
        }
    }

    for comment in comments {
        lowerer.insert_extra(NodeKind::Comment, comment.clone());
    }
    for span in errors.iter().filter_map(|e| e.span) {
        lowerer.insert_extra(NodeKind::Error, span.into());
    }

    lowerer.propagate_errors();
    lowerer.nodes
}

struct Lowerer<'a> {
    index: &'a SourceIndex,
    nodes: Vec<NodeData>,
}

impl Lowerer<'_> {
    fn push(
        &mut self,
        parent: Option<usize>,
        field: Option<Field>,
        kind: NodeKind,
        chars: Range<usize>,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(NodeData {
            kind,
            field,
            start_byte: self.index.byte(chars.start),
            end_byte: self.index.byte(chars.end),
            parent,
            children: Vec::new(),
            has_error: kind == NodeKind::Error,
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    fn node(&mut self, parent: usize, field: Option<Field>, kind: NodeKind, span: Span) -> usize {
        self.push(Some(parent), field, kind, span.into())
    }

    fn item(&mut self, parent: usize, item: &Item) {
        match &item.kind {
            ItemKind::GlobalDef(def) => {
                let node = self.node(parent, None, NodeKind::GlobalDefItem, item.span);
                self.ident(node, Field::Name, &def.name);
                if let Some(ty) = &def.ty {
                    self.type_expr(node, ty);
                }
                self.expr(node, Some(Field::Value), &def.value);
            }
        }
    }

    fn type_expr(&mut self, parent: usize, ty: &TypeExpr) {
        match ty {
            TypeExpr::Primitive(primitive) => {
                self.node(
                    parent,
                    Some(Field::Typeexpr),
                    NodeKind::PrimitiveType,
                    primitive.span,
                );
            }
            TypeExpr::Expr(expr) => self.expr(parent, Some(Field::Typeexpr), expr),
        }
    }

    fn ident(&mut self, parent: usize, field: Field, ident: &Ident) {
        self.node(parent, Some(field), NodeKind::Identifier, ident.span);
    }

    fn expr(&mut self, parent: usize, field: Option<Field>, expr: &Expr) {
        ensure_sufficient_stack(|| self.expr_kind(parent, field, expr))
    }

    fn expr_kind(&mut self, parent: usize, field: Option<Field>, expr: &Expr) {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Bool(_) => {
                self.node(parent, field, NodeKind::BoolExpr, span);
            }
            ExprKind::Literal(lit) => {
                let node = self.node(parent, field, NodeKind::LitExpr, span);
                self.literal(node, lit, span);
            }
            ExprKind::Null => {
                self.node(parent, field, NodeKind::NullExpr, span);
            }
            ExprKind::Paren(inner) => {
                let node = self.node(parent, field, NodeKind::ParenExpr, span);
                self.expr(node, None, inner);
            }
            ExprKind::Path(path) => {
                let node = self.node(parent, field, NodeKind::PathExpr, span);
                let path_node = self.node(node, None, NodeKind::Path, span);
                if let PathRoot::Ident(first) = &path.root {
                    self.ident(path_node, Field::FirstSeg, first);
                }
                for seg in &path.segments {
                    self.ident(path_node, Field::Seg, seg);
                }
            }
            ExprKind::Binary(binary) => {
                let node = self.node(parent, field, NodeKind::BinaryExpr, span);
                self.expr(node, Some(Field::Lhs), &binary.lhs);
                self.node(
                    node,
                    Some(Field::Op),
                    bin_op_kind(binary.op.node),
                    binary.op.span,
                );
                self.expr(node, Some(Field::Rhs), &binary.rhs);
            }
            ExprKind::Assign(assign) => {
                let node = self.node(parent, field, NodeKind::AssignExpr, span);
                self.expr(node, Some(Field::Lhs), &assign.lhs);
                self.expr(node, Some(Field::Rhs), &assign.rhs);
            }
            ExprKind::Unary(unary) => {
                let node = self.node(parent, field, NodeKind::LeftUnaryExpr, span);
                let op = match unary.op.node {
                    UnOp::Neg => NodeKind::Sub,
                    UnOp::Not => NodeKind::Not,
                };
                self.node(node, Some(Field::Op), op, unary.op.span);
                self.expr(node, None, &unary.expr);
            }
            ExprKind::Deref(inner) => {
                let node = self.node(parent, field, NodeKind::RightUnaryExpr, span);
                self.expr(node, None, inner);
                // `.*` is the last token of the expression
                let deref = span.end.saturating_sub(2)..span.end;
                self.push(Some(node), Some(Field::Deref), NodeKind::Deref, deref);
            }
            ExprKind::Borrow(borrow) => {
                let node = self.node(parent, field, NodeKind::BorrowExpr, span);
                if let Some(mut_span) = borrow.mut_span {
                    self.node(node, None, NodeKind::MutSpec, mut_span);
                }
                self.expr(node, None, &borrow.expr);
            }
            ExprKind::Call(call) => {
                let node = self.node(parent, field, NodeKind::CallExpr, span);
                self.expr(node, Some(Field::Callee), &call.callee);
                let args = self.node(node, Some(Field::Args), NodeKind::Arguments, call.args.span);
                for arg in &call.args.args {
                    self.expr(args, None, arg);
                }
            }
            ExprKind::Field(field_expr) => {
                let node = self.node(parent, field, NodeKind::FieldExpr, span);
                self.expr(node, None, &field_expr.expr);
                self.ident(node, Field::Field, &field_expr.field);
            }
            ExprKind::If(if_expr) => {
                let node = self.node(parent, field, NodeKind::IfExpr, span);
                self.expr(node, Some(Field::Cond), &if_expr.cond);
                self.block(node, Some(Field::Then), &if_expr.then);
                match if_expr.els.as_deref() {
                    Some(Else::If(els)) => self.expr(node, Some(Field::Else), els),
                    Some(Else::Block(els)) => self.block(node, Some(Field::Else), els),
                    None => {}
                }
            }
            ExprKind::Return(value) => {
                let node = self.node(parent, field, NodeKind::ReturnExpr, span);
                if let Some(value) = value {
                    self.expr(node, None, value);
                }
            }
            ExprKind::Break(break_expr) => {
                let node = self.node(parent, field, NodeKind::BreakExpr, span);
                if let Some(label) = &break_expr.label {
                    self.ident(node, Field::Label, label);
                }
                if let Some(value) = &break_expr.value {
                    self.expr(node, None, value);
                }
            }
            ExprKind::Continue(label) => {
                let node = self.node(parent, field, NodeKind::ContinueExpr, span);
                if let Some(label) = label {
                    self.ident(node, Field::Label, label);
                }
            }
            ExprKind::Block(block) => {
                let node = self.node(parent, field, NodeKind::BlockExpr, span);
                self.block(node, Some(Field::Block), block);
            }
            ExprKind::While(while_expr) => {
                let node = self.node(parent, field, NodeKind::WhileExpr, span);
                self.expr(node, Some(Field::Cond), &while_expr.cond);
                self.block(node, Some(Field::Body), &while_expr.body);
            }
            ExprKind::For(for_expr) => {
                let node = self.node(parent, field, NodeKind::ForExpr, span);
                self.ident(node, Field::Var, &for_expr.var);
                self.expr(node, Some(Field::Iterator), &for_expr.iterator);
                self.block(node, Some(Field::Body), &for_expr.body);
            }
            ExprKind::Loop(loop_expr) => {
                let node = self.node(parent, field, NodeKind::LoopExpr, span);
                self.block(node, Some(Field::Body), &loop_expr.body);
            }
            ExprKind::Labeled(labeled) => {
                let node = self.node(parent, field, NodeKind::LabeledExpr, span);
                self.ident(node, Field::Label, &labeled.label);
                // a labeled block is a bare `block`, not a `block_expr`
                match &labeled.expr.kind {
                    ExprKind::Block(block) => self.block(node, None, block),
                    _ => self.expr(node, None, &labeled.expr),
                }
            }
            ExprKind::Error => {
                self.node(parent, field, NodeKind::Error, span);
            }
        }
    }

    fn block(&mut self, parent: usize, field: Option<Field>, block: &Block) {
        let node = self.node(parent, field, NodeKind::Block, block.span);
        for stmt in &block.stmts {
            self.expr(node, Some(Field::Stmt), &stmt.expr);
        }
        if let Some(last_expr) = &block.last_expr {
            self.expr(node, Some(Field::LastExpr), last_expr);
        }
    }

    fn literal(&mut self, parent: usize, lit: &Literal, span: Span) {
        match lit {
            Literal::Integer(IntegerLit { .. }) => {
                // the tag is part of the token
                self.node(parent, None, NodeKind::IntegerLit, span);
            }
            Literal::String(StringLit { tag, parts }) => {
                let node = self.node(parent, None, NodeKind::StringLit, span);
                if let Some(tag) = tag {
                    let tag_end = span.start + tag.chars().count();
                    self.push(
                        Some(node),
                        Some(Field::Tag),
                        NodeKind::Identifier,
                        span.start..tag_end,
                    );
                }
                for part in parts {
                    let (kind, chars) = match part {
                        StringPart::Content(content) => {
                            (NodeKind::StringContent, content.span.clone())
                        }
                        StringPart::Escape(escape) => {
                            (NodeKind::EscapeSequence, escape.span.clone())
                        }
                    };
                    self.push(Some(node), None, kind, chars);
                }
            }
        }
    }

    /// Attaches a comment or an error to the innermost node containing it.
    /// Errors at an `ERROR` node are already represented by it.
    fn insert_extra(&mut self, kind: NodeKind, chars: Range<usize>) {
        let start = self.index.byte(chars.start);
        let end = self.index.byte(chars.end);

        let parent = self.container(start, end);
        if kind == NodeKind::Error && self.is_represented(parent, start, end) {
            return;
        }

        let position = self.nodes[parent]
            .children
            .partition_point(|child| self.nodes[*child].start_byte <= start);

        let id = self.nodes.len();
        self.nodes.push(NodeData {
            kind,
            field: None,
            start_byte: start,
            end_byte: end,
            parent: Some(parent),
            children: Vec::new(),
            has_error: kind == NodeKind::Error,
        });
        self.nodes[parent].children.insert(position, id);
    }

    fn container(&self, start: usize, end: usize) -> usize {
        let mut current = ROOT;
        while let Some(child) = self.nodes[current].children.iter().find(|child| {
            let node = &self.nodes[**child];
            !node.kind.is_leaf() && node.contains(start, end)
        }) {
            current = *child;
        }
        current
    }

    /// Whether an error is within an `ERROR` node, or next to one. Recovery
    /// reports the token which ended the erroneous range, just past it.
    fn is_represented(&self, container: usize, start: usize, end: usize) -> bool {
        let container = &self.nodes[container];
        container.kind == NodeKind::Error
            || container.children.iter().any(|child| {
                let node = &self.nodes[*child];
                node.kind == NodeKind::Error && node.start_byte <= end && start <= node.end_byte
            })
    }

    fn propagate_errors(&mut self) {
        // children come after their parents
        for id in (0..self.nodes.len()).rev() {
            if let (true, Some(parent)) = (self.nodes[id].has_error, self.nodes[id].parent) {
                self.nodes[parent].has_error = true;
            }
        }
    }
}

fn bin_op_kind(op: BinOp) -> NodeKind {
    match op {
        BinOp::Mul => NodeKind::Mul,
        BinOp::Div => NodeKind::Div,
        BinOp::Mod => NodeKind::Mod,
        BinOp::Add => NodeKind::Add,
        BinOp::Sub => NodeKind::Sub,
        BinOp::Shl => NodeKind::Shl,
        BinOp::Shr => NodeKind::Shr,
        BinOp::BitAnd => NodeKind::BitAnd,
        BinOp::BitXor => NodeKind::BitXor,
        BinOp::BitOr => NodeKind::BitOr,
        BinOp::Eq => NodeKind::Eq,
        BinOp::Ne => NodeKind::Ne,
        BinOp::Gt => NodeKind::Gt,
        BinOp::Lt => NodeKind::Lt,
        BinOp::Gte => NodeKind::Gte,
        BinOp::Lte => NodeKind::Lte,
        BinOp::And => NodeKind::And,
        BinOp::Or => NodeKind::Or,
    }
}
