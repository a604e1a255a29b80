//! Visitor pattern for traversing documents.
//!
//! [`Visitor`] walks a tree by shared reference; [`VisitorMut`] walks it by
//! mutable reference and is what transform stages build on. Each `visit_*`
//! method defaults to the matching `walk_*` function, so an implementation
//! overrides only the nodes it cares about.
//!
//! # Example
//!
//! ```
//! use whisker_core::visitor::Visitor;
//! use whisker_core::{Document, ExpressionNode, Node, Path, Span, Trim};
//!
//! #[derive(Default)]
//! struct ExpressionCounter {
//!     count: usize,
//! }
//!
//! impl Visitor for ExpressionCounter {
//!     fn visit_expression(&mut self, _expr: &ExpressionNode) {
//!         self.count += 1;
//!     }
//! }
//!
//! let document = Document::new(vec![Node::Expression(ExpressionNode {
//!     path: Path::from_segments(["name"]),
//!     escape: true,
//!     trim: Trim::default(),
//!     span: Span::new(1, 1, 8),
//! })]);
//!
//! let mut counter = ExpressionCounter::default();
//! counter.visit_document(&document);
//! assert_eq!(counter.count, 1);
//! ```

use crate::document::*;

/// Read-only traversal of a document.
pub trait Visitor: Sized {
    /// Visit the document root.
    fn visit_document(&mut self, document: &Document) {
        walk_document(self, document);
    }

    /// Visit a list of sibling nodes (document root, block body or inverse).
    fn visit_nodes(&mut self, nodes: &[Node]) {
        walk_nodes(self, nodes);
    }

    /// Visit any node.
    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_text(&mut self, _text: &TextNode) {}

    fn visit_expression(&mut self, expr: &ExpressionNode) {
        self.visit_path(&expr.path);
    }

    fn visit_comment(&mut self, _comment: &CommentNode) {}

    /// Visit a block; walks the argument, the body, then the inverse.
    fn visit_block(&mut self, block: &BlockNode) {
        walk_block(self, block);
    }

    fn visit_partial(&mut self, partial: &PartialNode) {
        if let Some(context) = &partial.context {
            self.visit_path(context);
        }
    }

    fn visit_path(&mut self, _path: &Path) {}
}

pub fn walk_document<V: Visitor>(visitor: &mut V, document: &Document) {
    visitor.visit_nodes(&document.nodes);
}

pub fn walk_nodes<V: Visitor>(visitor: &mut V, nodes: &[Node]) {
    for node in nodes {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    match node {
        Node::Text(text) => visitor.visit_text(text),
        Node::Expression(expr) => visitor.visit_expression(expr),
        Node::Comment(comment) => visitor.visit_comment(comment),
        Node::Block(block) => visitor.visit_block(block),
        Node::Partial(partial) => visitor.visit_partial(partial),
    }
}

pub fn walk_block<V: Visitor>(visitor: &mut V, block: &BlockNode) {
    visitor.visit_path(&block.argument);
    visitor.visit_nodes(&block.body);
    if let Some(inverse) = &block.inverse {
        visitor.visit_nodes(inverse);
    }
}

/// Mutable traversal of a document.
///
/// Sibling lists are handed over as `&mut Vec<Node>` so an implementation can
/// edit neighbouring nodes or drop nodes entirely.
pub trait VisitorMut: Sized {
    fn visit_document_mut(&mut self, document: &mut Document) {
        walk_document_mut(self, document);
    }

    fn visit_nodes_mut(&mut self, nodes: &mut Vec<Node>) {
        walk_nodes_mut(self, nodes);
    }

    fn visit_node_mut(&mut self, node: &mut Node) {
        walk_node_mut(self, node);
    }

    fn visit_text_mut(&mut self, _text: &mut TextNode) {}

    fn visit_block_mut(&mut self, block: &mut BlockNode) {
        walk_block_mut(self, block);
    }
}

pub fn walk_document_mut<V: VisitorMut>(visitor: &mut V, document: &mut Document) {
    visitor.visit_nodes_mut(&mut document.nodes);
}

pub fn walk_nodes_mut<V: VisitorMut>(visitor: &mut V, nodes: &mut Vec<Node>) {
    for node in nodes.iter_mut() {
        visitor.visit_node_mut(node);
    }
}

pub fn walk_node_mut<V: VisitorMut>(visitor: &mut V, node: &mut Node) {
    match node {
        Node::Text(text) => visitor.visit_text_mut(text),
        Node::Block(block) => visitor.visit_block_mut(block),
        Node::Expression(_) | Node::Comment(_) | Node::Partial(_) => {}
    }
}

pub fn walk_block_mut<V: VisitorMut>(visitor: &mut V, block: &mut BlockNode) {
    visitor.visit_nodes_mut(&mut block.body);
    if let Some(inverse) = &mut block.inverse {
        visitor.visit_nodes_mut(inverse);
    }
}

/// Collects partial names in first-use order, without duplicates.
#[derive(Debug, Default)]
pub struct PartialCollector<'doc> {
    names: Vec<&'doc str>,
}

impl<'doc> PartialCollector<'doc> {
    /// Collect every partial name referenced anywhere in `document`.
    pub fn collect(document: &'doc Document) -> Vec<&'doc str> {
        let mut collector = Self::default();
        collector.collect_nodes(&document.nodes);
        collector.names
    }

    fn collect_nodes(&mut self, nodes: &'doc [Node]) {
        for node in nodes {
            match node {
                Node::Partial(partial) => {
                    if !self.names.contains(&partial.name.as_str()) {
                        self.names.push(&partial.name);
                    }
                }
                Node::Block(block) => {
                    self.collect_nodes(&block.body);
                    if let Some(inverse) = &block.inverse {
                        self.collect_nodes(inverse);
                    }
                }
                Node::Text(_) | Node::Expression(_) | Node::Comment(_) => {}
            }
        }
    }
}
