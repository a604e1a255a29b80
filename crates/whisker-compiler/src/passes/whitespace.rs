//! `~` whitespace control.
//!
//! A `~` inside a tag delimiter strips all whitespace from the adjacent text
//! on that side: `{{~x}}` eats the whitespace before the tag, `{{x~}}` the
//! whitespace after it. Block tags apply their inner markers to the edges of
//! the sections they delimit. Text left empty is removed.

use whisker_core::visitor::{VisitorMut, walk_block_mut, walk_nodes_mut};
use whisker_core::{BlockNode, Document, Node, TextNode};

use super::DocumentTransform;

/// Applies `~` whitespace control to a whole document.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceCollapser;

impl WhitespaceCollapser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentTransform for WhitespaceCollapser {
    fn name(&self) -> &str {
        "whitespace-collapse"
    }

    fn transform(&self, mut document: Document) -> Document {
        CollapseVisitor.visit_document_mut(&mut document);
        document
    }
}

struct CollapseVisitor;

impl VisitorMut for CollapseVisitor {
    fn visit_nodes_mut(&mut self, nodes: &mut Vec<Node>) {
        walk_nodes_mut(self, nodes);

        for i in 0..nodes.len() {
            if i > 0 && nodes[i].trims_before() {
                if let Node::Text(text) = &mut nodes[i - 1] {
                    trim_end(text);
                }
            }
            if i + 1 < nodes.len() && nodes[i].trims_after() {
                if let Node::Text(text) = &mut nodes[i + 1] {
                    trim_start(text);
                }
            }
        }

        nodes.retain(|node| !matches!(node, Node::Text(text) if text.content.is_empty()));
    }

    fn visit_block_mut(&mut self, block: &mut BlockNode) {
        let body_end = match block.inverse {
            Some(_) => block.else_trim.left,
            None => block.close_trim.left,
        };
        trim_section(&mut block.body, block.open_trim.right, body_end);

        if let Some(inverse) = &mut block.inverse {
            trim_section(inverse, block.else_trim.right, block.close_trim.left);
        }

        walk_block_mut(self, block);
    }
}

/// Trim the inner edges of a block section.
fn trim_section(nodes: &mut [Node], start: bool, end: bool) {
    if start {
        if let Some(Node::Text(text)) = nodes.first_mut() {
            trim_start(text);
        }
    }
    if end {
        if let Some(Node::Text(text)) = nodes.last_mut() {
            trim_end(text);
        }
    }
}

fn trim_start(text: &mut TextNode) {
    let trimmed = text.content.trim_start();
    if trimmed.len() != text.content.len() {
        text.content = trimmed.to_string();
    }
}

fn trim_end(text: &mut TextNode) {
    let len = text.content.trim_end().len();
    text.content.truncate(len);
}
