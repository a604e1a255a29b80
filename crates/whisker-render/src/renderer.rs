//! Document rendering.
//!
//! [`DocumentRenderer`] walks a [`Document`] against a [`RenderContext`] and
//! produces text. It never mutates the document, so one document can be
//! rendered from any number of threads at once.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value;
use whisker_core::{BlockNode, Document, ExpressionNode, Node, PartialNode, TemplateError};

use crate::context::RenderContext;
use crate::escape::escape_html_into;
use crate::helpers::{BlockHelpers, HelperBlock};

/// Default bound on nested partial invocations.
pub const DEFAULT_MAX_PARTIAL_DEPTH: usize = 64;

/// Turns a document plus a context into text.
pub trait Renderer: Send + Sync {
    /// Render `document` in `context`.
    fn render(&self, document: &Document, context: &RenderContext<'_>) -> Result<String, TemplateError>;
}

/// Knobs for [`DocumentRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Escape `{{path}}` output. Raw tags are never escaped.
    pub escape_html: bool,
    /// Deepest allowed partial nesting.
    pub max_partial_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            escape_html: true,
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
        }
    }
}

/// The built-in renderer: expressions, partials, and blocks dispatched to
/// [`BlockHelpers`].
#[derive(Debug, Clone, Default)]
pub struct DocumentRenderer {
    options: RenderOptions,
    helpers: Arc<BlockHelpers>,
}

impl DocumentRenderer {
    /// A renderer with the built-in block helpers.
    pub fn new(options: RenderOptions) -> Self {
        Self::with_helpers(options, BlockHelpers::builtin())
    }

    /// A renderer dispatching blocks to `helpers`.
    pub fn with_helpers(options: RenderOptions, helpers: BlockHelpers) -> Self {
        Self {
            options,
            helpers: Arc::new(helpers),
        }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn helpers(&self) -> &BlockHelpers {
        &self.helpers
    }

    pub(crate) fn render_nodes(
        &self,
        nodes: &[Node],
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(&text.content),
                Node::Comment(_) => {}
                Node::Expression(expr) => self.render_expression(expr, context, out),
                Node::Block(block) => self.render_block(block, context, out)?,
                Node::Partial(partial) => self.render_partial(partial, context, out)?,
            }
        }
        Ok(())
    }

    fn render_expression(&self, expr: &ExpressionNode, context: &RenderContext<'_>, out: &mut String) {
        // Missing values render as nothing.
        let Some(value) = context.lookup(&expr.path) else {
            return;
        };

        let metadata = context.metadata();
        if expr.escape && self.options.escape_html {
            escape_html_into(&metadata.display(&value), out);
        } else {
            metadata.write_display(&value, out);
        }
    }

    fn render_block(
        &self,
        block: &BlockNode,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        let helper = self
            .helpers
            .get(&block.helper)
            .ok_or_else(|| TemplateError::unknown_helper(&block.helper))?;
        helper.render(&HelperBlock::new(self, block, context), out)
    }

    fn render_partial(
        &self,
        partial: &PartialNode,
        context: &RenderContext<'_>,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        let limit = self.options.max_partial_depth;
        if context.depth() >= limit {
            return Err(TemplateError::PartialDepthExceeded {
                name: partial.name.clone(),
                limit,
            });
        }

        let scope = partial
            .context
            .as_ref()
            .map(|path| context.lookup(path).unwrap_or(Cow::Owned(Value::Null)));
        let nested = context.for_partial(scope);
        let text = context.partials().resolve_partial(&partial.name, &nested)?;
        out.push_str(&text);
        Ok(())
    }
}

impl Renderer for DocumentRenderer {
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn render(&self, document: &Document, context: &RenderContext<'_>) -> Result<String, TemplateError> {
        let mut out = String::new();
        self.render_nodes(&document.nodes, context, &mut out)?;
        Ok(out)
    }
}
