//! The parsed template tree.
//!
//! A [`Document`] is produced by a parser, normalized by the transform
//! pipeline, and then frozen inside a compiled render function. Nothing
//! mutates a document once it has been captured, so one tree can serve any
//! number of concurrent renders.

use std::fmt;

use crate::Span;

/// A parsed template: an ordered list of top-level nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Top-level nodes in source order.
    pub nodes: Vec<Node>,
}

impl Document {
    /// Create a document from its top-level nodes.
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Whether the document has no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names of every partial the document invokes, in first-use order.
    pub fn referenced_partials(&self) -> Vec<&str> {
        crate::visitor::PartialCollector::collect(self)
    }
}

/// One node of a template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text copied to the output.
    Text(TextNode),
    /// `{{path}}`, `{{{path}}}` or `{{& path}}`.
    Expression(ExpressionNode),
    /// `{{! ... }}`; produces no output.
    Comment(CommentNode),
    /// `{{#helper arg}} ... {{else}} ... {{/helper}}`.
    Block(BlockNode),
    /// `{{> name}}` or `{{> name path}}`.
    Partial(PartialNode),
}

impl Node {
    /// Source location of the node.
    pub fn span(&self) -> Span {
        match self {
            Node::Text(node) => node.span,
            Node::Expression(node) => node.span,
            Node::Comment(node) => node.span,
            Node::Block(node) => node.span,
            Node::Partial(node) => node.span,
        }
    }

    /// Leading `~` of the node's (opening) tag. Text has none.
    pub fn trims_before(&self) -> bool {
        match self {
            Node::Text(_) => false,
            Node::Expression(node) => node.trim.left,
            Node::Comment(node) => node.trim.left,
            Node::Block(node) => node.open_trim.left,
            Node::Partial(node) => node.trim.left,
        }
    }

    /// Trailing `~` of the node's (closing) tag. Text has none.
    pub fn trims_after(&self) -> bool {
        match self {
            Node::Text(_) => false,
            Node::Expression(node) => node.trim.right,
            Node::Comment(node) => node.trim.right,
            Node::Block(node) => node.close_trim.right,
            Node::Partial(node) => node.trim.right,
        }
    }
}

/// `~` whitespace control on either side of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Trim {
    /// `{{~`: strip whitespace before the tag.
    pub left: bool,
    /// `~}}`: strip whitespace after the tag.
    pub right: bool,
}

impl Trim {
    /// Trim markers for a tag.
    pub fn new(left: bool, right: bool) -> Self {
        Self { left, right }
    }
}

/// Literal text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub content: String,
    pub span: Span,
}

/// A value substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionNode {
    pub path: Path,
    /// `false` for `{{{ }}}` and `{{& }}`.
    pub escape: bool,
    pub trim: Trim,
    pub span: Span,
}

/// A template comment.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub content: String,
    pub trim: Trim,
    pub span: Span,
}

/// A block helper with its main body and optional `{{else}}` section.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    /// Helper name from `{{#name}}`.
    pub helper: String,
    pub argument: Path,
    pub body: Vec<Node>,
    pub inverse: Option<Vec<Node>>,
    /// Markers on `{{#helper}}`.
    pub open_trim: Trim,
    /// Markers on `{{else}}`, when present.
    pub else_trim: Trim,
    /// Markers on `{{/helper}}`.
    pub close_trim: Trim,
    pub span: Span,
}

/// A partial invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialNode {
    pub name: String,
    /// Context to render the partial in; `None` keeps the current one.
    pub context: Option<Path>,
    pub trim: Trim,
    pub span: Span,
}

/// A reference to a value in the render context.
///
/// `../../user.name` is `Path { parents: 2, root: PathRoot::Context,
/// segments: ["user", "name"] }`; `@index` is `PathRoot::Data("index")`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    /// Number of `../` hops up the context chain.
    pub parents: usize,
    pub root: PathRoot,
    /// Member names after the root. Empty means the root value itself.
    pub segments: Vec<String>,
}

impl Path {
    /// The current context value (`this` or `.`).
    pub fn this() -> Self {
        Self::default()
    }

    /// A plain dotted path from the current context.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parents: 0,
            root: PathRoot::Context,
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the path names the current context itself.
    pub fn is_this(&self) -> bool {
        self.parents == 0 && self.root == PathRoot::Context && self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.parents {
            f.write_str("../")?;
        }
        match &self.root {
            PathRoot::Context if self.segments.is_empty() => return f.write_str("this"),
            PathRoot::Context => {}
            PathRoot::Data(name) => {
                write!(f, "@{name}")?;
                if !self.segments.is_empty() {
                    f.write_str(".")?;
                }
            }
        }
        f.write_str(&self.segments.join("."))
    }
}

/// Where a path starts resolving.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PathRoot {
    /// The current context value.
    #[default]
    Context,
    /// A `@name` data variable such as `@index` or `@root`.
    Data(String),
}
