//! Shared vocabulary for the whisker template host.
//!
//! This crate is depended on by every other whisker crate. It provides:
//! - [`Span`] source locations
//! - [`BlockTable`], the block helper names a parser accepts
//! - The [`Document`] tree that parsers produce and renderers consume
//! - [`visitor`] traits for walking and rewriting documents
//! - Error types: [`ParseError`] diagnostics and the top-level [`TemplateError`]

pub mod blocks;
pub mod document;
pub mod error;
pub mod span;
pub mod visitor;

pub use blocks::{BUILTIN_BLOCKS, BlockArgument, BlockTable};
pub use document::{
    BlockNode, CommentNode, Document, ExpressionNode, Node, PartialNode, Path,
    PathRoot, TextNode, Trim,
};
pub use error::{ParseError, ParseErrorKind, ParseErrors, TemplateError};
pub use span::Span;

/// Result alias used across the workspace.
pub type TemplateResult<T> = Result<T, TemplateError>;
