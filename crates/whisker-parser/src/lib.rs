//! Whisker parser crate.
//!
//! This crate turns template source into a [`Document`]. It includes:
//! - Lexical analysis (text runs and `{{ }}` tags)
//! - Path expression parsing
//! - A recovering tree builder that reports every diagnostic in one pass
//! - The [`TemplateParser`] trait the compilation service parses through
//!
//! # Example
//!
//! ```
//! use whisker_parser::HandlebarsParser;
//!
//! let source = "Hello {{#if user}}{{user.name}}{{else}}stranger{{/if}}!";
//!
//! match HandlebarsParser::parse(source) {
//!     Ok(document) => println!("parsed {} top-level nodes", document.nodes.len()),
//!     Err(errors) => eprintln!("syntax errors:\n{errors}"),
//! }
//! ```

pub mod lexer;
mod parser;
pub mod path;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::MAX_BLOCK_DEPTH;
pub use path::parse_path;

use whisker_core::{BlockTable, Document, ParseErrors};

/// Source-to-document parsing, as consumed by the compilation service.
///
/// Implementations must not panic on malformed input: failure is reported as
/// a non-empty [`ParseErrors`].
pub trait TemplateParser: Send + Sync {
    /// Parse `source` into a document, or return every diagnostic found.
    fn parse(&self, source: &str) -> Result<Document, ParseErrors>;
}

/// The default parser: Handlebars-style mustache tags.
///
/// `{{#name}}` is accepted for every helper in the parser's [`BlockTable`];
/// [`HandlebarsParser::new`] knows only the built-in ones.
#[derive(Debug, Clone, Default)]
pub struct HandlebarsParser {
    blocks: BlockTable,
}

impl HandlebarsParser {
    /// Create a parser for the built-in block helpers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser that accepts the helpers in `blocks`.
    pub fn with_blocks(blocks: BlockTable) -> Self {
        Self { blocks }
    }

    /// The block helpers this parser accepts.
    pub fn blocks(&self) -> &BlockTable {
        &self.blocks
    }

    /// Parse a template with the built-in helpers, failing if any diagnostic
    /// was produced.
    pub fn parse(source: &str) -> Result<Document, ParseErrors> {
        Self::new().parse_template(source)
    }

    /// [`parse_lenient_template`](Self::parse_lenient_template) with the
    /// built-in helpers.
    pub fn parse_lenient(source: &str) -> (Document, ParseErrors) {
        Self::new().parse_lenient_template(source)
    }

    /// Parse a template, failing if any diagnostic was produced.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_template(&self, source: &str) -> Result<Document, ParseErrors> {
        let (document, errors) = self.parse_lenient_template(source);
        if errors.is_empty() {
            Ok(document)
        } else {
            Err(errors)
        }
    }

    /// Parse a template, returning whatever could be built alongside the
    /// diagnostics. Useful for tooling that wants partial results.
    pub fn parse_lenient_template(&self, source: &str) -> (Document, ParseErrors) {
        parser::Parser::new(source, &self.blocks).parse_document()
    }
}

impl TemplateParser for HandlebarsParser {
    fn parse(&self, source: &str) -> Result<Document, ParseErrors> {
        self.parse_template(source)
    }
}
