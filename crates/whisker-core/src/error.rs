//! Error types shared by every stage of the template host.
//!
//! ## Error Hierarchy
//!
//! ```text
//! TemplateError (top-level, returned by the service and by render functions)
//! ├── Syntax                - ParseErrors: every diagnostic from one parse
//! ├── UnknownTemplate       - run() on a name with no cached template
//! ├── UnknownPartial        - run_partial() / {{> name}} on an unregistered name
//! ├── UnknownHelper         - a block whose helper the renderer does not have
//! ├── PartialDepthExceeded  - recursive partials nested past the configured limit
//! └── Model                 - a Serialize model failed to convert to JSON
//! ```
//!
//! A [`ParseError`] displays as `line:col: message`. [`ParseErrors`] joins
//! those lines with `\n` and never drops any of them, so a caller sees every
//! problem from a single compile attempt.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of template syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// `{{` without a matching `}}`.
    UnterminatedTag,
    /// `{{!--` without a matching `--}}`.
    UnterminatedComment,
    /// A tag with nothing between its delimiters.
    EmptyTag,
    /// A path expression that cannot be parsed.
    InvalidPath,
    /// A tag with more arguments than it accepts.
    UnexpectedArgument,
    /// `{{#name}}` where `name` is not a known block helper.
    UnknownBlock,
    /// A block helper that requires an argument was given none.
    MissingArgument,
    /// `{{/name}}` that does not close the innermost open block.
    MismatchedClose,
    /// `{{/name}}` with no open block at all.
    UnexpectedClose,
    /// `{{else}}` outside a block, or a second `{{else}}` in one block.
    UnexpectedElse,
    /// `{{>}}` without a partial name.
    MissingPartialName,
    /// A block still open at end of input.
    UnclosedBlock,
    /// Blocks nested past the parser's depth limit.
    NestingTooDeep,
}

impl ParseErrorKind {
    /// Short lowercase label, e.g. `"unclosed block"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::UnterminatedTag => "unterminated tag",
            ParseErrorKind::UnterminatedComment => "unterminated comment",
            ParseErrorKind::EmptyTag => "empty tag",
            ParseErrorKind::InvalidPath => "invalid path",
            ParseErrorKind::UnexpectedArgument => "unexpected argument",
            ParseErrorKind::UnknownBlock => "unknown block helper",
            ParseErrorKind::MissingArgument => "missing argument",
            ParseErrorKind::MismatchedClose => "mismatched closing tag",
            ParseErrorKind::UnexpectedClose => "unexpected closing tag",
            ParseErrorKind::UnexpectedElse => "unexpected else",
            ParseErrorKind::MissingPartialName => "missing partial name",
            ParseErrorKind::UnclosedBlock => "unclosed block",
            ParseErrorKind::NestingTooDeep => "nesting too deep",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic: where the parser gave up on a construct, and why.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{span}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Start of the offending tag or block.
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "unterminated tag" error.
    pub fn unterminated_tag(span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnterminatedTag,
            span,
            "tag opened with '{{' is never closed with '}}'",
        )
    }

    /// Create an "unclosed block" error for the block opened at `span`.
    pub fn unclosed_block(span: Span, helper: &str) -> Self {
        Self::new(
            ParseErrorKind::UnclosedBlock,
            span,
            format!("block '{helper}' is never closed with '{{{{/{helper}}}}}'"),
        )
    }

    /// The diagnostic followed by the offending source line, with the span
    /// underlined:
    ///
    /// ```text
    /// 2:3: empty tag
    ///    |
    ///  2 |   {{}} there
    ///    |   ^~~~
    /// ```
    pub fn display_with_source(&self, source: &str) -> String {
        let mut out = format!("{self}\n");
        let line_text = (self.span.line as usize)
            .checked_sub(1)
            .and_then(|index| source.lines().nth(index));

        if let Some(text) = line_text {
            let gutter = self.span.line.to_string();
            let blank = " ".repeat(gutter.len());
            let indent = " ".repeat(self.span.col.saturating_sub(1) as usize);
            out.push_str(&format!(" {blank} |\n"));
            out.push_str(&format!(" {gutter} | {text}\n"));
            out.push_str(&format!(" {blank} | {indent}{}\n", self.span.underline()));
        }
        out
    }
}

/// Every diagnostic produced by one parse.
///
/// A successful parse produces none; a failed parse produces at least one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Diagnostics in report order.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// Sort diagnostics by source position.
    ///
    /// The parser reports structural errors (unclosed blocks) after the tag
    /// errors it found along the way; sorting restores reading order.
    pub fn sort_by_location(&mut self) {
        self.errors
            .sort_by_key(|error| (error.span.line, error.span.col));
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl FromIterator<ParseError> for ParseErrors {
    fn from_iter<I: IntoIterator<Item = ParseError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

/// One `location: message` line per diagnostic.
impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut errors = self.errors.iter();
        if let Some(first) = errors.next() {
            write!(f, "{first}")?;
        }
        errors.try_for_each(|error| write!(f, "\n{error}"))
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Template Errors
// ============================================================================

/// Errors surfaced by compiling, running, or rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The parser rejected the template source.
    #[error("{0}")]
    Syntax(#[from] ParseErrors),

    /// No template has been compiled under this name.
    #[error("no template called '{name}' has been compiled")]
    UnknownTemplate {
        /// The name that was looked up.
        name: String,
    },

    /// No partial has been registered under this name.
    #[error("no partial template called '{name}' has been registered")]
    UnknownPartial {
        /// The name that was looked up.
        name: String,
    },

    /// A block names a helper the renderer was not given. Only happens when
    /// the parser and renderer were configured with different helper sets.
    #[error("no block helper called '{name}' is registered with the renderer")]
    UnknownHelper {
        /// The helper name from `{{#name}}`.
        name: String,
    },

    /// Partials nested deeper than the configured limit.
    #[error("partial '{name}' exceeded the maximum nesting depth of {limit}")]
    PartialDepthExceeded {
        /// The partial that would have crossed the limit.
        name: String,
        /// The configured limit.
        limit: usize,
    },

    /// A model could not be converted into a JSON value.
    #[error("model could not be converted to a template value: {0}")]
    Model(#[from] serde_json::Error),
}

impl TemplateError {
    /// Create an [`TemplateError::UnknownTemplate`] error.
    pub fn unknown_template(name: impl Into<String>) -> Self {
        Self::UnknownTemplate { name: name.into() }
    }

    /// Create an [`TemplateError::UnknownPartial`] error.
    pub fn unknown_partial(name: impl Into<String>) -> Self {
        Self::UnknownPartial { name: name.into() }
    }

    /// Create an [`TemplateError::UnknownHelper`] error.
    pub fn unknown_helper(name: impl Into<String>) -> Self {
        Self::UnknownHelper { name: name.into() }
    }

    /// The diagnostics behind a syntax error, if this is one.
    pub fn diagnostics(&self) -> Option<&ParseErrors> {
        match self {
            TemplateError::Syntax(errors) => Some(errors),
            _ => None,
        }
    }
}
