//! Token types produced by the template lexer.

use std::fmt;

use whisker_core::{Span, Trim};

/// A token from the template source.
///
/// For tags, `lexeme` is the tag body with delimiters, the sigil and any `~`
/// markers removed, trimmed of surrounding whitespace. For text it is the
/// text run verbatim.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'src> {
    /// The type of token.
    pub kind: TokenKind,
    /// Text run or tag body, borrowed from the source.
    pub lexeme: &'src str,
    /// `~` markers on the tag delimiters.
    pub trim: Trim,
    /// Location in source; for tags this covers the whole tag.
    pub span: Span,
}

impl<'src> Token<'src> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'src str, trim: Trim, span: Span) -> Self {
        Self {
            kind,
            lexeme,
            trim,
            span,
        }
    }

    /// Whitespace-separated words of the tag body.
    pub fn words(&self) -> impl Iterator<Item = &'src str> {
        self.lexeme.split_whitespace()
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token types in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Literal text between tags.
    Text,
    /// `{{! ... }}` or `{{!-- ... --}}`
    Comment,
    /// `{{path}}`
    Escaped,
    /// `{{{path}}}` or `{{& path}}`
    Raw,
    /// `{{#helper arg}}`
    BlockOpen,
    /// `{{/helper}}`
    BlockClose,
    /// `{{else}}`, or `{{^ ... }}` (the body is kept so the parser can reject
    /// inverted sections)
    Else,
    /// `{{> name arg}}`
    Partial,
    /// A tag the lexer could not delimit; the error is already recorded.
    Error,
    /// End of input.
    Eof,
}
