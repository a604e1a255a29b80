//! Template tokenizer.
//!
//! The [`Lexer`] splits source text into text runs and tags. It does not
//! interpret tag bodies beyond their leading sigil; paths and arguments are
//! left to the parser. Lexemes borrow from the source.

use whisker_core::{ParseError, ParseErrorKind, Span, Trim};

use super::cursor::Cursor;
use super::token::{Token, TokenKind};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const RAW_CLOSE: &str = "}}}";
/// `}~}}`: closes `{{~{x}~}}`.
const RAW_TRIM_CLOSE: &str = "}~}}";

/// Splits template source into text and tag tokens.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    errors: Vec<ParseError>,
    /// Set once the EOF token has been handed out.
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            errors: Vec::new(),
            finished: false,
        }
    }

    /// Diagnostics found so far; the lexer keeps none afterwards.
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The next token; [`TokenKind::Eof`] forever once input runs out.
    pub fn next_token(&mut self) -> Token<'src> {
        if self.cursor.is_eof() {
            self.finished = true;
            return self.make_eof();
        }

        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let start_offset = self.cursor.offset();

        if self.cursor.check_str(OPEN) {
            self.scan_tag(start_line, start_col, start_offset)
        } else {
            self.scan_text(start_line, start_col)
        }
    }

    // =========================================
    // Internal: helpers
    // =========================================

    fn make_eof(&self) -> Token<'src> {
        let span = Span::at(self.cursor.line(), self.cursor.column());
        Token::new(TokenKind::Eof, "", Trim::default(), span)
    }

    fn make_error(&mut self, error: ParseError) -> Token<'src> {
        let span = error.span;
        self.errors.push(error);
        Token::new(TokenKind::Error, "", Trim::default(), span)
    }

    fn tag_span(&self, start_line: u32, start_col: u32, start_offset: u32) -> Span {
        Span::new(start_line, start_col, self.cursor.offset() - start_offset)
    }

    // =========================================
    // Scanning: text
    // =========================================

    fn scan_text(&mut self, start_line: u32, start_col: u32) -> Token<'src> {
        let text = match self.cursor.find(OPEN) {
            Some(n) => self.cursor.advance_bytes(n),
            None => self.cursor.advance_to_end(),
        };
        let span = Span::new(start_line, start_col, text.len() as u32);
        Token::new(TokenKind::Text, text, Trim::default(), span)
    }

    // =========================================
    // Scanning: tags
    // =========================================

    /// Scan a tag starting at `{{`.
    fn scan_tag(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'src> {
        self.cursor.advance_bytes(OPEN.len());
        // Both `{{~{x}}}` and `{{{~x}}}` trim before a raw tag.
        let mut trim_left = self.cursor.eat_str("~");
        let raw = self.cursor.eat_str("{");
        if raw && !trim_left {
            trim_left = self.cursor.eat_str("~");
        }

        if !raw && self.cursor.check_str("!") {
            return self.scan_comment(trim_left, start_line, start_col, start_offset);
        }

        let end = if raw {
            self.find_raw_end()
        } else {
            self.find_tag_end(CLOSE).map(|end| (end, CLOSE.len(), false))
        };
        let Some((end, terminator_len, closing_trim)) = end else {
            return self.recover_unterminated(start_line, start_col);
        };

        let inner = self.cursor.advance_bytes(end);
        self.cursor.advance_bytes(terminator_len);

        let (inner, trim_right) = match inner.strip_suffix('~') {
            Some(stripped) => (stripped, true),
            None => (inner, closing_trim),
        };
        let trim = Trim::new(trim_left, trim_right);
        let span = self.tag_span(start_line, start_col, start_offset);

        if raw {
            return Token::new(TokenKind::Raw, inner.trim(), trim, span);
        }

        let body = inner.trim();
        let (kind, lexeme) = match body.as_bytes().first() {
            Some(b'#') => (TokenKind::BlockOpen, &body[1..]),
            Some(b'/') => (TokenKind::BlockClose, &body[1..]),
            Some(b'>') => (TokenKind::Partial, &body[1..]),
            Some(b'&') => (TokenKind::Raw, &body[1..]),
            Some(b'^') => (TokenKind::Else, &body[1..]),
            _ if body == "else" => (TokenKind::Else, ""),
            _ => (TokenKind::Escaped, body),
        };

        Token::new(kind, lexeme.trim(), trim, span)
    }

    /// Distance to `terminator`, unless another `{{` opens first.
    fn find_tag_end(&self, terminator: &str) -> Option<usize> {
        let close = self.cursor.find(terminator)?;
        match self.cursor.find(OPEN) {
            Some(reopen) if reopen < close => None,
            _ => Some(close),
        }
    }

    /// End of a raw tag body: (distance, terminator length, right trim).
    /// Whichever of `}}}` and `}~}}` comes first closes the tag.
    fn find_raw_end(&self) -> Option<(usize, usize, bool)> {
        let plain = self.find_tag_end(RAW_CLOSE);
        let trimmed = self.find_tag_end(RAW_TRIM_CLOSE);
        match (plain, trimmed) {
            (Some(plain), Some(trimmed)) if trimmed < plain => {
                Some((trimmed, RAW_TRIM_CLOSE.len(), true))
            }
            (Some(plain), _) => Some((plain, RAW_CLOSE.len(), false)),
            (None, Some(trimmed)) => Some((trimmed, RAW_TRIM_CLOSE.len(), true)),
            (None, None) => None,
        }
    }

    /// Report an unterminated tag and resume at the next `{{`.
    fn recover_unterminated(&mut self, start_line: u32, start_col: u32) -> Token<'src> {
        match self.cursor.find(OPEN) {
            Some(n) => {
                self.cursor.advance_bytes(n);
            }
            None => {
                self.cursor.advance_to_end();
            }
        }
        let span = Span::new(start_line, start_col, OPEN.len() as u32);
        self.make_error(ParseError::unterminated_tag(span))
    }

    /// Scan `{{! ... }}` or `{{!-- ... --}}`; the cursor is on the `!`.
    fn scan_comment(
        &mut self,
        trim_left: bool,
        start_line: u32,
        start_col: u32,
        start_offset: u32,
    ) -> Token<'src> {
        self.cursor.advance_bytes(1);

        let (content, trim_right) = if self.cursor.eat_str("--") {
            match Self::find_long_comment_end(self.cursor.rest()) {
                Some((end, trim_right, terminator_len)) => {
                    let content = self.cursor.advance_bytes(end);
                    self.cursor.advance_bytes(terminator_len);
                    (content, trim_right)
                }
                None => return self.unterminated_comment(start_line, start_col),
            }
        } else {
            match self.cursor.find(CLOSE) {
                Some(end) => {
                    let content = self.cursor.advance_bytes(end);
                    self.cursor.advance_bytes(CLOSE.len());
                    match content.strip_suffix('~') {
                        Some(stripped) => (stripped, true),
                        None => (content, false),
                    }
                }
                None => return self.unterminated_comment(start_line, start_col),
            }
        };

        let span = self.tag_span(start_line, start_col, start_offset);
        Token::new(
            TokenKind::Comment,
            content.trim(),
            Trim::new(trim_left, trim_right),
            span,
        )
    }

    /// Locate `--}}` or `--~}}`: (content length, right trim, terminator length).
    fn find_long_comment_end(rest: &str) -> Option<(usize, bool, usize)> {
        let mut search = 0;
        loop {
            let at = search + rest[search..].find("--")?;
            let after = &rest[at + 2..];
            if after.starts_with(CLOSE) {
                return Some((at, false, 4));
            }
            if after.starts_with("~}}") {
                return Some((at, true, 5));
            }
            search = at + 1;
        }
    }

    fn unterminated_comment(&mut self, start_line: u32, start_col: u32) -> Token<'src> {
        self.cursor.advance_to_end();
        let error = ParseError::new(
            ParseErrorKind::UnterminatedComment,
            Span::new(start_line, start_col, 3),
            "comment is never closed",
        );
        self.make_error(error)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    /// Yields tokens up to, but not including, end of input.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|t| t.kind).collect()
    }

    fn lexemes(source: &str) -> Vec<&str> {
        Lexer::new(source).map(|t| t.lexeme).collect()
    }

    #[test]
    fn lex_text_and_expression() {
        assert_eq!(
            kinds("Hello {{name}}!"),
            [TokenKind::Text, TokenKind::Escaped, TokenKind::Text]
        );
        assert_eq!(lexemes("Hello {{ name }}!"), ["Hello ", "name", "!"]);
    }

    #[test]
    fn lex_raw_forms() {
        assert_eq!(kinds("{{{html}}}{{& html}}"), [TokenKind::Raw, TokenKind::Raw]);
        assert_eq!(lexemes("{{{ html }}}{{&html}}"), ["html", "html"]);
    }

    #[test]
    fn lex_trimmed_raw_tags() {
        let tokens: Vec<_> = Lexer::new("a {{~{x}~}} b {{~{y}}} {{{~z~}}}").collect();
        let raw: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Raw)
            .map(|t| (t.lexeme, t.trim))
            .collect();

        assert_eq!(
            raw,
            [
                ("x", Trim::new(true, true)),
                ("y", Trim::new(true, false)),
                ("z", Trim::new(true, true)),
            ]
        );
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Error));
    }

    #[test]
    fn lex_block_tags() {
        let source = "{{#if ok}}y{{else}}n{{/if}}";
        assert_eq!(
            kinds(source),
            [
                TokenKind::BlockOpen,
                TokenKind::Text,
                TokenKind::Else,
                TokenKind::Text,
                TokenKind::BlockClose,
            ]
        );
        assert_eq!(lexemes(source), ["if ok", "y", "", "n", "if"]);
    }

    #[test]
    fn lex_caret_else() {
        let tokens: Vec<_> = Lexer::new("{{^}}{{^items}}").collect();
        assert_eq!(tokens[0].kind, TokenKind::Else);
        assert_eq!(tokens[0].lexeme, "");
        assert_eq!(tokens[1].kind, TokenKind::Else);
        assert_eq!(tokens[1].lexeme, "items");
    }

    #[test]
    fn lex_partial() {
        let tokens: Vec<_> = Lexer::new("{{> user-card person }}").collect();
        assert_eq!(tokens[0].kind, TokenKind::Partial);
        assert_eq!(tokens[0].lexeme, "user-card person");
    }

    #[test]
    fn lex_trim_markers() {
        let tokens: Vec<_> = Lexer::new("{{~name~}}{{~#if x}}{{else~}}{{{~raw~}}}").collect();
        assert_eq!(tokens[0].trim, Trim::new(true, true));
        assert_eq!(tokens[0].lexeme, "name");
        assert_eq!(tokens[1].trim, Trim::new(true, false));
        assert_eq!(tokens[1].kind, TokenKind::BlockOpen);
        assert_eq!(tokens[2].trim, Trim::new(false, true));
        assert_eq!(tokens[2].kind, TokenKind::Else);
        assert_eq!(tokens[3].trim, Trim::new(true, true));
        assert_eq!(tokens[3].lexeme, "raw");
    }

    #[test]
    fn lex_comments() {
        let tokens: Vec<_> = Lexer::new("{{! short }}{{!-- has }} inside --}}{{!-- t --~}}").collect();
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Comment));
        assert_eq!(tokens[0].lexeme, "short");
        assert_eq!(tokens[1].lexeme, "has }} inside");
        assert_eq!(tokens[2].lexeme, "t");
        assert!(tokens[2].trim.right);
    }

    #[test]
    fn lex_tag_spans() {
        let tokens: Vec<_> = Lexer::new("ab\n  {{name}}").collect();
        assert_eq!(tokens[1].span, Span::new(2, 3, 8));
    }

    #[test]
    fn lex_unterminated_tag_recovers_at_next_open() {
        let mut lexer = Lexer::new("{{broken {{name}} tail");
        let tokens: Vec<_> = lexer.by_ref().collect();

        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            [TokenKind::Error, TokenKind::Escaped, TokenKind::Text]
        );
        let errors = lexer.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::UnterminatedTag);
        assert_eq!(errors[0].span, Span::new(1, 1, 2));
    }

    #[test]
    fn lex_unterminated_at_end() {
        let mut lexer = Lexer::new("text {{name");
        let tokens: Vec<_> = lexer.by_ref().collect();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Error));
        assert!(lexer.has_errors());
    }

    #[test]
    fn lex_unterminated_comment() {
        let mut lexer = Lexer::new("{{!-- never closed }}");
        let _ = lexer.by_ref().count();
        let errors = lexer.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::UnterminatedComment);
    }

    #[test]
    fn eof_repeats() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}
