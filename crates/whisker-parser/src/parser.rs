//! Tree-building parser.
//!
//! Consumes lexer tokens and assembles a [`Document`]. Errors never stop the
//! parse: the offending tag is dropped (or its block kept open for matching
//! purposes) and scanning continues, so one pass reports every problem.

use whisker_core::{
    BlockArgument, BlockNode, BlockTable, CommentNode, Document, ExpressionNode, Node,
    ParseError, ParseErrorKind, ParseErrors, PartialNode, Path, Span, TextNode, Trim,
};

use crate::lexer::{Lexer, Token, TokenKind};
use crate::path::parse_path;

/// Deepest block nesting a document may have.
///
/// Later stages walk the tree recursively, so depth has to be bounded here,
/// where the tree is still built iteratively.
pub const MAX_BLOCK_DEPTH: usize = 128;

/// An open `{{#helper}}` awaiting its `{{/helper}}`.
struct Frame<'src> {
    /// Unknown helpers and blocks past [`MAX_BLOCK_DEPTH`] are matched but
    /// discarded.
    keep: bool,
    name: &'src str,
    argument: Path,
    body: Vec<Node>,
    inverse: Option<Vec<Node>>,
    open_trim: Trim,
    else_trim: Trim,
    span: Span,
}

impl Frame<'_> {
    fn current_section(&mut self) -> &mut Vec<Node> {
        match &mut self.inverse {
            Some(inverse) => inverse,
            None => &mut self.body,
        }
    }
}

/// Parser state for one template.
pub(crate) struct Parser<'src> {
    lexer: Lexer<'src>,
    blocks: &'src BlockTable,
    root: Vec<Node>,
    stack: Vec<Frame<'src>>,
    errors: ParseErrors,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str, blocks: &'src BlockTable) -> Self {
        Self {
            lexer: Lexer::new(source),
            blocks,
            root: Vec::new(),
            stack: Vec::new(),
            errors: ParseErrors::new(),
        }
    }

    /// Parse the whole source, returning the tree built so far and every
    /// diagnostic found.
    pub(crate) fn parse_document(mut self) -> (Document, ParseErrors) {
        loop {
            let token = self.lexer.next_token();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Text => self.push_text(token),
                TokenKind::Comment => self.push(Node::Comment(CommentNode {
                    content: token.lexeme.to_string(),
                    trim: token.trim,
                    span: token.span,
                })),
                TokenKind::Escaped => self.parse_expression(token, true),
                TokenKind::Raw => self.parse_expression(token, false),
                TokenKind::BlockOpen => self.parse_block_open(token),
                TokenKind::Else => self.parse_else(token),
                TokenKind::BlockClose => self.parse_block_close(token),
                TokenKind::Partial => self.parse_partial(token),
                TokenKind::Error => {}
            }
        }

        while let Some(frame) = self.stack.pop() {
            self.errors
                .push(ParseError::unclosed_block(frame.span, frame.name));
        }

        for error in self.lexer.take_errors() {
            self.errors.push(error);
        }
        self.errors.sort_by_location();

        (Document::new(self.root), self.errors)
    }

    // =========================================
    // Helpers
    // =========================================

    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(frame) => frame.current_section().push(node),
            None => self.root.push(node),
        }
    }

    fn error(&mut self, kind: ParseErrorKind, span: Span, message: impl Into<String>) {
        self.errors.push(ParseError::new(kind, span, message));
    }

    /// Split a tag body into its first word and its remaining words, and
    /// report anything past `max_args` arguments.
    fn split_args(&mut self, token: &Token<'src>, max_args: usize) -> Option<(&'src str, Vec<&'src str>)> {
        let mut words = token.words();
        let head = words.next()?;
        let args: Vec<&'src str> = words.collect();
        if args.len() > max_args {
            self.error(
                ParseErrorKind::UnexpectedArgument,
                token.span,
                format!("unexpected argument '{}' in '{}'", args[max_args], token.lexeme),
            );
        }
        Some((head, args))
    }

    // =========================================
    // Tokens
    // =========================================

    fn push_text(&mut self, token: Token<'src>) {
        self.push(Node::Text(TextNode {
            content: token.lexeme.to_string(),
            span: token.span,
        }));
    }

    fn parse_expression(&mut self, token: Token<'src>, escape: bool) {
        let Some((head, args)) = self.split_args(&token, 0) else {
            self.error(ParseErrorKind::EmptyTag, token.span, "tag has no expression");
            return;
        };
        if !args.is_empty() {
            return;
        }

        match parse_path(head, token.span) {
            Ok(path) => self.push(Node::Expression(ExpressionNode {
                path,
                escape,
                trim: token.trim,
                span: token.span,
            })),
            Err(error) => self.errors.push(error),
        }
    }

    fn parse_block_open(&mut self, token: Token<'src>) {
        let Some((name, args)) = self.split_args(&token, 1) else {
            self.error(ParseErrorKind::EmptyTag, token.span, "block tag has no helper name");
            return;
        };

        let rule = self.blocks.argument(name);
        if rule.is_none() {
            self.error(
                ParseErrorKind::UnknownBlock,
                token.span,
                format!("unknown block helper '{name}'"),
            );
        }

        let depth = self.stack.len();
        if depth == MAX_BLOCK_DEPTH {
            self.error(
                ParseErrorKind::NestingTooDeep,
                token.span,
                format!("blocks nest deeper than {MAX_BLOCK_DEPTH} levels"),
            );
        }

        let argument = match args.first() {
            Some(arg) => match parse_path(arg, token.span) {
                Ok(path) => path,
                Err(error) => {
                    self.errors.push(error);
                    Path::this()
                }
            },
            None => {
                if rule == Some(BlockArgument::Required) {
                    self.error(
                        ParseErrorKind::MissingArgument,
                        token.span,
                        format!("block helper '{name}' requires an argument"),
                    );
                }
                Path::this()
            }
        };

        self.stack.push(Frame {
            keep: rule.is_some() && depth < MAX_BLOCK_DEPTH,
            name,
            argument,
            body: Vec::new(),
            inverse: None,
            open_trim: token.trim,
            else_trim: Trim::default(),
            span: token.span,
        });
    }

    fn parse_else(&mut self, token: Token<'src>) {
        if !token.lexeme.is_empty() {
            self.error(
                ParseErrorKind::UnknownBlock,
                token.span,
                format!("inverted section '{{{{^{}}}}}' is not supported", token.lexeme),
            );
            return;
        }

        let Some(frame) = self.stack.last_mut() else {
            self.error(
                ParseErrorKind::UnexpectedElse,
                token.span,
                "'{{else}}' outside of a block",
            );
            return;
        };

        if frame.inverse.is_some() {
            let name = frame.name;
            self.error(
                ParseErrorKind::UnexpectedElse,
                token.span,
                format!("block '{name}' already has an '{{{{else}}}}' section"),
            );
            return;
        }

        frame.inverse = Some(Vec::new());
        frame.else_trim = token.trim;
    }

    fn parse_block_close(&mut self, token: Token<'src>) {
        let name = token.lexeme;
        if name.is_empty() {
            self.error(ParseErrorKind::EmptyTag, token.span, "closing tag has no helper name");
            return;
        }

        let Some(position) = self.stack.iter().rposition(|frame| frame.name == name) else {
            match self.stack.last() {
                Some(frame) => {
                    let open = frame.name;
                    self.error(
                        ParseErrorKind::MismatchedClose,
                        token.span,
                        format!("expected '{{{{/{open}}}}}' but found '{{{{/{name}}}}}'"),
                    );
                }
                None => self.error(
                    ParseErrorKind::UnexpectedClose,
                    token.span,
                    format!("'{{{{/{name}}}}}' does not close any open block"),
                ),
            }
            return;
        };

        // Blocks opened after the matching one were never closed.
        while self.stack.len() > position + 1 {
            if let Some(inner) = self.stack.pop() {
                self.errors.push(ParseError::unclosed_block(inner.span, inner.name));
            }
        }

        let Some(frame) = self.stack.pop() else {
            return;
        };
        if !frame.keep {
            return;
        }

        self.push(Node::Block(BlockNode {
            helper: frame.name.to_string(),
            argument: frame.argument,
            body: frame.body,
            inverse: frame.inverse,
            open_trim: frame.open_trim,
            else_trim: frame.else_trim,
            close_trim: token.trim,
            span: frame.span,
        }));
    }

    fn parse_partial(&mut self, token: Token<'src>) {
        let Some((name, args)) = self.split_args(&token, 1) else {
            self.error(
                ParseErrorKind::MissingPartialName,
                token.span,
                "partial tag has no partial name",
            );
            return;
        };

        let context = match args.first() {
            Some(arg) => match parse_path(arg, token.span) {
                Ok(path) => Some(path),
                Err(error) => {
                    self.errors.push(error);
                    return;
                }
            },
            None => None,
        };

        self.push(Node::Partial(PartialNode {
            name: name.to_string(),
            context,
            trim: token.trim,
            span: token.span,
        }));
    }
}
