//! csc-par - Parser (syntactic analyzer) for CompilScript.
//!
//! A hand-written recursive-descent parser over the `csc-lex` token stream.
//! Expressions use precedence climbing with binding-power pairs; statements
//! and declarations each get one `parse_*` function.
//!
//! The parser recovers from errors by synchronizing to the next statement
//! boundary (`;` or `}`), so one run reports as many syntax errors as it
//! can. Whatever tree was recovered is still returned; the driver only
//! feeds it to semantic analysis when the handler holds no errors.

pub mod ast;
mod expr;
mod items;
mod stmt;
mod types;

pub use ast::*;

use csc_lex::{Token, TokenKind};
use csc_util::{Diagnostic, Handler, Span};

/// Recursive-descent parser
///
/// # Example
///
/// ```
/// use csc_lex::Lexer;
/// use csc_par::Parser;
/// use csc_util::Handler;
///
/// let handler = Handler::new();
/// let tokens = Lexer::new("var x: integer = 1;", &handler).tokenize();
/// let program = Parser::new(tokens, &handler).parse();
/// assert_eq!(program.len(), 1);
/// assert!(!handler.has_errors());
/// ```
pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    handler: &'a Handler,
}

impl<'a> Parser<'a> {
    /// Create a parser over a token stream ending in `Eof`
    pub fn new(mut tokens: Vec<Token>, handler: &'a Handler) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::Eof, Span::DUMMY));
        }
        Self {
            tokens,
            position: 0,
            handler,
        }
    }

    /// Parse a whole program
    pub fn parse(mut self) -> Program {
        let mut program = Vec::new();
        while !self.at(&TokenKind::Eof) {
            match self.parse_stmt() {
                Some(stmt) => program.push(stmt),
                None => self.synchronize(),
            }
        }
        program
    }

    // ------------------------------------------------------------------
    // Token cursor helpers
    // ------------------------------------------------------------------

    /// Current token
    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    /// Kind of the current token
    pub(crate) fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    /// Span of the current token
    pub(crate) fn current_span(&self) -> Span {
        self.current().span
    }

    /// Span of the most recently consumed token
    pub(crate) fn prev_span(&self) -> Span {
        self.tokens[self.position.saturating_sub(1)].span
    }

    /// Advance past the current token
    pub(crate) fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    /// True when the current token matches `kind` exactly
    pub(crate) fn at(&self, kind: &TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Consume the current token if it matches `kind`
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Require `kind`, reporting a syntax error when absent
    pub(crate) fn expect(&mut self, kind: &TokenKind, context: &str) -> Option<Span> {
        if self.at(kind) {
            let span = self.current_span();
            self.advance();
            Some(span)
        } else {
            self.error(format!(
                "expected {} {}, found {}",
                kind.describe(),
                context,
                self.current_kind().describe()
            ));
            None
        }
    }

    /// Require an identifier, returning its text and span
    pub(crate) fn expect_ident(&mut self, context: &str) -> Option<(String, Span)> {
        if let TokenKind::Ident(name) = self.current_kind() {
            let name = name.clone();
            let span = self.current_span();
            self.advance();
            Some((name, span))
        } else {
            self.error(format!(
                "expected identifier {}, found {}",
                context,
                self.current_kind().describe()
            ));
            None
        }
    }

    /// Report a syntax error at the current token
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.handler
            .emit(Diagnostic::syntax(message, self.current_span()));
    }

    /// Skip to the next statement boundary after a parse error
    pub(crate) fn synchronize(&mut self) {
        while !self.at(&TokenKind::Eof) {
            if self.eat(&TokenKind::Semi) {
                return;
            }
            if self.at(&TokenKind::RBrace) {
                self.advance();
                return;
            }
            match self.current_kind() {
                TokenKind::Var
                | TokenKind::Const
                | TokenKind::Function
                | TokenKind::Class
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Foreach
                | TokenKind::Switch
                | TokenKind::Return => return,
                _ => self.advance(),
            }
        }
    }
}
