//! The tokenizer proper: one `match` on the current character per token.

use crate::cursor::Cursor;
use crate::{Token, TokenKind};
use csc_util::{Diagnostic, Handler, Span};

/// CompilScript lexer
///
/// # Example
///
/// ```
/// use csc_lex::{Lexer, TokenKind};
/// use csc_util::Handler;
///
/// let handler = Handler::new();
/// let tokens = Lexer::new("var x = 10;", &handler).tokenize();
/// assert_eq!(tokens[0].kind, TokenKind::Var);
/// assert!(!handler.has_errors());
/// ```
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    handler: &'a Handler,
    /// Start state of the token being scanned
    start_offset: usize,
    start_line: u32,
    start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `source`, reporting into `handler`
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            start_offset: 0,
            start_line: 1,
            start_column: 0,
        }
    }

    /// Scan the whole source into a token stream ending in `Eof`
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let at_end = token.kind == TokenKind::Eof;
            tokens.push(token);
            if at_end {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();
        self.mark_start();

        if self.cursor.is_at_end() {
            return self.token(TokenKind::Eof);
        }

        let c = self.cursor.current();
        self.cursor.advance();

        match c {
            '+' => self.token(TokenKind::Plus),
            '-' => self.token(TokenKind::Minus),
            '*' => self.token(TokenKind::Star),
            '/' => self.token(TokenKind::Slash),
            '%' => self.token(TokenKind::Percent),
            '?' => self.token(TokenKind::Question),
            ':' => self.token(TokenKind::Colon),
            ';' => self.token(TokenKind::Semi),
            ',' => self.token(TokenKind::Comma),
            '.' => self.token(TokenKind::Dot),
            '(' => self.token(TokenKind::LParen),
            ')' => self.token(TokenKind::RParen),
            '{' => self.token(TokenKind::LBrace),
            '}' => self.token(TokenKind::RBrace),
            '[' => self.token(TokenKind::LBracket),
            ']' => self.token(TokenKind::RBracket),
            '<' => {
                if self.cursor.match_char('=') {
                    self.token(TokenKind::Le)
                } else {
                    self.token(TokenKind::Lt)
                }
            }
            '>' => {
                if self.cursor.match_char('=') {
                    self.token(TokenKind::Ge)
                } else {
                    self.token(TokenKind::Gt)
                }
            }
            '=' => {
                if self.cursor.match_char('=') {
                    self.token(TokenKind::EqEq)
                } else {
                    self.token(TokenKind::Assign)
                }
            }
            '!' => {
                if self.cursor.match_char('=') {
                    self.token(TokenKind::NotEq)
                } else {
                    self.token(TokenKind::Bang)
                }
            }
            '&' => {
                if self.cursor.match_char('&') {
                    self.token(TokenKind::AndAnd)
                } else {
                    self.error("expected `&&`, found single `&`");
                    self.next_token()
                }
            }
            '|' => {
                if self.cursor.match_char('|') {
                    self.token(TokenKind::OrOr)
                } else {
                    self.error("expected `||`, found single `|`");
                    self.next_token()
                }
            }
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c == '_' || c.is_ascii_alphabetic() => self.identifier(),
            c => {
                self.error(format!("unknown character `{}`", c));
                self.next_token()
            }
        }
    }

    /// Skip whitespace and both comment forms
    fn skip_trivia(&mut self) {
        loop {
            let c = self.cursor.current();
            if c.is_whitespace() {
                self.cursor.advance();
            } else if c == '/' && self.cursor.peek(1) == '/' {
                while !self.cursor.is_at_end() && self.cursor.current() != '\n' {
                    self.cursor.advance();
                }
            } else if c == '/' && self.cursor.peek(1) == '*' {
                self.mark_start();
                self.cursor.advance();
                self.cursor.advance();
                let mut closed = false;
                while !self.cursor.is_at_end() {
                    if self.cursor.current() == '*' && self.cursor.peek(1) == '/' {
                        self.cursor.advance();
                        self.cursor.advance();
                        closed = true;
                        break;
                    }
                    self.cursor.advance();
                }
                if !closed {
                    self.error("unterminated block comment");
                }
            } else {
                break;
            }
        }
    }

    fn identifier(&mut self) -> Token {
        loop {
            let c = self.cursor.current();
            if c != '_' && !c.is_ascii_alphanumeric() {
                break;
            }
            self.cursor.advance();
        }
        let text = self.cursor.slice(self.start_offset, self.cursor.offset());
        match TokenKind::keyword(text) {
            Some(kind) => self.token(kind),
            None => self.token(TokenKind::Ident(text.to_string())),
        }
    }

    fn number(&mut self) -> Token {
        while self.cursor.current().is_ascii_digit() {
            self.cursor.advance();
        }

        // A decimal point followed by a digit makes this a float literal.
        let is_float = self.cursor.current() == '.' && self.cursor.peek(1).is_ascii_digit();
        if is_float {
            self.cursor.advance();
            while self.cursor.current().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        let text = self.cursor.slice(self.start_offset, self.cursor.offset());
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => self.token(TokenKind::Float(value)),
                Err(_) => {
                    self.error(format!("invalid float literal `{}`", text));
                    self.token(TokenKind::Float(0.0))
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.token(TokenKind::Int(value)),
                Err(_) => {
                    self.error(format!("integer literal `{}` is too large", text));
                    self.token(TokenKind::Int(0))
                }
            }
        }
    }

    fn string(&mut self) -> Token {
        let mut value = String::new();
        loop {
            let c = self.cursor.current();
            match c {
                '"' => {
                    self.cursor.advance();
                    return self.token(TokenKind::Str(value));
                }
                '\n' | '\0' => {
                    self.error("unterminated string literal");
                    return self.token(TokenKind::Str(value));
                }
                '\\' => {
                    self.cursor.advance();
                    let escaped = self.cursor.current();
                    self.cursor.advance();
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        other => {
                            self.error(format!("unknown escape sequence `\\{}`", other));
                            value.push(other);
                        }
                    }
                }
                _ => {
                    value.push(c);
                    self.cursor.advance();
                }
            }
        }
    }

    fn mark_start(&mut self) {
        self.start_offset = self.cursor.offset();
        self.start_line = self.cursor.line();
        self.start_column = self.cursor.column();
    }

    fn span(&self) -> Span {
        Span::new(
            self.start_offset,
            self.cursor.offset(),
            self.start_line,
            self.start_column,
        )
    }

    fn token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.span())
    }

    fn error(&self, message: impl Into<String>) {
        self.handler.emit(Diagnostic::lex(message, self.span()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Token>, Handler) {
        let handler = Handler::new();
        let tokens = Lexer::new(source, &handler).tokenize();
        (tokens, handler)
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        let (tokens, handler) = lex("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_declaration() {
        assert_eq!(
            kinds("var x: integer = 10;"),
            vec![
                TokenKind::Var,
                TokenKind::Ident("x".into()),
                TokenKind::Colon,
                TokenKind::IntegerTy,
                TokenKind::Assign,
                TokenKind::Int(10),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_vs_identifiers() {
        assert_eq!(
            kinds("foreach foreachx in inx"),
            vec![
                TokenKind::Foreach,
                TokenKind::Ident("foreachx".into()),
                TokenKind::In,
                TokenKind::Ident("inx".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("<= >= == != && || < > = !"),
            vec![
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Assign,
                TokenKind::Bang,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_float_vs_member_access() {
        assert_eq!(
            kinds("3.14 a.b"),
            vec![
                TokenKind::Float(3.14),
                TokenKind::Ident("a".into()),
                TokenKind::Dot,
                TokenKind::Ident("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\t\"c\"\\""#),
            vec![TokenKind::Str("a\nb\t\"c\"\\".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, handler) = lex("\"oops\nvar");
        assert!(handler.has_errors());
        assert_eq!(handler.diagnostics()[0].phase, csc_util::Phase::Lex);
        // The lexer recovers and keeps scanning the next line.
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Var));
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("1 // line\n/* block\nstill */ 2"),
            vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unknown_character_recovers() {
        let (tokens, handler) = lex("@ 5");
        assert_eq!(handler.error_count(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Int(5));
    }

    #[test]
    fn test_spans_track_lines_and_columns() {
        let (tokens, _) = lex("var\n  x");
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[0].span.column, 0);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 2);
        assert_eq!(tokens[1].span.len(), 1);
    }

    #[test]
    fn test_huge_integer_reports_error() {
        let (_, handler) = lex("99999999999999999999;");
        assert_eq!(handler.error_count(), 1);
    }
}
