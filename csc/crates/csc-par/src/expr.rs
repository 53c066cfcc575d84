//! Expression parsing via precedence climbing.
//!
//! Each infix operator has a (left, right) binding-power pair; a left-
//! associative operator binds tighter on the right. The ternary sits above
//! the binary ladder and associates to the right.

use crate::ast::*;
use crate::Parser;
use csc_lex::TokenKind;

impl<'a> Parser<'a> {
    /// Parse a full expression (ternary and below)
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        let cond = self.parse_binary(0)?;

        if !self.eat(&TokenKind::Question) {
            return Some(cond);
        }

        let then_expr = self.parse_expr()?;
        self.expect(&TokenKind::Colon, "between ternary arms")?;
        let else_expr = self.parse_expr()?;

        let span = cond.span.merge(else_expr.span);
        Some(Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    /// Precedence-climbing loop over infix operators
    fn parse_binary(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;

        while let Some((op, lbp, rbp)) = self.infix_binding_power() {
            if lbp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(rbp)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Some(lhs)
    }

    /// Binding powers; higher binds tighter, all left-associative
    fn infix_binding_power(&self) -> Option<(BinOp, u8, u8)> {
        let (op, lbp, rbp) = match self.current_kind() {
            TokenKind::OrOr => (BinOp::Or, 1, 2),
            TokenKind::AndAnd => (BinOp::And, 3, 4),
            TokenKind::EqEq => (BinOp::Eq, 5, 6),
            TokenKind::NotEq => (BinOp::Ne, 5, 6),
            TokenKind::Lt => (BinOp::Lt, 7, 8),
            TokenKind::Le => (BinOp::Le, 7, 8),
            TokenKind::Gt => (BinOp::Gt, 7, 8),
            TokenKind::Ge => (BinOp::Ge, 7, 8),
            TokenKind::Plus => (BinOp::Add, 9, 10),
            TokenKind::Minus => (BinOp::Sub, 9, 10),
            TokenKind::Star => (BinOp::Mul, 11, 12),
            TokenKind::Slash => (BinOp::Div, 11, 12),
            TokenKind::Percent => (BinOp::Mod, 11, 12),
            _ => return None,
        };
        Some((op, lbp, rbp))
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.current_kind() {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Bang => Some(UnOp::Not),
            _ => None,
        };

        if let Some(op) = op {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Some(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        self.parse_postfix()
    }

    /// Calls, indexing, and property access bind tightest
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_args()?;
                    let close = self.expect(&TokenKind::RParen, "to close argument list")?;
                    let span = expr.span.merge(close);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let close = self.expect(&TokenKind::RBracket, "to close index")?;
                    let span = expr.span.merge(close);
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let (name, name_span) = self.expect_ident("after `.`")?;
                    let span = expr.span.merge(name_span);
                    expr = Expr::new(
                        ExprKind::Property {
                            object: Box::new(expr),
                            name,
                            name_span,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }

        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.current_span();
        let kind = self.current_kind().clone();
        match kind {
            TokenKind::Int(value) => {
                self.advance();
                Some(Expr::new(ExprKind::Int(value), span))
            }
            TokenKind::Float(value) => {
                self.advance();
                Some(Expr::new(ExprKind::Float(value), span))
            }
            TokenKind::Str(value) => {
                self.advance();
                Some(Expr::new(ExprKind::Str(value), span))
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::new(ExprKind::Bool(true), span))
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::new(ExprKind::Bool(false), span))
            }
            TokenKind::Null => {
                self.advance();
                Some(Expr::new(ExprKind::Null, span))
            }
            TokenKind::This => {
                self.advance();
                Some(Expr::new(ExprKind::This, span))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Some(Expr::new(ExprKind::Ident(name), span))
            }
            TokenKind::New => {
                self.advance();
                let (class, class_span) = self.expect_ident("after `new`")?;
                self.expect(&TokenKind::LParen, "after class name")?;
                let args = self.parse_args()?;
                let close = self.expect(&TokenKind::RParen, "to close constructor arguments")?;
                Some(Expr::new(
                    ExprKind::New {
                        class,
                        class_span,
                        args,
                    },
                    span.merge(close),
                ))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "to close parenthesized expression")?;
                Some(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.at(&TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expr()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let close = self.expect(&TokenKind::RBracket, "to close array literal")?;
                Some(Expr::new(ExprKind::ArrayLit(elements), span.merge(close)))
            }
            other => {
                self.error(format!("expected expression, found {}", other.describe()));
                None
            }
        }
    }

    /// Comma-separated argument list; caller consumes the parentheses
    fn parse_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if self.at(&TokenKind::RParen) {
            return Some(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                return Some(args);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use csc_lex::Lexer;
    use csc_util::Handler;

    fn parse_expr(source: &str) -> Expr {
        let handler = Handler::new();
        let tokens = Lexer::new(source, &handler).tokenize();
        let mut parser = Parser::new(tokens, &handler);
        let expr = parser.parse_expr().expect("expression should parse");
        assert!(
            !handler.has_errors(),
            "unexpected errors: {:?}",
            handler.diagnostics()
        );
        expr
    }

    #[test]
    fn test_precedence_mul_over_add() {
        let expr = parse_expr("1 + 2 * 3");
        let ExprKind::Binary { op, rhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(
            rhs.kind,
            ExprKind::Binary { op: BinOp::Mul, .. }
        ));
    }

    #[test]
    fn test_left_associativity() {
        // (10 - 4) - 3
        let expr = parse_expr("10 - 4 - 3");
        let ExprKind::Binary { op, lhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Sub);
        assert!(matches!(
            lhs.kind,
            ExprKind::Binary { op: BinOp::Sub, .. }
        ));
    }

    #[test]
    fn test_logic_below_comparison() {
        let expr = parse_expr("a < b && c > d");
        assert!(matches!(
            expr.kind,
            ExprKind::Binary { op: BinOp::And, .. }
        ));
    }

    #[test]
    fn test_ternary_right_associative() {
        let expr = parse_expr("a ? 1 : b ? 2 : 3");
        let ExprKind::Ternary { else_expr, .. } = &expr.kind else {
            panic!("expected ternary");
        };
        assert!(matches!(else_expr.kind, ExprKind::Ternary { .. }));
    }

    #[test]
    fn test_postfix_chain() {
        let expr = parse_expr("a.b[0].c(1, 2)");
        let ExprKind::Call { callee, args } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        assert!(matches!(callee.kind, ExprKind::Property { .. }));
    }

    #[test]
    fn test_new_expression() {
        let expr = parse_expr("new Dog(\"Rex\")");
        let ExprKind::New { class, args, .. } = &expr.kind else {
            panic!("expected new");
        };
        assert_eq!(class, "Dog");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_array_literal() {
        let expr = parse_expr("[1, 2, 3]");
        let ExprKind::ArrayLit(elements) = &expr.kind else {
            panic!("expected array literal");
        };
        assert_eq!(elements.len(), 3);

        let empty = parse_expr("[]");
        assert!(matches!(empty.kind, ExprKind::ArrayLit(ref v) if v.is_empty()));
    }

    #[test]
    fn test_unary_nesting() {
        let expr = parse_expr("!!ok");
        let ExprKind::Unary { op, operand } = &expr.kind else {
            panic!("expected unary");
        };
        assert_eq!(*op, UnOp::Not);
        assert!(matches!(operand.kind, ExprKind::Unary { .. }));
    }

    #[test]
    fn test_parens_override_precedence() {
        let expr = parse_expr("(1 + 2) * 3");
        assert!(matches!(
            expr.kind,
            ExprKind::Binary { op: BinOp::Mul, .. }
        ));
    }
}
