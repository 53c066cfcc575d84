//! Statement parsing.

use crate::ast::*;
use crate::Parser;
use csc_lex::TokenKind;

impl<'a> Parser<'a> {
    /// Parse one statement or declaration
    pub(crate) fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.current_kind() {
            TokenKind::Var => self.parse_var_decl(true, true).map(Stmt::VarDecl),
            TokenKind::Const => self.parse_var_decl(false, true).map(Stmt::VarDecl),
            TokenKind::Function => self.parse_function().map(Stmt::Function),
            TokenKind::Class => self.parse_class().map(Stmt::Class),
            TokenKind::If => self.parse_if().map(Stmt::If),
            TokenKind::While => self.parse_while().map(Stmt::While),
            TokenKind::Do => self.parse_do_while().map(Stmt::DoWhile),
            TokenKind::For => self.parse_for().map(Stmt::For),
            TokenKind::Foreach => self.parse_foreach().map(Stmt::Foreach),
            TokenKind::Switch => self.parse_switch().map(Stmt::Switch),
            TokenKind::Try => self.parse_try_catch().map(Stmt::TryCatch),
            TokenKind::Break => {
                let span = self.current_span();
                self.advance();
                self.expect(&TokenKind::Semi, "after `break`")?;
                Some(Stmt::Break(span))
            }
            TokenKind::Continue => {
                let span = self.current_span();
                self.advance();
                self.expect(&TokenKind::Semi, "after `continue`")?;
                Some(Stmt::Continue(span))
            }
            TokenKind::Return => self.parse_return().map(Stmt::Return),
            TokenKind::LBrace => self.parse_block().map(Stmt::Block),
            _ => self.parse_expr_or_assign(true),
        }
    }

    /// Parse `var`/`const name (: type)? (= init)?`, with optional `;`
    ///
    /// The `for` initializer reuses this with `require_semi = false`.
    pub(crate) fn parse_var_decl(&mut self, mutable: bool, require_semi: bool) -> Option<VarDecl> {
        let keyword_span = self.current_span();
        self.advance();

        let (name, name_span) = self.expect_ident("after `var`/`const`")?;

        let ty = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let init = if self.eat(&TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let end = if require_semi {
            self.expect(&TokenKind::Semi, "after declaration")?
        } else {
            self.prev_span()
        };

        Some(VarDecl {
            name,
            name_span,
            mutable,
            ty,
            init,
            span: keyword_span.merge(end),
        })
    }

    /// Parse an expression statement or an assignment statement
    pub(crate) fn parse_expr_or_assign(&mut self, require_semi: bool) -> Option<Stmt> {
        let target = self.parse_expr()?;

        if self.eat(&TokenKind::Assign) {
            let value = self.parse_expr()?;
            let end = if require_semi {
                self.expect(&TokenKind::Semi, "after assignment")?
            } else {
                value.span
            };
            let span = target.span.merge(end);
            return Some(Stmt::Assign(AssignStmt {
                target,
                value,
                span,
            }));
        }

        if require_semi {
            self.expect(&TokenKind::Semi, "after expression")?;
        }
        Some(Stmt::Expr(target))
    }

    fn parse_if(&mut self) -> Option<IfStmt> {
        let start = self.current_span();
        self.advance();
        self.expect(&TokenKind::LParen, "after `if`")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "after condition")?;
        let then_block = self.parse_block()?;

        let mut span = start.merge(then_block.span);
        let else_clause = if self.eat(&TokenKind::Else) {
            if self.at(&TokenKind::If) {
                let chained = self.parse_if()?;
                span = span.merge(chained.span);
                Some(Box::new(ElseClause::If(chained)))
            } else {
                let block = self.parse_block()?;
                span = span.merge(block.span);
                Some(Box::new(ElseClause::Block(block)))
            }
        } else {
            None
        };

        Some(IfStmt {
            cond,
            then_block,
            else_clause,
            span,
        })
    }

    fn parse_while(&mut self) -> Option<WhileStmt> {
        let start = self.current_span();
        self.advance();
        self.expect(&TokenKind::LParen, "after `while`")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "after condition")?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(WhileStmt { cond, body, span })
    }

    fn parse_do_while(&mut self) -> Option<DoWhileStmt> {
        let start = self.current_span();
        self.advance();
        let body = self.parse_block()?;
        self.expect(&TokenKind::While, "after `do` body")?;
        self.expect(&TokenKind::LParen, "after `while`")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "after condition")?;
        let end = self.expect(&TokenKind::Semi, "after `do-while`")?;
        Some(DoWhileStmt {
            body,
            cond,
            span: start.merge(end),
        })
    }

    fn parse_for(&mut self) -> Option<ForStmt> {
        let start = self.current_span();
        self.advance();
        self.expect(&TokenKind::LParen, "after `for`")?;

        let init = if self.eat(&TokenKind::Semi) {
            None
        } else {
            let stmt = match self.current_kind() {
                TokenKind::Var => Stmt::VarDecl(self.parse_var_decl(true, false)?),
                TokenKind::Const => Stmt::VarDecl(self.parse_var_decl(false, false)?),
                _ => self.parse_expr_or_assign(false)?,
            };
            self.expect(&TokenKind::Semi, "after `for` initializer")?;
            Some(Box::new(stmt))
        };

        let cond = if self.at(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semi, "after `for` condition")?;

        let step = if self.at(&TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_expr_or_assign(false)?))
        };
        self.expect(&TokenKind::RParen, "after `for` step")?;

        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(ForStmt {
            init,
            cond,
            step,
            body,
            span,
        })
    }

    fn parse_foreach(&mut self) -> Option<ForeachStmt> {
        let start = self.current_span();
        self.advance();
        self.expect(&TokenKind::LParen, "after `foreach`")?;
        let (var, var_span) = self.expect_ident("as `foreach` variable")?;
        self.expect(&TokenKind::In, "after `foreach` variable")?;
        let iter = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "after `foreach` iterable")?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(ForeachStmt {
            var,
            var_span,
            iter,
            body,
            span,
        })
    }

    fn parse_switch(&mut self) -> Option<SwitchStmt> {
        let start = self.current_span();
        self.advance();
        self.expect(&TokenKind::LParen, "after `switch`")?;
        let scrutinee = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "after `switch` value")?;
        self.expect(&TokenKind::LBrace, "to open `switch` body")?;

        let mut cases = Vec::new();
        let mut default = None;
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            if self.at(&TokenKind::Case) {
                let case_span = self.current_span();
                self.advance();
                let label = self.parse_expr()?;
                self.expect(&TokenKind::Colon, "after `case` label")?;
                let body = self.parse_case_body();
                cases.push(SwitchCase {
                    label,
                    body,
                    span: case_span,
                });
            } else if self.at(&TokenKind::Default) {
                let default_span = self.current_span();
                self.advance();
                self.expect(&TokenKind::Colon, "after `default`")?;
                if default.is_some() {
                    self.handler.emit(csc_util::Diagnostic::syntax(
                        "duplicate `default` in switch",
                        default_span,
                    ));
                }
                default = Some(self.parse_case_body());
            } else {
                self.error("expected `case`, `default`, or `}` in switch body");
                return None;
            }
        }
        let end = self.expect(&TokenKind::RBrace, "to close `switch` body")?;

        Some(SwitchStmt {
            scrutinee,
            cases,
            default,
            span: start.merge(end),
        })
    }

    /// Statements of one case arm, up to the next `case`/`default`/`}`
    fn parse_case_body(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !matches!(
            self.current_kind(),
            TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
        ) {
            match self.parse_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        stmts
    }

    fn parse_return(&mut self) -> Option<ReturnStmt> {
        let start = self.current_span();
        self.advance();
        let value = if self.at(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let end = self.expect(&TokenKind::Semi, "after `return`")?;
        Some(ReturnStmt {
            value,
            span: start.merge(end),
        })
    }

    fn parse_try_catch(&mut self) -> Option<TryCatchStmt> {
        let start = self.current_span();
        self.advance();
        let try_block = self.parse_block()?;
        self.expect(&TokenKind::Catch, "after `try` block")?;
        self.expect(&TokenKind::LParen, "after `catch`")?;
        let (catch_name, catch_name_span) = self.expect_ident("as `catch` binding")?;
        self.expect(&TokenKind::RParen, "after `catch` binding")?;
        let catch_block = self.parse_block()?;
        let span = start.merge(catch_block.span);
        Some(TryCatchStmt {
            try_block,
            catch_name,
            catch_name_span,
            catch_block,
            span,
        })
    }

    /// Parse `{ stmts }`
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let open = self.expect(&TokenKind::LBrace, "to open block")?;
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            match self.parse_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        let close = self.expect(&TokenKind::RBrace, "to close block")?;
        Some(Block {
            stmts,
            span: open.merge(close),
        })
    }
}
