//! Statement and declaration analysis.

use super::Analyzer;
use crate::table::{ScopeKind, Symbol, SymbolKind};
use crate::tast::{self, StmtKind};
use crate::types::{compatible_assign, element_type, Type};
use csc_par::ast;
use csc_util::ErrorCode;

impl<'a> Analyzer<'a> {
    /// Analyze a statement list, flagging dead code after a terminator
    pub(crate) fn analyze_block_stmts(
        &mut self,
        stmts: &[ast::Stmt],
        top_level: bool,
    ) -> Vec<tast::Stmt> {
        let mut out = Vec::with_capacity(stmts.len());
        let mut terminated = false;
        for stmt in stmts {
            if terminated {
                self.warn(
                    ErrorCode::DeadCode,
                    "unreachable statement",
                    stmt.span(),
                );
            }
            let analyzed = self.analyze_stmt(stmt, top_level);
            terminated = terminated
                || matches!(
                    analyzed.kind,
                    StmtKind::ReturnStmt(_) | StmtKind::BreakStmt | StmtKind::ContinueStmt
                );
            out.push(analyzed);
        }
        out
    }

    fn analyze_stmt(&mut self, stmt: &ast::Stmt, top_level: bool) -> tast::Stmt {
        let span = stmt.span();
        let kind = match stmt {
            ast::Stmt::VarDecl(decl) => self.analyze_var_decl(decl),
            ast::Stmt::Assign(assign) => self.analyze_assign(assign),
            ast::Stmt::Expr(expr) => StmtKind::ExprStmt(self.analyze_expr(expr)),
            ast::Stmt::If(if_stmt) => self.analyze_if(if_stmt),
            ast::Stmt::While(while_stmt) => {
                let cond = self.analyze_condition(&while_stmt.cond, "while");
                let body = self.analyze_loop_body(&while_stmt.body);
                StmtKind::WhileStmt { cond, body }
            }
            ast::Stmt::DoWhile(do_while) => {
                let body = self.analyze_loop_body(&do_while.body);
                let cond = self.analyze_condition(&do_while.cond, "do-while");
                StmtKind::DoWhileStmt { body, cond }
            }
            ast::Stmt::For(for_stmt) => self.analyze_for(for_stmt),
            ast::Stmt::Foreach(foreach) => self.analyze_foreach(foreach),
            ast::Stmt::Switch(switch) => self.analyze_switch(switch),
            ast::Stmt::Break(span) => {
                if self.loop_depth + self.switch_depth == 0 {
                    self.err(
                        ErrorCode::InvalidJump,
                        "`break` outside of a loop or switch",
                        *span,
                    );
                }
                StmtKind::BreakStmt
            }
            ast::Stmt::Continue(span) => {
                if self.loop_depth == 0 {
                    self.err(ErrorCode::InvalidJump, "`continue` outside of a loop", *span);
                }
                StmtKind::ContinueStmt
            }
            ast::Stmt::Return(ret) => self.analyze_return(ret),
            ast::Stmt::TryCatch(tc) => self.analyze_try_catch(tc),
            ast::Stmt::Function(decl) => self.analyze_function_decl(decl, top_level),
            ast::Stmt::Class(decl) => self.analyze_class_decl(decl, top_level),
            ast::Stmt::Block(block) => {
                self.table.enter(ScopeKind::Block, "block");
                let body = self.analyze_block_stmts(&block.stmts, false);
                self.table.leave();
                StmtKind::Block(body)
            }
        };
        tast::Stmt::new(kind, span)
    }

    fn analyze_var_decl(&mut self, decl: &ast::VarDecl) -> StmtKind {
        let annotated = decl.ty.as_ref().map(|t| self.resolve_type(t));
        let mut init = decl.init.as_ref().map(|e| self.analyze_expr(e));

        let ty = match (&annotated, &mut init) {
            (Some(declared), Some(value)) => {
                self.coerce_empty_array(value, declared);
                if !compatible_assign(&self.registry, declared, &value.ty) {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!(
                            "cannot initialize `{}: {}` with a value of type `{}`",
                            decl.name, declared, value.ty
                        ),
                        value.span,
                    );
                }
                declared.clone()
            }
            (Some(declared), None) => declared.clone(),
            (None, Some(value)) => {
                if value.ty.contains_any() {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!(
                            "cannot infer a type for `{}`; add a type annotation",
                            decl.name
                        ),
                        value.span,
                    );
                } else if matches!(value.ty, Type::Null | Type::Void) {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!(
                            "cannot infer a type for `{}` from a `{}` initializer",
                            decl.name, value.ty
                        ),
                        value.span,
                    );
                }
                value.ty.clone()
            }
            (None, None) => {
                self.err(
                    ErrorCode::TypeMismatch,
                    format!(
                        "`{}` needs a type annotation or an initializer",
                        decl.name
                    ),
                    decl.name_span,
                );
                Type::Any
            }
        };

        if !decl.mutable && init.is_none() {
            self.err(
                ErrorCode::ConstWithoutInit,
                format!("constant `{}` must be initialized", decl.name),
                decl.name_span,
            );
        }

        let kind = if decl.mutable {
            SymbolKind::Variable
        } else {
            SymbolKind::Constant
        };
        let symbol = Symbol::new(
            decl.name.clone(),
            kind,
            ty.clone(),
            decl.mutable,
            decl.name_span,
        );
        self.define_or_report(symbol, decl.name_span);

        match (decl.mutable, init) {
            (false, Some(init)) => StmtKind::ConstDecl {
                name: decl.name.clone(),
                ty,
                init,
            },
            (_, init) => StmtKind::VariableDecl {
                name: decl.name.clone(),
                ty,
                init,
            },
        }
    }

    fn analyze_assign(&mut self, assign: &ast::AssignStmt) -> StmtKind {
        match &assign.target.kind {
            ast::ExprKind::Ident(name) => self.analyze_name_assign(name, assign),
            ast::ExprKind::Property { object, name, name_span } => {
                let object = self.analyze_expr(object);
                let mut value = self.analyze_expr(&assign.value);
                match &object.ty {
                    Type::Class(class) => {
                        match self.registry.lookup_field(class, name) {
                            Some((field_ty, _)) => {
                                self.coerce_empty_array(&mut value, &field_ty);
                                if !compatible_assign(&self.registry, &field_ty, &value.ty) {
                                    self.err(
                                        ErrorCode::TypeMismatch,
                                        format!(
                                            "cannot assign `{}` to field `{}: {}`",
                                            value.ty, name, field_ty
                                        ),
                                        value.span,
                                    );
                                }
                            }
                            None => {
                                if self.registry.lookup_method(class, name).is_some() {
                                    self.err(
                                        ErrorCode::TypeMismatch,
                                        format!("cannot assign to method `{}`", name),
                                        *name_span,
                                    );
                                } else {
                                    self.err(
                                        ErrorCode::MemberNotFound,
                                        format!("class `{}` has no field `{}`", class, name),
                                        *name_span,
                                    );
                                }
                            }
                        }
                    }
                    Type::Any => {}
                    other => {
                        self.err(
                            ErrorCode::PropertyOnPrimitive,
                            format!("cannot assign to a property of `{}`", other),
                            *name_span,
                        );
                    }
                }
                StmtKind::PropertyAssignment {
                    object,
                    field: name.clone(),
                    value,
                }
            }
            ast::ExprKind::Index { object, index } => {
                let object = self.analyze_expr(object);
                let index = self.analyze_index_operand(index);
                let mut value = self.analyze_expr(&assign.value);
                match element_type(&object.ty) {
                    Ok(elem) => {
                        self.coerce_empty_array(&mut value, &elem);
                        if !compatible_assign(&self.registry, &elem, &value.ty) {
                            self.err(
                                ErrorCode::TypeMismatch,
                                format!(
                                    "cannot store `{}` into an element of type `{}`",
                                    value.ty, elem
                                ),
                                value.span,
                            );
                        }
                    }
                    Err(_) if object.ty == Type::Any => {}
                    Err(_) => {
                        self.err(
                            ErrorCode::NonIndexable,
                            format!("type `{}` cannot be indexed", object.ty),
                            object.span,
                        );
                    }
                }
                StmtKind::IndexAssignment {
                    object,
                    index,
                    value,
                }
            }
            _ => {
                self.err(
                    ErrorCode::TypeMismatch,
                    "invalid assignment target",
                    assign.target.span,
                );
                let value = self.analyze_expr(&assign.value);
                StmtKind::ExprStmt(value)
            }
        }
    }

    fn analyze_name_assign(&mut self, name: &str, assign: &ast::AssignStmt) -> StmtKind {
        let mut value = self.analyze_expr(&assign.value);

        let Some(symbol) = self.table.lookup(name) else {
            self.err(
                ErrorCode::UndeclaredName,
                format!("assignment to undeclared name `{}`", name),
                assign.target.span,
            );
            return StmtKind::Assignment {
                name: name.to_string(),
                value,
            };
        };
        let symbol_kind = symbol.kind;
        let symbol_ty = symbol.ty.clone();

        match symbol_kind {
            SymbolKind::Constant => {
                self.err(
                    ErrorCode::ConstReassigned,
                    format!("cannot assign to constant `{}`", name),
                    assign.target.span,
                );
            }
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Class => {
                self.err(
                    ErrorCode::TypeMismatch,
                    format!("cannot assign to `{}`", name),
                    assign.target.span,
                );
            }
            SymbolKind::Field => {
                // Bare field write inside a method is sugar for `this.f = v`.
                self.coerce_empty_array(&mut value, &symbol_ty);
                if !compatible_assign(&self.registry, &symbol_ty, &value.ty) {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!(
                            "cannot assign `{}` to field `{}: {}`",
                            value.ty, name, symbol_ty
                        ),
                        value.span,
                    );
                }
                let class = self.current_class.clone().unwrap_or_default();
                let this = tast::Expr::new(
                    tast::ExprKind::ThisExpr,
                    Type::Class(class),
                    assign.target.span,
                );
                return StmtKind::PropertyAssignment {
                    object: this,
                    field: name.to_string(),
                    value,
                };
            }
            SymbolKind::Variable | SymbolKind::Parameter => {
                self.coerce_empty_array(&mut value, &symbol_ty);
                if !compatible_assign(&self.registry, &symbol_ty, &value.ty) {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!(
                            "cannot assign `{}` to `{}: {}`",
                            value.ty, name, symbol_ty
                        ),
                        value.span,
                    );
                }
            }
        }

        StmtKind::Assignment {
            name: name.to_string(),
            value,
        }
    }

    fn analyze_if(&mut self, if_stmt: &ast::IfStmt) -> StmtKind {
        let cond = self.analyze_condition(&if_stmt.cond, "if");

        self.table.enter(ScopeKind::Block, "block");
        let then_block = self.analyze_block_stmts(&if_stmt.then_block.stmts, false);
        self.table.leave();

        let else_block = if_stmt.else_clause.as_deref().map(|clause| match clause {
            ast::ElseClause::Block(block) => {
                self.table.enter(ScopeKind::Block, "block");
                let stmts = self.analyze_block_stmts(&block.stmts, false);
                self.table.leave();
                stmts
            }
            ast::ElseClause::If(nested) => {
                let span = nested.span;
                let kind = self.analyze_if(nested);
                vec![tast::Stmt::new(kind, span)]
            }
        });

        StmtKind::IfStmt {
            cond,
            then_block,
            else_block,
        }
    }

    fn analyze_for(&mut self, for_stmt: &ast::ForStmt) -> StmtKind {
        // The initializer's declarations live in a scope wrapping the loop.
        self.table.enter(ScopeKind::Block, "for");
        let init = for_stmt
            .init
            .as_deref()
            .map(|s| Box::new(self.analyze_stmt(s, false)));
        let cond = for_stmt
            .cond
            .as_ref()
            .map(|c| self.analyze_condition(c, "for"));
        let step = for_stmt
            .step
            .as_deref()
            .map(|s| Box::new(self.analyze_stmt(s, false)));
        let body = self.analyze_loop_body(&for_stmt.body);
        self.table.leave();

        StmtKind::ForStmt {
            init,
            cond,
            step,
            body,
        }
    }

    fn analyze_foreach(&mut self, foreach: &ast::ForeachStmt) -> StmtKind {
        let iter = self.analyze_expr(&foreach.iter);
        let var_ty = match element_type(&iter.ty) {
            Ok(elem) => elem,
            Err(_) => {
                if iter.ty != Type::Any {
                    self.err(
                        ErrorCode::InvalidCondition,
                        format!("`foreach` needs an array, found `{}`", iter.ty),
                        iter.span,
                    );
                }
                Type::Any
            }
        };

        self.table.enter(ScopeKind::LoopBody, "loop");
        let symbol = Symbol::new(
            foreach.var.clone(),
            SymbolKind::Variable,
            var_ty.clone(),
            true,
            foreach.var_span,
        );
        self.define_or_report(symbol, foreach.var_span);
        self.loop_depth += 1;
        let body = self.analyze_block_stmts(&foreach.body.stmts, false);
        self.loop_depth -= 1;
        self.table.leave();

        StmtKind::ForeachStmt {
            var: foreach.var.clone(),
            var_ty,
            iter,
            body,
        }
    }

    fn analyze_switch(&mut self, switch: &ast::SwitchStmt) -> StmtKind {
        let scrutinee = self.analyze_expr(&switch.scrutinee);
        self.switch_depth += 1;

        let cases = switch
            .cases
            .iter()
            .map(|case| {
                let label = self.analyze_expr(&case.label);
                if !compatible_assign(&self.registry, &scrutinee.ty, &label.ty) {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!(
                            "case label of type `{}` does not fit switch value of type `{}`",
                            label.ty, scrutinee.ty
                        ),
                        label.span,
                    );
                }
                self.table.enter(ScopeKind::SwitchCase, "switch");
                let body = self.analyze_block_stmts(&case.body, false);
                self.table.leave();
                tast::SwitchCase { label, body }
            })
            .collect();

        let default = switch.default.as_ref().map(|stmts| {
            self.table.enter(ScopeKind::SwitchCase, "switch");
            let body = self.analyze_block_stmts(stmts, false);
            self.table.leave();
            body
        });

        self.switch_depth -= 1;
        StmtKind::SwitchStmt {
            scrutinee,
            cases,
            default,
        }
    }

    fn analyze_return(&mut self, ret: &ast::ReturnStmt) -> StmtKind {
        let Some(expected) = self.ret_stack.last().cloned() else {
            self.err(
                ErrorCode::InvalidJump,
                "`return` outside of a function",
                ret.span,
            );
            let value = ret.value.as_ref().map(|e| self.analyze_expr(e));
            return StmtKind::ReturnStmt(value);
        };

        match &ret.value {
            None => {
                if expected != Type::Void {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!("expected a return value of type `{}`", expected),
                        ret.span,
                    );
                }
                StmtKind::ReturnStmt(None)
            }
            Some(expr) => {
                let mut value = self.analyze_expr(expr);
                if expected == Type::Void {
                    self.err(
                        ErrorCode::TypeMismatch,
                        "a void function cannot return a value",
                        value.span,
                    );
                } else {
                    self.coerce_empty_array(&mut value, &expected);
                    if !compatible_assign(&self.registry, &expected, &value.ty) {
                        self.err(
                            ErrorCode::TypeMismatch,
                            format!(
                                "cannot return `{}` from a function returning `{}`",
                                value.ty, expected
                            ),
                            value.span,
                        );
                    }
                }
                StmtKind::ReturnStmt(Some(value))
            }
        }
    }

    fn analyze_try_catch(&mut self, tc: &ast::TryCatchStmt) -> StmtKind {
        self.table.enter(ScopeKind::Block, "block");
        let try_block = self.analyze_block_stmts(&tc.try_block.stmts, false);
        self.table.leave();

        self.table.enter(ScopeKind::Catch, "catch");
        // The caught value surfaces as its message text.
        let symbol = Symbol::new(
            tc.catch_name.clone(),
            SymbolKind::Variable,
            Type::Str,
            true,
            tc.catch_name_span,
        );
        self.define_or_report(symbol, tc.catch_name_span);
        let catch_block = self.analyze_block_stmts(&tc.catch_block.stmts, false);
        self.table.leave();

        StmtKind::TryCatchStmt {
            try_block,
            catch_name: tc.catch_name.clone(),
            catch_block,
        }
    }

    fn analyze_function_decl(&mut self, decl: &ast::FnDecl, top_level: bool) -> StmtKind {
        if !top_level {
            // Top-level functions were registered up front for forward
            // references; nested ones bind at their declaration site.
            let sig = self.fn_sig(decl);
            let symbol =
                Symbol::function(decl.name.clone(), SymbolKind::Function, sig, decl.name_span);
            self.define_or_report(symbol, decl.name_span);
        }
        let function = self.analyze_function_body(decl, None);
        StmtKind::FunctionDecl(function)
    }

    /// Analyze a function or method body in a fresh scope
    pub(crate) fn analyze_function_body(
        &mut self,
        decl: &ast::FnDecl,
        class: Option<&str>,
    ) -> tast::Function {
        let (scope_kind, qualified) = match class {
            Some(class_name) => (
                ScopeKind::Method,
                format!("{}_{}", class_name, decl.name),
            ),
            None => (ScopeKind::Function, decl.name.clone()),
        };

        self.table.enter(scope_kind, qualified.clone());

        if let Some(class_name) = class {
            let this = Symbol::new(
                "this",
                SymbolKind::Parameter,
                Type::Class(class_name.to_string()),
                false,
                decl.name_span,
            );
            self.define_or_report(this, decl.name_span);
        }

        let mut params = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            let ty = self.resolve_type(&param.ty);
            let symbol = Symbol::new(
                param.name.clone(),
                SymbolKind::Parameter,
                ty.clone(),
                true,
                param.name_span,
            );
            self.define_or_report(symbol, param.name_span);
            params.push(tast::TypedParam {
                name: param.name.clone(),
                ty,
            });
        }

        let ret = decl
            .ret
            .as_ref()
            .map(|t| self.resolve_type(t))
            .unwrap_or(Type::Void);

        self.ret_stack.push(ret.clone());
        let saved_loops = std::mem::take(&mut self.loop_depth);
        let saved_switches = std::mem::take(&mut self.switch_depth);

        let body = self.analyze_block_stmts(&decl.body.stmts, false);

        self.loop_depth = saved_loops;
        self.switch_depth = saved_switches;
        self.ret_stack.pop();
        self.table.leave();

        tast::Function {
            name: decl.name.clone(),
            qualified,
            class: class.map(str::to_string),
            params,
            ret,
            body,
            span: decl.span,
        }
    }

    fn analyze_class_decl(&mut self, decl: &ast::ClassDecl, top_level: bool) -> StmtKind {
        if !top_level {
            self.handler.emit(csc_util::Diagnostic::new(
                csc_util::Phase::Semantic,
                csc_util::Severity::Error,
                None,
                format!("class `{}` must be declared at top level", decl.name),
                decl.name_span,
            ));
            return StmtKind::ClassDecl(tast::Class {
                name: decl.name.clone(),
                methods: Vec::new(),
                span: decl.span,
            });
        }

        // A duplicate declaration was reported in the first pass; its body
        // contributes no members, methods, or scope.
        if !self.is_registered_decl(decl) {
            return StmtKind::ClassDecl(tast::Class {
                name: decl.name.clone(),
                methods: Vec::new(),
                span: decl.span,
            });
        }

        self.table.enter(ScopeKind::Class, decl.name.clone());

        // Pre-bind inherited and declared fields, root ancestors first so
        // layout order matches the heap layout.
        for (field, ty) in self.registry.fields_with_inherited(&decl.name) {
            let symbol = Symbol::new(field, SymbolKind::Field, ty, true, decl.name_span);
            // Inherited and own names were already checked for duplicates.
            let _ = self.table.define(symbol);
        }

        // Pre-bind methods, nearest definition wins.
        for owner in self.registry.ancestry(&decl.name) {
            let Some(meta) = self.registry.get(&owner) else {
                continue;
            };
            for sig in meta.methods.values().cloned().collect::<Vec<_>>() {
                if self.table.lookup_local(&sig.name).is_some() {
                    continue;
                }
                let symbol = Symbol::function(
                    sig.name.clone(),
                    SymbolKind::Method,
                    crate::table::FnSig {
                        params: sig.params.clone(),
                        ret: sig.ret.clone(),
                    },
                    sig.span,
                );
                let _ = self.table.define(symbol);
            }
        }

        let previous_class = self.current_class.replace(decl.name.clone());
        let mut methods = Vec::new();
        for member in &decl.members {
            if let ast::ClassMember::Method(method) = member {
                methods.push(self.analyze_function_body(method, Some(&decl.name)));
            }
        }
        self.current_class = previous_class;
        self.table.leave();

        StmtKind::ClassDecl(tast::Class {
            name: decl.name.clone(),
            methods,
            span: decl.span,
        })
    }

    /// Analyze a loop body in its own scope with loop depth raised
    fn analyze_loop_body(&mut self, block: &ast::Block) -> Vec<tast::Stmt> {
        self.table.enter(ScopeKind::LoopBody, "loop");
        self.loop_depth += 1;
        let body = self.analyze_block_stmts(&block.stmts, false);
        self.loop_depth -= 1;
        self.table.leave();
        body
    }

    /// Analyze a control condition, requiring `boolean`
    fn analyze_condition(&mut self, cond: &ast::Expr, construct: &str) -> tast::Expr {
        let analyzed = self.analyze_expr(cond);
        if analyzed.ty != Type::Boolean && analyzed.ty != Type::Any {
            self.err(
                ErrorCode::InvalidCondition,
                format!(
                    "`{}` condition must be `boolean`, found `{}`",
                    construct, analyzed.ty
                ),
                analyzed.span,
            );
        }
        analyzed
    }
}
