//! Expression analysis: every node gets its semantic type.
//!
//! Error recovery uses `Type::Any` as the poison type: once a sub-
//! expression failed, anything containing it types as `Any` and produces
//! no further diagnostics, so one mistake is reported once.

use super::Analyzer;
use crate::table::SymbolKind;
use crate::tast::{CallTarget, Expr, ExprKind, Lit};
use crate::types::{
    compatible_assign, element_type, promote_numeric, unify_array_elements, widen, Type,
};
use csc_par::ast::{self, BinOp, UnOp};
use csc_util::{ErrorCode, Span};

impl<'a> Analyzer<'a> {
    /// Analyze one expression
    pub(crate) fn analyze_expr(&mut self, expr: &ast::Expr) -> Expr {
        let span = expr.span;
        match &expr.kind {
            ast::ExprKind::Int(v) => Expr::new(ExprKind::Literal(Lit::Int(*v)), Type::Integer, span),
            ast::ExprKind::Float(v) => {
                Expr::new(ExprKind::Literal(Lit::Float(*v)), Type::Float, span)
            }
            ast::ExprKind::Str(v) => {
                Expr::new(ExprKind::Literal(Lit::Str(v.clone())), Type::Str, span)
            }
            ast::ExprKind::Bool(v) => {
                Expr::new(ExprKind::Literal(Lit::Bool(*v)), Type::Boolean, span)
            }
            ast::ExprKind::Null => Expr::new(ExprKind::Literal(Lit::Null), Type::Null, span),
            ast::ExprKind::Ident(name) => self.analyze_ident(name, span),
            ast::ExprKind::This => self.analyze_this(span),
            ast::ExprKind::Binary { op, lhs, rhs } => self.analyze_binary(*op, lhs, rhs, span),
            ast::ExprKind::Unary { op, operand } => self.analyze_unary(*op, operand, span),
            ast::ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => self.analyze_ternary(cond, then_expr, else_expr, span),
            ast::ExprKind::Call { callee, args } => self.analyze_call(callee, args, span),
            ast::ExprKind::New {
                class,
                class_span,
                args,
            } => self.analyze_new(class, *class_span, args, span),
            ast::ExprKind::Property {
                object,
                name,
                name_span,
            } => self.analyze_property(object, name, *name_span, span),
            ast::ExprKind::Index { object, index } => self.analyze_index(object, index, span),
            ast::ExprKind::ArrayLit(elements) => self.analyze_array_lit(elements, span),
        }
    }

    fn analyze_ident(&mut self, name: &str, span: Span) -> Expr {
        let Some(symbol) = self.table.lookup(name) else {
            self.err(
                ErrorCode::UndeclaredName,
                format!("use of undeclared name `{}`", name),
                span,
            );
            return Expr::new(ExprKind::VariableRef(name.to_string()), Type::Any, span);
        };

        match symbol.kind {
            SymbolKind::Field => {
                // Bare field read inside a method is sugar for `this.f`.
                let ty = symbol.ty.clone();
                let class = self.current_class.clone().unwrap_or_default();
                let this = Expr::new(ExprKind::ThisExpr, Type::Class(class), span);
                Expr::new(
                    ExprKind::PropertyAccess {
                        object: Box::new(this),
                        field: name.to_string(),
                    },
                    ty,
                    span,
                )
            }
            SymbolKind::Function | SymbolKind::Method => {
                self.err(
                    ErrorCode::TypeMismatch,
                    format!("`{}` is a function and must be called", name),
                    span,
                );
                Expr::new(ExprKind::VariableRef(name.to_string()), Type::Any, span)
            }
            SymbolKind::Class => {
                self.err(
                    ErrorCode::TypeMismatch,
                    format!("class `{}` can only be used with `new`", name),
                    span,
                );
                Expr::new(ExprKind::VariableRef(name.to_string()), Type::Any, span)
            }
            _ => {
                let ty = symbol.ty.clone();
                Expr::new(ExprKind::VariableRef(name.to_string()), ty, span)
            }
        }
    }

    fn analyze_this(&mut self, span: Span) -> Expr {
        match &self.current_class {
            Some(class) => Expr::new(ExprKind::ThisExpr, Type::Class(class.clone()), span),
            None => {
                self.err(
                    ErrorCode::UndeclaredName,
                    "`this` is only available inside a method",
                    span,
                );
                Expr::new(ExprKind::ThisExpr, Type::Any, span)
            }
        }
    }

    fn analyze_binary(&mut self, op: BinOp, lhs: &ast::Expr, rhs: &ast::Expr, span: Span) -> Expr {
        let lhs = self.analyze_expr(lhs);
        let rhs = self.analyze_expr(rhs);

        let ty = match op {
            BinOp::Add if lhs.ty == Type::Str || rhs.ty == Type::Str => {
                // String concatenation; the other side is stringified.
                let other = if lhs.ty == Type::Str { &rhs } else { &lhs };
                if !matches!(
                    other.ty,
                    Type::Str | Type::Integer | Type::Float | Type::Boolean | Type::Any
                ) {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!("cannot concatenate a `{}` to a string", other.ty),
                        other.span,
                    );
                }
                Type::Str
            }
            BinOp::Mod => {
                let ok = |t: &Type| matches!(t, Type::Integer | Type::Any);
                if !ok(&lhs.ty) || !ok(&rhs.ty) {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!("`%` needs integer operands, found `{}` and `{}`", lhs.ty, rhs.ty),
                        span,
                    );
                }
                Type::Integer
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                match promote_numeric(&lhs.ty, &rhs.ty) {
                    Ok(ty) => ty,
                    Err(_) => {
                        self.err(
                            ErrorCode::TypeMismatch,
                            format!(
                                "operator `{}` needs numeric operands, found `{}` and `{}`",
                                binop_text(op),
                                lhs.ty,
                                rhs.ty
                            ),
                            span,
                        );
                        // Recovery type; keeps the error from cascading
                        // into the surrounding declaration.
                        Type::Integer
                    }
                }
            }
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if promote_numeric(&lhs.ty, &rhs.ty).is_err() {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!(
                            "operator `{}` needs numeric operands, found `{}` and `{}`",
                            binop_text(op),
                            lhs.ty,
                            rhs.ty
                        ),
                        span,
                    );
                }
                Type::Boolean
            }
            BinOp::Eq | BinOp::Ne => {
                let comparable = compatible_assign(&self.registry, &lhs.ty, &rhs.ty)
                    || compatible_assign(&self.registry, &rhs.ty, &lhs.ty);
                if !comparable {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!("cannot compare `{}` with `{}`", lhs.ty, rhs.ty),
                        span,
                    );
                }
                Type::Boolean
            }
            BinOp::And | BinOp::Or => {
                let ok = |t: &Type| matches!(t, Type::Boolean | Type::Any);
                if !ok(&lhs.ty) || !ok(&rhs.ty) {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!(
                            "operator `{}` needs boolean operands, found `{}` and `{}`",
                            binop_text(op),
                            lhs.ty,
                            rhs.ty
                        ),
                        span,
                    );
                }
                Type::Boolean
            }
        };

        Expr::new(
            ExprKind::BinaryOp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            span,
        )
    }

    fn analyze_unary(&mut self, op: UnOp, operand: &ast::Expr, span: Span) -> Expr {
        let operand = self.analyze_expr(operand);
        let ty = match op {
            UnOp::Neg => {
                if operand.ty.is_numeric() || operand.ty == Type::Any {
                    operand.ty.clone()
                } else {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!("unary `-` needs a numeric operand, found `{}`", operand.ty),
                        operand.span,
                    );
                    Type::Integer
                }
            }
            UnOp::Not => {
                if !matches!(operand.ty, Type::Boolean | Type::Any) {
                    self.err(
                        ErrorCode::TypeMismatch,
                        format!("`!` needs a boolean operand, found `{}`", operand.ty),
                        operand.span,
                    );
                }
                Type::Boolean
            }
        };
        Expr::new(
            ExprKind::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            ty,
            span,
        )
    }

    fn analyze_ternary(
        &mut self,
        cond: &ast::Expr,
        then_expr: &ast::Expr,
        else_expr: &ast::Expr,
        span: Span,
    ) -> Expr {
        let cond = self.analyze_expr(cond);
        if !matches!(cond.ty, Type::Boolean | Type::Any) {
            self.err(
                ErrorCode::InvalidCondition,
                format!("ternary guard must be `boolean`, found `{}`", cond.ty),
                cond.span,
            );
        }
        let then_expr = self.analyze_expr(then_expr);
        let else_expr = self.analyze_expr(else_expr);

        let ty = match widen(&self.registry, &then_expr.ty, &else_expr.ty) {
            Some(ty) => ty,
            None => {
                self.err(
                    ErrorCode::TypeMismatch,
                    format!(
                        "ternary arms have incompatible types `{}` and `{}`",
                        then_expr.ty, else_expr.ty
                    ),
                    span,
                );
                then_expr.ty.clone()
            }
        };

        Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            ty,
            span,
        )
    }

    fn analyze_call(&mut self, callee: &ast::Expr, args: &[ast::Expr], span: Span) -> Expr {
        match &callee.kind {
            ast::ExprKind::Ident(name) => {
                let Some(symbol) = self.table.lookup(name) else {
                    self.err(
                        ErrorCode::UndeclaredName,
                        format!("call to undeclared function `{}`", name),
                        callee.span,
                    );
                    let args = args.iter().map(|a| self.analyze_expr(a)).collect();
                    return Expr::new(
                        ExprKind::Call {
                            target: CallTarget::Function(name.to_string()),
                            args,
                        },
                        Type::Any,
                        span,
                    );
                };

                match (symbol.kind, symbol.sig.clone()) {
                    (SymbolKind::Function, Some(sig)) => {
                        let checked = self.check_args(&sig.params, args, span, name);
                        let target = CallTarget::Function(name.to_string());
                        Expr::new(ExprKind::Call { target, args: checked }, sig.ret, span)
                    }
                    (SymbolKind::Method, Some(sig)) => {
                        // Bare method call inside a class body dispatches on
                        // `this`.
                        let class = self.current_class.clone().unwrap_or_default();
                        let owner = self
                            .registry
                            .lookup_method(&class, name)
                            .map(|(_, owner)| owner)
                            .unwrap_or_else(|| class.clone());
                        let checked = self.check_args(&sig.params, args, span, name);
                        let this = Expr::new(
                            ExprKind::ThisExpr,
                            Type::Class(class),
                            callee.span,
                        );
                        Expr::new(
                            ExprKind::Call {
                                target: CallTarget::Method {
                                    object: Box::new(this),
                                    owner,
                                    method: name.to_string(),
                                },
                                args: checked,
                            },
                            sig.ret,
                            span,
                        )
                    }
                    (SymbolKind::Class, _) => {
                        self.err(
                            ErrorCode::NonCallable,
                            format!("use `new {}(..)` to construct an instance", name),
                            callee.span,
                        );
                        let args = args.iter().map(|a| self.analyze_expr(a)).collect();
                        Expr::new(
                            ExprKind::Call {
                                target: CallTarget::Function(name.to_string()),
                                args,
                            },
                            Type::Any,
                            span,
                        )
                    }
                    _ => {
                        self.err(
                            ErrorCode::NonCallable,
                            format!("`{}` is not callable", name),
                            callee.span,
                        );
                        let args = args.iter().map(|a| self.analyze_expr(a)).collect();
                        Expr::new(
                            ExprKind::Call {
                                target: CallTarget::Function(name.to_string()),
                                args,
                            },
                            Type::Any,
                            span,
                        )
                    }
                }
            }
            ast::ExprKind::Property {
                object,
                name,
                name_span,
            } => {
                let object = self.analyze_expr(object);
                match object.ty.clone() {
                    Type::Class(class) => {
                        match self.registry.lookup_method(&class, name) {
                            Some((sig, owner)) => {
                                let checked = self.check_args(&sig.params, args, span, name);
                                Expr::new(
                                    ExprKind::Call {
                                        target: CallTarget::Method {
                                            object: Box::new(object),
                                            owner,
                                            method: name.clone(),
                                        },
                                        args: checked,
                                    },
                                    sig.ret,
                                    span,
                                )
                            }
                            None => {
                                if self.registry.lookup_field(&class, name).is_some() {
                                    self.err(
                                        ErrorCode::NonCallable,
                                        format!("field `{}` is not callable", name),
                                        *name_span,
                                    );
                                } else {
                                    self.err(
                                        ErrorCode::MemberNotFound,
                                        format!("class `{}` has no method `{}`", class, name),
                                        *name_span,
                                    );
                                }
                                let args = args.iter().map(|a| self.analyze_expr(a)).collect();
                                Expr::new(
                                    ExprKind::Call {
                                        target: CallTarget::Method {
                                            object: Box::new(object),
                                            owner: class,
                                            method: name.clone(),
                                        },
                                        args,
                                    },
                                    Type::Any,
                                    span,
                                )
                            }
                        }
                    }
                    Type::Any => {
                        let args: Vec<Expr> = args.iter().map(|a| self.analyze_expr(a)).collect();
                        Expr::new(
                            ExprKind::Call {
                                target: CallTarget::Method {
                                    object: Box::new(object),
                                    owner: String::new(),
                                    method: name.clone(),
                                },
                                args,
                            },
                            Type::Any,
                            span,
                        )
                    }
                    other => {
                        self.err(
                            ErrorCode::PropertyOnPrimitive,
                            format!("type `{}` has no methods", other),
                            *name_span,
                        );
                        let args: Vec<Expr> = args.iter().map(|a| self.analyze_expr(a)).collect();
                        Expr::new(
                            ExprKind::Call {
                                target: CallTarget::Method {
                                    object: Box::new(object),
                                    owner: String::new(),
                                    method: name.clone(),
                                },
                                args,
                            },
                            Type::Any,
                            span,
                        )
                    }
                }
            }
            _ => {
                self.err(
                    ErrorCode::NonCallable,
                    "this expression is not callable",
                    callee.span,
                );
                self.analyze_expr(callee);
                let args: Vec<Expr> = args.iter().map(|a| self.analyze_expr(a)).collect();
                Expr::new(
                    ExprKind::Call {
                        target: CallTarget::Function(String::new()),
                        args,
                    },
                    Type::Any,
                    span,
                )
            }
        }
    }

    fn analyze_new(
        &mut self,
        class: &str,
        class_span: Span,
        args: &[ast::Expr],
        span: Span,
    ) -> Expr {
        if !self.registry.contains(class) {
            self.err(
                ErrorCode::UndeclaredName,
                format!("unknown class `{}`", class),
                class_span,
            );
            let args = args.iter().map(|a| self.analyze_expr(a)).collect();
            return Expr::new(
                ExprKind::NewExpr {
                    class: class.to_string(),
                    args,
                },
                Type::Any,
                span,
            );
        }

        let checked = match self.registry.constructor_of(class) {
            Some(sig) => self.check_args(&sig.params, args, span, class),
            None => {
                if !args.is_empty() {
                    self.err(
                        ErrorCode::ArityMismatch,
                        format!(
                            "class `{}` has no constructor but was given {} argument(s)",
                            class,
                            args.len()
                        ),
                        span,
                    );
                }
                args.iter().map(|a| self.analyze_expr(a)).collect()
            }
        };

        Expr::new(
            ExprKind::NewExpr {
                class: class.to_string(),
                args: checked,
            },
            Type::Class(class.to_string()),
            span,
        )
    }

    fn analyze_property(
        &mut self,
        object: &ast::Expr,
        name: &str,
        name_span: Span,
        span: Span,
    ) -> Expr {
        let object = self.analyze_expr(object);
        match object.ty.clone() {
            Type::Class(class) => match self.registry.lookup_field(&class, name) {
                Some((ty, _)) => Expr::new(
                    ExprKind::PropertyAccess {
                        object: Box::new(object),
                        field: name.to_string(),
                    },
                    ty,
                    span,
                ),
                None => {
                    if self.registry.lookup_method(&class, name).is_some() {
                        self.err(
                            ErrorCode::TypeMismatch,
                            format!("method `{}` must be called", name),
                            name_span,
                        );
                    } else {
                        self.err(
                            ErrorCode::MemberNotFound,
                            format!("class `{}` has no member `{}`", class, name),
                            name_span,
                        );
                    }
                    Expr::new(
                        ExprKind::PropertyAccess {
                            object: Box::new(object),
                            field: name.to_string(),
                        },
                        Type::Any,
                        span,
                    )
                }
            },
            Type::Any => Expr::new(
                ExprKind::PropertyAccess {
                    object: Box::new(object),
                    field: name.to_string(),
                },
                Type::Any,
                span,
            ),
            other => {
                self.err(
                    ErrorCode::PropertyOnPrimitive,
                    format!("type `{}` has no properties", other),
                    name_span,
                );
                Expr::new(
                    ExprKind::PropertyAccess {
                        object: Box::new(object),
                        field: name.to_string(),
                    },
                    Type::Any,
                    span,
                )
            }
        }
    }

    fn analyze_index(&mut self, object: &ast::Expr, index: &ast::Expr, span: Span) -> Expr {
        let object = self.analyze_expr(object);
        let index = self.analyze_index_operand(index);

        let ty = match element_type(&object.ty) {
            Ok(elem) => elem,
            Err(_) => {
                if object.ty != Type::Any {
                    self.err(
                        ErrorCode::NonIndexable,
                        format!("type `{}` cannot be indexed", object.ty),
                        object.span,
                    );
                }
                Type::Any
            }
        };

        Expr::new(
            ExprKind::IndexAccess {
                object: Box::new(object),
                index: Box::new(index),
            },
            ty,
            span,
        )
    }

    /// Analyze an index expression, requiring `integer`
    pub(crate) fn analyze_index_operand(&mut self, index: &ast::Expr) -> Expr {
        let index = self.analyze_expr(index);
        if !matches!(index.ty, Type::Integer | Type::Any) {
            self.err(
                ErrorCode::TypeMismatch,
                format!("array index must be `integer`, found `{}`", index.ty),
                index.span,
            );
        }
        index
    }

    fn analyze_array_lit(&mut self, elements: &[ast::Expr], span: Span) -> Expr {
        let elements: Vec<Expr> = elements.iter().map(|e| self.analyze_expr(e)).collect();
        let element_types: Vec<Type> = elements.iter().map(|e| e.ty.clone()).collect();

        let ty = match unify_array_elements(&self.registry, &element_types) {
            Ok(Type::Array { elem, rank }) => Type::Array {
                elem,
                rank: rank + 1,
            },
            Ok(elem) => Type::array(elem, 1),
            Err(_) => {
                self.err(
                    ErrorCode::TypeMismatch,
                    "array literal has heterogeneous element types",
                    span,
                );
                Type::array(Type::Any, 1)
            }
        };

        Expr::new(ExprKind::ArrayLiteral(elements), ty, span)
    }

    /// Check a call's arguments against the parameter list
    pub(crate) fn check_args(
        &mut self,
        params: &[(String, Type)],
        args: &[ast::Expr],
        call_span: Span,
        callee: &str,
    ) -> Vec<Expr> {
        if args.len() != params.len() {
            self.err(
                ErrorCode::ArityMismatch,
                format!(
                    "`{}` expects {} argument(s), found {}",
                    callee,
                    params.len(),
                    args.len()
                ),
                call_span,
            );
        }

        args.iter()
            .enumerate()
            .map(|(i, arg)| {
                let mut analyzed = self.analyze_expr(arg);
                if let Some((name, expected)) = params.get(i) {
                    self.coerce_empty_array(&mut analyzed, expected);
                    if !compatible_assign(&self.registry, expected, &analyzed.ty) {
                        self.err(
                            ErrorCode::TypeMismatch,
                            format!(
                                "argument `{}` of `{}` expects `{}`, found `{}`",
                                name, callee, expected, analyzed.ty
                            ),
                            analyzed.span,
                        );
                    }
                }
                analyzed
            })
            .collect()
    }

    /// Resolve the `Any` element type of an empty array literal from context
    pub(crate) fn coerce_empty_array(&self, expr: &mut Expr, expected: &Type) {
        if !expr.ty.contains_any() {
            return;
        }
        if let ExprKind::ArrayLiteral(elements) = &expr.kind {
            if elements.is_empty() && matches!(expected, Type::Array { .. }) {
                expr.ty = expected.clone();
            }
        }
    }
}

fn binop_text(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::And => "&&",
        BinOp::Or => "||",
    }
}
