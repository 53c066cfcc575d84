//! Graphviz DOT rendering of the typed AST.
//!
//! Used by hosts that want to show the tree (`return_ast_dot` in the
//! compile options). Output is deterministic: node ids are assigned in
//! walk order.

use crate::tast::{CallTarget, Expr, ExprKind, Lit, Program, Stmt, StmtKind};
use std::fmt::Write;

/// Render a typed AST as a DOT digraph
pub fn program_to_dot(program: &Program) -> String {
    let mut dot = DotWriter::new();
    let root = dot.node("Program");
    for stmt in &program.body {
        let child = dot.stmt(stmt);
        dot.edge(root, child);
    }
    dot.finish()
}

struct DotWriter {
    out: String,
    next_id: u32,
}

impl DotWriter {
    fn new() -> Self {
        let mut out = String::new();
        out.push_str("digraph AST {\n");
        out.push_str("  node [shape=box, fontname=\"monospace\"];\n");
        Self { out, next_id: 0 }
    }

    fn finish(mut self) -> String {
        self.out.push_str("}\n");
        self.out
    }

    fn node(&mut self, label: &str) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        let _ = writeln!(self.out, "  n{} [label=\"{}\"];", id, escape(label));
        id
    }

    fn edge(&mut self, from: u32, to: u32) {
        let _ = writeln!(self.out, "  n{} -> n{};", from, to);
    }

    fn stmt(&mut self, stmt: &Stmt) -> u32 {
        match &stmt.kind {
            StmtKind::Block(body) => {
                let id = self.node("Block");
                self.stmt_list(id, body);
                id
            }
            StmtKind::VariableDecl { name, ty, init } => {
                let id = self.node(&format!("VariableDecl {}: {}", name, ty));
                if let Some(init) = init {
                    let child = self.expr(init);
                    self.edge(id, child);
                }
                id
            }
            StmtKind::ConstDecl { name, ty, init } => {
                let id = self.node(&format!("ConstDecl {}: {}", name, ty));
                let child = self.expr(init);
                self.edge(id, child);
                id
            }
            StmtKind::Assignment { name, value } => {
                let id = self.node(&format!("Assignment {}", name));
                let child = self.expr(value);
                self.edge(id, child);
                id
            }
            StmtKind::PropertyAssignment {
                object,
                field,
                value,
            } => {
                let id = self.node(&format!("PropertyAssignment .{}", field));
                let obj = self.expr(object);
                self.edge(id, obj);
                let val = self.expr(value);
                self.edge(id, val);
                id
            }
            StmtKind::IndexAssignment {
                object,
                index,
                value,
            } => {
                let id = self.node("IndexAssignment");
                for expr in [object, index, value] {
                    let child = self.expr(expr);
                    self.edge(id, child);
                }
                id
            }
            StmtKind::ExprStmt(expr) => {
                let id = self.node("ExprStmt");
                let child = self.expr(expr);
                self.edge(id, child);
                id
            }
            StmtKind::IfStmt {
                cond,
                then_block,
                else_block,
            } => {
                let id = self.node("IfStmt");
                let c = self.expr(cond);
                self.edge(id, c);
                self.stmt_list(id, then_block);
                if let Some(else_block) = else_block {
                    self.stmt_list(id, else_block);
                }
                id
            }
            StmtKind::WhileStmt { cond, body } => {
                let id = self.node("WhileStmt");
                let c = self.expr(cond);
                self.edge(id, c);
                self.stmt_list(id, body);
                id
            }
            StmtKind::DoWhileStmt { body, cond } => {
                let id = self.node("DoWhileStmt");
                self.stmt_list(id, body);
                let c = self.expr(cond);
                self.edge(id, c);
                id
            }
            StmtKind::ForStmt {
                init,
                cond,
                step,
                body,
            } => {
                let id = self.node("ForStmt");
                if let Some(init) = init {
                    let child = self.stmt(init);
                    self.edge(id, child);
                }
                if let Some(cond) = cond {
                    let child = self.expr(cond);
                    self.edge(id, child);
                }
                if let Some(step) = step {
                    let child = self.stmt(step);
                    self.edge(id, child);
                }
                self.stmt_list(id, body);
                id
            }
            StmtKind::ForeachStmt {
                var,
                var_ty,
                iter,
                body,
            } => {
                let id = self.node(&format!("ForeachStmt {}: {}", var, var_ty));
                let child = self.expr(iter);
                self.edge(id, child);
                self.stmt_list(id, body);
                id
            }
            StmtKind::SwitchStmt {
                scrutinee,
                cases,
                default,
            } => {
                let id = self.node("SwitchStmt");
                let child = self.expr(scrutinee);
                self.edge(id, child);
                for case in cases {
                    let case_id = self.node("Case");
                    self.edge(id, case_id);
                    let label = self.expr(&case.label);
                    self.edge(case_id, label);
                    self.stmt_list(case_id, &case.body);
                }
                if let Some(default) = default {
                    let default_id = self.node("Default");
                    self.edge(id, default_id);
                    self.stmt_list(default_id, default);
                }
                id
            }
            StmtKind::BreakStmt => self.node("BreakStmt"),
            StmtKind::ContinueStmt => self.node("ContinueStmt"),
            StmtKind::ReturnStmt(value) => {
                let id = self.node("ReturnStmt");
                if let Some(value) = value {
                    let child = self.expr(value);
                    self.edge(id, child);
                }
                id
            }
            StmtKind::TryCatchStmt {
                try_block,
                catch_name,
                catch_block,
            } => {
                let id = self.node(&format!("TryCatchStmt catch({})", catch_name));
                self.stmt_list(id, try_block);
                self.stmt_list(id, catch_block);
                id
            }
            StmtKind::FunctionDecl(function) => {
                let id = self.node(&format!("FunctionDecl {}", function.qualified));
                self.stmt_list(id, &function.body);
                id
            }
            StmtKind::ClassDecl(class) => {
                let id = self.node(&format!("ClassDecl {}", class.name));
                for method in &class.methods {
                    let m = self.node(&format!("FunctionDecl {}", method.qualified));
                    self.edge(id, m);
                    self.stmt_list(m, &method.body);
                }
                id
            }
        }
    }

    fn stmt_list(&mut self, parent: u32, stmts: &[Stmt]) {
        for stmt in stmts {
            let child = self.stmt(stmt);
            self.edge(parent, child);
        }
    }

    fn expr(&mut self, expr: &Expr) -> u32 {
        let label = match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Lit::Int(v) => format!("Literal {}", v),
                Lit::Float(v) => format!("Literal {}", v),
                Lit::Str(v) => format!("Literal \"{}\"", v),
                Lit::Bool(v) => format!("Literal {}", v),
                Lit::Null => "Literal null".to_string(),
            },
            ExprKind::VariableRef(name) => format!("VariableRef {}", name),
            ExprKind::BinaryOp { .. } => "BinaryOp".to_string(),
            ExprKind::UnaryOp { .. } => "UnaryOp".to_string(),
            ExprKind::Ternary { .. } => "Ternary".to_string(),
            ExprKind::Call { target, .. } => match target {
                CallTarget::Function(name) => format!("Call {}", name),
                CallTarget::Method { owner, method, .. } => {
                    format!("Call {}_{}", owner, method)
                }
            },
            ExprKind::NewExpr { class, .. } => format!("NewExpr {}", class),
            ExprKind::PropertyAccess { field, .. } => format!("PropertyAccess .{}", field),
            ExprKind::IndexAccess { .. } => "IndexAccess".to_string(),
            ExprKind::ArrayLiteral(_) => "ArrayLiteral".to_string(),
            ExprKind::ThisExpr => "ThisExpr".to_string(),
        };
        let id = self.node(&format!("{} : {}", label, expr.ty));

        match &expr.kind {
            ExprKind::BinaryOp { lhs, rhs, .. } => {
                for child in [lhs, rhs] {
                    let c = self.expr(child);
                    self.edge(id, c);
                }
            }
            ExprKind::UnaryOp { operand, .. } => {
                let c = self.expr(operand);
                self.edge(id, c);
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                for child in [cond, then_expr, else_expr] {
                    let c = self.expr(child);
                    self.edge(id, c);
                }
            }
            ExprKind::Call { target, args } => {
                if let CallTarget::Method { object, .. } = target {
                    let c = self.expr(object);
                    self.edge(id, c);
                }
                for arg in args {
                    let c = self.expr(arg);
                    self.edge(id, c);
                }
            }
            ExprKind::NewExpr { args, .. } => {
                for arg in args {
                    let c = self.expr(arg);
                    self.edge(id, c);
                }
            }
            ExprKind::PropertyAccess { object, .. } => {
                let c = self.expr(object);
                self.edge(id, c);
            }
            ExprKind::IndexAccess { object, index } => {
                for child in [object, index] {
                    let c = self.expr(child);
                    self.edge(id, c);
                }
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    let c = self.expr(element);
                    self.edge(id, c);
                }
            }
            _ => {}
        }

        id
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
