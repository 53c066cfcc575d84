//! Lowering from the typed AST to the linear TAC stream.
//!
//! Contract highlights, all load-bearing for the backend:
//!
//! - expressions evaluate left-to-right at every node
//! - a pure variable reference is its own operand (no copy)
//! - an operand's temporary is released as soon as the producing
//!   instruction has consumed it, which keeps the live-temp peak at the
//!   Ershov number of the expression tree
//! - `&&`/`||` are jump-threaded; when they feed a control condition no
//!   intermediate boolean is materialized
//! - call arguments are pushed with `param` immediately after each
//!   argument's sub-expression completes; method calls push the receiver
//!   first and dispatch statically on `<Owner>_<method>`
//! - top-level statements form the implicit `main` function; every
//!   function ends with a `return`, synthesized when the body can fall
//!   off the end

use crate::frame::{ActivationRecord, FunctionInfo, FunctionTable};
use crate::label::{Label, LabelGen};
use crate::tac::{Instr, Operand};
use crate::temp::TempAllocator;
use csc_sem::tast::{
    BinOp, CallTarget, Class, Expr, ExprKind, Function, Lit, Program, Stmt, StmtKind, SwitchCase,
    UnOp,
};
use csc_sem::Type;

/// Everything the TAC phase hands to hosts and the backend
#[derive(Clone, Debug)]
pub struct TacResult {
    /// The instruction stream, function markers and labels included
    pub instrs: Vec<Instr>,
    /// Function table keyed by qualified name, in emission order
    pub functions: FunctionTable,
    /// Unique temporary names minted across all functions
    pub temporaries_used: u32,
}

impl TacResult {
    /// Instructions proper, excluding labels and function markers
    pub fn instruction_count(&self) -> usize {
        self.instrs.iter().filter(|i| !i.is_marker()).count()
    }

    /// Textual listing, one instruction per line
    pub fn listing(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.instrs.len() + 1);
        lines.push("# TAC Code Generation".to_string());
        for instr in &self.instrs {
            lines.push(instr.to_string());
            if let Instr::FuncBegin { frame_size, .. } = instr {
                lines.push(format!("# frame: {} bytes", frame_size));
            }
        }
        lines
    }
}

/// Lower a typed program to TAC
pub fn generate(program: &Program) -> TacResult {
    let mut gen = Generator::new();
    gen.run(program);
    TacResult {
        instrs: gen.instrs,
        functions: gen.functions,
        temporaries_used: gen.temporaries_used,
    }
}

struct Generator {
    instrs: Vec<Instr>,
    labels: LabelGen,
    temps: TempAllocator,
    temporaries_used: u32,
    /// `break` targets; loops and switches push here
    break_stack: Vec<Label>,
    /// `continue` targets; only loops push here
    continue_stack: Vec<Label>,
    frame: ActivationRecord,
    /// Index of the current function's `FuncBegin`, for patching
    func_begin: usize,
    /// Top-level statements lower into `main`, whose vars are globals
    in_main: bool,
    functions: FunctionTable,
    /// Functions and methods waiting to be lowered
    pending: Vec<Function>,
}

impl Generator {
    fn new() -> Self {
        Self {
            instrs: Vec::new(),
            labels: LabelGen::new(),
            temps: TempAllocator::new(),
            temporaries_used: 0,
            break_stack: Vec::new(),
            continue_stack: Vec::new(),
            frame: ActivationRecord::new("main"),
            func_begin: 0,
            in_main: true,
            functions: FunctionTable::new(),
            pending: Vec::new(),
        }
    }

    fn run(&mut self, program: &Program) {
        self.begin_function("main", Vec::new());
        self.in_main = true;
        for stmt in &program.body {
            self.lower_stmt(stmt);
        }
        self.end_function();

        let mut next = 0;
        while next < self.pending.len() {
            let function = self.pending[next].clone();
            next += 1;
            self.lower_function(&function);
        }
    }

    fn lower_function(&mut self, function: &Function) {
        let mut params = Vec::new();
        if function.class.is_some() {
            params.push("this".to_string());
        }
        params.extend(function.params.iter().map(|p| p.name.clone()));

        self.begin_function(&function.qualified, params);
        self.in_main = false;
        for stmt in &function.body {
            self.lower_stmt(stmt);
        }
        self.end_function();
    }

    fn begin_function(&mut self, name: &str, params: Vec<String>) {
        self.temps = TempAllocator::new();
        self.frame = ActivationRecord::new(name);
        for param in &params {
            self.frame.add_param(param.clone());
        }
        self.func_begin = self.instrs.len();
        self.instrs.push(Instr::FuncBegin {
            name: name.to_string(),
            params,
            frame_size: 0,
        });
    }

    fn end_function(&mut self) {
        if !matches!(self.instrs.last(), Some(Instr::Return(_))) {
            self.instrs.push(Instr::Return(None));
        }
        self.instrs.push(Instr::FuncEnd);

        self.frame.finish(self.temps.peak());
        self.temporaries_used += self.temps.total();

        let frame = std::mem::replace(&mut self.frame, ActivationRecord::new(""));
        if let Instr::FuncBegin { frame_size, params, .. } = &mut self.instrs[self.func_begin] {
            *frame_size = frame.frame_size;
            let params = params.clone();
            self.functions
                .insert(frame.name.clone(), FunctionInfo { params, frame });
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(body) => self.lower_stmts(body),

            StmtKind::VariableDecl { name, init, .. } => {
                if !self.in_main {
                    self.frame.add_local(name.clone());
                }
                if let Some(init) = init {
                    let src = self.lower_expr(init);
                    self.instrs.push(Instr::Copy {
                        dst: Operand::Var(name.clone()),
                        src: src.clone(),
                    });
                    self.temps.release(&src);
                }
            }

            StmtKind::ConstDecl { name, init, .. } => {
                if !self.in_main {
                    self.frame.add_local(name.clone());
                }
                let src = self.lower_expr(init);
                self.instrs.push(Instr::Copy {
                    dst: Operand::Var(name.clone()),
                    src: src.clone(),
                });
                self.temps.release(&src);
            }

            StmtKind::Assignment { name, value } => {
                let src = self.lower_expr(value);
                self.instrs.push(Instr::Copy {
                    dst: Operand::Var(name.clone()),
                    src: src.clone(),
                });
                self.temps.release(&src);
            }

            StmtKind::PropertyAssignment {
                object,
                field,
                value,
            } => {
                let object = self.lower_expr(object);
                let src = self.lower_expr(value);
                self.instrs.push(Instr::FieldStore {
                    object: object.clone(),
                    field: field.clone(),
                    src: src.clone(),
                });
                self.temps.release(&src);
                self.temps.release(&object);
            }

            StmtKind::IndexAssignment {
                object,
                index,
                value,
            } => {
                let array = self.lower_expr(object);
                let index = self.lower_expr(index);
                let src = self.lower_expr(value);
                self.instrs.push(Instr::IndexedStore {
                    array: array.clone(),
                    index: index.clone(),
                    src: src.clone(),
                });
                self.temps.release(&src);
                self.temps.release(&index);
                self.temps.release(&array);
            }

            StmtKind::ExprStmt(expr) => {
                if let ExprKind::Call { target, args } = &expr.kind {
                    if expr.ty == Type::Void {
                        self.lower_call(target, args, true);
                        return;
                    }
                }
                let value = self.lower_expr(expr);
                self.temps.release(&value);
            }

            StmtKind::IfStmt {
                cond,
                then_block,
                else_block,
            } => match else_block {
                Some(else_block) => {
                    let lelse = self.labels.fresh("else");
                    let lend = self.labels.fresh("end");
                    self.cond_false_jump(cond, &lelse);
                    self.lower_stmts(then_block);
                    self.instrs.push(Instr::Goto(lend.clone()));
                    self.instrs.push(Instr::Label(lelse));
                    self.lower_stmts(else_block);
                    self.instrs.push(Instr::Label(lend));
                }
                None => {
                    let lend = self.labels.fresh("end");
                    self.cond_false_jump(cond, &lend);
                    self.lower_stmts(then_block);
                    self.instrs.push(Instr::Label(lend));
                }
            },

            StmtKind::WhileStmt { cond, body } => {
                let lloop = self.labels.fresh("loop");
                let lend = self.labels.fresh("end");
                self.instrs.push(Instr::Label(lloop.clone()));
                self.cond_false_jump(cond, &lend);
                self.enter_loop(lloop.clone(), lend.clone());
                self.lower_stmts(body);
                self.leave_loop();
                self.instrs.push(Instr::Goto(lloop));
                self.instrs.push(Instr::Label(lend));
            }

            StmtKind::DoWhileStmt { body, cond } => {
                let lloop = self.labels.fresh("loop");
                // `continue` re-tests the condition instead of re-entering
                // the body.
                let lcond = self.labels.fresh("cond");
                let lend = self.labels.fresh("end");
                self.instrs.push(Instr::Label(lloop.clone()));
                self.enter_loop(lcond.clone(), lend.clone());
                self.lower_stmts(body);
                self.leave_loop();
                self.instrs.push(Instr::Label(lcond));
                self.cond_true_jump(cond, &lloop);
                self.instrs.push(Instr::Label(lend));
            }

            StmtKind::ForStmt {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.lower_stmt(init);
                }
                let lloop = self.labels.fresh("loop");
                let lstep = self.labels.fresh("step");
                let lend = self.labels.fresh("end");
                self.instrs.push(Instr::Label(lloop.clone()));
                if let Some(cond) = cond {
                    self.cond_false_jump(cond, &lend);
                }
                self.enter_loop(lstep.clone(), lend.clone());
                self.lower_stmts(body);
                self.leave_loop();
                self.instrs.push(Instr::Label(lstep));
                if let Some(step) = step {
                    self.lower_stmt(step);
                }
                self.instrs.push(Instr::Goto(lloop));
                self.instrs.push(Instr::Label(lend));
            }

            StmtKind::ForeachStmt {
                var, iter, body, ..
            } => self.lower_foreach(var, iter, body),

            StmtKind::SwitchStmt {
                scrutinee,
                cases,
                default,
            } => self.lower_switch(scrutinee, cases, default.as_deref()),

            StmtKind::BreakStmt => {
                if let Some(target) = self.break_stack.last().cloned() {
                    self.instrs.push(Instr::Goto(target));
                }
            }

            StmtKind::ContinueStmt => {
                if let Some(target) = self.continue_stack.last().cloned() {
                    self.instrs.push(Instr::Goto(target));
                }
            }

            StmtKind::ReturnStmt(value) => match value {
                Some(value) => {
                    let operand = self.lower_expr(value);
                    self.instrs.push(Instr::Return(Some(operand.clone())));
                    self.temps.release(&operand);
                }
                None => self.instrs.push(Instr::Return(None)),
            },

            StmtKind::TryCatchStmt {
                try_block,
                catch_name,
                catch_block,
            } => {
                let lcatch = self.labels.fresh("catch");
                let lend = self.labels.fresh("end");
                self.instrs.push(Instr::TryBegin(lcatch.clone()));
                self.lower_stmts(try_block);
                self.instrs.push(Instr::TryEnd);
                self.instrs.push(Instr::Goto(lend.clone()));
                self.instrs.push(Instr::Label(lcatch));
                if !self.in_main {
                    self.frame.add_local(catch_name.clone());
                }
                self.lower_stmts(catch_block);
                self.instrs.push(Instr::Label(lend));
            }

            StmtKind::FunctionDecl(function) => self.pending.push(function.clone()),

            StmtKind::ClassDecl(Class { methods, .. }) => {
                for method in methods {
                    self.pending.push(method.clone());
                }
            }
        }
    }

    fn lower_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.lower_stmt(stmt);
        }
    }

    fn lower_foreach(&mut self, var: &str, iter: &Expr, body: &[Stmt]) {
        if !self.in_main {
            self.frame.add_local(var.to_string());
        }

        let array = self.lower_expr(iter);
        let index = self.temps.fresh();
        self.instrs.push(Instr::Copy {
            dst: index.clone(),
            src: Operand::ConstInt(0),
        });
        self.instrs.push(Instr::Param(array.clone()));
        let limit = self.temps.fresh();
        self.instrs.push(Instr::Call {
            dst: Some(limit.clone()),
            func: "len".to_string(),
            argc: 1,
        });

        let lloop = self.labels.fresh("loop");
        let lstep = self.labels.fresh("step");
        let lend = self.labels.fresh("end");

        self.instrs.push(Instr::Label(lloop.clone()));
        let cond = self.temps.fresh();
        self.instrs.push(Instr::Binary {
            dst: cond.clone(),
            op: BinOp::Lt,
            lhs: index.clone(),
            rhs: limit.clone(),
        });
        self.instrs.push(Instr::IfFalse {
            cond: cond.clone(),
            target: lend.clone(),
        });
        self.temps.release(&cond);

        self.instrs.push(Instr::IndexedLoad {
            dst: Operand::Var(var.to_string()),
            array: array.clone(),
            index: index.clone(),
        });

        self.enter_loop(lstep.clone(), lend.clone());
        self.lower_stmts(body);
        self.leave_loop();

        self.instrs.push(Instr::Label(lstep));
        self.instrs.push(Instr::Binary {
            dst: index.clone(),
            op: BinOp::Add,
            lhs: index.clone(),
            rhs: Operand::ConstInt(1),
        });
        self.instrs.push(Instr::Goto(lloop));
        self.instrs.push(Instr::Label(lend));

        self.temps.release(&limit);
        self.temps.release(&index);
        self.temps.release(&array);
    }

    fn lower_switch(&mut self, scrutinee: &Expr, cases: &[SwitchCase], default: Option<&[Stmt]>) {
        let value = self.lower_expr(scrutinee);
        let lend = self.labels.fresh("end");
        let case_labels: Vec<Label> = cases.iter().map(|_| self.labels.fresh("case")).collect();
        let ldefault = default.map(|_| self.labels.fresh("default"));

        // Dispatch: one equality test per case, in declared order.
        for (case, label) in cases.iter().zip(&case_labels) {
            let case_value = self.lower_expr(&case.label);
            let test = self.temps.fresh();
            self.instrs.push(Instr::Binary {
                dst: test.clone(),
                op: BinOp::Eq,
                lhs: value.clone(),
                rhs: case_value.clone(),
            });
            self.instrs.push(Instr::If {
                cond: test.clone(),
                target: label.clone(),
            });
            self.temps.release(&test);
            self.temps.release(&case_value);
        }
        self.instrs
            .push(Instr::Goto(ldefault.clone().unwrap_or_else(|| lend.clone())));
        self.temps.release(&value);

        // Bodies fall through to the next case; `break` exits.
        self.break_stack.push(lend.clone());
        for (case, label) in cases.iter().zip(&case_labels) {
            self.instrs.push(Instr::Label(label.clone()));
            self.lower_stmts(&case.body);
        }
        if let (Some(label), Some(body)) = (ldefault, default) {
            self.instrs.push(Instr::Label(label));
            self.lower_stmts(body);
        }
        self.break_stack.pop();

        self.instrs.push(Instr::Label(lend));
    }

    fn enter_loop(&mut self, continue_to: Label, break_to: Label) {
        self.continue_stack.push(continue_to);
        self.break_stack.push(break_to);
    }

    fn leave_loop(&mut self) {
        self.continue_stack.pop();
        self.break_stack.pop();
    }

    // ------------------------------------------------------------------
    // Conditions with jump threading
    // ------------------------------------------------------------------

    /// Emit code that jumps to `target` when `cond` is false
    fn cond_false_jump(&mut self, cond: &Expr, target: &Label) {
        match &cond.kind {
            ExprKind::BinaryOp {
                op: BinOp::And,
                lhs,
                rhs,
            } => {
                self.cond_false_jump(lhs, target);
                self.cond_false_jump(rhs, target);
            }
            ExprKind::BinaryOp {
                op: BinOp::Or,
                lhs,
                rhs,
            } => {
                let ltrue = self.labels.fresh("true");
                self.cond_true_jump(lhs, &ltrue);
                self.cond_false_jump(rhs, target);
                self.instrs.push(Instr::Label(ltrue));
            }
            ExprKind::UnaryOp {
                op: UnOp::Not,
                operand,
            } => self.cond_true_jump(operand, target),
            _ => {
                let operand = self.lower_expr(cond);
                self.instrs.push(Instr::IfFalse {
                    cond: operand.clone(),
                    target: target.clone(),
                });
                self.temps.release(&operand);
            }
        }
    }

    /// Emit code that jumps to `target` when `cond` is true
    fn cond_true_jump(&mut self, cond: &Expr, target: &Label) {
        match &cond.kind {
            ExprKind::BinaryOp {
                op: BinOp::Or,
                lhs,
                rhs,
            } => {
                self.cond_true_jump(lhs, target);
                self.cond_true_jump(rhs, target);
            }
            ExprKind::BinaryOp {
                op: BinOp::And,
                lhs,
                rhs,
            } => {
                let lfalse = self.labels.fresh("false");
                self.cond_false_jump(lhs, &lfalse);
                self.cond_true_jump(rhs, target);
                self.instrs.push(Instr::Label(lfalse));
            }
            ExprKind::UnaryOp {
                op: UnOp::Not,
                operand,
            } => self.cond_false_jump(operand, target),
            _ => {
                let operand = self.lower_expr(cond);
                self.instrs.push(Instr::If {
                    cond: operand.clone(),
                    target: target.clone(),
                });
                self.temps.release(&operand);
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn lower_expr(&mut self, expr: &Expr) -> Operand {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Lit::Int(v) => Operand::ConstInt(*v),
                Lit::Float(v) => Operand::ConstFloat(*v),
                Lit::Str(v) => Operand::ConstStr(v.clone()),
                Lit::Bool(v) => Operand::ConstBool(*v),
                Lit::Null => Operand::Null,
            },

            ExprKind::VariableRef(name) => Operand::Var(name.clone()),

            ExprKind::ThisExpr => Operand::Var("this".to_string()),

            ExprKind::BinaryOp {
                op: BinOp::And,
                lhs,
                rhs,
            } => self.lower_and(lhs, rhs),

            ExprKind::BinaryOp {
                op: BinOp::Or,
                lhs,
                rhs,
            } => self.lower_or(lhs, rhs),

            ExprKind::BinaryOp { op, lhs, rhs } => {
                let lhs = self.lower_expr(lhs);
                let rhs = self.lower_expr(rhs);
                self.temps.release(&lhs);
                self.temps.release(&rhs);
                let dst = self.temps.fresh();
                self.instrs.push(Instr::Binary {
                    dst: dst.clone(),
                    op: *op,
                    lhs,
                    rhs,
                });
                dst
            }

            ExprKind::UnaryOp { op, operand } => {
                let operand = self.lower_expr(operand);
                self.temps.release(&operand);
                let dst = self.temps.fresh();
                self.instrs.push(Instr::Unary {
                    dst: dst.clone(),
                    op: *op,
                    operand,
                });
                dst
            }

            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                let dst = self.temps.fresh();
                let lelse = self.labels.fresh("else");
                let lend = self.labels.fresh("end");

                self.cond_false_jump(cond, &lelse);
                let then_value = self.lower_expr(then_expr);
                self.instrs.push(Instr::Copy {
                    dst: dst.clone(),
                    src: then_value.clone(),
                });
                self.temps.release(&then_value);
                self.instrs.push(Instr::Goto(lend.clone()));

                self.instrs.push(Instr::Label(lelse));
                let else_value = self.lower_expr(else_expr);
                self.instrs.push(Instr::Copy {
                    dst: dst.clone(),
                    src: else_value.clone(),
                });
                self.temps.release(&else_value);
                self.instrs.push(Instr::Label(lend));
                dst
            }

            ExprKind::Call { target, args } => self
                .lower_call(target, args, expr.ty == Type::Void)
                .unwrap_or(Operand::Null),

            ExprKind::NewExpr { class, args } => {
                for arg in args {
                    let operand = self.lower_expr(arg);
                    self.instrs.push(Instr::Param(operand.clone()));
                    self.temps.release(&operand);
                }
                let dst = self.temps.fresh();
                self.instrs.push(Instr::New {
                    dst: dst.clone(),
                    class: class.clone(),
                    argc: args.len(),
                });
                dst
            }

            ExprKind::PropertyAccess { object, field } => {
                let object = self.lower_expr(object);
                self.temps.release(&object);
                let dst = self.temps.fresh();
                self.instrs.push(Instr::FieldLoad {
                    dst: dst.clone(),
                    object,
                    field: field.clone(),
                });
                dst
            }

            ExprKind::IndexAccess { object, index } => {
                let array = self.lower_expr(object);
                let index = self.lower_expr(index);
                self.temps.release(&array);
                self.temps.release(&index);
                let dst = self.temps.fresh();
                self.instrs.push(Instr::IndexedLoad {
                    dst: dst.clone(),
                    array,
                    index,
                });
                dst
            }

            ExprKind::ArrayLiteral(elements) => {
                // Runtime array allocation mirrors the constructor
                // protocol, with the reserved class name `Array`.
                for element in elements {
                    let operand = self.lower_expr(element);
                    self.instrs.push(Instr::Param(operand.clone()));
                    self.temps.release(&operand);
                }
                let dst = self.temps.fresh();
                self.instrs.push(Instr::New {
                    dst: dst.clone(),
                    class: "Array".to_string(),
                    argc: elements.len(),
                });
                dst
            }
        }
    }

    /// Lower a call; returns the result operand unless the call is void
    fn lower_call(&mut self, target: &CallTarget, args: &[Expr], is_void: bool) -> Option<Operand> {
        let (func, argc) = match target {
            CallTarget::Function(name) => {
                for arg in args {
                    let operand = self.lower_expr(arg);
                    self.instrs.push(Instr::Param(operand.clone()));
                    self.temps.release(&operand);
                }
                (name.clone(), args.len())
            }
            CallTarget::Method {
                object,
                owner,
                method,
            } => {
                // The receiver is the implicit first parameter.
                let receiver = self.lower_expr(object);
                self.instrs.push(Instr::Param(receiver.clone()));
                self.temps.release(&receiver);
                for arg in args {
                    let operand = self.lower_expr(arg);
                    self.instrs.push(Instr::Param(operand.clone()));
                    self.temps.release(&operand);
                }
                (format!("{}_{}", owner, method), args.len() + 1)
            }
        };

        let dst = if is_void {
            None
        } else {
            Some(self.temps.fresh())
        };
        self.instrs.push(Instr::Call {
            dst: dst.clone(),
            func,
            argc,
        });
        dst
    }

    /// Value form of `a && b`
    fn lower_and(&mut self, lhs: &Expr, rhs: &Expr) -> Operand {
        let dst = self.temps.fresh();
        let lfalse = self.labels.fresh("false");
        let lend = self.labels.fresh("end");

        let lhs = self.lower_expr(lhs);
        self.instrs.push(Instr::IfFalse {
            cond: lhs.clone(),
            target: lfalse.clone(),
        });
        self.temps.release(&lhs);

        let rhs = self.lower_expr(rhs);
        self.instrs.push(Instr::Copy {
            dst: dst.clone(),
            src: rhs.clone(),
        });
        self.temps.release(&rhs);
        self.instrs.push(Instr::Goto(lend.clone()));

        self.instrs.push(Instr::Label(lfalse));
        self.instrs.push(Instr::Copy {
            dst: dst.clone(),
            src: Operand::ConstBool(false),
        });
        self.instrs.push(Instr::Label(lend));
        dst
    }

    /// Value form of `a || b`
    fn lower_or(&mut self, lhs: &Expr, rhs: &Expr) -> Operand {
        let dst = self.temps.fresh();
        let ltrue = self.labels.fresh("true");
        let lend = self.labels.fresh("end");

        let lhs = self.lower_expr(lhs);
        self.instrs.push(Instr::If {
            cond: lhs.clone(),
            target: ltrue.clone(),
        });
        self.temps.release(&lhs);

        let rhs = self.lower_expr(rhs);
        self.instrs.push(Instr::Copy {
            dst: dst.clone(),
            src: rhs.clone(),
        });
        self.temps.release(&rhs);
        self.instrs.push(Instr::Goto(lend.clone()));

        self.instrs.push(Instr::Label(ltrue));
        self.instrs.push(Instr::Copy {
            dst: dst.clone(),
            src: Operand::ConstBool(true),
        });
        self.instrs.push(Instr::Label(lend));
        dst
    }
}
