//! TAC instruction forms and their textual rendering.
//!
//! One instruction renders to one line; labels render as `label L:` on
//! their own line immediately before the instruction they mark.

use crate::label::Label;
use csc_sem::tast::{BinOp, UnOp};
use std::fmt;

/// An operand of a TAC instruction
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// Recycled temporary, prints as `tN`
    Temp(u32),
    /// Named variable (the read-optimization: a pure variable reference
    /// is its own operand, no copy through a temporary)
    Var(String),
    ConstInt(i64),
    ConstFloat(f64),
    ConstStr(String),
    ConstBool(bool),
    Null,
}

impl Operand {
    /// Temporary id, if this operand is a temporary
    pub fn temp_id(&self) -> Option<u32> {
        match self {
            Operand::Temp(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Temp(id) => write!(f, "t{}", id),
            Operand::Var(name) => write!(f, "{}", name),
            Operand::ConstInt(v) => write!(f, "{}", v),
            // `{:?}` keeps a trailing `.0` on round floats, so a float
            // constant never reads as an integer.
            Operand::ConstFloat(v) => write!(f, "{:?}", v),
            Operand::ConstStr(v) => write!(f, "\"{}\"", escape_str(v)),
            Operand::ConstBool(v) => write!(f, "{}", v),
            Operand::Null => write!(f, "null"),
        }
    }
}

/// Escape a string literal for the listing (`\n`, `\t`, `\"`, `\\`)
fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

/// One three-address instruction
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    /// `x = y op z`
    Binary {
        dst: Operand,
        op: BinOp,
        lhs: Operand,
        rhs: Operand,
    },
    /// `x = op y`
    Unary {
        dst: Operand,
        op: UnOp,
        operand: Operand,
    },
    /// `x = y`
    Copy { dst: Operand, src: Operand },
    /// `x = y[i]`
    IndexedLoad {
        dst: Operand,
        array: Operand,
        index: Operand,
    },
    /// `x[i] = y`
    IndexedStore {
        array: Operand,
        index: Operand,
        src: Operand,
    },
    /// `x = y.f`
    FieldLoad {
        dst: Operand,
        object: Operand,
        field: String,
    },
    /// `x.f = y`
    FieldStore {
        object: Operand,
        field: String,
        src: Operand,
    },
    /// `goto L`
    Goto(Label),
    /// `if x goto L`
    If { cond: Operand, target: Label },
    /// `ifFalse x goto L`
    IfFalse { cond: Operand, target: Label },
    /// `param x`
    Param(Operand),
    /// `x = call f, n` (no `x =` for void calls)
    Call {
        dst: Option<Operand>,
        func: String,
        argc: usize,
    },
    /// `x = new C, n`
    New {
        dst: Operand,
        class: String,
        argc: usize,
    },
    /// `return` / `return x`
    Return(Option<Operand>),
    /// `label L:`
    Label(Label),
    /// `@function name(params)`
    FuncBegin {
        name: String,
        params: Vec<String>,
        /// Frame size in bytes, filled in when the function is finished
        frame_size: u32,
    },
    /// `endfunc`
    FuncEnd,
    /// `try_begin Lcatch`
    TryBegin(Label),
    /// `try_end`
    TryEnd,
}

impl Instr {
    /// True for entries that are not counted as instructions
    pub fn is_marker(&self) -> bool {
        matches!(
            self,
            Instr::Label(_) | Instr::FuncBegin { .. } | Instr::FuncEnd
        )
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

fn unop_text(op: UnOp) -> &'static str {
    match op {
        UnOp::Neg => "-",
        UnOp::Not => "!",
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Binary { dst, op, lhs, rhs } => {
                write!(f, "{} = {} {} {}", dst, lhs, binop_text(*op), rhs)
            }
            Instr::Unary { dst, op, operand } => {
                write!(f, "{} = {} {}", dst, unop_text(*op), operand)
            }
            Instr::Copy { dst, src } => write!(f, "{} = {}", dst, src),
            Instr::IndexedLoad { dst, array, index } => {
                write!(f, "{} = {}[{}]", dst, array, index)
            }
            Instr::IndexedStore { array, index, src } => {
                write!(f, "{}[{}] = {}", array, index, src)
            }
            Instr::FieldLoad { dst, object, field } => {
                write!(f, "{} = {}.{}", dst, object, field)
            }
            Instr::FieldStore { object, field, src } => {
                write!(f, "{}.{} = {}", object, field, src)
            }
            Instr::Goto(label) => write!(f, "goto {}", label),
            Instr::If { cond, target } => write!(f, "if {} goto {}", cond, target),
            Instr::IfFalse { cond, target } => write!(f, "ifFalse {} goto {}", cond, target),
            Instr::Param(operand) => write!(f, "param {}", operand),
            Instr::Call { dst, func, argc } => match dst {
                Some(dst) => write!(f, "{} = call {}, {}", dst, func, argc),
                None => write!(f, "call {}, {}", func, argc),
            },
            Instr::New { dst, class, argc } => write!(f, "{} = new {}, {}", dst, class, argc),
            Instr::Return(value) => match value {
                Some(value) => write!(f, "return {}", value),
                None => write!(f, "return"),
            },
            Instr::Label(label) => write!(f, "label {}:", label),
            Instr::FuncBegin { name, params, .. } => {
                write!(f, "@function {}({})", name, params.join(", "))
            }
            Instr::FuncEnd => write!(f, "endfunc"),
            Instr::TryBegin(label) => write!(f, "try_begin {}", label),
            Instr::TryEnd => write!(f, "try_end"),
        }
    }
}
