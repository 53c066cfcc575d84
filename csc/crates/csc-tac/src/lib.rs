//! csc-tac - Three-address-code generation for CompilScript.
//!
//! Lowers the typed AST produced by `csc-sem` into a linear IR:
//!
//! - [`tac`]: the instruction forms and their textual rendering
//! - [`temp`]: the temporary allocator (LIFO recycling, Ershov-optimal
//!   peak)
//! - [`label`]: the label generator (one shared counter, prefixed hints)
//! - [`frame`]: activation records and the function table
//! - [`lower`]: the generator walking the typed AST
//! - [`validate`]: post-generation shape checks on the emitted IR
//!
//! Generation runs only when semantic analysis produced no errors, so the
//! generator trusts its input: every name resolves and every type fits.

pub mod frame;
pub mod label;
pub mod lower;
pub mod tac;
pub mod temp;
pub mod validate;

pub use frame::{ActivationRecord, FunctionInfo};
pub use label::{Label, LabelGen};
pub use lower::{generate, TacResult};
pub use tac::{Instr, Operand};
pub use temp::TempAllocator;
pub use validate::validate;
