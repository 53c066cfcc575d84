//! csc-sem - Semantic analyzer and type checker for CompilScript.
//!
//! This crate owns the static model of the language and the pass that
//! enforces it:
//!
//! - [`types`]: the [`Type`] enum plus the assignability, promotion, and
//!   array-unification rules
//! - [`table`]: the hierarchical symbol table; scopes live in an arena and
//!   reference each other by [`ScopeId`] handle, so there are no ownership
//!   cycles
//! - [`classes`]: the class registry with inheritance links, iterative
//!   cycle detection, and override checking
//! - [`tast`]: the typed AST the analyzer produces; every expression node
//!   carries its computed semantic type
//! - [`analyze`]: the analyzer itself, one matcher pass per construct
//! - [`dot`]: Graphviz DOT rendering of the typed AST for debugging hosts
//!
//! The analyzer never aborts on the first problem: diagnostics accumulate
//! in the shared [`csc_util::Handler`] and analysis continues, so a single
//! run reports everything it can find.

pub mod analyze;
pub mod classes;
pub mod dot;
pub mod table;
pub mod tast;
pub mod types;

pub use analyze::{analyze, Analysis};
pub use classes::{ClassMeta, ClassRegistry, MethodSig};
pub use table::{
    Address, DefineError, FnSig, Scope, ScopeId, ScopeKind, ScopeNode, Symbol, SymbolKind,
    SymbolTable,
};
pub use types::{Type, TypeError};
