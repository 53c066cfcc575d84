//! csc-util - Shared infrastructure for the CompilScript compiler.
//!
//! Every phase crate depends on this one. It provides:
//!
//! - [`Span`]: source location tracking (byte range plus line/column)
//! - [`Diagnostic`] / [`Handler`]: the diagnostic sink every phase writes
//!   into; errors are values, never panics
//! - [`IndexVec`] / [`Idx`]: vectors indexed by typed handles, used for the
//!   scope arena and other id-addressed tables

pub mod diagnostic;
pub mod index_vec;
pub mod span;

pub use diagnostic::{Diagnostic, ErrorCode, Handler, Phase, Severity};
pub use index_vec::{Idx, IndexVec};
pub use span::Span;
