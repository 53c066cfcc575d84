//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! Every compilation owns one [`Handler`]; all phases push into it and
//! continue past non-fatal problems, so one run reports as many issues as
//! possible. A [`Diagnostic`] serializes to the wire shape consumed by
//! hosts:
//!
//! ```json
//! { "kind": "semantic", "message": "...", "line": 3, "column": 9, "length": 5 }
//! ```
//!
//! `line` is 1-based, `column` 0-based, `length` is the highlighted span in
//! bytes.

mod codes;

pub use codes::ErrorCode;

use crate::Span;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::cell::RefCell;
use std::fmt;

/// Pipeline phase that produced a diagnostic
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Lex,
    Syntax,
    Semantic,
    Tac,
}

impl Phase {
    /// Wire name of the phase
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Lex => "lex",
            Phase::Syntax => "syntax",
            Phase::Semantic => "semantic",
            Phase::Tac => "tac",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Prevents TAC generation and fails the compile
    Error,
    /// Reported but never blocks later phases
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with phase, severity, and location
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// Which phase produced it
    pub phase: Phase,
    /// Error or warning
    pub severity: Severity,
    /// Category, for semantic/TAC diagnostics
    pub code: Option<ErrorCode>,
    /// Human-readable message
    pub message: String,
    /// Offending source span
    pub span: Span,
}

impl Diagnostic {
    /// Create a new diagnostic
    ///
    /// The phase-specific constructors below are the usual entry points.
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::{Diagnostic, Phase, Severity, Span};
    ///
    /// let diag = Diagnostic::new(Phase::Lex, Severity::Error, None, "bad input", Span::DUMMY);
    /// assert_eq!(diag.phase, Phase::Lex);
    /// assert_eq!(diag.code, None);
    /// ```
    pub fn new(
        phase: Phase,
        severity: Severity,
        code: Option<ErrorCode>,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            phase,
            severity,
            code,
            message: message.into(),
            span,
        }
    }

    /// Lexical error
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::{Diagnostic, Phase, Span};
    ///
    /// let diag = Diagnostic::lex("unterminated string literal", Span::DUMMY);
    /// assert_eq!(diag.phase, Phase::Lex);
    /// ```
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::new(Phase::Lex, Severity::Error, None, message, span)
    }

    /// Syntax error
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::{Diagnostic, Phase, Span};
    ///
    /// let diag = Diagnostic::syntax("expected `;` after expression", Span::DUMMY);
    /// assert_eq!(diag.phase, Phase::Syntax);
    /// ```
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(Phase::Syntax, Severity::Error, None, message, span)
    }

    /// Semantic error with a category code
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::{Diagnostic, ErrorCode, Severity, Span};
    ///
    /// let diag = Diagnostic::semantic(
    ///     ErrorCode::UndeclaredName,
    ///     "use of undeclared name `x`",
    ///     Span::DUMMY,
    /// );
    /// assert_eq!(diag.code, Some(ErrorCode::UndeclaredName));
    /// assert_eq!(diag.severity, Severity::Error);
    /// ```
    pub fn semantic(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Phase::Semantic, Severity::Error, Some(code), message, span)
    }

    /// Semantic warning with a category code
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::{Diagnostic, ErrorCode, Severity, Span};
    ///
    /// let diag = Diagnostic::semantic_warning(
    ///     ErrorCode::DeadCode,
    ///     "unreachable statement",
    ///     Span::DUMMY,
    /// );
    /// assert_eq!(diag.severity, Severity::Warning);
    /// ```
    pub fn semantic_warning(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Phase::Semantic, Severity::Warning, Some(code), message, span)
    }

    /// TAC validation error
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::{Diagnostic, ErrorCode, Span};
    ///
    /// let diag = Diagnostic::tac("jump to undefined label `L3`", Span::DUMMY);
    /// assert_eq!(diag.code, Some(ErrorCode::TacValidation));
    /// ```
    pub fn tac(message: impl Into<String>, span: Span) -> Self {
        Self::new(
            Phase::Tac,
            Severity::Error,
            Some(ErrorCode::TacValidation),
            message,
            span,
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} {}",
            self.span.line, self.span.column, self.phase, self.severity
        )?;
        if let Some(code) = self.code {
            write!(f, " [{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Diagnostic", 5)?;
        st.serialize_field("kind", self.phase.as_str())?;
        st.serialize_field("message", &self.message)?;
        st.serialize_field("line", &self.span.line)?;
        st.serialize_field("column", &self.span.column)?;
        st.serialize_field("length", &(self.span.len() as u32))?;
        st.end()
    }
}

/// Handler for collecting diagnostics
///
/// Uses interior mutability so a phase can hold `&Handler` alongside
/// mutable access to its own state. One handler per compilation; never
/// shared across compiles.
///
/// # Examples
///
/// ```
/// use csc_util::{Diagnostic, Handler, Span};
///
/// let handler = Handler::new();
/// handler.emit(Diagnostic::lex("unknown character `@`", Span::DUMMY));
/// assert!(handler.has_errors());
/// ```
#[derive(Debug, Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create a new handler
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::Handler;
    ///
    /// let handler = Handler::new();
    /// assert!(!handler.has_errors());
    /// ```
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Record a diagnostic
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::{Diagnostic, Handler, Span};
    ///
    /// let handler = Handler::new();
    /// handler.emit(Diagnostic::syntax("expected `)`", Span::DUMMY));
    /// assert_eq!(handler.error_count(), 1);
    /// ```
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Check if any error-severity diagnostics have been reported
    ///
    /// Warnings alone leave this false, which is what lets a compile with
    /// only dead-code warnings still produce TAC.
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::{Diagnostic, ErrorCode, Handler, Span};
    ///
    /// let handler = Handler::new();
    /// handler.emit(Diagnostic::semantic_warning(
    ///     ErrorCode::DeadCode,
    ///     "unreachable statement",
    ///     Span::DUMMY,
    /// ));
    /// assert!(!handler.has_errors());
    /// ```
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Number of error-severity diagnostics
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::Handler;
    ///
    /// let handler = Handler::new();
    /// assert_eq!(handler.error_count(), 0);
    /// ```
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Number of warning-severity diagnostics
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::{Diagnostic, ErrorCode, Handler, Span};
    ///
    /// let handler = Handler::new();
    /// handler.emit(Diagnostic::semantic_warning(
    ///     ErrorCode::DeadCode,
    ///     "unreachable statement",
    ///     Span::DUMMY,
    /// ));
    /// assert_eq!(handler.warning_count(), 1);
    /// ```
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Snapshot of all diagnostics in emission order
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::{Diagnostic, Handler, Span};
    ///
    /// let handler = Handler::new();
    /// handler.emit(Diagnostic::lex("first", Span::DUMMY));
    /// handler.emit(Diagnostic::syntax("second", Span::DUMMY));
    /// let diags = handler.diagnostics();
    /// assert_eq!(diags.len(), 2);
    /// assert_eq!(diags[0].message, "first");
    /// ```
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Drain the handler, consuming it
    ///
    /// # Examples
    ///
    /// ```
    /// use csc_util::{Diagnostic, Handler, Span};
    ///
    /// let handler = Handler::new();
    /// handler.emit(Diagnostic::lex("bad char", Span::DUMMY));
    /// let diags = handler.into_diagnostics();
    /// assert_eq!(diags.len(), 1);
    /// ```
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}
