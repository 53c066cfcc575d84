//! csc-drv - Compiler driver and public API.
//!
//! Orchestrates the pipeline:
//!
//! ```text
//! source text
//!      │
//!      ▼
//!  [csc-lex]  ──▶ tokens
//!      │
//!      ▼
//!  [csc-par]  ──▶ parse tree
//!      │
//!      ▼
//!  [csc-sem]  ──▶ typed AST + scope tree + class registry
//!      │
//!      ▼
//!  [csc-mem]  ──▶ annotated scope tree
//!      │
//!      ▼
//!  [csc-tac]  ──▶ TAC listing + function table
//! ```
//!
//! Each phase writes into one shared diagnostic handler and keeps going
//! past non-fatal problems; semantic analysis runs only on a parse with no
//! lex/syntax errors, and TAC generation runs only on an error-free
//! analysis. Every stateful component (handler, counters, tables) is
//! constructed inside [`compile`], so concurrent hosts get identical
//! output for identical input.

use csc_lex::Lexer;
use csc_par::Parser;
use csc_sem::{analyze, dot::program_to_dot, ScopeNode};
use csc_tac::{generate, validate};
use csc_util::{Diagnostic, Handler, Severity, Span};
use serde::Serialize;
use tracing::debug;

/// Configuration of one compile call
#[derive(Clone, Copy, Debug, Default)]
pub struct CompileOptions {
    /// Include a Graphviz DOT serialization of the typed AST
    pub return_ast_dot: bool,
    /// Run TAC generation when semantic analysis succeeded
    pub generate_tac: bool,
    /// Run the memory annotator over the scope tree
    pub annotate_memory: bool,
}

/// Result of one compile call
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    /// True iff no error-severity diagnostics were produced
    pub ok: bool,
    /// All diagnostics in emission order (warnings included)
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast_dot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tac: Option<TacReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<ScopeNode>,
}

/// TAC section of a report
#[derive(Clone, Debug, Serialize)]
pub struct TacReport {
    /// Textual listing, one line per entry
    pub code: Vec<String>,
    pub instruction_count: usize,
    pub temporaries_used: u32,
    pub functions_registered: usize,
    pub validation_errors: Vec<String>,
}

/// Compile CompilScript source text
///
/// Never panics on user input; all problems surface as diagnostics in the
/// returned [`Report`].
pub fn compile(source: &str, options: &CompileOptions) -> Report {
    let handler = Handler::new();

    let tokens = Lexer::new(source, &handler).tokenize();
    debug!(tokens = tokens.len(), "lexed");

    let program = Parser::new(tokens, &handler).parse();
    debug!(statements = program.len(), "parsed");

    let mut ast_dot = None;
    let mut scopes = None;
    let mut tac = None;

    // Semantic analysis needs a tree the parser fully understood.
    if !handler.has_errors() {
        let mut analysis = analyze(&program, &handler);
        debug!(
            scopes = analysis.table.scope_count(),
            classes = analysis.registry.len(),
            "analyzed"
        );

        if options.return_ast_dot {
            ast_dot = Some(program_to_dot(&analysis.program));
        }

        if options.annotate_memory {
            csc_mem::annotate(&mut analysis.table);
            debug!("annotated");
        }
        scopes = Some(analysis.table.to_tree());

        if options.generate_tac && !handler.has_errors() {
            let result = generate(&analysis.program);
            let validation_errors = validate(&result.instrs);
            for error in &validation_errors {
                handler.emit(Diagnostic::tac(error.clone(), Span::DUMMY));
            }
            debug!(
                instructions = result.instruction_count(),
                functions = result.functions.len(),
                "generated TAC"
            );
            tac = Some(TacReport {
                code: result.listing(),
                instruction_count: result.instruction_count(),
                temporaries_used: result.temporaries_used,
                functions_registered: result.functions.len(),
                validation_errors,
            });
        }
    }

    let ok = !handler.has_errors();
    Report {
        ok,
        diagnostics: handler.into_diagnostics(),
        ast_dot,
        tac,
        scopes,
    }
}

impl Report {
    /// Error-severity diagnostics only
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }
}
