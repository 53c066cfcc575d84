//! The semantic analyzer.
//!
//! One pass structure, three phases over the parse tree:
//!
//! 1. Register every top-level class name (enables forward references and
//!    catches duplicate classes).
//! 2. Populate class metadata (superclass links, cycle detection, fields,
//!    method signatures, override checks) and register top-level function
//!    signatures.
//! 3. Analyze all bodies and statements, producing the typed AST.
//!
//! The analyzer carries its whole state in [`Analyzer`]; nothing is global,
//! so two compilations can never observe each other.

mod exprs;
mod stmts;

use crate::classes::{ClassMeta, ClassRegistry, MethodSig};
use crate::table::{DefineError, FnSig, Symbol, SymbolKind, SymbolTable};
use crate::tast;
use crate::types::Type;
use csc_par::ast;
use csc_util::{Diagnostic, ErrorCode, Handler, Span};

/// Result of semantic analysis
#[derive(Clone, Debug)]
pub struct Analysis {
    /// Typed AST
    pub program: tast::Program,
    /// Full scope tree, global scope at the root
    pub table: SymbolTable,
    /// Class metadata
    pub registry: ClassRegistry,
}

/// Analyze a parse tree, reporting into `handler`
///
/// Always returns an [`Analysis`]; callers gate later phases on
/// `handler.has_errors()`.
pub fn analyze(program: &[ast::Stmt], handler: &Handler) -> Analysis {
    let mut analyzer = Analyzer::new(handler);
    let body = analyzer.run(program);
    Analysis {
        program: tast::Program { body },
        table: analyzer.table,
        registry: analyzer.registry,
    }
}

/// Semantic state threaded through the walk
pub(crate) struct Analyzer<'a> {
    pub(crate) table: SymbolTable,
    pub(crate) registry: ClassRegistry,
    pub(crate) handler: &'a Handler,
    /// Expected return types, one per entered function/method
    pub(crate) ret_stack: Vec<Type>,
    pub(crate) loop_depth: u32,
    pub(crate) switch_depth: u32,
    /// Set while analyzing method bodies of a class
    pub(crate) current_class: Option<String>,
}

impl<'a> Analyzer<'a> {
    fn new(handler: &'a Handler) -> Self {
        Self {
            table: SymbolTable::new(),
            registry: ClassRegistry::new(),
            handler,
            ret_stack: Vec::new(),
            loop_depth: 0,
            switch_depth: 0,
            current_class: None,
        }
    }

    fn run(&mut self, program: &[ast::Stmt]) -> Vec<tast::Stmt> {
        self.register_class_names(program);
        self.populate_classes(program);
        self.register_functions(program);
        self.analyze_block_stmts(program, true)
    }

    pub(crate) fn err(&self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.handler.emit(Diagnostic::semantic(code, message, span));
    }

    pub(crate) fn warn(&self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.handler
            .emit(Diagnostic::semantic_warning(code, message, span));
    }

    // ------------------------------------------------------------------
    // Pass 1: class names
    // ------------------------------------------------------------------

    fn register_class_names(&mut self, program: &[ast::Stmt]) {
        for stmt in program {
            let ast::Stmt::Class(decl) = stmt else {
                continue;
            };
            if !self
                .registry
                .register(ClassMeta::new(decl.name.clone(), decl.name_span))
            {
                self.err(
                    ErrorCode::DuplicateName,
                    format!("class `{}` is already declared", decl.name),
                    decl.name_span,
                );
                continue;
            }
            let symbol = Symbol::new(
                decl.name.clone(),
                SymbolKind::Class,
                Type::Class(decl.name.clone()),
                false,
                decl.name_span,
            );
            self.define_or_report(symbol, decl.name_span);
        }
    }

    // ------------------------------------------------------------------
    // Pass 2: class metadata and top-level function signatures
    // ------------------------------------------------------------------

    fn populate_classes(&mut self, program: &[ast::Stmt]) {
        // Only the registered declaration of each name contributes members;
        // a duplicate was already reported and must not merge its body into
        // the first class's metadata.
        let class_decls: Vec<&ast::ClassDecl> = program
            .iter()
            .filter_map(|s| match s {
                ast::Stmt::Class(decl) => Some(decl),
                _ => None,
            })
            .filter(|decl| self.is_registered_decl(decl))
            .collect();

        // Superclass links first, so cycle detection sees the whole graph.
        for decl in &class_decls {
            let Some(superclass) = &decl.superclass else {
                continue;
            };
            if !self.registry.contains(&superclass.name) {
                self.err(
                    ErrorCode::UndeclaredName,
                    format!("unknown superclass `{}`", superclass.name),
                    superclass.span,
                );
            } else if superclass.name == decl.name {
                self.err(
                    ErrorCode::InheritanceCycle,
                    format!("class `{}` cannot inherit from itself", decl.name),
                    superclass.span,
                );
            } else {
                self.registry.set_superclass(&decl.name, &superclass.name);
            }
        }

        for decl in &class_decls {
            if self.registry.has_cycle(&decl.name) {
                self.err(
                    ErrorCode::InheritanceCycle,
                    format!("inheritance cycle through class `{}`", decl.name),
                    decl.name_span,
                );
                // Break the cycle so later ancestor walks terminate cleanly.
                if let Some(meta) = self.registry.get_mut(&decl.name) {
                    meta.superclass = None;
                }
            }
        }

        for decl in &class_decls {
            self.populate_members(decl);
        }

        for decl in &class_decls {
            self.check_overrides(decl);
        }
    }

    fn populate_members(&mut self, decl: &ast::ClassDecl) {
        for member in &decl.members {
            match member {
                ast::ClassMember::Field(field) => {
                    let ty = match &field.ty {
                        Some(annotation) => self.resolve_type(annotation),
                        None => {
                            self.err(
                                ErrorCode::TypeMismatch,
                                format!("field `{}` needs a type annotation", field.name),
                                field.name_span,
                            );
                            Type::Any
                        }
                    };
                    if field.init.is_some() {
                        self.err(
                            ErrorCode::TypeMismatch,
                            format!(
                                "field `{}` cannot have an initializer; assign it in the constructor",
                                field.name
                            ),
                            field.name_span,
                        );
                    }
                    let meta = self.registry.get_mut(&decl.name).expect("registered");
                    if meta.fields.contains_key(&field.name)
                        || meta.methods.contains_key(&field.name)
                    {
                        self.err(
                            ErrorCode::DuplicateName,
                            format!("duplicate member `{}` in class `{}`", field.name, decl.name),
                            field.name_span,
                        );
                    } else {
                        let meta = self.registry.get_mut(&decl.name).expect("registered");
                        meta.fields.insert(field.name.clone(), ty);
                    }
                }
                ast::ClassMember::Method(method) => {
                    let sig = self.method_sig(method);
                    let meta = self.registry.get_mut(&decl.name).expect("registered");
                    if meta.methods.contains_key(&method.name)
                        || meta.fields.contains_key(&method.name)
                    {
                        self.err(
                            ErrorCode::DuplicateName,
                            format!(
                                "duplicate member `{}` in class `{}`",
                                method.name, decl.name
                            ),
                            method.name_span,
                        );
                        continue;
                    }
                    if method.name == "constructor" {
                        if sig.ret != Type::Void {
                            self.err(
                                ErrorCode::TypeMismatch,
                                "a constructor cannot declare a return type",
                                method.name_span,
                            );
                        }
                        let meta = self.registry.get_mut(&decl.name).expect("registered");
                        meta.has_constructor = true;
                    }
                    let meta = self.registry.get_mut(&decl.name).expect("registered");
                    meta.methods.insert(method.name.clone(), sig);
                }
            }
        }
    }

    fn method_sig(&mut self, method: &ast::FnDecl) -> MethodSig {
        let params = method
            .params
            .iter()
            .map(|p| (p.name.clone(), self.resolve_type(&p.ty)))
            .collect();
        let ret = method
            .ret
            .as_ref()
            .map(|t| self.resolve_type(t))
            .unwrap_or(Type::Void);
        MethodSig {
            name: method.name.clone(),
            params,
            ret,
            span: method.name_span,
        }
    }

    fn check_overrides(&mut self, decl: &ast::ClassDecl) {
        let Some(parent) = self.registry.superclass_of(&decl.name) else {
            return;
        };
        let Some(meta) = self.registry.get(&decl.name) else {
            return;
        };
        let own: Vec<MethodSig> = meta.methods.values().cloned().collect();
        for sig in own {
            if sig.name == "constructor" {
                continue;
            }
            let Some((inherited, _)) = self.registry.lookup_method(&parent, &sig.name) else {
                continue;
            };
            let arity_ok = inherited.arity() == sig.arity();
            let params_ok = arity_ok
                && inherited
                    .params
                    .iter()
                    .zip(sig.params.iter())
                    .all(|((_, base), (_, over))| {
                        crate::types::compatible_assign(&self.registry, base, over)
                    });
            let ret_ok = inherited.ret == sig.ret;
            if !params_ok || !ret_ok {
                self.err(
                    ErrorCode::OverrideIncompatible,
                    format!(
                        "method `{}` overrides an inherited method with a different signature",
                        sig.name
                    ),
                    sig.span,
                );
            }
        }
    }

    fn register_functions(&mut self, program: &[ast::Stmt]) {
        for stmt in program {
            let ast::Stmt::Function(decl) = stmt else {
                continue;
            };
            let sig = self.fn_sig(decl);
            let symbol =
                Symbol::function(decl.name.clone(), SymbolKind::Function, sig, decl.name_span);
            self.define_or_report(symbol, decl.name_span);
        }
    }

    pub(crate) fn fn_sig(&mut self, decl: &ast::FnDecl) -> FnSig {
        let params = decl
            .params
            .iter()
            .map(|p| (p.name.clone(), self.resolve_type(&p.ty)))
            .collect();
        let ret = decl
            .ret
            .as_ref()
            .map(|t| self.resolve_type(t))
            .unwrap_or(Type::Void);
        FnSig { params, ret }
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    /// True when `decl` is the declaration the registry actually holds
    ///
    /// The registry keeps the first declaration of a name; a duplicate
    /// fails this check because its declaration site differs.
    pub(crate) fn is_registered_decl(&self, decl: &ast::ClassDecl) -> bool {
        self.registry
            .get(&decl.name)
            .is_some_and(|meta| meta.span == decl.name_span)
    }

    /// Turn a written annotation into a semantic type
    pub(crate) fn resolve_type(&mut self, annotation: &ast::TypeExpr) -> Type {
        let base = match &annotation.base {
            ast::BaseType::Integer => Type::Integer,
            ast::BaseType::Float => Type::Float,
            ast::BaseType::Str => Type::Str,
            ast::BaseType::Boolean => Type::Boolean,
            ast::BaseType::Void => Type::Void,
            ast::BaseType::Named(name) => {
                if !self.registry.contains(name) {
                    self.err(
                        ErrorCode::UndeclaredName,
                        format!("unknown type `{}`", name),
                        annotation.span,
                    );
                }
                Type::Class(name.clone())
            }
        };
        if annotation.rank == 0 {
            base
        } else {
            Type::array(base, annotation.rank)
        }
    }

    /// Define a symbol, mapping failures to diagnostics
    pub(crate) fn define_or_report(&mut self, symbol: Symbol, span: Span) {
        let name = symbol.name.clone();
        match self.table.define(symbol) {
            Ok(()) => {}
            Err(DefineError::BuiltinClash) => {
                self.err(
                    ErrorCode::BuiltinClash,
                    format!("cannot redefine built-in `{}`", name),
                    span,
                );
            }
            Err(DefineError::Duplicate(previous)) => {
                self.err(
                    ErrorCode::DuplicateName,
                    format!(
                        "`{}` is already declared in this scope (line {})",
                        name, previous.line
                    ),
                    span,
                );
            }
        }
    }
}
