//! Hierarchical symbol table.
//!
//! Scopes live in an arena ([`IndexVec`]) and reference their parents by
//! [`ScopeId`] handle; children are owned as a handle list. `enter`/`leave`
//! move a cursor through the tree, and the whole tree stays addressable
//! afterwards, which is what the memory annotator and the scopes JSON dump
//! walk.

use crate::types::Type;
use csc_util::{Idx, IndexVec, Span};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a scope in the arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl Idx for ScopeId {
    fn from_usize(idx: usize) -> Self {
        ScopeId(idx as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl ScopeId {
    /// The global scope is always the first arena entry
    pub const GLOBAL: ScopeId = ScopeId(0);
}

/// Kind of a scope
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Block,
    Function,
    Method,
    Class,
    LoopBody,
    SwitchCase,
    Catch,
}

impl ScopeKind {
    /// Name used in the scopes JSON dump
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Global => "GLOBAL",
            ScopeKind::Block => "BLOCK",
            ScopeKind::Function => "FUNCTION",
            ScopeKind::Method => "METHOD",
            ScopeKind::Class => "CLASS",
            ScopeKind::LoopBody => "LOOP_BODY",
            ScopeKind::SwitchCase => "SWITCH_CASE",
            ScopeKind::Catch => "CATCH",
        }
    }
}

/// Kind of a symbol
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Parameter,
    Function,
    Method,
    Class,
    Field,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Variable => "VARIABLE",
            SymbolKind::Constant => "CONSTANT",
            SymbolKind::Parameter => "PARAMETER",
            SymbolKind::Function => "FUNCTION",
            SymbolKind::Method => "METHOD",
            SymbolKind::Class => "CLASS",
            SymbolKind::Field => "FIELD",
        }
    }
}

/// Storage assigned by the memory annotator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Address {
    /// Not annotated (functions, classes, or annotator not run)
    None,
    /// Slot in the flat global region
    Global(u32),
    /// Local slot, byte offset below the frame pointer
    Stack(u32),
    /// Parameter slot, by declaration index
    Param(u32),
    /// Field offset from the instance base
    Heap(u32),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::None => write!(f, "none"),
            Address::Global(n) => write!(f, "global[{}]", n),
            Address::Stack(n) => write!(f, "stack[-{}]", n),
            Address::Param(n) => write!(f, "param[{}]", n),
            Address::Heap(n) => write!(f, "heap+{}", n),
        }
    }
}

/// Signature attached to function and method symbols
#[derive(Clone, Debug, PartialEq)]
pub struct FnSig {
    pub params: Vec<(String, Type)>,
    pub ret: Type,
}

/// One named entity
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub mutable: bool,
    /// Declaration site
    pub span: Span,
    /// Filled in by the memory annotator
    pub address: Address,
    /// Present for Function/Method symbols
    pub sig: Option<FnSig>,
    /// Pre-registered name that user code must not redefine
    pub builtin: bool,
}

impl Symbol {
    /// Plain symbol without a signature
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Type, mutable: bool, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            mutable,
            span,
            address: Address::None,
            sig: None,
            builtin: false,
        }
    }

    /// Function or method symbol carrying its signature
    pub fn function(
        name: impl Into<String>,
        kind: SymbolKind,
        sig: FnSig,
        span: Span,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            ty: sig.ret.clone(),
            mutable: false,
            span,
            address: Address::None,
            sig: Some(sig),
            builtin: false,
        }
    }
}

/// One scope: local bindings plus tree links
#[derive(Clone, Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Display name: function/class name, or the kind for anonymous scopes
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Bindings in declaration order
    pub symbols: IndexMap<String, Symbol>,
}

/// Failure modes of [`SymbolTable::define`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefineError {
    /// Name already bound in this scope; carries the earlier site
    Duplicate(Span),
    /// Name is a protected built-in
    BuiltinClash,
}

/// The scope tree of one compilation
#[derive(Clone, Debug)]
pub struct SymbolTable {
    scopes: IndexVec<ScopeId, Scope>,
    current: ScopeId,
}

impl SymbolTable {
    /// Create a table holding the global scope with the built-ins bound
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();
        scopes.push(Scope {
            kind: ScopeKind::Global,
            name: "global".to_string(),
            parent: None,
            children: Vec::new(),
            symbols: IndexMap::new(),
        });

        let mut table = Self {
            scopes,
            current: ScopeId::GLOBAL,
        };
        table.register_builtins();
        table
    }

    fn register_builtins(&mut self) {
        let mut print = Symbol::function(
            "print",
            SymbolKind::Function,
            FnSig {
                params: vec![("value".to_string(), Type::Any)],
                ret: Type::Void,
            },
            Span::DUMMY,
        );
        print.builtin = true;

        let mut len = Symbol::function(
            "len",
            SymbolKind::Function,
            FnSig {
                params: vec![("arr".to_string(), Type::array(Type::Any, 1))],
                ret: Type::Integer,
            },
            Span::DUMMY,
        );
        len.builtin = true;

        let global = &mut self.scopes[ScopeId::GLOBAL];
        global.symbols.insert(print.name.clone(), print);
        global.symbols.insert(len.name.clone(), len);
    }

    /// Currently active scope
    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Borrow a scope by handle
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Mutably borrow a scope by handle
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id]
    }

    /// Number of scopes in the arena
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Push a child of the current scope and make it current
    pub fn enter(&mut self, kind: ScopeKind, name: impl Into<String>) -> ScopeId {
        let id = self.scopes.push(Scope {
            kind,
            name: name.into(),
            parent: Some(self.current),
            children: Vec::new(),
            symbols: IndexMap::new(),
        });
        self.scopes[self.current].children.push(id);
        self.current = id;
        id
    }

    /// Pop back to the parent scope
    pub fn leave(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    /// Bind a symbol in the current scope
    pub fn define(&mut self, symbol: Symbol) -> Result<(), DefineError> {
        let scope = &mut self.scopes[self.current];
        if let Some(existing) = scope.symbols.get(&symbol.name) {
            if existing.builtin {
                return Err(DefineError::BuiltinClash);
            }
            return Err(DefineError::Duplicate(existing.span));
        }
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Look up a name in the current scope only
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.current].symbols.get(name)
    }

    /// Look up a name along the scope chain, innermost first
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.lookup_with_scope(name).map(|(_, symbol)| symbol)
    }

    /// Like [`lookup`](Self::lookup) but also names the defining scope
    pub fn lookup_with_scope(&self, name: &str) -> Option<(ScopeId, &Symbol)> {
        let mut id = self.current;
        loop {
            let scope = &self.scopes[id];
            if let Some(symbol) = scope.symbols.get(name) {
                return Some((id, symbol));
            }
            id = scope.parent?;
        }
    }

    /// Mutable lookup along the chain, for const-tracking updates
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let mut id = self.current;
        loop {
            if self.scopes[id].symbols.contains_key(name) {
                return self.scopes[id].symbols.get_mut(name);
            }
            id = self.scopes[id].parent?;
        }
    }

    /// Scope chain from `from` up to the global scope, inclusive
    pub fn chain(&self, from: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![from];
        let mut id = from;
        while let Some(parent) = self.scopes[id].parent {
            chain.push(parent);
            id = parent;
        }
        chain
    }

    /// Serializable tree rooted at the global scope
    pub fn to_tree(&self) -> ScopeNode {
        self.node(ScopeId::GLOBAL)
    }

    fn node(&self, id: ScopeId) -> ScopeNode {
        let scope = &self.scopes[id];
        ScopeNode {
            name: scope.name.clone(),
            kind: scope.kind.as_str().to_string(),
            symbols: scope
                .symbols
                .iter()
                .map(|(name, symbol)| {
                    (
                        name.clone(),
                        SymbolNode {
                            ty: symbol.ty.to_string(),
                            kind: symbol.kind.as_str().to_string(),
                            mutable: symbol.mutable,
                            address: symbol.address.to_string(),
                        },
                    )
                })
                .collect(),
            children: scope.children.iter().map(|&c| self.node(c)).collect(),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialized scope, the JSON layout hosts consume
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ScopeNode {
    pub name: String,
    pub kind: String,
    pub symbols: IndexMap<String, SymbolNode>,
    pub children: Vec<ScopeNode>,
}

/// Serialized symbol entry
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SymbolNode {
    #[serde(rename = "type")]
    pub ty: String,
    pub kind: String,
    pub mutable: bool,
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, ty: Type) -> Symbol {
        Symbol::new(name, SymbolKind::Variable, ty, true, Span::DUMMY)
    }

    #[test]
    fn test_builtins_preregistered() {
        let table = SymbolTable::new();
        let print = table.lookup("print").unwrap();
        assert_eq!(print.kind, SymbolKind::Function);
        assert!(print.builtin);
        assert!(table.lookup("len").is_some());
    }

    #[test]
    fn test_builtin_clash() {
        let mut table = SymbolTable::new();
        let result = table.define(Symbol::function(
            "print",
            SymbolKind::Function,
            FnSig {
                params: vec![],
                ret: Type::Void,
            },
            Span::DUMMY,
        ));
        assert_eq!(result, Err(DefineError::BuiltinClash));
    }

    #[test]
    fn test_duplicate_across_kinds() {
        let mut table = SymbolTable::new();
        table.define(var("x", Type::Integer)).unwrap();
        // Same name as a different kind is still a duplicate.
        let result = table.define(Symbol::new(
            "x",
            SymbolKind::Constant,
            Type::Str,
            false,
            Span::DUMMY,
        ));
        assert!(matches!(result, Err(DefineError::Duplicate(_))));
    }

    #[test]
    fn test_shadowing_in_inner_scope() {
        let mut table = SymbolTable::new();
        table.define(var("x", Type::Integer)).unwrap();

        table.enter(ScopeKind::Block, "block");
        table.define(var("x", Type::Str)).unwrap();
        assert_eq!(table.lookup("x").unwrap().ty, Type::Str);

        table.leave();
        assert_eq!(table.lookup("x").unwrap().ty, Type::Integer);
    }

    #[test]
    fn test_lookup_walks_chain() {
        let mut table = SymbolTable::new();
        table.define(var("outer", Type::Boolean)).unwrap();
        table.enter(ScopeKind::Function, "f");
        table.enter(ScopeKind::Block, "block");

        assert!(table.lookup("outer").is_some());
        assert!(table.lookup_local("outer").is_none());
        assert!(table.lookup("missing").is_none());
    }

    #[test]
    fn test_defining_scope_is_on_chain() {
        let mut table = SymbolTable::new();
        table.define(var("g", Type::Integer)).unwrap();
        table.enter(ScopeKind::Function, "f");
        let inner = table.enter(ScopeKind::Block, "block");

        let (defining, _) = table.lookup_with_scope("g").unwrap();
        assert!(table.chain(inner).contains(&defining));
    }

    #[test]
    fn test_tree_serialization_round_trip() {
        let mut table = SymbolTable::new();
        table.define(var("x", Type::Integer)).unwrap();
        table.enter(ScopeKind::Function, "f");
        table
            .define(Symbol::new(
                "p",
                SymbolKind::Parameter,
                Type::Float,
                true,
                Span::DUMMY,
            ))
            .unwrap();
        table.leave();

        let tree = table.to_tree();
        let json = serde_json::to_string(&tree).unwrap();
        let parsed: ScopeNode = serde_json::from_str(&json).unwrap();
        assert_eq!(tree, parsed);

        assert_eq!(parsed.kind, "GLOBAL");
        assert_eq!(parsed.children[0].name, "f");
        assert_eq!(parsed.children[0].symbols["p"].ty, "float");
        assert_eq!(parsed.children[0].symbols["p"].address, "none");
    }

    #[test]
    fn test_symbol_order_is_declaration_order() {
        let mut table = SymbolTable::new();
        table.define(var("z", Type::Integer)).unwrap();
        table.define(var("a", Type::Integer)).unwrap();
        let tree = table.to_tree();
        let names: Vec<_> = tree.symbols.keys().cloned().collect();
        // Built-ins first, then user symbols in declaration order.
        assert_eq!(names, vec!["print", "len", "z", "a"]);
    }
}
