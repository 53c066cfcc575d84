//! Activation records.
//!
//! Frame layout, from the frame pointer outward:
//!
//! ```text
//!   fp + 8 + 4k   parameter k          (pushed by the caller)
//!   fp + 4        saved return address
//!   fp + 0        saved frame pointer
//!   fp - 4 ...    locals, in declaration order
//!   below locals  temporary spill region (allocator peak)
//! ```
//!
//! Slots are 4-byte MIPS words; strings, arrays, and instances occupy one
//! pointer word.

use indexmap::IndexMap;

/// Slot width in bytes
pub const WORD: u32 = 4;

/// Offset of the saved frame pointer
pub const SAVED_FP_OFFSET: u32 = 0;

/// Offset of the saved return address
pub const SAVED_RA_OFFSET: u32 = WORD;

/// Offset of the first parameter slot
pub const FIRST_PARAM_OFFSET: u32 = 2 * WORD;

/// Stack frame layout for one function
#[derive(Clone, Debug, PartialEq)]
pub struct ActivationRecord {
    /// Qualified function name
    pub name: String,
    /// Parameters with positive offsets from the frame pointer
    pub params: Vec<(String, u32)>,
    /// Locals with their (positive) distance below the frame pointer
    pub locals: Vec<(String, u32)>,
    /// Spill slots reserved for temporaries (allocator peak)
    pub spill_slots: u32,
    /// Total frame size in bytes
    pub frame_size: u32,
}

impl ActivationRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            locals: Vec::new(),
            spill_slots: 0,
            frame_size: 0,
        }
    }

    /// Add the next parameter; returns its positive fp offset
    pub fn add_param(&mut self, name: impl Into<String>) -> u32 {
        let offset = FIRST_PARAM_OFFSET + WORD * self.params.len() as u32;
        self.params.push((name.into(), offset));
        offset
    }

    /// Add the next local; returns its distance below the frame pointer
    pub fn add_local(&mut self, name: impl Into<String>) -> u32 {
        let offset = WORD * (self.locals.len() as u32 + 1);
        self.locals.push((name.into(), offset));
        offset
    }

    /// Finish the record: reserve the spill region and compute the size
    ///
    /// The frame holds the saved fp/ra pair, all locals, and one slot per
    /// simultaneously-live temporary.
    pub fn finish(&mut self, spill_slots: u32) {
        self.spill_slots = spill_slots;
        self.frame_size = 2 * WORD + WORD * self.locals.len() as u32 + WORD * spill_slots;
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Entry of the function table handed to the backend
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionInfo {
    /// Parameter names, in push order (`this` first for methods)
    pub params: Vec<String>,
    pub frame: ActivationRecord,
}

/// Ordered function table; key is the qualified name
pub type FunctionTable = IndexMap<String, FunctionInfo>;
