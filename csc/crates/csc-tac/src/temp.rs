//! Temporary allocator with LIFO recycling.
//!
//! A released temporary goes onto a free list and is reissued before any
//! new name is minted. An expression walker that releases each operand
//! right after the producing instruction consumes it keeps the peak live
//! count at exactly the Ershov number of the expression tree.

use crate::tac::Operand;

/// Per-function temporary allocator
#[derive(Debug, Default)]
pub struct TempAllocator {
    /// Released ids, reissued LIFO
    free: Vec<u32>,
    /// Next never-used id; also the count of unique names minted
    next: u32,
    /// Currently live temporaries
    live: u32,
    /// High-water mark of `live`
    peak: u32,
}

impl TempAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a temporary, reusing the most recently released name
    pub fn fresh(&mut self) -> Operand {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                let id = self.next;
                self.next += 1;
                id
            }
        };
        self.live += 1;
        self.peak = self.peak.max(self.live);
        Operand::Temp(id)
    }

    /// Release an operand's temporary, if it is one
    ///
    /// Non-temporary operands (variables, constants) pass through silently
    /// so expression walkers can release unconditionally.
    pub fn release(&mut self, operand: &Operand) {
        if let Operand::Temp(id) = operand {
            debug_assert!(!self.free.contains(id), "double release of t{}", id);
            self.free.push(*id);
            self.live = self.live.saturating_sub(1);
        }
    }

    /// Unique names minted so far (the never-recycled diagnostic counter)
    pub fn total(&self) -> u32 {
        self.next
    }

    /// Peak number of simultaneously live temporaries
    pub fn peak(&self) -> u32 {
        self.peak
    }

    /// Currently live count
    pub fn live(&self) -> u32 {
        self.live
    }
}
