// id.rs — Arena handles for loop records
//
// Loops live in a single arena owned by `ir::LoopNest`; every link between
// them (parent, main, inner loops, parts) is a `LoopId`. Handles are
// allocated in discovery order, so iteration over the arena is deterministic.

use serde::Serialize;

/// Stable identifier of a loop record inside one `LoopNest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LoopId(pub u32);

impl LoopId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Allocator for loop handles. Produces monotonically increasing IDs in
/// allocation (report) order.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_loop: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_loop(&mut self) -> LoopId {
        let id = LoopId(self.next_loop);
        self.next_loop += 1;
        id
    }

    /// Number of handles handed out so far.
    pub fn allocated(&self) -> usize {
        self.next_loop as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_ordered() {
        let mut alloc = IdAllocator::new();
        let a = alloc.alloc_loop();
        let b = alloc.alloc_loop();
        assert_eq!(a, LoopId(0));
        assert_eq!(b, LoopId(1));
        assert!(a < b);
        assert_eq!(b.index(), 1);
        assert_eq!(alloc.allocated(), 2);
    }
}
