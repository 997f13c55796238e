//! Sequence Cursor
//!
//! Each execution context walks the template table in index order,
//! wrapping at the table capacity. The position lives in a per-context
//! cell; only the owning context advances it, and only after a packet was
//! templated successfully.

use crate::context::{ContextId, PerContext};
use std::sync::atomic::{AtomicU32, Ordering};

/// Per-context template cursor
#[derive(Debug)]
pub struct SequenceCursor {
    cells: PerContext<AtomicU32>,
    capacity: u32,
}

impl SequenceCursor {
    /// Cursor for `contexts` contexts over a table of `capacity` slots.
    ///
    /// A zero capacity is treated as one slot.
    pub fn new(contexts: usize, capacity: u32) -> Self {
        Self {
            cells: PerContext::new(contexts),
            capacity: capacity.max(1),
        }
    }

    /// Table capacity the cursor wraps at
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of contexts with a cursor cell
    pub fn contexts(&self) -> usize {
        self.cells.len()
    }

    /// Position for the next packet on `ctx`.
    ///
    /// Out-of-range stored values read as 0; a context without a cell
    /// always reads 0 and never advances.
    #[inline]
    pub fn next_index(&self, ctx: ContextId) -> CursorPosition<'_> {
        let cell = self.cells.get(ctx);
        let stored = cell.map_or(0, |c| c.load(Ordering::Relaxed));
        let index = if stored >= self.capacity { 0 } else { stored };
        CursorPosition {
            index,
            cell,
            capacity: self.capacity,
        }
    }

    /// Raw stored value, unclamped
    pub fn load_raw(&self, ctx: ContextId) -> Option<u32> {
        self.cells.get(ctx).map(|c| c.load(Ordering::Relaxed))
    }

    /// Overwrite the stored value for `ctx` (control plane).
    ///
    /// Any value is accepted; the next read clamps it. Returns `false`
    /// when the context has no cell.
    pub fn set(&self, ctx: ContextId, value: u32) -> bool {
        match self.cells.get(ctx) {
            Some(cell) => {
                cell.store(value, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Rewind every context to index 0 (control plane)
    pub fn reset(&self) {
        for (_, cell) in self.cells.iter() {
            cell.store(0, Ordering::Relaxed);
        }
    }
}

/// Index read for one packet, plus the right to advance past it
#[derive(Debug)]
#[must_use = "a cursor position does nothing unless advanced"]
pub struct CursorPosition<'a> {
    index: u32,
    cell: Option<&'a AtomicU32>,
    capacity: u32,
}

impl CursorPosition<'_> {
    /// Template index for this packet, always `< capacity`
    #[inline(always)]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Store `(index + 1) mod capacity`
    #[inline]
    pub fn advance(self) {
        if let Some(cell) = self.cell {
            let next = self.index + 1;
            cell.store(if next >= self.capacity { 0 } else { next }, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_wraps() {
        let cursor = SequenceCursor::new(1, 3);
        let ctx = ContextId(0);
        let mut seen = Vec::new();
        for _ in 0..7 {
            let pos = cursor.next_index(ctx);
            seen.push(pos.index());
            pos.advance();
        }
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_out_of_range_clamps_to_zero() {
        let cursor = SequenceCursor::new(1, 4);
        let ctx = ContextId(0);
        assert!(cursor.set(ctx, 4));
        assert_eq!(cursor.next_index(ctx).index(), 0);

        cursor.set(ctx, u32::MAX);
        let pos = cursor.next_index(ctx);
        assert_eq!(pos.index(), 0);
        pos.advance();
        assert_eq!(cursor.load_raw(ctx), Some(1));
    }

    #[test]
    fn test_unadvanced_position_keeps_index() {
        let cursor = SequenceCursor::new(1, 8);
        let ctx = ContextId(0);
        cursor.set(ctx, 5);
        let _ = cursor.next_index(ctx).index();
        assert_eq!(cursor.next_index(ctx).index(), 5);
    }

    #[test]
    fn test_missing_context_reads_zero() {
        let cursor = SequenceCursor::new(2, 8);
        let ghost = ContextId(9);
        let pos = cursor.next_index(ghost);
        assert_eq!(pos.index(), 0);
        pos.advance();
        assert_eq!(cursor.next_index(ghost).index(), 0);
        assert!(!cursor.set(ghost, 1));
    }

    #[test]
    fn test_contexts_are_independent() {
        let cursor = SequenceCursor::new(2, 16);
        cursor.next_index(ContextId(0)).advance();
        cursor.next_index(ContextId(0)).advance();
        assert_eq!(cursor.load_raw(ContextId(0)), Some(2));
        assert_eq!(cursor.load_raw(ContextId(1)), Some(0));

        cursor.reset();
        assert_eq!(cursor.load_raw(ContextId(0)), Some(0));
    }
}
