//! Execution Contexts
//!
//! An execution context is one independent packet-processing lane (one
//! worker thread, one CPU). State that the data path mutates lives in a
//! [`PerContext`] array: each context reads and writes only its own
//! cache-padded cell, so no two contexts ever contend on a line.

use crossbeam::utils::CachePadded;
use std::fmt;

/// Execution context identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContextId(pub u32);

impl ContextId {
    /// Index into per-context storage
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx{}", self.0)
    }
}

impl From<u32> for ContextId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// One cache-padded cell per execution context
pub struct PerContext<T> {
    cells: Box<[CachePadded<T>]>,
}

impl<T: Default> PerContext<T> {
    /// Allocate `contexts` default cells
    pub fn new(contexts: usize) -> Self {
        Self {
            cells: (0..contexts).map(|_| CachePadded::new(T::default())).collect(),
        }
    }
}

impl<T> PerContext<T> {
    /// Cell owned by `ctx`, or `None` if the context was never provisioned
    #[inline(always)]
    pub fn get(&self, ctx: ContextId) -> Option<&T> {
        self.cells.get(ctx.index()).map(|cell| &**cell)
    }

    /// Number of provisioned contexts
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all cells with their context ids
    pub fn iter(&self) -> impl Iterator<Item = (ContextId, &T)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, cell)| (ContextId(i as u32), &**cell))
    }
}

impl<T> fmt::Debug for PerContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerContext")
            .field("contexts", &self.cells.len())
            .finish()
    }
}
