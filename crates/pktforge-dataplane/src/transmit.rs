//! Transmit Decision
//!
//! Per-packet state machine run by every execution context:
//!
//! ```text
//! START ─▶ read cursor ─▶ lookup template ──(absent)──────────▶ ABORT
//!                               │
//!                               ▼
//!                        resize + overwrite ─(failure)────────▶ ABORT
//!                               │
//!                               ▼
//!                        advance cursor ─▶ record stats ─(no record)─▶ ABORT
//!                                                │
//!                                                ▼
//!                                             FORWARD
//! ```
//!
//! The cursor only moves once the frame has been fully templated, so an
//! aborted packet is retried against the same template on the next frame.

use crate::buffer::FrameBuffer;
use crate::context::ContextId;
use crate::cursor::SequenceCursor;
use crate::overwrite::{self, OverwriteError};
use crate::stats::StatsStore;
use crate::template::TemplateTable;
use std::sync::Arc;

/// XDP verdict: transmit back out the receiving interface
pub const XDP_TX: u32 = 3;

/// XDP verdict: drop and flag as an error
pub const XDP_ABORTED: u32 = 0;

/// Verdict for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Transmit the templated frame
    Forward,
    /// Drop the frame
    Abort,
}

impl Action {
    /// Numeric verdict as understood by an XDP hook
    #[inline(always)]
    pub fn xdp_code(self) -> u32 {
        match self {
            Action::Forward => XDP_TX,
            Action::Abort => XDP_ABORTED,
        }
    }
}

/// Why a frame was aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AbortReason {
    #[error("no template provisioned at index {index}")]
    MissingTemplate { index: u32 },

    #[error(transparent)]
    Overwrite(#[from] OverwriteError),

    #[error("no statistics record for {0}")]
    MissingStats(ContextId),
}

/// A successfully templated frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transmitted {
    /// Template index used
    pub index: u32,
    /// Frame length after templating, as accounted in the stats
    pub len: usize,
}

/// Shared transmit state: one table, one cursor and one stats store
#[derive(Debug, Clone)]
pub struct Transmitter {
    table: Arc<TemplateTable>,
    cursor: Arc<SequenceCursor>,
    stats: Arc<StatsStore>,
}

impl Transmitter {
    pub fn new(
        table: Arc<TemplateTable>,
        cursor: Arc<SequenceCursor>,
        stats: Arc<StatsStore>,
    ) -> Self {
        Self {
            table,
            cursor,
            stats,
        }
    }

    /// Cursor and stats sized for `contexts` over `table`
    pub fn for_contexts(table: Arc<TemplateTable>, contexts: usize) -> Self {
        let cursor = Arc::new(SequenceCursor::new(contexts, table.capacity()));
        let stats = Arc::new(StatsStore::new(contexts));
        Self::new(table, cursor, stats)
    }

    pub fn table(&self) -> &Arc<TemplateTable> {
        &self.table
    }

    pub fn cursor(&self) -> &Arc<SequenceCursor> {
        &self.cursor
    }

    pub fn stats(&self) -> &Arc<StatsStore> {
        &self.stats
    }

    /// Template `buf` in place and account for it on `ctx`
    #[inline]
    pub fn try_process<B>(&self, ctx: ContextId, buf: &mut B) -> Result<Transmitted, AbortReason>
    where
        B: FrameBuffer + ?Sized,
    {
        let pos = self.cursor.next_index(ctx);
        let index = pos.index();

        self.table
            .lookup(index, |template| overwrite::apply(buf, template))
            .ok_or(AbortReason::MissingTemplate { index })??;

        pos.advance();

        let len = buf.len();
        if !self.stats.record(ctx, len as u64) {
            return Err(AbortReason::MissingStats(ctx));
        }

        Ok(Transmitted { index, len })
    }

    /// Template `buf` and return the verdict
    #[inline]
    pub fn process<B>(&self, ctx: ContextId, buf: &mut B) -> Action
    where
        B: FrameBuffer + ?Sized,
    {
        match self.try_process(ctx, buf) {
            Ok(_) => Action::Forward,
            Err(reason) => {
                tracing::trace!(%ctx, %reason, "frame aborted");
                Action::Abort
            }
        }
    }
}
