//! Control Plane
//!
//! Writer-side access to the shared transmit state. Every mutation goes
//! through one mutex so concurrent writers cannot interleave a bulk install
//! with a single-slot replace; the data path never takes it.

use crate::context::ContextId;
use crate::stats::StatsSnapshot;
use crate::template::Template;
use crate::transmit::Transmitter;
use parking_lot::Mutex;
use std::sync::Arc;

/// Control plane errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("at least one template is required")]
    NoTemplates,

    #[error("template index {index} out of range for capacity {capacity}")]
    IndexOutOfRange { index: u32, capacity: u32 },

    #[error("unknown execution context {0}")]
    UnknownContext(ContextId),
}

/// Result of a bulk install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallReport {
    /// Templates supplied
    pub distinct: usize,
    /// Slots written
    pub slots: usize,
}

/// Mutating handle over a [`Transmitter`]'s table, cursor and stats
#[derive(Debug)]
pub struct ControlPlane {
    tx: Transmitter,
    writer: Mutex<()>,
}

impl ControlPlane {
    pub fn new(tx: Transmitter) -> Self {
        Self {
            tx,
            writer: Mutex::new(()),
        }
    }

    /// Data path view sharing this control plane's state
    pub fn transmitter(&self) -> &Transmitter {
        &self.tx
    }

    /// Fill every slot `i` with `templates[i % templates.len()]`.
    ///
    /// Identical templates share one allocation. When the capacity is not a
    /// multiple of `templates.len()`, the last pass before the cursor wraps
    /// is partial, so the first `capacity % templates.len()` templates are
    /// sent once more per cycle than the rest.
    pub fn install(&self, templates: &[Template]) -> Result<InstallReport, ControlError> {
        if templates.is_empty() {
            return Err(ControlError::NoTemplates);
        }
        let shared: Vec<Arc<Template>> = templates.iter().cloned().map(Arc::new).collect();

        let _guard = self.writer.lock();
        let table = self.tx.table();
        let capacity = table.capacity();
        for slot in 0..capacity {
            table.store(slot, Arc::clone(&shared[slot as usize % shared.len()]));
        }

        tracing::debug!(
            templates = templates.len(),
            slots = capacity,
            "installed templates"
        );
        let tail = capacity as usize % templates.len();
        if tail != 0 {
            tracing::debug!(
                tail,
                "template count does not divide the table, last cycle is partial"
            );
        }

        Ok(InstallReport {
            distinct: templates.len(),
            slots: capacity as usize,
        })
    }

    /// Replace the template in slot `index`
    pub fn replace(&self, index: u32, template: Template) -> Result<(), ControlError> {
        self.check_index(index)?;
        let _guard = self.writer.lock();
        self.tx.table().store(index, Arc::new(template));
        Ok(())
    }

    /// Unprovision slot `index`; packets reaching it abort
    pub fn clear(&self, index: u32) -> Result<(), ControlError> {
        self.check_index(index)?;
        let _guard = self.writer.lock();
        self.tx.table().clear(index);
        Ok(())
    }

    /// Rewind every context to index 0
    pub fn reset_cursors(&self) {
        let _guard = self.writer.lock();
        self.tx.cursor().reset();
    }

    /// Store a raw cursor value; out-of-range values read as 0
    pub fn set_cursor(&self, ctx: ContextId, value: u32) -> Result<(), ControlError> {
        let _guard = self.writer.lock();
        if self.tx.cursor().set(ctx, value) {
            Ok(())
        } else {
            Err(ControlError::UnknownContext(ctx))
        }
    }

    /// Per-context snapshots
    pub fn stats(&self) -> Vec<(ContextId, StatsSnapshot)> {
        self.tx.stats().snapshots()
    }

    /// Sum over all contexts
    pub fn totals(&self) -> StatsSnapshot {
        self.tx.stats().total()
    }

    pub fn reset_stats(&self) {
        let _guard = self.writer.lock();
        self.tx.stats().reset();
    }

    fn check_index(&self, index: u32) -> Result<(), ControlError> {
        let capacity = self.tx.table().capacity();
        if index >= capacity {
            return Err(ControlError::IndexOutOfRange { index, capacity });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{FrameBuffer, PacketBuffer};
    use crate::template::TemplateTable;
    use crate::transmit::Action;

    fn control(capacity: usize, contexts: usize) -> ControlPlane {
        let table = Arc::new(TemplateTable::new(capacity).unwrap());
        ControlPlane::new(Transmitter::for_contexts(table, contexts))
    }

    fn sized(len: usize) -> Template {
        Template::from_frame(&vec![len as u8; len]).unwrap()
    }

    #[test]
    fn test_install_fills_cyclically() {
        let cp = control(5, 1);
        let report = cp.install(&[sized(1), sized(2)]).unwrap();
        assert_eq!(report, InstallReport { distinct: 2, slots: 5 });

        let table = cp.transmitter().table();
        let lengths: Vec<usize> = (0..5)
            .map(|i| table.lookup(i, |t| t.effective_len()).unwrap())
            .collect();
        assert_eq!(lengths, vec![1, 2, 1, 2, 1]);
    }

    #[test]
    fn test_install_partial_cycle_favours_leading_templates() {
        let cp = control(5, 1);
        cp.install(&[sized(1), sized(2)]).unwrap();

        let tx = cp.transmitter();
        let mut counts = [0usize; 3];
        for _ in 0..5 {
            let mut buf = PacketBuffer::new();
            buf.load(&[0; 16]).unwrap();
            assert_eq!(tx.process(ContextId(0), &mut buf), Action::Forward);
            counts[buf.len()] += 1;
        }
        assert_eq!(&counts[1..], &[3, 2]);
        assert_eq!(tx.cursor().load_raw(ContextId(0)), Some(0));
    }

    #[test]
    fn test_install_rejects_empty() {
        let cp = control(4, 1);
        assert_eq!(cp.install(&[]), Err(ControlError::NoTemplates));
        assert_eq!(cp.transmitter().table().provisioned(), 0);
    }

    #[test]
    fn test_replace_and_clear() {
        let cp = control(4, 1);
        cp.install(&[sized(10)]).unwrap();
        cp.replace(2, sized(3)).unwrap();
        assert_eq!(
            cp.transmitter().table().lookup(2, |t| t.effective_len()),
            Some(3)
        );

        cp.clear(0).unwrap();
        let mut buf = PacketBuffer::new();
        buf.load(&[0; 16]).unwrap();
        assert_eq!(cp.transmitter().process(ContextId(0), &mut buf), Action::Abort);

        assert_eq!(
            cp.replace(4, sized(1)),
            Err(ControlError::IndexOutOfRange { index: 4, capacity: 4 })
        );
    }

    #[test]
    fn test_cursor_and_stats_control() {
        let cp = control(4, 2);
        cp.install(&[sized(8)]).unwrap();

        cp.set_cursor(ContextId(1), 3).unwrap();
        assert_eq!(
            cp.set_cursor(ContextId(2), 0),
            Err(ControlError::UnknownContext(ContextId(2)))
        );

        let mut buf = PacketBuffer::new();
        buf.load(&[0; 4]).unwrap();
        cp.transmitter().process(ContextId(1), &mut buf);
        assert_eq!(cp.transmitter().cursor().load_raw(ContextId(1)), Some(0));
        assert_eq!(cp.totals().tx_bytes, 8);
        assert_eq!(cp.stats()[1].1.tx_packets, 1);

        cp.reset_stats();
        cp.reset_cursors();
        assert_eq!(cp.totals(), StatsSnapshot::default());
    }
}
