//! Template Table
//!
//! Fixed-capacity, index-addressed table of replacement frames. The control
//! plane swaps whole templates in and out of slots; the data path only
//! borrows a slot's current template for the duration of one packet.
//!
//! Length and payload of a slot are always replaced together: a reader sees
//! either the previous template or the new one, never a mix.

use arc_swap::ArcSwapOption;
use pktforge_common::{MAX_PACKET_ENTRY, MAX_TEMPLATE_SIZE};
use std::fmt;
use std::sync::Arc;

/// Template errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("frame of {len} bytes exceeds template limit of {}", MAX_TEMPLATE_SIZE)]
    FrameTooLarge { len: usize },

    #[error("table capacity must be between 1 and {max}, got {capacity}")]
    InvalidCapacity { capacity: usize, max: usize },
}

/// Replacement frame: declared length plus fixed-size payload
#[derive(Clone, PartialEq, Eq)]
pub struct Template {
    length: u32,
    payload: Box<[u8; MAX_TEMPLATE_SIZE]>,
}

impl Template {
    /// Template carrying exactly `frame`
    pub fn from_frame(frame: &[u8]) -> Result<Self, TemplateError> {
        if frame.len() > MAX_TEMPLATE_SIZE {
            return Err(TemplateError::FrameTooLarge { len: frame.len() });
        }
        let mut payload = Box::new([0u8; MAX_TEMPLATE_SIZE]);
        payload[..frame.len()].copy_from_slice(frame);
        Ok(Self {
            length: frame.len() as u32,
            payload,
        })
    }

    /// Template exactly as a control plane wrote it.
    ///
    /// `length` is not validated; consumers clamp it to
    /// `MAX_TEMPLATE_SIZE` on every use.
    pub fn from_raw(length: u32, payload: Box<[u8; MAX_TEMPLATE_SIZE]>) -> Self {
        Self { length, payload }
    }

    /// Length as declared by the writer
    #[inline(always)]
    pub fn declared_len(&self) -> u32 {
        self.length
    }

    /// Declared length clamped to `MAX_TEMPLATE_SIZE`
    #[inline(always)]
    pub fn effective_len(&self) -> usize {
        (self.length as usize).min(MAX_TEMPLATE_SIZE)
    }

    /// Full payload array, including bytes past the length
    #[inline(always)]
    pub fn payload(&self) -> &[u8; MAX_TEMPLATE_SIZE] {
        &self.payload
    }

    /// Frame bytes `[0, effective_len)`
    #[inline(always)]
    pub fn frame(&self) -> &[u8] {
        &self.payload[..self.effective_len()]
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("length", &self.length)
            .field("head", &&self.frame()[..self.effective_len().min(16)])
            .finish()
    }
}

/// Index-addressed template slots
pub struct TemplateTable {
    slots: Box<[ArcSwapOption<Template>]>,
}

impl TemplateTable {
    /// Empty table with `capacity` slots
    pub fn new(capacity: usize) -> Result<Self, TemplateError> {
        let max = u32::MAX as usize;
        if capacity == 0 || capacity > max {
            return Err(TemplateError::InvalidCapacity { capacity, max });
        }
        Ok(Self {
            slots: (0..capacity).map(|_| ArcSwapOption::empty()).collect(),
        })
    }

    /// Empty table with `MAX_PACKET_ENTRY` slots
    pub fn with_default_capacity() -> Self {
        Self {
            slots: (0..MAX_PACKET_ENTRY).map(|_| ArcSwapOption::empty()).collect(),
        }
    }

    /// Number of slots
    #[inline(always)]
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Borrow the template at `index mod capacity` for the duration of `f`.
    ///
    /// Returns `None` when the slot was never provisioned.
    #[inline]
    pub fn lookup<R>(&self, index: u32, f: impl FnOnce(&Template) -> R) -> Option<R> {
        let slot = self.slots.get((index % self.capacity()) as usize)?;
        let guard = slot.load();
        guard.as_deref().map(f)
    }

    /// Replace the template at `index mod capacity`
    pub fn store(&self, index: u32, template: Arc<Template>) {
        if let Some(slot) = self.slots.get((index % self.capacity()) as usize) {
            slot.store(Some(template));
        }
    }

    /// Unprovision the slot at `index mod capacity`
    pub fn clear(&self, index: u32) {
        if let Some(slot) = self.slots.get((index % self.capacity()) as usize) {
            slot.store(None);
        }
    }

    /// Number of provisioned slots
    pub fn provisioned(&self) -> usize {
        self.slots.iter().filter(|slot| slot.load().is_some()).count()
    }
}

impl Default for TemplateTable {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl fmt::Debug for TemplateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateTable")
            .field("capacity", &self.capacity())
            .field("provisioned", &self.provisioned())
            .finish()
    }
}
