//! Packet Buffers
//!
//! The transmit path never holds on to offsets across a resize. Every
//! buffer hands out its current bounds and a freshly borrowed frame slice
//! on each call, so a stale view of the frame cannot outlive
//! [`FrameBuffer::adjust_tail`].
//!
//! # Layout
//!
//! ```text
//! 0          start              end                    FRAME_SIZE
//! ├──────────┼──────────────────┼──────────────────────┤
//! │ headroom │      frame       │       tailroom       │
//! └──────────┴──────────────────┴──────────────────────┘
//! ```

/// Backing storage per buffer (one XDP frame)
pub const FRAME_SIZE: usize = 4096;

/// Default headroom reserved in front of the frame
pub const DEFAULT_HEADROOM: usize = 256;

/// Current frame bounds as offsets into the backing storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBounds {
    /// First byte of the frame
    pub start: usize,
    /// One past the last byte of the frame
    pub end: usize,
}

impl FrameBounds {
    /// Frame length (`end - start`, zero if inverted)
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if empty
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `len` bytes starting at `start` stay inside the frame
    #[inline(always)]
    pub fn fits(&self, len: usize) -> bool {
        matches!(self.start.checked_add(len), Some(last) if last <= self.end)
    }
}

/// Buffer resize errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("growing by {delta} bytes exceeds tailroom of {tailroom}")]
    NoTailroom { delta: i32, tailroom: usize },

    #[error("shrinking by {delta} bytes exceeds frame length {len}")]
    Underflow { delta: i32, len: usize },

    #[error("frame of {len} bytes does not fit buffer room of {room}")]
    TooLarge { len: usize, room: usize },
}

/// A resizable frame owned by the caller of the transmit path.
///
/// Implementations must return bounds and slices that reflect the state
/// after the most recent `adjust_tail`.
pub trait FrameBuffer {
    /// Current frame bounds
    fn bounds(&self) -> FrameBounds;

    /// Grow (positive) or shrink (negative) the frame at its tail
    fn adjust_tail(&mut self, delta: i32) -> Result<(), BufferError>;

    /// Frame bytes `[start, end)`
    fn frame(&self) -> &[u8];

    /// Mutable frame bytes `[start, end)`
    fn frame_mut(&mut self) -> &mut [u8];

    /// Frame length
    #[inline(always)]
    fn len(&self) -> usize {
        self.bounds().len()
    }

    /// Check if empty
    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Packet buffer with fixed backing storage
#[repr(C, align(64))]
pub struct PacketBuffer {
    /// Data length
    data_len: u16,
    /// Headroom offset
    headroom: u16,
    /// Packet data
    data: [u8; FRAME_SIZE],
}

impl PacketBuffer {
    /// Create an empty buffer with the default headroom
    pub fn new() -> Self {
        Self::with_headroom(DEFAULT_HEADROOM)
    }

    /// Create an empty buffer with `headroom` bytes reserved in front.
    ///
    /// Headroom is capped at `FRAME_SIZE`.
    pub fn with_headroom(headroom: usize) -> Self {
        Self {
            data_len: 0,
            headroom: headroom.min(FRAME_SIZE) as u16,
            data: [0; FRAME_SIZE],
        }
    }

    /// Replace the frame with a copy of `frame`
    pub fn load(&mut self, frame: &[u8]) -> Result<(), BufferError> {
        let room = FRAME_SIZE - self.headroom();
        if frame.len() > room {
            return Err(BufferError::TooLarge {
                len: frame.len(),
                room,
            });
        }
        let start = self.headroom();
        self.data[start..start + frame.len()].copy_from_slice(frame);
        self.data_len = frame.len() as u16;
        Ok(())
    }

    /// Get packet data slice
    #[inline(always)]
    pub fn data(&self) -> &[u8] {
        let start = self.headroom as usize;
        let end = start + self.data_len as usize;
        &self.data[start..end]
    }

    /// Get mutable packet data
    #[inline(always)]
    pub fn data_mut(&mut self) -> &mut [u8] {
        let start = self.headroom as usize;
        let end = start + self.data_len as usize;
        &mut self.data[start..end]
    }

    /// Get headroom
    #[inline(always)]
    pub fn headroom(&self) -> usize {
        self.headroom as usize
    }

    /// Get tailroom
    #[inline(always)]
    pub fn tailroom(&self) -> usize {
        FRAME_SIZE - self.headroom as usize - self.data_len as usize
    }

    /// Drop the frame, keeping the headroom
    #[inline]
    pub fn reset(&mut self) {
        self.data_len = 0;
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer for PacketBuffer {
    #[inline(always)]
    fn bounds(&self) -> FrameBounds {
        let start = self.headroom as usize;
        FrameBounds {
            start,
            end: start + self.data_len as usize,
        }
    }

    #[inline]
    fn adjust_tail(&mut self, delta: i32) -> Result<(), BufferError> {
        let len = self.data_len as usize;
        let magnitude = delta.unsigned_abs() as usize;
        if delta >= 0 {
            let tailroom = self.tailroom();
            if magnitude > tailroom {
                return Err(BufferError::NoTailroom { delta, tailroom });
            }
            self.data_len = (len + magnitude) as u16;
        } else {
            if magnitude > len {
                return Err(BufferError::Underflow { delta, len });
            }
            self.data_len = (len - magnitude) as u16;
        }
        Ok(())
    }

    #[inline(always)]
    fn frame(&self) -> &[u8] {
        self.data()
    }

    #[inline(always)]
    fn frame_mut(&mut self) -> &mut [u8] {
        self.data_mut()
    }
}
