//! Resize-and-Overwrite
//!
//! Turns whatever frame arrived into an exact copy of a template:
//!
//! 1. Clamp the template length to `MAX_TEMPLATE_SIZE`
//! 2. Resize the frame by the signed length difference (skipped when equal)
//! 3. Re-read the frame bounds; nothing computed before the resize is reused
//! 4. Verify the template still fits between the fresh bounds
//! 5. Copy byte by byte, checking the destination before every write
//!
//! The copy loop runs at most `MAX_TEMPLATE_SIZE` times no matter what
//! length a template declares.

use crate::buffer::{BufferError, FrameBuffer};
use crate::template::Template;
use pktforge_common::MAX_TEMPLATE_SIZE;

/// Reasons a frame could not be templated
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OverwriteError {
    #[error("length change {current} -> {target} is not representable")]
    DeltaOverflow { current: usize, target: usize },

    #[error("resize by {delta} bytes failed: {source}")]
    Resize {
        delta: i32,
        #[source]
        source: BufferError,
    },

    #[error("frame bounds {start}..{end} cannot hold {required} bytes after resize")]
    ShortFrame {
        start: usize,
        end: usize,
        required: usize,
    },

    #[error("write at offset {offset} outside frame of {len} bytes")]
    OutOfBounds { offset: usize, len: usize },
}

/// Resize `buf` to the template's length and copy the template into it.
///
/// Returns the number of bytes written, which is the final frame length
/// for any buffer that honours its resize requests.
#[inline]
pub fn apply<B>(buf: &mut B, template: &Template) -> Result<usize, OverwriteError>
where
    B: FrameBuffer + ?Sized,
{
    let target_len = template.effective_len();
    let current_len = buf.bounds().len();

    if current_len != target_len {
        let delta = i32::try_from(target_len as i64 - current_len as i64).map_err(|_| {
            OverwriteError::DeltaOverflow {
                current: current_len,
                target: target_len,
            }
        })?;
        buf.adjust_tail(delta)
            .map_err(|source| OverwriteError::Resize { delta, source })?;
    }

    let bounds = buf.bounds();
    if !bounds.fits(target_len) {
        return Err(OverwriteError::ShortFrame {
            start: bounds.start,
            end: bounds.end,
            required: target_len,
        });
    }

    let payload = template.payload();
    let frame = buf.frame_mut();
    for offset in 0..MAX_TEMPLATE_SIZE {
        if offset >= target_len {
            break;
        }
        match frame.get_mut(offset) {
            Some(byte) => *byte = payload[offset],
            None => {
                return Err(OverwriteError::OutOfBounds {
                    offset,
                    len: frame.len(),
                })
            }
        }
    }

    Ok(target_len)
}
