//! Frame delivery and chroma-order conversion.
//!
//! Decoded frames arrive in a planar 4:2:0 layout: a full-resolution
//! luma plane followed by an interleaved chroma plane of alternating
//! component pairs. When the decoder's chroma order matches the target,
//! delivery is one bulk copy. When it doesn't, the swap path transposes
//! each chroma pair while copying: the second component of every pair is
//! shifted into the leading position in one block copy, then the first
//! component is restrided into the trailing position one pair at a time.

use std::time::Instant;

use thiserror::Error;
use tracing::trace;

use vp_common::nv12_frame_len;

use crate::session::TargetSlot;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("decoded frame holds {actual} bytes, need {expected}")]
    SourceTooSmall { expected: usize, actual: usize },

    #[error("target buffer holds {actual} bytes, need {expected}")]
    TargetTooSmall { expected: usize, actual: usize },
}

fn check_sizes(src: &[u8], dst: &[u8], width: u32, height: u32) -> Result<usize, ConvertError> {
    let expected = nv12_frame_len(width, height);
    if src.len() < expected {
        return Err(ConvertError::SourceTooSmall {
            expected,
            actual: src.len(),
        });
    }
    if dst.len() < expected {
        return Err(ConvertError::TargetTooSmall {
            expected,
            actual: dst.len(),
        });
    }
    Ok(expected)
}

/// Bulk copy of luma plus chroma, used when the decoder's native chroma
/// ordering already matches the target.
pub fn copy_direct(src: &[u8], dst: &mut [u8], width: u32, height: u32) -> Result<(), ConvertError> {
    let len = check_sizes(src, dst, width, height)?;
    dst[..len].copy_from_slice(&src[..len]);
    Ok(())
}

/// Copy with the two chroma components of every pair transposed,
/// compensating for a decoder/target chroma-order mismatch. Luma is
/// copied verbatim. Applying the transform twice restores the original
/// chroma order.
pub fn copy_chroma_swapped(
    src: &[u8],
    dst: &mut [u8],
    width: u32,
    height: u32,
) -> Result<(), ConvertError> {
    check_sizes(src, dst, width, height)?;

    let y_len = width as usize * height as usize;
    dst[..y_len].copy_from_slice(&src[..y_len]);

    let uv_len = y_len / 2;
    if uv_len == 0 {
        return Ok(());
    }

    // Second component of each pair into the leading position.
    dst[y_len..y_len + uv_len - 1].copy_from_slice(&src[y_len + 1..y_len + uv_len]);

    // First component of each pair into the trailing position.
    let pairs = uv_len / 2;
    for pair in 0..pairs {
        dst[y_len + 1 + 2 * pair] = src[y_len + 2 * pair];
    }

    Ok(())
}

/// Copy one decoded frame into whatever target is currently installed.
///
/// The target reference is acquired here, per delivery, never cached
/// across cycles; an absent target simply drops the frame. The lease is
/// released (unlock and present) on every exit path by its `Drop`.
pub(crate) fn deliver(
    frame: &[u8],
    slot: &TargetSlot,
    swap: bool,
    width: u32,
    height: u32,
) -> Result<(), ConvertError> {
    let Some(target) = slot.acquire() else {
        trace!("no render target installed; dropping frame");
        return Ok(());
    };

    let Ok(mut lease) = target.lock() else {
        trace!("render target unavailable; dropping frame");
        return Ok(());
    };

    let start = Instant::now();
    let result = if swap {
        copy_chroma_swapped(frame, lease.bytes(), width, height)
    } else {
        copy_direct(frame, lease.bytes(), width, height)
    };
    drop(lease);
    trace!(elapsed_us = start.elapsed().as_micros() as u64, "frame copy");

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use vp_common::nv12_frame_len;

    const W: u32 = 4;
    const H: u32 = 2;

    /// Frame with distinguishable planes: luma 0x10.., chroma pairs
    /// (0xA0 + i, 0xB0 + i).
    fn patterned_frame() -> Vec<u8> {
        let y_len = (W * H) as usize;
        let mut frame = Vec::with_capacity(nv12_frame_len(W, H));
        for i in 0..y_len {
            frame.push(0x10 + i as u8);
        }
        let pairs = y_len / 4;
        for i in 0..pairs {
            frame.push(0xA0 + i as u8);
            frame.push(0xB0 + i as u8);
        }
        frame
    }

    #[test]
    fn direct_copy_is_verbatim() {
        let src = patterned_frame();
        let mut dst = vec![0u8; src.len()];
        copy_direct(&src, &mut dst, W, H).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn swap_transposes_chroma_and_leaves_luma_untouched() {
        let src = patterned_frame();
        let mut dst = vec![0u8; src.len()];
        copy_chroma_swapped(&src, &mut dst, W, H).unwrap();

        let y_len = (W * H) as usize;
        assert_eq!(&dst[..y_len], &src[..y_len], "luma must not change");

        let pairs = y_len / 4;
        for i in 0..pairs {
            assert_eq!(dst[y_len + 2 * i], 0xB0 + i as u8);
            assert_eq!(dst[y_len + 2 * i + 1], 0xA0 + i as u8);
        }
    }

    #[test]
    fn swapping_twice_restores_the_frame() {
        let src = patterned_frame();
        let mut once = vec![0u8; src.len()];
        let mut twice = vec![0u8; src.len()];
        copy_chroma_swapped(&src, &mut once, W, H).unwrap();
        copy_chroma_swapped(&once, &mut twice, W, H).unwrap();
        assert_eq!(twice, src);
        assert_ne!(once, src);
    }

    #[test]
    fn short_source_is_rejected() {
        let src = vec![0u8; 3];
        let mut dst = vec![0u8; nv12_frame_len(W, H)];
        assert_eq!(
            copy_direct(&src, &mut dst, W, H),
            Err(ConvertError::SourceTooSmall {
                expected: nv12_frame_len(W, H),
                actual: 3,
            })
        );
    }

    #[test]
    fn short_target_is_rejected() {
        let src = patterned_frame();
        let mut dst = vec![0u8; 3];
        assert_eq!(
            copy_chroma_swapped(&src, &mut dst, W, H),
            Err(ConvertError::TargetTooSmall {
                expected: nv12_frame_len(W, H),
                actual: 3,
            })
        );
    }
}
