//! Render target interface and an in-memory reference implementation.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::error::MediaError;

/// Exclusive lease over a target's backing pixels.
///
/// Dropping the lease unlocks the buffer and presents its contents; this
/// happens on every exit path, including delivery failures partway
/// through a copy.
pub trait TargetLease {
    fn bytes(&mut self) -> &mut [u8];
}

/// A drawable surface the engine paints decoded frames into.
///
/// Implementations are supplied and replaced by an external owner, so the
/// trait is `Sync`: the engine only ever holds it behind an `Arc` and
/// locks it for the duration of one frame copy.
pub trait RenderTarget: Send + Sync {
    fn lock(&self) -> Result<Box<dyn TargetLease + '_>, MediaError>;
}

/// Plain memory-backed render target.
///
/// Useful as a headless sink in tests and demos; a windowing integration
/// would instead wrap its native lock/unlock-and-post pair.
pub struct BufferTarget {
    pixels: Mutex<Vec<u8>>,
    presented: AtomicU64,
}

impl BufferTarget {
    pub fn new(len: usize) -> Self {
        Self {
            pixels: Mutex::new(vec![0; len]),
            presented: AtomicU64::new(0),
        }
    }

    /// Number of times a lease has been returned (= frames presented).
    pub fn frames_presented(&self) -> u64 {
        self.presented.load(Ordering::Acquire)
    }

    /// Copy of the most recently presented pixels.
    pub fn snapshot(&self) -> Vec<u8> {
        self.pixels.lock().clone()
    }
}

impl RenderTarget for BufferTarget {
    fn lock(&self) -> Result<Box<dyn TargetLease + '_>, MediaError> {
        Ok(Box::new(BufferLease {
            guard: self.pixels.lock(),
            presented: &self.presented,
        }))
    }
}

struct BufferLease<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
    presented: &'a AtomicU64,
}

impl TargetLease for BufferLease<'_> {
    fn bytes(&mut self) -> &mut [u8] {
        &mut self.guard
    }
}

impl Drop for BufferLease<'_> {
    fn drop(&mut self) {
        self.presented.fetch_add(1, Ordering::Release);
    }
}
