//! Video decoder interface.
//!
//! Modeled on buffer-queue decoders: the caller borrows an empty input
//! slot, fills it with a compressed sample, queues it, and separately
//! polls for finished output buffers. Buffer views are only valid between
//! the dequeue and the matching queue/release call, which the borrow
//! rules on `&mut self` enforce.

use std::time::Duration;

use crate::error::MediaError;
use crate::format::TrackFormat;

/// Index of a dequeued input buffer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSlot(pub usize);

/// Metadata for a dequeued output buffer.
///
/// Consumed by value on release so a stale frame cannot be released (or
/// read) twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFrame {
    /// Decoder-side buffer index.
    pub index: usize,
    /// Valid byte length of the buffer. Zero for a drained EOS marker.
    pub len: usize,
    /// Presentation timestamp in microseconds.
    pub pts_us: i64,
    /// Set on the final buffer of the stream.
    pub eos: bool,
}

/// Outcome of polling the decoder's output side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPoll {
    /// A decoded buffer is ready.
    Frame(OutputFrame),
    /// The output format or buffer set changed; informational.
    FormatChanged,
    /// Nothing ready within the timeout.
    TryAgain,
    /// Any other status code; treated as transient by the engine.
    Other(i32),
}

/// A started video decoder.
pub trait VideoDecoder: Send {
    fn start(&mut self) -> Result<(), MediaError>;

    fn stop(&mut self) -> Result<(), MediaError>;

    /// Drop all in-flight buffers (used on seek).
    fn flush(&mut self) -> Result<(), MediaError>;

    /// Wait up to `timeout` for an empty input slot.
    fn dequeue_input(&mut self, timeout: Duration) -> Result<Option<InputSlot>, MediaError>;

    /// Writable view of a dequeued input slot.
    fn input_buffer(&mut self, slot: InputSlot) -> &mut [u8];

    /// Submit `len` bytes in `slot` with the given timestamp. `eos` marks
    /// the final (possibly empty) submission.
    fn queue_input(
        &mut self,
        slot: InputSlot,
        len: usize,
        pts_us: i64,
        eos: bool,
    ) -> Result<(), MediaError>;

    /// Poll for a finished output buffer, waiting at most `timeout`.
    fn dequeue_output(&mut self, timeout: Duration) -> OutputPoll;

    /// Readable view of a dequeued output buffer.
    fn output_buffer(&mut self, frame: &OutputFrame) -> &[u8];

    /// Return an output buffer to the decoder. `render` is false for
    /// zero-length buffers that carry no pixels.
    fn release_output(&mut self, frame: OutputFrame, render: bool);
}

/// Creates and configures a decoder for a selected track.
pub trait DecoderFactory: Send {
    fn create(&self, format: &TrackFormat) -> Result<Box<dyn VideoDecoder>, MediaError>;
}
