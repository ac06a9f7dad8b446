//! Demuxed media source interface.

use crate::error::MediaError;
use crate::format::TrackFormat;

/// Result of pulling one compressed sample out of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRead {
    /// `len` bytes were written into the caller's buffer.
    Data { len: usize },
    /// The source has no more samples.
    EndOfStream,
}

/// How a seek position is snapped to a decodable sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// Nearest sync sample at or before the requested position.
    PrecedingSync,
    /// Nearest sync sample at or after the requested position.
    FollowingSync,
    /// Whichever sync sample is closest.
    ClosestSync,
}

/// A container demuxer positioned on a stream of compressed samples.
///
/// The engine drives this from a single worker thread: `read_sample` fills
/// the decoder's input buffer with the sample at the current position,
/// `sample_time_us` reports that sample's presentation timestamp, and
/// `advance` moves to the next sample.
pub trait MediaSource: Send {
    fn track_count(&self) -> usize;

    fn track_format(&self, index: usize) -> Result<TrackFormat, MediaError>;

    fn select_track(&mut self, index: usize) -> Result<(), MediaError>;

    /// Copy the current sample into `buf`.
    fn read_sample(&mut self, buf: &mut [u8]) -> SampleRead;

    /// Presentation timestamp of the current sample, in microseconds.
    fn sample_time_us(&self) -> i64;

    /// Move to the next sample. Returns `false` once exhausted.
    fn advance(&mut self) -> bool;

    fn seek(&mut self, position_us: i64, mode: SeekMode) -> Result<(), MediaError>;
}
