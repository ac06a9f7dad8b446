//! Shared types and collaborator interfaces for the viewport-player engine.
//!
//! The engine itself lives in `vp-engine`; this crate defines the boundary
//! it talks across: a [`MediaSource`] that hands out timestamped compressed
//! samples, a [`VideoDecoder`] that turns them into raw frames, and a
//! [`RenderTarget`] that exposes a lockable pixel buffer. Concrete
//! implementations (hardware codecs, container demuxers, window surfaces)
//! plug in behind these traits.

pub mod decoder;
pub mod error;
pub mod format;
pub mod source;
pub mod target;

pub use decoder::{DecoderFactory, InputSlot, OutputFrame, OutputPoll, VideoDecoder};
pub use error::MediaError;
pub use format::{nv12_frame_len, TrackFormat};
pub use source::{MediaSource, SampleRead, SeekMode};
pub use target::{BufferTarget, RenderTarget, TargetLease};
