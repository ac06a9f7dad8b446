//! Errors crossing the collaborator boundary.

use thiserror::Error;

/// Failure reported by a media collaborator (source, decoder or target).
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("track {0} does not exist")]
    NoSuchTrack(usize),

    #[error("track {index} could not be selected: {reason}")]
    SelectTrack { index: usize, reason: String },

    #[error("seek failed: {0}")]
    Seek(String),

    #[error("decoder error: {0}")]
    Decoder(String),

    #[error("no decoder available for mime type {0:?}")]
    UnsupportedMime(String),

    #[error("render target is unavailable")]
    TargetUnavailable,
}
