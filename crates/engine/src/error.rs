//! Engine error types.

use thiserror::Error;
use vp_common::MediaError;

/// Setup failure from [`crate::Player::open`].
///
/// Nothing after setup reports errors to the caller: once the worker is
/// running, collaborator faults are logged and degrade to end-of-stream
/// rather than escaping the loop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("media source has no video track")]
    NoVideoTrack,

    #[error("media source setup failed: {0}")]
    Source(#[source] MediaError),

    #[error("decoder setup failed: {0}")]
    Decoder(#[source] MediaError),

    #[error("failed to spawn playback worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}
