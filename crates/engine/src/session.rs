//! Playback session state and control-message dispatch.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use vp_common::{MediaSource, RenderTarget, SeekMode, TrackFormat, VideoDecoder};

use crate::cycle;
use crate::looper::MessageSink;

/// Control messages handled on the playback worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerMsg {
    /// Run one decode-render cycle (self-resubmitting).
    Cycle,
    /// Start or resume playback.
    Resume,
    /// Stop requesting new frames.
    Pause,
    /// Seek to a position (microseconds) at the preceding sync sample.
    Seek { to_us: i64 },
    /// Tear down decoder and source; terminal.
    Stop,
}

/// Shared slot holding the current render target.
///
/// The owner replaces the target from its own thread while the worker
/// may be mid-delivery; the worker clones the current `Arc` at the start
/// of each delivery instead of caching it, so a swap at worst lets one
/// in-flight frame land on the previous target.
#[derive(Default)]
pub struct TargetSlot {
    current: Mutex<Option<Arc<dyn RenderTarget>>>,
}

impl TargetSlot {
    /// Install or clear the target. The previous handle is released
    /// before the new one is stored; the slot never holds two.
    pub fn replace(&self, target: Option<Arc<dyn RenderTarget>>) {
        *self.current.lock() = target;
    }

    pub fn acquire(&self) -> Option<Arc<dyn RenderTarget>> {
        self.current.lock().clone()
    }
}

/// All mutable playback state, owned by the worker thread.
pub(crate) struct PlaybackSession {
    pub(crate) source: Option<Box<dyn MediaSource>>,
    pub(crate) decoder: Option<Box<dyn VideoDecoder>>,
    pub(crate) target: Arc<TargetSlot>,
    pub(crate) chroma_swap: Arc<AtomicBool>,
    /// Wall-clock nanosecond anchor for the current segment; `None`
    /// until the first frame after start or seek establishes it.
    pub(crate) render_anchor_ns: Option<i64>,
    pub(crate) saw_input_end: bool,
    pub(crate) saw_output_end: bool,
    pub(crate) is_playing: bool,
    /// Deliver exactly one frame, then stop resubmitting (used to paint
    /// a frame right after a seek while paused, and on session start).
    pub(crate) render_once: bool,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl PlaybackSession {
    pub(crate) fn new(
        source: Box<dyn MediaSource>,
        decoder: Box<dyn VideoDecoder>,
        target: Arc<TargetSlot>,
        chroma_swap: Arc<AtomicBool>,
        format: &TrackFormat,
    ) -> Self {
        Self {
            source: Some(source),
            decoder: Some(decoder),
            target,
            chroma_swap,
            render_anchor_ns: None,
            saw_input_end: false,
            saw_output_end: false,
            is_playing: false,
            render_once: true,
            width: format.width,
            height: format.height,
        }
    }
}

/// The playback state machine: interprets one message against the
/// session. All transitions are idempotent against redundant triggers.
pub(crate) fn dispatch(
    session: &mut PlaybackSession,
    msg: PlayerMsg,
    sink: &dyn MessageSink<PlayerMsg>,
) {
    match msg {
        PlayerMsg::Cycle => cycle::run(session, sink),

        PlayerMsg::Resume => {
            if !session.is_playing {
                session.render_anchor_ns = None;
                session.is_playing = true;
                sink.post(PlayerMsg::Cycle);
                debug!("resumed");
            }
        }

        PlayerMsg::Pause => {
            if session.is_playing {
                session.is_playing = false;
                debug!("paused");
            }
        }

        PlayerMsg::Seek { to_us } => {
            let (Some(source), Some(decoder)) =
                (session.source.as_mut(), session.decoder.as_mut())
            else {
                trace!("seek after stop; ignoring");
                return;
            };
            if let Err(e) = source.seek(to_us, SeekMode::PrecedingSync) {
                warn!(error = %e, to_us, "source seek failed");
            }
            if let Err(e) = decoder.flush() {
                warn!(error = %e, "decoder flush on seek failed");
            }
            session.render_anchor_ns = None;
            session.saw_input_end = false;
            session.saw_output_end = false;
            if !session.is_playing {
                session.render_once = true;
                sink.post(PlayerMsg::Cycle);
            }
            debug!(to_us, "seeked");
        }

        PlayerMsg::Stop => {
            if let Some(mut decoder) = session.decoder.take() {
                if let Err(e) = decoder.stop() {
                    warn!(error = %e, "decoder stop failed");
                }
            }
            session.source = None;
            session.saw_input_end = true;
            session.saw_output_end = true;
            session.is_playing = false;
            debug!("stopped");
        }
    }
}
