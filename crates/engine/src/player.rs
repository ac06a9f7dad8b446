//! Public playback engine surface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use vp_common::{DecoderFactory, MediaSource, RenderTarget, TrackFormat};

use crate::error::EngineError;
use crate::looper::{Looper, LooperHandle, MessageSink};
use crate::session::{dispatch, PlaybackSession, PlayerMsg, TargetSlot};

/// A running playback session and its worker thread.
///
/// Created paused; the first frame is painted as soon as it decodes so
/// there is something on screen before play is pressed. All methods are
/// safe to call from any thread; they post messages to the worker and
/// never touch playback state directly. Dropping the player shuts the
/// pipeline down.
pub struct Player {
    looper: Looper<PlayerMsg>,
    handle: LooperHandle<PlayerMsg>,
    target: Arc<TargetSlot>,
    chroma_swap: Arc<AtomicBool>,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Player {
    /// Open a playback session: select the first video track, create and
    /// start a decoder for it, spawn the worker, and schedule the first
    /// decode cycle.
    ///
    /// On any failure everything built so far is torn down; no partial
    /// session is left behind.
    pub fn open(
        mut source: Box<dyn MediaSource>,
        factory: &dyn DecoderFactory,
    ) -> Result<Player, EngineError> {
        let format = select_video_track(source.as_mut())?;
        info!(
            mime = %format.mime,
            width = format.width,
            height = format.height,
            "selected video track"
        );

        let mut decoder = factory.create(&format).map_err(EngineError::Decoder)?;
        decoder.start().map_err(EngineError::Decoder)?;

        let target = Arc::new(TargetSlot::default());
        let chroma_swap = Arc::new(AtomicBool::new(false));
        let mut session = PlaybackSession::new(
            source,
            decoder,
            target.clone(),
            chroma_swap.clone(),
            &format,
        );

        let looper = Looper::spawn("playback-worker", move |msg, handle| {
            dispatch(&mut session, msg, handle)
        })
        .map_err(EngineError::WorkerSpawn)?;

        // Paint one frame while still paused.
        let handle = looper.handle();
        handle.post(PlayerMsg::Cycle);

        Ok(Player {
            looper,
            handle,
            target,
            chroma_swap,
            width: format.width,
            height: format.height,
        })
    }

    /// Decoded width of the selected track.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Decoded height of the selected track.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the playback worker is still running. Flips after a
    /// shutdown once the worker has drained its queue.
    pub fn is_alive(&self) -> bool {
        self.looper.is_alive()
    }

    /// Resume (`true`) or pause (`false`) playback.
    ///
    /// Pausing is synchronous: when this returns, every decode cycle
    /// queued before the pause has run and no further frame will be
    /// delivered until the next resume or seek.
    pub fn set_playing(&self, playing: bool) {
        if playing {
            self.handle.post(PlayerMsg::Resume);
        } else if !self.handle.post_sync(PlayerMsg::Pause) {
            warn!("pause ignored; playback worker already gone");
        }
    }

    /// Seek back to the beginning of the stream.
    pub fn seek_to_start(&self) {
        self.seek_to(Duration::ZERO);
    }

    /// Seek to `position`, snapped to the nearest preceding sync sample.
    ///
    /// While paused this paints one frame at the new position. A session
    /// that ran to natural end of stream should be paused before seeking
    /// so the single-frame repaint is scheduled.
    pub fn seek_to(&self, position: Duration) {
        self.handle.post(PlayerMsg::Seek {
            to_us: position.as_micros() as i64,
        });
    }

    /// Install, replace or clear the render target. Takes effect on the
    /// next delivered frame; a delivery already in flight may still land
    /// on the previous target.
    pub fn set_render_target(&self, target: Option<Arc<dyn RenderTarget>>) {
        self.target.replace(target);
    }

    /// Toggle chroma-pair swapping in frame delivery. Takes effect on
    /// the next delivered frame.
    pub fn set_chroma_swap(&self, swap: bool) {
        self.chroma_swap.store(swap, Ordering::Relaxed);
    }

    /// Stop playback, release the decoder and source, and terminate the
    /// worker after it drains what is already queued. Idempotent; also
    /// runs on drop.
    pub fn shutdown(&self) {
        if self.handle.post_sync(PlayerMsg::Stop) {
            debug!("playback stopped");
        }
        self.looper.quit();
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Scan tracks in order and select the first video track, returning its
/// format.
fn select_video_track(source: &mut dyn MediaSource) -> Result<TrackFormat, EngineError> {
    let tracks = source.track_count();
    debug!(tracks, "probing source");
    for index in 0..tracks {
        let format = source.track_format(index).map_err(EngineError::Source)?;
        debug!(index, mime = %format.mime, "track format");
        if format.is_video() {
            source.select_track(index).map_err(EngineError::Source)?;
            return Ok(format);
        }
    }
    Err(EngineError::NoVideoTrack)
}
