//! Hand-rolled fakes for exercising dispatch and cycle logic without a
//! worker thread or real codecs.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use vp_common::{
    nv12_frame_len, InputSlot, MediaError, MediaSource, OutputFrame, OutputPoll, SampleRead,
    SeekMode, TrackFormat, VideoDecoder,
};

use crate::looper::MessageSink;
use crate::session::PlayerMsg;

/// Sink that records posted messages instead of running them.
#[derive(Default)]
pub(crate) struct RecordingSink {
    msgs: RefCell<Vec<PlayerMsg>>,
}

impl RecordingSink {
    pub(crate) fn taken(&self) -> Vec<PlayerMsg> {
        self.msgs.borrow_mut().drain(..).collect()
    }
}

impl MessageSink<PlayerMsg> for RecordingSink {
    fn post(&self, msg: PlayerMsg) -> bool {
        self.msgs.borrow_mut().push(msg);
        true
    }
}

/// Observable side effects of a [`ScriptSource`].
#[derive(Default)]
pub(crate) struct SourceProbe {
    pub seeks: AtomicUsize,
    pub dropped: AtomicBool,
}

/// Source playing back a scripted list of (payload, pts_us) samples.
pub(crate) struct ScriptSource {
    tracks: Vec<TrackFormat>,
    samples: Vec<(Vec<u8>, i64)>,
    cursor: usize,
    selected: Option<usize>,
    probe: Arc<SourceProbe>,
}

impl ScriptSource {
    pub(crate) fn new(tracks: Vec<TrackFormat>, samples: Vec<(Vec<u8>, i64)>) -> Self {
        Self {
            tracks,
            samples,
            cursor: 0,
            selected: None,
            probe: Arc::new(SourceProbe::default()),
        }
    }

    /// One 2x2 video track, no samples.
    pub(crate) fn empty() -> Self {
        Self::new(vec![TrackFormat::video("video/avc", 2, 2)], Vec::new())
    }

    pub(crate) fn probe(&self) -> Arc<SourceProbe> {
        self.probe.clone()
    }
}

impl MediaSource for ScriptSource {
    fn track_count(&self) -> usize {
        self.tracks.len()
    }

    fn track_format(&self, index: usize) -> Result<TrackFormat, MediaError> {
        self.tracks
            .get(index)
            .cloned()
            .ok_or(MediaError::NoSuchTrack(index))
    }

    fn select_track(&mut self, index: usize) -> Result<(), MediaError> {
        if index >= self.tracks.len() {
            return Err(MediaError::NoSuchTrack(index));
        }
        self.selected = Some(index);
        Ok(())
    }

    fn read_sample(&mut self, buf: &mut [u8]) -> SampleRead {
        match self.samples.get(self.cursor) {
            Some((payload, _)) => {
                buf[..payload.len()].copy_from_slice(payload);
                SampleRead::Data { len: payload.len() }
            }
            None => SampleRead::EndOfStream,
        }
    }

    fn sample_time_us(&self) -> i64 {
        self.samples
            .get(self.cursor)
            .map(|(_, pts)| *pts)
            .unwrap_or(-1)
    }

    fn advance(&mut self) -> bool {
        if self.cursor < self.samples.len() {
            self.cursor += 1;
        }
        self.cursor < self.samples.len()
    }

    fn seek(&mut self, position_us: i64, _mode: SeekMode) -> Result<(), MediaError> {
        self.probe.seeks.fetch_add(1, Ordering::SeqCst);
        // Every scripted sample counts as a sync sample.
        self.cursor = self
            .samples
            .iter()
            .rposition(|(_, pts)| *pts <= position_us)
            .unwrap_or(0);
        Ok(())
    }
}

impl Drop for ScriptSource {
    fn drop(&mut self) {
        self.probe.dropped.store(true, Ordering::SeqCst);
    }
}

/// Observable side effects of a [`ScriptDecoder`].
#[derive(Default)]
pub(crate) struct DecoderProbe {
    pub started: AtomicBool,
    pub stopped: AtomicBool,
    pub dropped: AtomicBool,
    pub flushes: AtomicUsize,
    pub output_polls: AtomicUsize,
}

/// Passthrough decoder with one input slot: queued samples come straight
/// back out as "decoded" frames in submission order.
pub(crate) struct ScriptDecoder {
    input: Vec<u8>,
    slot_busy: bool,
    pending: VecDeque<(Vec<u8>, i64, bool)>,
    dequeued: Option<Vec<u8>>,
    probe: Arc<DecoderProbe>,
}

impl ScriptDecoder {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            input: vec![0; nv12_frame_len(width, height).max(64)],
            slot_busy: false,
            pending: VecDeque::new(),
            dequeued: None,
            probe: Arc::new(DecoderProbe::default()),
        }
    }

    pub(crate) fn probe(&self) -> Arc<DecoderProbe> {
        self.probe.clone()
    }
}

impl VideoDecoder for ScriptDecoder {
    fn start(&mut self) -> Result<(), MediaError> {
        self.probe.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), MediaError> {
        self.probe.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MediaError> {
        self.probe.flushes.fetch_add(1, Ordering::SeqCst);
        self.pending.clear();
        self.slot_busy = false;
        self.dequeued = None;
        Ok(())
    }

    fn dequeue_input(&mut self, _timeout: Duration) -> Result<Option<InputSlot>, MediaError> {
        if self.slot_busy {
            return Ok(None);
        }
        self.slot_busy = true;
        Ok(Some(InputSlot(0)))
    }

    fn input_buffer(&mut self, _slot: InputSlot) -> &mut [u8] {
        &mut self.input
    }

    fn queue_input(
        &mut self,
        _slot: InputSlot,
        len: usize,
        pts_us: i64,
        eos: bool,
    ) -> Result<(), MediaError> {
        self.slot_busy = false;
        self.pending.push_back((self.input[..len].to_vec(), pts_us, eos));
        Ok(())
    }

    fn dequeue_output(&mut self, _timeout: Duration) -> OutputPoll {
        self.probe.output_polls.fetch_add(1, Ordering::SeqCst);
        match self.pending.pop_front() {
            Some((payload, pts_us, eos)) => {
                let len = payload.len();
                self.dequeued = Some(payload);
                OutputPoll::Frame(OutputFrame {
                    index: 0,
                    len,
                    pts_us,
                    eos,
                })
            }
            None => OutputPoll::TryAgain,
        }
    }

    fn output_buffer(&mut self, _frame: &OutputFrame) -> &[u8] {
        self.dequeued.as_deref().unwrap_or(&[])
    }

    fn release_output(&mut self, _frame: OutputFrame, _render: bool) {
        self.dequeued = None;
    }
}

impl Drop for ScriptDecoder {
    fn drop(&mut self) {
        self.probe.dropped.store(true, Ordering::SeqCst);
    }
}
