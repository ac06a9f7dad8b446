//! Synthetic media collaborators for running the engine without real
//! codecs: a source that generates NV12 test frames and a passthrough
//! decoder that hands them straight back out.

use std::time::Duration;

use vp_common::{
    nv12_frame_len, DecoderFactory, InputSlot, MediaError, MediaSource, OutputFrame, OutputPoll,
    SampleRead, SeekMode, TrackFormat, VideoDecoder,
};

/// Generator of timestamped NV12 test frames.
///
/// Each frame carries a luma gradient with a moving vertical bar and a
/// row of blocks encoding the frame number in binary, plus a chroma
/// gradient that makes a chroma-order swap visible as a color shift.
pub struct SyntheticSource {
    format: TrackFormat,
    frame_count: u64,
    frame_us: i64,
    cursor: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, frame_count: u64, fps: f64) -> Self {
        Self {
            format: TrackFormat::video("video/raw", width, height),
            frame_count,
            frame_us: (1_000_000.0 / fps) as i64,
            cursor: 0,
        }
    }

    fn fill_frame(&self, buf: &mut [u8], frame_num: u64) {
        let w = self.format.width as usize;
        let h = self.format.height as usize;
        let y_len = w * h;

        // Luma: gradient plus a bar sweeping once per 120 frames.
        let bar_x = (frame_num as usize * w / 120) % w.max(1);
        for y in 0..h {
            for x in 0..w {
                let base = (x * 192 / w.max(1) + y * 64 / h.max(1)) as u8;
                let lit = x.abs_diff(bar_x) < w / 32 + 1;
                buf[y * w + x] = if lit { 235 } else { base };
            }
        }

        // Frame number in binary as a row of 16 blocks along the top.
        let block = 8;
        for bit in 0..16 {
            let x0 = 4 + bit * (block + 2);
            if x0 + block >= w {
                break;
            }
            let set = (frame_num >> bit) & 1 == 1;
            for y in 4..(4 + block).min(h) {
                for x in x0..x0 + block {
                    buf[y * w + x] = if set { 255 } else { 16 };
                }
            }
        }

        // Chroma: first component sweeps horizontally, second vertically,
        // so swapping the pair order rotates the colors.
        let cw = w / 2;
        let ch = h / 2;
        for cy in 0..ch {
            for cx in 0..cw {
                let offset = y_len + (cy * cw + cx) * 2;
                buf[offset] = (cx * 255 / cw.max(1)) as u8;
                buf[offset + 1] = (cy * 255 / ch.max(1)) as u8;
            }
        }
    }
}

impl MediaSource for SyntheticSource {
    fn track_count(&self) -> usize {
        1
    }

    fn track_format(&self, index: usize) -> Result<TrackFormat, MediaError> {
        if index == 0 {
            Ok(self.format.clone())
        } else {
            Err(MediaError::NoSuchTrack(index))
        }
    }

    fn select_track(&mut self, index: usize) -> Result<(), MediaError> {
        if index == 0 {
            Ok(())
        } else {
            Err(MediaError::NoSuchTrack(index))
        }
    }

    fn read_sample(&mut self, buf: &mut [u8]) -> SampleRead {
        if self.cursor >= self.frame_count {
            return SampleRead::EndOfStream;
        }
        let len = nv12_frame_len(self.format.width, self.format.height);
        self.fill_frame(&mut buf[..len], self.cursor);
        SampleRead::Data { len }
    }

    fn sample_time_us(&self) -> i64 {
        if self.cursor < self.frame_count {
            self.cursor as i64 * self.frame_us
        } else {
            -1
        }
    }

    fn advance(&mut self) -> bool {
        if self.cursor < self.frame_count {
            self.cursor += 1;
        }
        self.cursor < self.frame_count
    }

    fn seek(&mut self, position_us: i64, _mode: SeekMode) -> Result<(), MediaError> {
        let frame = (position_us.max(0) / self.frame_us.max(1)) as u64;
        self.cursor = frame.min(self.frame_count.saturating_sub(1));
        Ok(())
    }
}

/// Decoder that emits each queued sample unchanged as a decoded frame.
pub struct PassthroughDecoder {
    input: Vec<u8>,
    slot_busy: bool,
    pending: Option<(Vec<u8>, i64, bool)>,
    dequeued: Option<Vec<u8>>,
}

impl PassthroughDecoder {
    pub fn new(format: &TrackFormat) -> Self {
        Self {
            input: vec![0; nv12_frame_len(format.width, format.height)],
            slot_busy: false,
            pending: None,
            dequeued: None,
        }
    }
}

impl VideoDecoder for PassthroughDecoder {
    fn start(&mut self) -> Result<(), MediaError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), MediaError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MediaError> {
        self.pending = None;
        self.dequeued = None;
        self.slot_busy = false;
        Ok(())
    }

    fn dequeue_input(&mut self, _timeout: Duration) -> Result<Option<InputSlot>, MediaError> {
        if self.slot_busy || self.pending.is_some() {
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
        self.pending = Some((self.input[..len].to_vec(), pts_us, eos));
        Ok(())
    }

    fn dequeue_output(&mut self, _timeout: Duration) -> OutputPoll {
        match self.pending.take() {
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

/// Factory producing [`PassthroughDecoder`]s for any video track.
#[derive(Default)]
pub struct PassthroughFactory;

impl DecoderFactory for PassthroughFactory {
    fn create(&self, format: &TrackFormat) -> Result<Box<dyn VideoDecoder>, MediaError> {
        if !format.is_video() {
            return Err(MediaError::UnsupportedMime(format.mime.clone()));
        }
        Ok(Box::new(PassthroughDecoder::new(format)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_embed_their_number() {
        let mut source = SyntheticSource::new(320, 240, 10, 30.0);
        let mut a = vec![0u8; nv12_frame_len(320, 240)];
        let mut b = vec![0u8; nv12_frame_len(320, 240)];

        assert!(matches!(source.read_sample(&mut a), SampleRead::Data { .. }));
        assert!(source.advance());
        assert!(matches!(source.read_sample(&mut b), SampleRead::Data { .. }));
        assert_ne!(a, b);
    }

    #[test]
    fn source_reports_eos_after_last_frame() {
        let mut source = SyntheticSource::new(32, 32, 2, 30.0);
        let mut buf = vec![0u8; nv12_frame_len(32, 32)];

        assert!(matches!(source.read_sample(&mut buf), SampleRead::Data { .. }));
        assert!(source.advance());
        assert!(matches!(source.read_sample(&mut buf), SampleRead::Data { .. }));
        assert!(!source.advance());
        assert!(matches!(source.read_sample(&mut buf), SampleRead::EndOfStream));
        assert_eq!(source.sample_time_us(), -1);
    }

    #[test]
    fn passthrough_decoder_echoes_queued_samples() {
        let format = TrackFormat::video("video/raw", 4, 4);
        let mut decoder = PassthroughDecoder::new(&format);

        let slot = decoder
            .dequeue_input(Duration::ZERO)
            .unwrap()
            .expect("slot available");
        decoder.input_buffer(slot)[..4].copy_from_slice(&[9, 8, 7, 6]);
        decoder.queue_input(slot, 4, 42, false).unwrap();

        let OutputPoll::Frame(frame) = decoder.dequeue_output(Duration::ZERO) else {
            panic!("expected a frame");
        };
        assert_eq!(frame.pts_us, 42);
        assert_eq!(decoder.output_buffer(&frame), &[9, 8, 7, 6]);
        decoder.release_output(frame, true);
    }
}
