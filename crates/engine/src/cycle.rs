//! The decode-render cycle.
//!
//! One message dispatch performs at most one input feed and one output
//! drain, then re-posts itself to the tail of the queue. Keeping each
//! unit of work small and going back through the queue is what lets
//! control messages interleave with a busy pipeline.

use std::sync::atomic::Ordering;
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use vp_common::{OutputPoll, SampleRead};

use crate::convert;
use crate::looper::MessageSink;
use crate::session::{PlaybackSession, PlayerMsg};

/// Bounded wait when asking the decoder for an empty input slot. The
/// output side polls with zero wait instead; render timing is managed by
/// the pacing gate, not by blocking on the decoder.
const INPUT_DEQUEUE_WAIT: Duration = Duration::from_micros(2000);

/// Nanoseconds a frame with timestamp `pts_ns` still has to wait, given
/// the segment anchor and the current clock. Negative means late.
/// Saturating so a corrupt timestamp cannot overflow the arithmetic.
pub(crate) fn frame_delay(anchor_ns: i64, pts_ns: i64, now_ns: i64) -> i64 {
    anchor_ns.saturating_add(pts_ns).saturating_sub(now_ns)
}

/// Monotonic nanoseconds since engine start.
pub(crate) fn monotonic_ns() -> i64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_nanos() as i64
}

enum Outcome {
    Continue,
    /// The single requested frame was delivered; park the pipeline.
    RenderedOnce,
}

/// Run one cycle against the session, re-posting unless the pipeline has
/// drained both directions or is parked.
pub(crate) fn run(session: &mut PlaybackSession, sink: &dyn MessageSink<PlayerMsg>) {
    if session.source.is_none() || session.decoder.is_none() {
        // Queued behind a stop; the handles are gone.
        trace!("cycle after stop; ignoring");
        return;
    }
    if !session.is_playing && !session.render_once {
        // Parked: a cycle that raced a pause must not deliver anything.
        return;
    }

    feed_input(session);

    if let Outcome::RenderedOnce = drain_output(session) {
        return;
    }

    if !session.saw_input_end || !session.saw_output_end {
        sink.post(PlayerMsg::Cycle);
    }
}

/// Input side: move one compressed sample from the source into the
/// decoder. A full input queue is a transient stall, retried next cycle.
fn feed_input(session: &mut PlaybackSession) {
    if session.saw_input_end {
        return;
    }
    let (Some(source), Some(decoder)) = (session.source.as_mut(), session.decoder.as_mut())
    else {
        return;
    };

    let slot = match decoder.dequeue_input(INPUT_DEQUEUE_WAIT) {
        Ok(Some(slot)) => slot,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, "input dequeue failed; treating as end of stream");
            session.saw_input_end = true;
            session.saw_output_end = true;
            return;
        }
    };

    let buf = decoder.input_buffer(slot);
    let (len, eos) = match source.read_sample(buf) {
        SampleRead::Data { len } => (len, false),
        SampleRead::EndOfStream => {
            trace!("input EOS");
            (0, true)
        }
    };
    let pts_us = source.sample_time_us();

    if eos {
        session.saw_input_end = true;
    }
    if let Err(e) = decoder.queue_input(slot, len, pts_us, eos) {
        warn!(error = %e, "input queue failed; treating as end of stream");
        session.saw_input_end = true;
        session.saw_output_end = true;
        return;
    }
    source.advance();
}

/// Output side: poll for one decoded frame, gate it on its presentation
/// deadline, and deliver it to the render target.
fn drain_output(session: &mut PlaybackSession) -> Outcome {
    if session.saw_output_end {
        return Outcome::Continue;
    }
    let Some(decoder) = session.decoder.as_mut() else {
        return Outcome::Continue;
    };

    match decoder.dequeue_output(Duration::ZERO) {
        OutputPoll::Frame(frame) => {
            if frame.eos {
                trace!("output EOS");
                session.saw_output_end = true;
            }

            let pts_ns = frame.pts_us.saturating_mul(1000);
            let now = monotonic_ns();
            let anchor = match session.render_anchor_ns {
                Some(anchor) => anchor,
                None => {
                    // First frame of the segment renders immediately and
                    // defines the reference for everything after it.
                    let anchor = now.saturating_sub(pts_ns);
                    session.render_anchor_ns = Some(anchor);
                    anchor
                }
            };
            let delay_ns = frame_delay(anchor, pts_ns, now);
            if delay_ns > 0 {
                thread::sleep(Duration::from_nanos(delay_ns as u64));
            }

            if frame.len > 0 {
                let swap = session.chroma_swap.load(Ordering::Relaxed);
                let bytes = decoder.output_buffer(&frame);
                if let Err(e) =
                    convert::deliver(bytes, &session.target, swap, session.width, session.height)
                {
                    warn!(error = %e, "frame delivery failed");
                }
            }

            let render = frame.len != 0;
            decoder.release_output(frame, render);

            if session.render_once {
                session.render_once = false;
                return Outcome::RenderedOnce;
            }
        }
        OutputPoll::FormatChanged => {
            debug!("output format changed");
        }
        OutputPoll::TryAgain => {}
        OutputPoll::Other(code) => {
            warn!(code, "unexpected decoder output status");
        }
    }

    Outcome::Continue
}
