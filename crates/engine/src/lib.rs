//! Playback engine coordinating a demuxed source, a decoder, and a
//! render target from a single worker thread.
//!
//! Architecture:
//!
//! ```text
//! Caller thread                Playback worker
//! ┌──────────────┐            ┌─────────────────┐
//! │ Player       │── post ───►│ message queue   │
//! │  - play/pause│            │  - dispatch     │
//! │  - seek/stop │◄─ barrier ─│  - decode cycle │
//! └──────────────┘            │  - pacing gate  │
//!                             │  - frame copy   │
//!                             └─────────────────┘
//! ```
//!
//! All session state is mutated on the worker thread; callers interact
//! only by posting messages, so no locks guard the session itself. The
//! decode cycle keeps itself alive by re-posting to the tail of the same
//! queue, which lets control messages interleave with decode work instead
//! of being starved by it.

mod convert;
mod cycle;
mod error;
mod looper;
mod player;
mod session;
#[cfg(test)]
mod testutil;

pub use convert::{copy_chroma_swapped, copy_direct, ConvertError};
pub use error::EngineError;
pub use looper::{Looper, LooperHandle, MessageSink};
pub use player::Player;
pub use session::{PlayerMsg, TargetSlot};
