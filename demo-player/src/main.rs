//! Headless playback demo.
//!
//! Drives the engine against a synthetic NV12 source and an in-memory
//! render target, exercising play, pause, seek and the chroma-order
//! toggle, then prints delivery statistics.

mod synthetic;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use vp_common::{nv12_frame_len, BufferTarget};
use vp_engine::Player;

use synthetic::{PassthroughFactory, SyntheticSource};

#[derive(Parser, Debug)]
#[command(name = "demo-player")]
#[command(about = "Headless playback engine demo with synthetic video")]
#[command(version)]
struct Args {
    /// Frame width in pixels
    #[arg(long, default_value = "640")]
    width: u32,

    /// Frame height in pixels
    #[arg(long, default_value = "360")]
    height: u32,

    /// Number of frames in the synthetic stream
    #[arg(long, default_value = "90")]
    frames: u64,

    /// Frame rate of the synthetic stream
    #[arg(long, default_value = "30.0")]
    fps: f64,

    /// Swap the chroma component order during delivery
    #[arg(long)]
    chroma_swap: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    let source = SyntheticSource::new(args.width, args.height, args.frames, args.fps);
    let factory = PassthroughFactory;
    let player = Player::open(Box::new(source), &factory)?;

    let target = Arc::new(BufferTarget::new(nv12_frame_len(
        player.width(),
        player.height(),
    )));
    player.set_render_target(Some(target.clone()));
    player.set_chroma_swap(args.chroma_swap);

    let half = Duration::from_secs_f64(args.frames as f64 / args.fps / 2.0);
    info!(
        width = player.width(),
        height = player.height(),
        frames = args.frames,
        fps = args.fps,
        "starting playback"
    );

    player.set_playing(true);
    thread::sleep(half);

    player.set_playing(false);
    info!(
        presented = target.frames_presented(),
        "paused at mid-stream"
    );

    player.seek_to_start();
    thread::sleep(Duration::from_millis(100));
    info!(
        presented = target.frames_presented(),
        "seeked to start while paused"
    );

    player.set_playing(true);
    thread::sleep(half * 2 + Duration::from_millis(200));

    let presented = target.frames_presented();
    let checksum: u32 = target
        .snapshot()
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_add(b as u32));
    info!(presented, checksum, "playback finished");

    player.shutdown();
    Ok(())
}
