//! Duplex loopback: a test tone goes in through capture and comes out of render.
//!
//! Two threads play the hardware against an in-memory platform:
//!
//! ```text
//!   capture thread ──► SimPlatform::capture_block(sine) ──► ring
//!   render thread  ◄── SimPlatform::render_block        ◄── ring ◄── passthrough
//!         │
//!         └──► WAV file
//! ```
//!
//! The processing routine leaves captured audio untouched, so the file holds
//! the input tone delayed by the configured latency, with leading silence.
//!
//! ```text
//! RUST_LOG=debug cargo run -p slot-audio-demos --bin duplex_loopback -- --seconds 2
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use slot_audio::wav::create_wav;
use slot_audio::{CaptureConfig, Session, SessionConfig, SimPlatform};

#[derive(Parser, Debug)]
#[command(about = "Capture a sine tone and render it back through a duplex session")]
struct Args {
    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,

    #[arg(long, default_value_t = 240)]
    block_frames: usize,

    #[arg(long, default_value_t = 480)]
    latency_frames: usize,

    /// Tone frequency in Hz.
    #[arg(long, default_value_t = 440.0)]
    frequency: f32,

    #[arg(long, default_value_t = 2.0)]
    seconds: f32,

    /// Pace the simulated hardware at the real block period.
    #[arg(long)]
    realtime: bool,

    #[arg(long, default_value = "loopback.wav")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    if args.seconds <= 0.0 {
        bail!("--seconds must be positive");
    }

    let platform = Arc::new(SimPlatform::new());
    let config = SessionConfig::default()
        .with_sample_rate(args.sample_rate)
        .with_block_frames(args.block_frames)
        .with_capture(CaptureConfig::default())
        .with_latency_frames(args.latency_frames);
    let passthrough = |_: &mut [i16], _: usize, _: u32| true;
    let session = Session::new(config, platform.clone(), passthrough)
        .context("failed to open audio session")?;

    let blocks = (args.seconds * args.sample_rate as f32 / args.block_frames as f32).ceil() as usize;
    let period = Duration::from_secs_f64(args.block_frames as f64 / args.sample_rate as f64);
    let mut writer = create_wav(&args.output, args.sample_rate, 2)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let barrier = Barrier::new(2);
    let started = Instant::now();
    std::thread::scope(|scope| -> Result<()> {
        let capture = scope.spawn(|| {
            let mut tone = Sine::new(args.frequency, args.sample_rate);
            let mut block = vec![0i16; args.block_frames * 2];
            for n in 0..blocks {
                barrier.wait();
                tone.fill(&mut block);
                platform.capture_block(&block);
                pace(args.realtime, started, period, n);
            }
        });

        let render = scope.spawn(|| -> Result<()> {
            let mut out = vec![0i16; args.block_frames * 2];
            let mut result = Ok(());
            for _ in 0..blocks {
                // Keep meeting the barrier after a write error so capture can finish.
                barrier.wait();
                if platform.render_block(&mut out) && result.is_ok() {
                    result = writer.write_block(&out);
                }
            }
            Ok(result?)
        });

        capture
            .join()
            .map_err(|_| anyhow::anyhow!("capture thread panicked"))?;
        render
            .join()
            .map_err(|_| anyhow::anyhow!("render thread panicked"))?
    })?;

    let frames = writer.frames();
    writer.close().context("failed to finalize WAV file")?;

    let stats = session.stats();
    info!(
        blocks,
        frames,
        deliveries = stats.deliveries,
        underruns = stats.underruns,
        path = %args.output.display(),
        "loopback finished"
    );
    Ok(())
}

fn pace(realtime: bool, started: Instant, period: Duration, n: usize) {
    if !realtime {
        return;
    }
    let due = started + period * (n as u32 + 1);
    if let Some(wait) = due.checked_duration_since(Instant::now()) {
        std::thread::sleep(wait);
    }
}

/// Stereo sine oscillator at half scale.
struct Sine {
    phase: f32,
    step: f32,
}

impl Sine {
    fn new(frequency: f32, sample_rate: u32) -> Self {
        Sine {
            phase: 0.0,
            step: core::f32::consts::TAU * frequency / sample_rate as f32,
        }
    }

    fn fill(&mut self, block: &mut [i16]) {
        for frame in block.chunks_exact_mut(2) {
            let s = (self.phase.sin() * 16_384.0) as i16;
            frame[0] = s;
            frame[1] = s;
            self.phase = (self.phase + self.step) % core::f32::consts::TAU;
        }
    }
}
