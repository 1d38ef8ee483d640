//! Tone player: playback-only session and the background auto-suspend policy.
//!
//! The processing routine generates a sine tone while `playing` is set and
//! reports silence otherwise. The demo walks through:
//!
//! 1. foreground playback of the tone,
//! 2. going to the background and muting, until the session stops its own
//!    queues after more than one second of silence,
//! 3. returning to the foreground, which restarts the queues.
//!
//! ```text
//! RUST_LOG=debug cargo run -p slot-audio-demos --bin tone_player -- --output tone.wav
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use slot_audio::effect::{Effect, WithEffect};
use slot_audio::wav::{create_wav, PcmWriter};
use slot_audio::{
    PlaybackConfig, ProcessBlock, Session, SessionConfig, SimPlatform, StreamCategory,
};

#[derive(Parser, Debug)]
#[command(about = "Play a tone, background the session and watch it suspend")]
struct Args {
    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,

    #[arg(long, default_value_t = 256)]
    block_frames: usize,

    #[arg(long, default_value_t = 1024)]
    latency_frames: usize,

    #[arg(long, default_value_t = 330.0)]
    frequency: f32,

    /// Output gain applied by an effect stage, 1.0 disables it.
    #[arg(long, default_value_t = 1.0)]
    gain: f32,

    /// Seconds of audible playback before and after the background phase.
    #[arg(long, default_value_t = 1.0)]
    seconds: f32,

    /// Record everything rendered to this WAV file.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    ensure!(args.seconds > 0.0, "--seconds must be positive");

    let playing = Arc::new(AtomicBool::new(true));
    let tone = tone_generator(args.frequency, playing.clone());
    let gain = Gain {
        enabled: args.gain != 1.0,
        gain: args.gain,
    };
    let processor = WithEffect::new(tone, gain, args.block_frames);

    let config = SessionConfig::default()
        .with_sample_rate(args.sample_rate)
        .with_block_frames(args.block_frames)
        .with_playback(PlaybackConfig::with_category(StreamCategory::Media))
        .with_latency_frames(args.latency_frames);
    let session = Session::new(config, SimPlatform::new(), processor)
        .context("failed to open audio session")?;

    let mut recorder = args
        .output
        .as_ref()
        .map(|path| {
            create_wav(path, args.sample_rate, 2)
                .with_context(|| format!("failed to create {}", path.display()))
        })
        .transpose()?;

    let audible_blocks =
        (args.seconds * args.sample_rate as f32 / args.block_frames as f32).ceil() as usize;
    let mut out = vec![0i16; args.block_frames * 2];

    let rendered = render(&session, &mut out, audible_blocks, recorder.as_mut())?;
    info!(rendered, "foreground playback done");

    session.on_background();
    playing.store(false, Ordering::Relaxed);
    // Anything past two seconds of silence means the policy never fired.
    let limit = 2 * args.sample_rate as usize / args.block_frames + 1;
    let rendered = render(&session, &mut out, limit, recorder.as_mut())?;
    if session.is_started() {
        warn!(rendered, "session still running after muting in background");
    } else {
        info!(
            rendered,
            silent_seconds = (rendered * args.block_frames) as f32 / args.sample_rate as f32,
            "session suspended itself"
        );
    }

    playing.store(true, Ordering::Relaxed);
    session.on_foreground();
    let rendered = render(&session, &mut out, audible_blocks, recorder.as_mut())?;
    info!(rendered, "resumed playback done");

    if let Some(recorder) = recorder {
        let frames = recorder.frames();
        recorder.close().context("failed to finalize WAV file")?;
        info!(frames, "recording written");
    }

    let stats = session.stats();
    info!(
        render_blocks = stats.render_blocks,
        silent_blocks = stats.silent_blocks,
        underruns = stats.underruns,
        auto_suspends = stats.auto_suspends,
        "tone player finished"
    );
    Ok(())
}

/// Pull up to `blocks` render blocks, stopping early if the queues stop.
fn render<F: ProcessBlock + 'static>(
    session: &Session<SimPlatform, F>,
    out: &mut [i16],
    blocks: usize,
    mut recorder: Option<&mut PcmWriter>,
) -> Result<usize> {
    let mut rendered = 0;
    while rendered < blocks && session.platform().render_block(out) {
        if let Some(recorder) = recorder.as_deref_mut() {
            recorder.write_block(out)?;
        }
        rendered += 1;
    }
    Ok(rendered)
}

fn tone_generator(
    frequency: f32,
    playing: Arc<AtomicBool>,
) -> impl FnMut(&mut [i16], usize, u32) -> bool + Send {
    let mut phase = 0.0f32;
    move |buf: &mut [i16], _frames: usize, sample_rate: u32| {
        if !playing.load(Ordering::Relaxed) {
            return false;
        }
        let step = core::f32::consts::TAU * frequency / sample_rate as f32;
        for frame in buf.chunks_exact_mut(2) {
            let s = (phase.sin() * 12_000.0) as i16;
            frame[0] = s;
            frame[1] = s;
            phase = (phase + step) % core::f32::consts::TAU;
        }
        true
    }
}

struct Gain {
    enabled: bool,
    gain: f32,
}

impl Effect for Gain {
    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_sample_rate(&mut self, _sample_rate: u32) {}

    fn reset(&mut self) {}

    fn process(&mut self, input: &[f32], output: &mut [f32], _frames: usize) -> bool {
        for (o, i) in output.iter_mut().zip(input) {
            *o = i * self.gain;
        }
        output.iter().any(|&s| s != 0.0)
    }
}
