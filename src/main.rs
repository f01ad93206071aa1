use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use drummer::audio::{self, BlockRing, Engine};
use drummer::audio_api::PlaybackEvent;
use drummer::pipeline::persistence;
use drummer::shared::HOST_CALLBACK_FRAMES;
use drummer::{Kit, KitConfig, Overrides};

/// Step-sequenced drum machine
#[derive(Parser)]
#[command(name = "drummer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play the kit's arrangement on the default output device
    Play {
        #[command(flatten)]
        kit: KitArgs,
        /// Stop after this many seconds (plays forever otherwise)
        #[arg(long, value_parser = parse_seconds)]
        seconds: Option<Duration>,
    },
    /// Render bars to a 16-bit stereo WAV file
    Render {
        #[command(flatten)]
        kit: KitArgs,
        #[arg(short, long)]
        out: PathBuf,
        /// Number of bars (defaults to one pass through the arrangement)
        #[arg(long)]
        bars: Option<usize>,
    },
    /// Write the default kit file into the project directory
    Init {
        #[arg(default_value = ".")]
        project_dir: PathBuf,
        /// Replace an existing kit file
        #[arg(long)]
        force: bool,
    },
    /// Show derived timing and the arrangement
    Info {
        #[command(flatten)]
        kit: KitArgs,
    },
}

#[derive(Args)]
struct KitArgs {
    /// Project directory holding .drummer/kit.json and its samples
    #[arg(default_value = ".")]
    project_dir: PathBuf,
    #[arg(long)]
    bpm: Option<u32>,
    /// Frames per ring block
    #[arg(long)]
    block_size: Option<usize>,
    /// Number of ring blocks
    #[arg(long)]
    blocks: Option<usize>,
}

fn parse_seconds(arg: &str) -> Result<Duration, String> {
    let seconds: f64 = arg.parse().map_err(|e| format!("{e}"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("expected a positive number of seconds, got {arg}"));
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| e.to_string())
}

impl KitArgs {
    // An explicit ring shape is used as given; otherwise `play` fits it to the host
    fn ring_is_explicit(&self) -> bool {
        self.block_size.is_some() || self.blocks.is_some()
    }

    fn load(&self) -> anyhow::Result<Arc<Kit>> {
        let mut config = persistence::load_kit(&self.project_dir)?.unwrap_or_else(|| {
            tracing::info!("no kit file found, using the built-in kit");
            KitConfig::default()
        });
        config.apply(Overrides {
            bpm: self.bpm,
            n_blocks: self.blocks,
            block_size: self.block_size,
        });
        let kit = Kit::load(&config, &self.project_dir).context("invalid kit")?;
        Ok(Arc::new(kit))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Play { kit, seconds } => play(kit.load()?, seconds, !kit.ring_is_explicit()),
        Command::Render { kit, out, bars } => render(kit.load()?, &out, bars),
        Command::Init { project_dir, force } => init(&project_dir, force),
        Command::Info { kit } => info(&*kit.load()?),
    }
}

fn play(kit: Arc<Kit>, seconds: Option<Duration>, fit_ring: bool) -> anyhow::Result<()> {
    let callback_frames = audio::output_callback_frames()?;
    let mut ring = kit.ring;
    if fit_ring {
        // two host callbacks of headroom
        let planned = callback_frames.unwrap_or(HOST_CALLBACK_FRAMES) as usize;
        ring = ring.covering(2 * planned);
        if ring != kit.ring {
            tracing::info!(
                block_size = ring.block_size,
                callback_frames = planned,
                "ring enlarged to cover the host buffer"
            );
        }
    } else if ring.latency(kit.sample_rate) < 0.02 {
        tracing::warn!(
            latency_ms = ring.latency(kit.sample_rate) * 1000.0,
            "ring is shorter than a typical host buffer; expect silent gaps"
        );
    }

    let (mut producer, consumer) = BlockRing::new(ring).prime(Engine::new(Arc::clone(&kit)));
    let playback = audio::start_playback(consumer, kit.sample_rate, callback_frames)?;
    tracing::info!(
        frames_per_step = kit.timing.frames_per_step,
        latency_ms = ring.latency(kit.sample_rate) * 1000.0,
        "playing"
    );

    // too far out to represent is the same as forever
    let deadline = seconds.and_then(|s| Instant::now().checked_add(s));
    // wait at most about one block between top-ups
    let poll = Duration::from_secs_f64(ring.block_size as f64 / kit.sample_rate as f64)
        .max(Duration::from_millis(1));
    let mut silent_frames = 0u64;
    loop {
        producer.fill_available();
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        match playback.wait(poll) {
            Some(PlaybackEvent::StreamError(err)) => {
                tracing::warn!("playback continuing after stream error: {err}");
            }
            Some(PlaybackEvent::Underrun { frames }) => {
                silent_frames += frames;
                tracing::debug!(frames, "producer fell behind");
            }
            Some(PlaybackEvent::BlockConsumed) | None => {}
        }
    }
    drop(playback);
    if silent_frames > 0 {
        tracing::warn!(silent_frames, "playback had gaps; raise --block-size or --blocks");
    }
    tracing::info!("stopped");
    Ok(())
}

fn render(kit: Arc<Kit>, out: &Path, bars: Option<usize>) -> anyhow::Result<()> {
    let bars = bars.unwrap_or(kit.arrangement.len());
    let frame_count = audio::frames_for_bars(&kit, bars);
    let frames = audio::render_frames(Arc::clone(&kit), frame_count);
    audio::write_wav(out, &frames, kit.sample_rate)
        .with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(bars, frames = frames.len(), path = %out.display(), "rendered");
    Ok(())
}

fn init(project_dir: &Path, force: bool) -> anyhow::Result<()> {
    let path = persistence::kit_file_path(project_dir);
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to replace it)", path.display());
    }
    let config = persistence::starter_kit(project_dir)?;
    // refuse to write a kit that would not load
    Kit::load(&config, project_dir).context("starter kit is invalid")?;
    let path = persistence::save_kit(project_dir, &config)?;
    println!("wrote {}", path.display());
    Ok(())
}

fn info(kit: &Kit) -> anyhow::Result<()> {
    let t = &kit.timing;
    println!("sample rate      {} Hz", kit.sample_rate);
    println!("frames per beat  {}", t.frames_per_beat);
    println!("frames per step  {}", t.frames_per_step);
    println!("steps per bar    {}", t.steps_per_bar);
    println!(
        "loop length      {} bars, {:.2} s",
        t.bars,
        t.frames_per_loop() as f64 / kit.sample_rate as f64
    );
    println!(
        "ring             {} x {} frames, {:.1} ms",
        kit.ring.n_blocks,
        kit.ring.block_size,
        kit.ring_latency() * 1000.0
    );
    println!("narrowing        {:?}", kit.narrowing);
    for (id, sample) in kit.bank.iter().skip(1) {
        println!("sample {:>2}        {} ({} frames)", id.0, sample.name, sample.len() - 1);
    }
    let names: Vec<&str> = kit
        .arrangement
        .bars()
        .iter()
        .map(|&p| kit.patterns[p].name.as_str())
        .collect();
    println!("arrangement      {}", names.join(" "));
    Ok(())
}
