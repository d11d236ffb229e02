//! pixelsynth CLI: plays or renders images as sound.
//!
//! Input is either a JSON-lines message script (`--messages`) or a generated
//! demo image (`--demo`). `play` streams through the default (or chosen)
//! output device; `render` writes a float WAV.

mod player;
mod render;
mod source;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::player::PlayOptions;
use crate::source::{Demo, DemoKind, Scheduled};

#[derive(Parser)]
#[command(name = "pixelsynth")]
#[command(about = "Image sonification player and renderer")]
#[command(version)]
struct Cli {
    /// More logging (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List output devices
    Devices,

    /// Play in real time
    Play {
        #[command(flatten)]
        input: InputArgs,

        /// Output device name (default device otherwise)
        #[arg(short, long)]
        device: Option<String>,

        /// Requested output sample rate
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Requested output channel count
        #[arg(long)]
        channels: Option<u16>,

        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<f64>,

        /// Output gain applied before the device clip
        #[arg(long, default_value_t = 1.0)]
        gain: f32,
    },

    /// Render offline to a WAV file
    Render {
        #[command(flatten)]
        input: InputArgs,

        /// Output .wav file
        #[arg(short, long)]
        output: PathBuf,

        /// Sample rate of the file
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,

        /// Length in seconds (default: one pass over the image)
        #[arg(long)]
        seconds: Option<f64>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// JSON-lines message script
    #[arg(short, long, conflicts_with = "demo")]
    messages: Option<PathBuf>,

    /// Generate a demo image instead of reading a script
    #[arg(long, value_enum)]
    demo: Option<DemoKind>,

    /// Demo image width (columns)
    #[arg(long, default_value_t = 32)]
    width: usize,

    /// Demo image height (harmonics)
    #[arg(long, default_value_t = 16)]
    height: usize,

    /// Demo noise seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Demo seconds per column
    #[arg(long, default_value_t = 0.25)]
    column_duration: f32,

    /// Demo base frequency in Hz
    #[arg(long, default_value_t = 110.0)]
    base_frequency: f32,

    /// Demo harmonic mode (all, odd, even, tonal)
    #[arg(long, default_value = "all")]
    mode: String,

    /// Print column notifications to stdout as JSON lines
    #[arg(long)]
    print_columns: bool,
}

impl InputArgs {
    fn load(&self, sample_rate: f32) -> Result<Vec<Scheduled>> {
        if let Some(path) = &self.messages {
            let script = source::load_script(path)?;
            info!(path = %path.display(), messages = script.len(), "script loaded");
            return Ok(script);
        }
        let Some(kind) = self.demo else {
            bail!("nothing to play: pass --messages <file> or --demo <kind>");
        };
        let demo = Demo {
            kind,
            width: self.width,
            height: self.height,
            seed: self.seed,
            column_duration: self.column_duration,
            base_frequency: self.base_frequency,
            mode: self.mode.clone(),
        };
        info!(?kind, width = demo.width, height = demo.height, "demo image");
        Ok(vec![demo.message(sample_rate)?])
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Devices => player::list_output_devices()?,
        Commands::Play { input, device, sample_rate, channels, duration, gain } => {
            // configs are retargeted to the device rate once the stream is open
            #[allow(clippy::cast_precision_loss)]
            let script = input.load(sample_rate.unwrap_or(48_000) as f32)?;
            let opts = PlayOptions {
                device_name: device,
                sample_rate,
                channels,
                duration,
                gain,
                print_columns: input.print_columns,
            };
            player::play(script, &opts)?;
        }
        Commands::Render { input, output, sample_rate, seconds } => {
            #[allow(clippy::cast_precision_loss)]
            let script = input.load(sample_rate as f32)?;
            let (samples, events) = render::render_script(script, sample_rate, seconds);
            render::log_events(&events, input.print_columns);
            render::write_wav(&output, &samples, sample_rate)?;
        }
    }
    Ok(())
}
