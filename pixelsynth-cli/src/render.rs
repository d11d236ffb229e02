//! Offline rendering to a WAV file.

use std::path::Path;

use anyhow::{Context, Result};
use pixelsynth_engine::{ColumnEvent, Synth};
use tracing::{debug, info, warn};

use crate::source::{retarget_sample_rate, Scheduled};

/// Render the script into interleaved stereo samples.
///
/// Messages are applied at the frame nearest their `at` time. Without an
/// explicit length the output covers one full pass over the last image, or
/// one second when nothing is configured.
pub fn render_script(
    mut script: Vec<Scheduled>,
    sample_rate: u32,
    seconds: Option<f64>,
) -> (Vec<f32>, Vec<ColumnEvent>) {
    #[allow(clippy::cast_precision_loss)]
    let rate = sample_rate as f32;
    retarget_sample_rate(&mut script, rate);

    let frame_of = |t: f64| -> usize {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let f = (t * f64::from(sample_rate)).round() as usize;
        f
    };

    let mut synth = Synth::new();
    let mut samples = Vec::new();
    let mut events = Vec::new();
    let mut cursor = 0usize;

    for item in script {
        let due = frame_of(item.at);
        if due > cursor {
            let (s, e) = synth.render_offline(due - cursor);
            samples.extend_from_slice(&s);
            events.extend(e);
            cursor = due;
        }
        let kind = item.message.kind();
        if !synth.handle(item.message) {
            warn!(kind, at = item.at, "message ignored: no config yet");
        }
    }

    let total = match seconds {
        Some(s) => frame_of(s),
        None => cursor + one_pass(&synth, sample_rate),
    };
    if total > cursor {
        let (s, e) = synth.render_offline(total - cursor);
        samples.extend_from_slice(&s);
        events.extend(e);
    }
    (samples, events)
}

fn one_pass(synth: &Synth, sample_rate: u32) -> usize {
    match synth.snapshot() {
        Some(s) if s.width() > 0 => {
            let spc = usize::try_from(s.samples_per_column()).unwrap_or(usize::MAX);
            spc.saturating_mul(s.width())
        }
        _ => sample_rate as usize,
    }
}

/// Write interleaved stereo f32 samples as a 32-bit float WAV.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;

    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 1.0 {
        warn!(peak, "output exceeds full scale; float WAV keeps it unclipped");
    }
    info!(path = %path.display(), frames = samples.len() / 2, peak, "wrote wav");
    Ok(())
}

pub fn log_events(events: &[ColumnEvent], print: bool) {
    for e in events {
        if print {
            println!("{}", e.to_json());
        } else {
            debug!(column = e.column, "column");
        }
    }
}
