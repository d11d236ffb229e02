//! Where messages come from: a JSON-lines script or a generated demo image.
//!
//! Script format: one protocol message per line. Blank lines and lines
//! starting with `#` are skipped. An optional `"at": seconds` field schedules
//! the message relative to the start of playback (default 0).

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use pixelsynth_engine::message::ConfigMessage;
use pixelsynth_engine::{HarmonicMode, Message, PixelBuffer, SynthConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use tracing::{debug, warn};

/// A message and the time it should be posted.
#[derive(Clone, Debug)]
pub struct Scheduled {
    pub at: f64,
    pub message: Message,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DemoKind {
    /// Red sweeps across, blue pans by row, brightness falls with pitch.
    Gradient,
    /// Random colors; seeded.
    Noise,
}

/// Parameters for a generated demo configuration.
#[derive(Clone, Debug)]
pub struct Demo {
    pub kind: DemoKind,
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    pub column_duration: f32,
    pub base_frequency: f32,
    pub mode: String,
}

impl Demo {
    pub fn image(&self) -> Result<PixelBuffer> {
        let (w, h) = (self.width.max(1), self.height.max(1));
        let img = match self.kind {
            DemoKind::Gradient => PixelBuffer::from_fn(w, h, |x, y| {
                let fade = 1.0 - y as f32 / h as f32;
                [byte(x as f32 / w as f32 * fade), 128, byte(y as f32 / h as f32), 255]
            }),
            DemoKind::Noise => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                PixelBuffer::from_fn(w, h, |_, _| [rng.gen(), rng.gen(), rng.gen(), 255])
            }
        };
        img.context("demo image dimensions")
    }

    pub fn message(&self, sample_rate: f32) -> Result<Scheduled> {
        let config = SynthConfig {
            sample_rate,
            duration_per_column: self.column_duration,
            base_frequency: self.base_frequency,
            harmonic_mode: HarmonicMode::parse(&self.mode),
            ..SynthConfig::default()
        };
        let pixels = Some(self.image()?);
        Ok(Scheduled { at: 0.0, message: Message::Config(ConfigMessage { config, pixels }) })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn byte(unit: f32) -> u8 {
    (unit.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Parse a script. Lines that fail to parse are logged and skipped.
pub fn parse_script(text: &str) -> Vec<Scheduled> {
    let mut out = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line) {
            Ok(s) => out.push(s),
            Err(e) => warn!(line = n + 1, "skipping message: {e:#}"),
        }
    }
    // stable: equal times keep file order
    out.sort_by(|a, b| a.at.total_cmp(&b.at));
    debug!(count = out.len(), "script loaded");
    out
}

fn parse_line(line: &str) -> Result<Scheduled> {
    let value: Value = serde_json::from_str(line)?;
    let at = value.get("at").and_then(Value::as_f64).filter(|t| t.is_finite() && *t >= 0.0).unwrap_or(0.0);
    let message = Message::from_value(value)?;
    Ok(Scheduled { at, message })
}

pub fn load_script(path: &Path) -> Result<Vec<Scheduled>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_script(&text))
}

/// Force every `config` to the host's output rate.
pub fn retarget_sample_rate(script: &mut [Scheduled], sample_rate: f32) {
    for s in script {
        if let Message::Config(c) = &mut s.message {
            if c.config.sample_rate != sample_rate {
                warn!(
                    requested = c.config.sample_rate,
                    actual = sample_rate,
                    "config sampleRate differs from output rate; using output rate"
                );
                c.config.sample_rate = sample_rate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_lines_are_scheduled_and_sorted() {
        let text = r#"
# comment
{"type":"params","at":2.5,"stereoWidth":0}
{"type":"config","sampleRate":48000,"durationPerColumn":0.1,"baseFrequency":220}
not json
{"type":"pixels","at":1,"pixelData":{"width":1,"height":1,"data":[1,2,3,4]}}
"#;
        let s = parse_script(text);
        let kinds: Vec<&str> = s.iter().map(|m| m.message.kind()).collect();
        assert_eq!(kinds, vec!["config", "pixels", "params"]);
        assert_eq!(s[2].at, 2.5);
    }

    #[test]
    fn retarget_only_touches_configs() {
        let mut s = parse_script(
            "{\"type\":\"config\",\"sampleRate\":22050,\"durationPerColumn\":0.1,\"baseFrequency\":220}\n\
             {\"type\":\"params\",\"detuneAmount\":0}",
        );
        retarget_sample_rate(&mut s, 44_100.0);
        let Message::Config(c) = &s[0].message else { panic!("expected config") };
        assert_eq!(c.config.sample_rate, 44_100.0);
    }

    #[test]
    fn demo_images_have_requested_shape() {
        let demo = Demo {
            kind: DemoKind::Noise,
            width: 8,
            height: 3,
            seed: 7,
            column_duration: 0.1,
            base_frequency: 110.0,
            mode: "odd".into(),
        };
        let img = demo.image().unwrap();
        assert_eq!((img.width(), img.height()), (8, 3));
        assert_eq!(img, demo.image().unwrap());

        let Message::Config(c) = demo.message(48_000.0).unwrap().message else { panic!("expected config") };
        assert_eq!(c.config.harmonic_mode, HarmonicMode::Odd);
    }
}
