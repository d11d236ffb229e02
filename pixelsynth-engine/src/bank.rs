//! Harmonic bank: one sine oscillator per image row.
//!
//! For the current column each row's pixel sets its oscillator:
//! - amplitude = `|rgb|` (length of the normalized color vector) × envelope
//! - frequency = row pitch (harmonic or tonal) × green detune
//! - phase     = red × 2π × phaseAmount
//! - pan       = `0.5 + (blue − 0.5) × stereoWidth`, equal-power
//!
//! Oscillators are stateless: the phase is recomputed from the time within the
//! column, so every column restarts its partials in phase.

use pixelsynth_core::dsp::{equal_power_pan, fast_sin, rgb_magnitude, unit_from_byte, TAU};

use crate::clock::Tick;
use crate::config::SynthConfig;
use crate::mixer::Mixer;
use crate::pixels::PixelBuffer;
use crate::snapshot::Snapshot;

/// Harmonics quieter than this are skipped and do not count as active.
pub const SILENCE_THRESHOLD: f32 = 1e-4;

/// One row's oscillator settings for the current column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Partial {
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
    pub pan: f32,
}

impl Partial {
    /// Derive the partial for `harmonic_index` from its RGBA pixel.
    /// `None` when the amplitude falls under [`SILENCE_THRESHOLD`].
    #[inline]
    pub fn from_pixel(
        snapshot: &Snapshot,
        harmonic_index: usize,
        rgba: [u8; 4],
        envelope_gain: f32,
    ) -> Option<Self> {
        let cfg: &SynthConfig = snapshot.config();
        let r = unit_from_byte(rgba[0]);
        let g = unit_from_byte(rgba[1]);
        let b = unit_from_byte(rgba[2]);

        let amplitude = rgb_magnitude(r, g, b) * envelope_gain;
        if amplitude < SILENCE_THRESHOLD {
            return None;
        }
        Some(Self {
            amplitude,
            frequency: snapshot.pitch().frequency(harmonic_index, g, cfg.detune_amount),
            phase: r * TAU * cfg.phase_amount,
            pan: 0.5 + (b - 0.5) * cfg.stereo_width,
        })
    }

    /// Oscillator output at `time` seconds into the column.
    ///
    /// Whole cycles are removed in f64 before the sine, so the argument stays
    /// within one turn however far into a column `time` is.
    #[inline]
    pub fn sample(&self, time: f64) -> f32 {
        let cycles = (f64::from(self.frequency) * time).fract();
        #[allow(clippy::cast_possible_truncation)]
        let turn = cycles as f32;
        self.amplitude * fast_sin(TAU * turn + self.phase)
    }

    #[inline]
    pub fn gains(&self) -> (f32, f32) {
        equal_power_pan(self.pan)
    }
}

/// Render one stereo frame of the bank for `tick`.
///
/// Bounds are rechecked on every call: the row count is clamped to the image
/// height and every pixel read is bounds-checked, so no combination of
/// parameters and image can index out of range.
#[inline]
pub fn render_frame(snapshot: &Snapshot, pixels: &PixelBuffer, tick: &Tick) -> (f32, f32) {
    let cfg = snapshot.config();
    let count = cfg.harmonic_count_for(pixels.height());
    let gain = snapshot.envelope().gain(tick.index_in_column);

    let mut mix = Mixer::new();
    for row in 0..count {
        if !cfg.harmonic_mode.admits(row) {
            continue;
        }
        let Some(rgba) = pixels.pixel(tick.column, row) else { continue };
        let Some(partial) = Partial::from_pixel(snapshot, row, rgba, gain) else { continue };
        mix.add(partial.sample(tick.time), partial.gains());
    }
    mix.finish(count)
}
