//! Live synthesis parameters and their validation rules.
//!
//! `SynthConfig` is a small `Copy` struct: the audio thread reads it as part of
//! an immutable snapshot and never sees a half-written value. All
//! normalization (ranges, case folding, note sanitizing) happens here, on the
//! control side, when a message is ingested.

use pixelsynth_core::envelope::ColumnEnvelope;
use pixelsynth_core::pitch::{PitchMap, TonalNotes};
use serde_json::Value;

/// Lowest/highest accepted `baseOctave`.
pub const OCTAVE_RANGE: (i32, i32) = (-1, 8);

/// Which rows of the image are allowed to sound.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HarmonicMode {
    #[default]
    All,
    /// Odd harmonics only (1st, 3rd, 5th… i.e. even row indices).
    Odd,
    /// Even harmonics only (2nd, 4th…).
    Even,
    /// Every row, pitched on a musical scale instead of the harmonic series.
    Tonal,
}

impl HarmonicMode {
    /// Case-insensitive; anything unrecognized is `All`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "odd" => HarmonicMode::Odd,
            "even" => HarmonicMode::Even,
            "tonal" => HarmonicMode::Tonal,
            _ => HarmonicMode::All,
        }
    }

    /// Parity filter on the 1-based harmonic number `index + 1`.
    #[inline]
    pub fn admits(self, harmonic_index: usize) -> bool {
        let harmonic = harmonic_index + 1;
        match self {
            HarmonicMode::Odd => harmonic % 2 == 1,
            HarmonicMode::Even => harmonic % 2 == 0,
            HarmonicMode::All | HarmonicMode::Tonal => true,
        }
    }
}

/// Name under which the tail ramp was last configured. Both behave identically.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TailKind {
    #[default]
    Decay,
    Release,
}

/// The full parameter set of the engine.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SynthConfig {
    pub sample_rate: f32,
    pub base_frequency: f32,
    pub duration_per_column: f32,
    /// 1.0 = ±5% detune across the green range.
    pub detune_amount: f32,
    /// 1.0 = blue spans the full pan range.
    pub stereo_width: f32,
    /// Requested row count; `None` plays every row. Clamped to the image height on use.
    pub harmonic_count: Option<u32>,
    pub harmonic_mode: HarmonicMode,
    pub tonal_notes: TonalNotes,
    pub base_octave: i32,
    pub phase_amount: f32,
    pub attack_time: f32,
    pub tail_time: f32,
    pub tail_kind: TailKind,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            base_frequency: 220.0,
            duration_per_column: 0.1,
            detune_amount: 1.0,
            stereo_width: 1.0,
            harmonic_count: None,
            harmonic_mode: HarmonicMode::All,
            tonal_notes: TonalNotes::chromatic(),
            base_octave: 4,
            phase_amount: 1.0,
            attack_time: 0.0,
            tail_time: 0.0,
            tail_kind: TailKind::Decay,
        }
    }
}

impl SynthConfig {
    /// `max(1, floor(durationPerColumn · sampleRate))`.
    ///
    /// The product is nudged up by one f32 epsilon before flooring so that a
    /// decimal like `0.01` (stored as `0.0099999998`) still yields whole columns.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn samples_per_column(&self) -> u64 {
        let exact = f64::from(self.duration_per_column) * f64::from(self.sample_rate);
        let n = (exact * (1.0 + f64::from(f32::EPSILON))).floor();
        if n.is_nan() || n < 1.0 {
            return 1;
        }
        n as u64
    }

    /// Number of rows to evaluate for an image of `height` rows: `[1, height]`,
    /// or 0 when there is no image.
    #[inline]
    pub fn harmonic_count_for(&self, height: usize) -> usize {
        if height == 0 {
            return 0;
        }
        let requested = self
            .harmonic_count
            .map_or(height, |n| usize::try_from(n).unwrap_or(usize::MAX));
        requested.clamp(1, height)
    }

    pub fn pitch_map(&self) -> PitchMap {
        match self.harmonic_mode {
            HarmonicMode::Tonal => PitchMap::Tonal {
                notes: self.tonal_notes,
                base_octave: self.base_octave,
                fallback_hz: self.base_frequency,
            },
            _ => PitchMap::Harmonic { base_hz: self.base_frequency },
        }
    }

    pub fn envelope(&self) -> ColumnEnvelope {
        ColumnEnvelope::new(
            self.attack_time,
            self.tail_time,
            self.sample_rate,
            self.samples_per_column(),
        )
    }
}

// ------------------------------- Field validators --------------------------------
//
// Each returns `None` for a rejected value; the caller then keeps what it had.

/// JSON number or numeric string, finite only.
pub(crate) fn number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn positive(v: &Value) -> Option<f32> {
    number(v).map(|n| n as f32).filter(|n| *n > 0.0 && n.is_finite())
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn non_negative(v: &Value) -> Option<f32> {
    number(v).map(|n| n as f32).filter(|n| *n >= 0.0 && n.is_finite())
}

/// Rounded, at least 1. The upper clamp to the image height happens at render time.
pub(crate) fn harmonic_count(v: &Value) -> Option<u32> {
    let n = number(v)?.round().max(1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(n.min(f64::from(u32::MAX)) as u32)
}

pub(crate) fn harmonic_mode(v: &Value) -> Option<HarmonicMode> {
    v.as_str().map(HarmonicMode::parse)
}

/// Array of numbers → sanitized pitch-class set. Non-numeric entries are skipped.
pub(crate) fn tonal_notes(v: &Value) -> Option<TonalNotes> {
    let items = v.as_array()?;
    #[allow(clippy::cast_possible_truncation)]
    let notes = TonalNotes::sanitize(items.iter().filter_map(number).map(|n| n as f32));
    Some(notes)
}

pub(crate) fn base_octave(v: &Value) -> Option<i32> {
    let n = number(v)?.round();
    let (lo, hi) = OCTAVE_RANGE;
    #[allow(clippy::cast_possible_truncation)]
    Some(n.clamp(f64::from(lo), f64::from(hi)) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mode_parsing_is_lenient() {
        assert_eq!(HarmonicMode::parse("ODD"), HarmonicMode::Odd);
        assert_eq!(HarmonicMode::parse(" Even "), HarmonicMode::Even);
        assert_eq!(HarmonicMode::parse("tonal"), HarmonicMode::Tonal);
        assert_eq!(HarmonicMode::parse("chromatic-ish"), HarmonicMode::All);
        assert_eq!(harmonic_mode(&json!(3)), None);
    }

    #[test]
    fn parity_filter() {
        // index 0 is the fundamental (harmonic 1, odd)
        assert!(HarmonicMode::Odd.admits(0));
        assert!(!HarmonicMode::Odd.admits(1));
        assert!(HarmonicMode::Even.admits(1));
        assert!(!HarmonicMode::Even.admits(2));
        assert!((0..8).all(|i| HarmonicMode::All.admits(i) && HarmonicMode::Tonal.admits(i)));
    }

    #[test]
    fn samples_per_column_floors_and_floors_at_one() {
        let mut c = SynthConfig { sample_rate: 48_000.0, duration_per_column: 0.1, ..Default::default() };
        assert_eq!(c.samples_per_column(), 4800);
        c.duration_per_column = 0.000_001;
        assert_eq!(c.samples_per_column(), 1);
        c.sample_rate = 44_100.0;
        c.duration_per_column = 0.25;
        assert_eq!(c.samples_per_column(), 11_025);
        c.sample_rate = 1000.0;
        c.duration_per_column = 0.01;
        assert_eq!(c.samples_per_column(), 10);
    }

    #[test]
    fn harmonic_count_clamps_to_height() {
        let mut c = SynthConfig::default();
        assert_eq!(c.harmonic_count_for(16), 16);
        assert_eq!(c.harmonic_count_for(0), 0);
        c.harmonic_count = Some(4);
        assert_eq!(c.harmonic_count_for(16), 4);
        assert_eq!(c.harmonic_count_for(2), 2);
        c.harmonic_count = Some(u32::MAX);
        assert_eq!(c.harmonic_count_for(3), 3);
    }

    #[test]
    fn numeric_validators() {
        assert_eq!(positive(&json!(220)), Some(220.0));
        assert_eq!(positive(&json!("44100")), Some(44_100.0));
        assert_eq!(positive(&json!(0)), None);
        assert_eq!(positive(&json!(-1.0)), None);
        assert_eq!(positive(&json!("abc")), None);
        assert_eq!(positive(&json!(null)), None);
        assert_eq!(positive(&json!(1e300)), None);
        assert_eq!(non_negative(&json!(0)), Some(0.0));
        assert_eq!(non_negative(&json!(-0.5)), None);
        assert_eq!(non_negative(&json!([1])), None);
    }

    #[test]
    fn structured_validators() {
        assert_eq!(harmonic_count(&json!(3.6)), Some(4));
        assert_eq!(harmonic_count(&json!(0)), Some(1));
        assert_eq!(harmonic_count(&json!(-20)), Some(1));
        assert_eq!(harmonic_count(&json!("many")), None);
        assert_eq!(base_octave(&json!(12)), Some(8));
        assert_eq!(base_octave(&json!(-3)), Some(-1));
        assert_eq!(base_octave(&json!(2.5)), Some(3));
        assert_eq!(tonal_notes(&json!([0, 4, "7", "x", 16])).unwrap().as_slice(), &[0, 4, 7]);
        assert_eq!(tonal_notes(&json!([])), Some(TonalNotes::chromatic()));
        assert_eq!(tonal_notes(&json!("0,4,7")), None);
    }

    #[test]
    fn defaults_match_plain_rgb_sonification() {
        let c = SynthConfig::default();
        assert_eq!(c.pitch_map(), PitchMap::Harmonic { base_hz: 220.0 });
        assert_eq!(c.envelope().gain(0), 1.0);
        assert_eq!(c.harmonic_mode, HarmonicMode::All);
    }

    #[test]
    fn tonal_mode_selects_the_scale_map() {
        let notes = TonalNotes::sanitize([0.0, 7.0]);
        let c = SynthConfig {
            harmonic_mode: HarmonicMode::Tonal,
            tonal_notes: notes,
            base_octave: 2,
            base_frequency: 330.0,
            ..Default::default()
        };
        assert_eq!(c.pitch_map(), PitchMap::Tonal { notes, base_octave: 2, fallback_hz: 330.0 });
        for mode in [HarmonicMode::All, HarmonicMode::Odd, HarmonicMode::Even] {
            let c = SynthConfig { harmonic_mode: mode, ..c };
            assert_eq!(c.pitch_map(), PitchMap::Harmonic { base_hz: 330.0 });
        }
    }
}
