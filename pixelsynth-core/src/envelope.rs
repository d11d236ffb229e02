//! Per-column gain envelope.
//!
//! Every column of the image is a fixed-length "note". The envelope is a
//! trapezoid scoped to that window:
//!
//! ```text
//!  1 ┤   ┌──────────┐
//!    │  /            \
//!  0 ┼─┘              └─
//!    0  attack   tail   total
//! ```
//!
//! The attack ramp rises from 0; the tail ramp (decay or release, the math is
//! identical) falls toward the end of the column. When the two windows overlap
//! the lower of the two ramps wins, so the peak can sit below 1.
//!
//! Stateless: the gain is a pure function of the sample index within the
//! column, so a column can be entered at any point without a click from stale
//! state.

use crate::dsp::{clamp, round};

/// Precomputed sample counts for the attack/tail ramps of one column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColumnEnvelope {
    attack: u64,
    tail: u64,
    total: u64,
    bypass: bool,
}

impl ColumnEnvelope {
    /// `attack_s`/`tail_s` are seconds; `total` is the column length in samples.
    ///
    /// A non-positive `sample_rate` or `total` yields a pass-through envelope.
    pub fn new(attack_s: f32, tail_s: f32, sample_rate: f32, total: u64) -> Self {
        if sample_rate <= 0.0 || !sample_rate.is_finite() || total == 0 {
            return Self::bypass();
        }
        Self {
            attack: ramp_samples(attack_s, sample_rate, total),
            tail: ramp_samples(tail_s, sample_rate, total),
            total,
            bypass: false,
        }
    }

    /// Constant unity gain.
    pub const fn bypass() -> Self {
        Self { attack: 0, tail: 0, total: 0, bypass: true }
    }

    #[inline] pub fn attack_samples(&self) -> u64 { self.attack }
    #[inline] pub fn tail_samples(&self) -> u64 { self.tail }

    /// Gain in `[0,1]` at `index` samples into the column.
    #[inline]
    #[allow(clippy::cast_precision_loss)]
    pub fn gain(&self, index: u64) -> f32 {
        if self.bypass {
            return 1.0;
        }
        let mut env = if self.attack > 0 && index < self.attack {
            index as f32 / self.attack as f32
        } else {
            1.0
        };
        if self.tail > 0 {
            let tail_start = self.total.saturating_sub(self.tail);
            if index >= tail_start {
                let left = self.total.saturating_sub(index);
                env = env.min(left as f32 / self.tail as f32);
            }
        }
        clamp(env, 0.0, 1.0)
    }
}

/// `clamp(round(seconds · sr), 0, total)`; negative or NaN times give 0.
#[inline]
fn ramp_samples(seconds: f32, sample_rate: f32, total: u64) -> u64 {
    let n = round(seconds * sample_rate);
    if n.is_nan() || n <= 0.0 {
        return 0;
    }
    // float → int casts saturate, then the column length caps it
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = n as u64;
    n.min(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 1000.0;

    #[test]
    fn no_ramps_is_flat() {
        let e = ColumnEnvelope::new(0.0, 0.0, SR, 100);
        for i in 0..100 {
            assert_eq!(e.gain(i), 1.0);
        }
    }

    #[test]
    fn trapezoid_shape() {
        // 10 samples attack, 20 samples tail, 100 total
        let e = ColumnEnvelope::new(0.010, 0.020, SR, 100);
        assert_eq!(e.attack_samples(), 10);
        assert_eq!(e.tail_samples(), 20);
        assert_eq!(e.gain(0), 0.0);
        assert!((e.gain(5) - 0.5).abs() < 1e-6);
        assert_eq!(e.gain(10), 1.0);
        assert_eq!(e.gain(79), 1.0);
        assert_eq!(e.gain(80), 1.0); // (100-80)/20
        assert!((e.gain(90) - 0.5).abs() < 1e-6);
        assert!((e.gain(99) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn overlapping_ramps_take_the_minimum() {
        // attack 80 + tail 80 > 100
        let e = ColumnEnvelope::new(0.080, 0.080, SR, 100);
        for i in 0..100u64 {
            let a = i as f32 / 80.0;
            let a = if i < 80 { a } else { 1.0 };
            let t = if i >= 20 { (100 - i) as f32 / 80.0 } else { 1.0 };
            let g = e.gain(i);
            assert!((g - a.min(t)).abs() < 1e-6, "i={i} g={g}");
            assert!((0.0..=1.0).contains(&g));
        }
        // crossover sits at the middle, below unity
        assert!((e.gain(50) - 0.625).abs() < 1e-6);
    }

    #[test]
    fn ramps_are_clamped_to_column() {
        let e = ColumnEnvelope::new(10.0, 10.0, SR, 50);
        assert_eq!(e.attack_samples(), 50);
        assert_eq!(e.tail_samples(), 50);
        for i in 0..50 {
            let g = e.gain(i);
            assert!((0.0..=1.0).contains(&g));
        }
    }

    #[test]
    fn degenerate_inputs_pass_through() {
        assert_eq!(ColumnEnvelope::new(0.1, 0.1, 0.0, 100).gain(0), 1.0);
        assert_eq!(ColumnEnvelope::new(0.1, 0.1, -48000.0, 100).gain(0), 1.0);
        assert_eq!(ColumnEnvelope::new(0.1, 0.1, SR, 0).gain(0), 1.0);
        assert_eq!(ColumnEnvelope::new(-1.0, f32::NAN, SR, 10).gain(0), 1.0);
    }
}
