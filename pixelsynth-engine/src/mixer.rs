//! Stereo accumulator for one output frame.

/// Fixed output headroom applied after normalization.
///
/// Row amplitudes are not clamped (white is `sqrt(3)`), so the averaged mix can
/// still exceed ±1 for some images; the output is not hard-limited.
pub const HEADROOM: f32 = 0.8;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Mixer {
    left: f32,
    right: f32,
    active: usize,
}

impl Mixer {
    #[inline]
    pub const fn new() -> Self {
        Self { left: 0.0, right: 0.0, active: 0 }
    }

    /// Add one audible harmonic, already split by its pan gains.
    #[inline]
    pub fn add(&mut self, sample: f32, (left_gain, right_gain): (f32, f32)) {
        self.left += sample * left_gain;
        self.right += sample * right_gain;
        self.active += 1;
    }

    #[inline] pub fn active(&self) -> usize { self.active }

    /// Average over the audible harmonics (or over `harmonic_count` when none
    /// sounded, which yields silence) and apply [`HEADROOM`].
    #[inline]
    #[allow(clippy::cast_precision_loss)]
    pub fn finish(self, harmonic_count: usize) -> (f32, f32) {
        let divisor = if self.active > 0 { self.active } else { harmonic_count.max(1) };
        let divisor = divisor as f32;
        ((self.left / divisor) * HEADROOM, (self.right / divisor) * HEADROOM)
    }
}
