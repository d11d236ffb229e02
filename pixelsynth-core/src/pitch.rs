//! Row → frequency mapping.
//!
//! Two strategies:
//! - `PitchMap::Harmonic` : row `n` plays `base · (n + 1)` (plain harmonic series)
//! - `PitchMap::Tonal`    : rows walk up a chromatic subset (`TonalNotes`), one
//!   octave per pass through the set, equal-tempered against A4 = 440 Hz
//!
//! Detune from the green channel is applied on top of either strategy.

use crate::dsp::{midi_to_hz, round};

/// Number of pitch classes in an octave.
pub const SEMITONES: usize = 12;

/// Detune span at `amount = 1.0`: ±5% around the nominal pitch.
pub const DETUNE_SPAN: f32 = 0.1;

/// Phase arguments stay finite below this many semitones from A4.
const MIDI_LIMIT: i64 = 1200;

/// Ordered, duplicate-free set of pitch classes in `0..12`.
///
/// Fixed-size so it can live inside `Copy` configs read by the audio thread.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TonalNotes {
    notes: [u8; SEMITONES],
    len: u8,
}

impl TonalNotes {
    /// All twelve pitch classes, ascending.
    pub const fn chromatic() -> Self {
        Self { notes: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11], len: SEMITONES as u8 }
    }

    /// A set with no notes. Only useful as a starting point for `push`.
    pub const fn empty() -> Self {
        Self { notes: [0; SEMITONES], len: 0 }
    }

    /// Build from arbitrary numbers: each value is rounded, reduced modulo 12,
    /// and deduplicated (first occurrence wins). Non-finite values are dropped.
    /// An empty result falls back to the chromatic set.
    pub fn sanitize<I: IntoIterator<Item = f32>>(values: I) -> Self {
        let mut set = Self::empty();
        for v in values {
            if !v.is_finite() {
                continue;
            }
            #[allow(clippy::cast_possible_truncation)]
            let class = (round(v) as i64).rem_euclid(SEMITONES as i64);
            #[allow(clippy::cast_sign_loss)]
            set.push(class as u8);
        }
        if set.is_empty() { Self::chromatic() } else { set }
    }

    /// Append a pitch class (taken modulo 12) unless already present.
    pub fn push(&mut self, class: u8) {
        let class = class % SEMITONES as u8;
        if self.contains(class) || self.len() == SEMITONES {
            return;
        }
        self.notes[self.len()] = class;
        self.len += 1;
    }

    #[inline] pub fn contains(&self, class: u8) -> bool { self.as_slice().contains(&class) }
    #[inline] pub fn len(&self) -> usize { usize::from(self.len) }
    #[inline] pub fn is_empty(&self) -> bool { self.len == 0 }
    #[inline] pub fn as_slice(&self) -> &[u8] { &self.notes[..self.len()] }
}

impl Default for TonalNotes {
    fn default() -> Self { Self::chromatic() }
}

/// Frequency strategy for the harmonic bank.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PitchMap {
    /// `base_hz · (index + 1)`
    Harmonic { base_hz: f32 },
    /// Scale-quantized rows. `fallback_hz` is used if `notes` is empty.
    Tonal { notes: TonalNotes, base_octave: i32, fallback_hz: f32 },
}

impl PitchMap {
    /// Nominal (undetuned) frequency of a 0-based harmonic row.
    #[inline]
    pub fn base_frequency(&self, harmonic_index: usize) -> f32 {
        match *self {
            PitchMap::Harmonic { base_hz } => {
                #[allow(clippy::cast_precision_loss)]
                let mult = (harmonic_index as f32) + 1.0;
                base_hz * mult
            }
            PitchMap::Tonal { notes, base_octave, fallback_hz } => {
                let count = notes.len();
                if count == 0 {
                    return fallback_hz;
                }
                let semitone = i64::from(notes.as_slice()[harmonic_index % count]);
                let octave_offset = i64::try_from(harmonic_index / count).unwrap_or(i64::MAX);
                let midi = (i64::from(base_octave) + 1)
                    .saturating_add(octave_offset)
                    .saturating_mul(12)
                    .saturating_add(semitone);
                #[allow(clippy::cast_possible_truncation)]
                let midi = midi.clamp(-MIDI_LIMIT, MIDI_LIMIT) as i32;
                midi_to_hz(midi)
            }
        }
    }

    /// Detuned frequency for `harmonic_index` given the row's normalized green value.
    #[inline]
    pub fn frequency(&self, harmonic_index: usize, green: f32, detune_amount: f32) -> f32 {
        self.base_frequency(harmonic_index) * detune_factor(green, detune_amount)
    }
}

/// `1 + (green − 0.5) · 0.1 · amount`; `amount = 1` spans ±5%.
#[inline]
pub fn detune_factor(green: f32, amount: f32) -> f32 {
    1.0 + (green - 0.5) * DETUNE_SPAN * amount
}
