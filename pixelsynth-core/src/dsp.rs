//! Generic DSP utilities and math helpers.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate feature `no-std`)
//! - Math backend selection that works in both `std` and `no_std` contexts
//! - Optional `fast-math` approximation for the oscillator sine
//! - Clean, side-effect free helpers that are easy to test
//!
//! Conventions:
//! - All functions are `#[inline]` where useful to help the optimizer.
//! - Argument and return domains are documented per function.

#![allow(clippy::excessive_precision)]

use core::f32::consts::{FRAC_PI_2, PI};

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    // micromath preferred if explicitly requested (works in no_std)
    if #[cfg(feature = "micromath")] {
        use micromath::F32Ext as _;
        #[inline] pub(crate) fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] pub(crate) fn m_cos(x: f32) -> f32 { x.cos() }
        #[inline] pub(crate) fn m_sqrt(x: f32) -> f32 { x.sqrt() }
        #[inline] pub(crate) fn m_exp2(x: f32) -> f32 { 2.0_f32.powf(x) }
        #[inline] pub(crate) fn m_floor(x: f32) -> f32 { x.floor() }
        #[inline] pub(crate) fn m_round(x: f32) -> f32 { x.round() }
    // libm (C math) in no_std
    } else if #[cfg(feature = "no-std")] {
        #[inline] pub(crate) fn m_sin(x: f32) -> f32 { libm::sinf(x) }
        #[inline] pub(crate) fn m_cos(x: f32) -> f32 { libm::cosf(x) }
        #[inline] pub(crate) fn m_sqrt(x: f32) -> f32 { libm::sqrtf(x) }
        #[inline] pub(crate) fn m_exp2(x: f32) -> f32 { libm::exp2f(x) }
        #[inline] pub(crate) fn m_floor(x: f32) -> f32 { libm::floorf(x) }
        #[inline] pub(crate) fn m_round(x: f32) -> f32 { libm::roundf(x) }
    // std backend
    } else {
        #[inline] pub(crate) fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] pub(crate) fn m_cos(x: f32) -> f32 { x.cos() }
        #[inline] pub(crate) fn m_sqrt(x: f32) -> f32 { x.sqrt() }
        #[inline] pub(crate) fn m_exp2(x: f32) -> f32 { x.exp2() }
        #[inline] pub(crate) fn m_floor(x: f32) -> f32 { x.floor() }
        #[inline] pub(crate) fn m_round(x: f32) -> f32 { x.round() }
    }
}

// --------------------------------- Constants -------------------------------------

/// 2π (commonly useful)
pub const TAU: f32 = 2.0 * PI;

/// Reference pitch of A4 in Hz.
pub const A4_HZ: f32 = 440.0;

/// MIDI note number of A4.
pub const A4_MIDI: i32 = 69;

// --------------------------------- Utilities -------------------------------------

/// Clamp `x` into `[lo, hi]`. `lo` must not exceed `hi`.
#[inline]
pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    num_traits::clamp(x, lo, hi)
}

/// Round half away from zero, backend independent.
#[inline]
pub fn round(x: f32) -> f32 {
    m_round(x)
}

#[inline]
pub fn floor(x: f32) -> f32 {
    m_floor(x)
}

/// Euclidean length of an RGB triple (each channel normalized to `[0,1]`).
///
/// Not clamped: white yields `sqrt(3)`.
#[inline]
pub fn rgb_magnitude(r: f32, g: f32, b: f32) -> f32 {
    m_sqrt(r * r + g * g + b * b)
}

/// Normalize an 8-bit channel to `[0,1]`.
#[inline]
pub fn unit_from_byte(v: u8) -> f32 {
    f32::from(v) / 255.0
}

// --------------------------------- Pitch -----------------------------------------

/// Equal-tempered MIDI note → frequency (A4 = 440 Hz, MIDI 69).
#[inline]
pub fn midi_to_hz(midi: i32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let semis = (midi - A4_MIDI) as f32;
    A4_HZ * m_exp2(semis / 12.0)
}

// --------------------------------- Fast trig -------------------------------------

/// Sine used by the oscillators.
///
/// With `fast-math`: range reduction into [-π, π] and a 5th-order odd polynomial
/// (max abs error ~1e-3). Exact backend sine otherwise.
#[inline]
pub fn fast_sin(x: f32) -> f32 {
    cfg_if! {
        if #[cfg(feature = "fast-math")] {
            let k = m_round(x / TAU);
            let xr = x - k * TAU;
            let x2 = xr * xr;
            xr * (0.999_979_313_3 + x2 * (-0.166_624_432_0 + x2 * 0.008_308_978_98))
        } else {
            m_sin(x)
        }
    }
}

// --------------------------------- Panning ---------------------------------------

/// Equal-power pan law.
///
/// `pan` in `[0,1]` (0 = hard left, 1 = hard right) maps onto a quarter circle;
/// returns `(left, right) = (cos(pan·π/2), sin(pan·π/2))`. Values outside the
/// unit range are clamped first so the gains stay non-negative.
#[inline]
pub fn equal_power_pan(pan: f32) -> (f32, f32) {
    let p = clamp(pan, 0.0, 1.0) * FRAC_PI_2;
    (m_cos(p), m_sin(p))
}

// --------------------------------- Tests (std only) ------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_c_and_a4() {
        assert!((midi_to_hz(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_hz(60) - 261.6256).abs() < 1e-2);
        assert!((midi_to_hz(81) - 880.0).abs() < 1e-2);
    }

    #[test]
    fn pan_is_equal_power() {
        for p in [0.0, 0.1, 0.25, 0.5, 0.8, 1.0] {
            let (l, r) = equal_power_pan(p);
            assert!((l * l + r * r - 1.0).abs() < 1e-5, "p={p}");
        }
        let (l, r) = equal_power_pan(0.0);
        assert!((l - 1.0).abs() < 1e-6 && r.abs() < 1e-6);
        let (l, r) = equal_power_pan(2.0);
        assert!(l.abs() < 1e-6 && (r - 1.0).abs() < 1e-6);
    }

    #[test]
    fn white_magnitude_is_not_clamped() {
        let a = rgb_magnitude(1.0, 1.0, 1.0);
        assert!((a - 3.0_f32.sqrt()).abs() < 1e-6, "a={a}");
    }

    #[test]
    fn byte_normalization() {
        assert_eq!(unit_from_byte(0), 0.0);
        assert_eq!(unit_from_byte(255), 1.0);
        assert!((unit_from_byte(128) - 0.50196).abs() < 1e-4);
    }

    #[test]
    fn fast_sin_tracks_sine() {
        for i in -20..=20 {
            let x = i as f32 * 0.37;
            assert!((fast_sin(x) - x.sin()).abs() < 2e-3, "x={x}");
        }
    }
}
