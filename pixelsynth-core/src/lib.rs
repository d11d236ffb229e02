#![cfg_attr(not(feature = "std"), no_std)]
//! pixelsynth Core: no_std-ready DSP primitives for image sonification.
//!
//! Features
//! - `std`      : (default) use the Rust standard library
//! - `no-std`   : build with `#![no_std]` and use `libm`/`micromath` math backends
//! - `fast-math`: polynomial sine for the oscillator bank
//!
//! Modules
//! - [`dsp`]      : math backend, pan law, MIDI/frequency, channel helpers
//! - [`pitch`]    : row → frequency mapping (harmonic series, tonal scales, detune)
//! - [`envelope`] : per-column attack/tail gain trapezoid
//!
//! Design
//! - No heap allocations; everything here is `Copy` and pure
//! - Friendly to embedded / real-time targets

pub mod dsp;
pub mod envelope;
pub mod pitch;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::dsp::{
        clamp, equal_power_pan, fast_sin, midi_to_hz, rgb_magnitude, unit_from_byte, TAU,
    };
    pub use crate::envelope::ColumnEnvelope;
    pub use crate::pitch::{detune_factor, PitchMap, TonalNotes};
}
