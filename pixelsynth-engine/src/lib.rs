//! pixelsynth Engine: image sonification driven by JSON control messages.
//!
//! Crate layout:
//! - [`config`]   : `SynthConfig`, harmonic modes, field validators
//! - [`pixels`]   : RGBA image buffer
//! - [`message`]  : `config` / `params` / `pixels` wire messages
//! - [`snapshot`] : immutable render state and the message state machine
//! - [`clock`]    : sample counter → column / time-in-column
//! - [`bank`]     : per-row sine oscillators for the current column
//! - [`mixer`]    : normalization and headroom
//! - [`notify`]   : outbound column events
//! - [`graph`]    : `BlockRenderer` trait and channel layout helpers
//! - [`synth`]    : single-threaded engine
//! - [`realtime`] : lock-free controller/processor split for audio hosts
//!
//! The render path never allocates, frees, locks, or blocks. Every message is
//! turned into a fresh [`Snapshot`] off the audio thread and handed over by
//! pointer.

pub mod bank;
pub mod clock;
pub mod config;
pub mod error;
pub mod graph;
pub mod message;
pub mod mixer;
pub mod notify;
pub mod pixels;
pub mod realtime;
pub mod snapshot;
pub mod synth;

// Re-export some commonly used items to make downstream imports ergonomic.
pub use config::{HarmonicMode, SynthConfig, TailKind};
pub use error::{ControlError, MessageError, PixelError};
pub use graph::BlockRenderer;
pub use message::{Message, ParamUpdate};
pub use notify::{ColumnEvent, ColumnSink};
pub use pixels::PixelBuffer;
pub use realtime::{split, split_default, SynthController, SynthProcessor};
pub use snapshot::{apply_message, Snapshot};
pub use synth::Synth;
