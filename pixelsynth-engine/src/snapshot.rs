//! Immutable engine state as seen by the render path, and the pure update
//! function that turns a message into the next snapshot.
//!
//! The control side builds a fresh `Snapshot` for every accepted message and
//! publishes it whole; the audio thread only ever swaps one complete snapshot
//! for another. Derived values (column length, envelope ramps, pitch strategy)
//! are computed once here instead of per sample.

use std::sync::Arc;

use pixelsynth_core::envelope::ColumnEnvelope;
use pixelsynth_core::pitch::PitchMap;

use crate::config::SynthConfig;
use crate::message::Message;
use crate::pixels::PixelBuffer;

#[derive(Clone, Debug)]
pub struct Snapshot {
    config: SynthConfig,
    pixels: Option<Arc<PixelBuffer>>,
    samples_per_column: u64,
    envelope: ColumnEnvelope,
    pitch: PitchMap,
}

impl Snapshot {
    pub fn new(config: SynthConfig, pixels: Option<Arc<PixelBuffer>>) -> Self {
        Self {
            samples_per_column: config.samples_per_column(),
            envelope: config.envelope(),
            pitch: config.pitch_map(),
            config,
            pixels,
        }
    }

    #[inline] pub fn config(&self) -> &SynthConfig { &self.config }
    #[inline] pub fn pixels(&self) -> Option<&PixelBuffer> { self.pixels.as_deref() }
    #[inline] pub fn samples_per_column(&self) -> u64 { self.samples_per_column }
    #[inline] pub fn envelope(&self) -> &ColumnEnvelope { &self.envelope }
    #[inline] pub fn pitch(&self) -> &PitchMap { &self.pitch }

    /// Image width in columns; 0 without an image.
    #[inline]
    pub fn width(&self) -> usize {
        self.pixels().map_or(0, PixelBuffer::width)
    }

    fn with_config(&self, config: SynthConfig) -> Self {
        Self::new(config, self.pixels.clone())
    }

    fn with_pixels(&self, pixels: PixelBuffer) -> Self {
        Self::new(self.config, Some(Arc::new(pixels)))
    }
}

/// Result of applying a message: the snapshot to publish and whether the
/// playback position restarts.
#[derive(Clone, Debug)]
pub struct Transition {
    pub snapshot: Snapshot,
    pub reset: bool,
}

/// `(state, message) → state'`.
///
/// Returns `None` when the message does not apply: `params` and `pixels`
/// before any `config` are ignored.
pub fn apply_message(current: Option<&Snapshot>, message: Message) -> Option<Transition> {
    match message {
        Message::Config(c) => Some(Transition {
            snapshot: Snapshot::new(c.config, c.pixels.map(Arc::new)),
            reset: true,
        }),
        Message::Params(update) => current.map(|cur| {
            let mut config = cur.config;
            update.apply_to(&mut config);
            Transition { snapshot: cur.with_config(config), reset: false }
        }),
        Message::Pixels(buf) => current.map(|cur| Transition {
            snapshot: cur.with_pixels(buf),
            reset: false,
        }),
    }
}
