//! Inbound control protocol.
//!
//! Wire form is JSON with a `type` tag:
//!
//! ```json
//! {"type":"config","sampleRate":48000,"durationPerColumn":0.1,"baseFrequency":220,
//!  "pixelData":{"width":1,"height":1,"data":[255,128,0,255]}}
//! {"type":"params","stereoWidth":0.5,"harmonicMode":"odd"}
//! {"type":"pixels","pixelData":{"width":2,"height":1,"data":[0,0,0,255,9,9,9,255]}}
//! ```
//!
//! Parsing happens in two stages. serde recognizes the envelope and collects
//! each field as a raw `Value`; then every field is validated on its own, so
//! one bad value never spoils its neighbours.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use pixelsynth_core::pitch::TonalNotes;

use crate::config::{self, HarmonicMode, SynthConfig, TailKind};
use crate::error::MessageError;
use crate::pixels::PixelBuffer;

/// A validated subset of config fields. `None` means "leave as is".
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ParamUpdate {
    pub sample_rate: Option<f32>,
    pub base_frequency: Option<f32>,
    pub duration_per_column: Option<f32>,
    pub detune_amount: Option<f32>,
    pub stereo_width: Option<f32>,
    pub harmonic_count: Option<u32>,
    pub harmonic_mode: Option<HarmonicMode>,
    pub tonal_notes: Option<TonalNotes>,
    pub base_octave: Option<i32>,
    pub phase_amount: Option<f32>,
    pub attack_time: Option<f32>,
    pub tail: Option<(TailKind, f32)>,
}

impl ParamUpdate {
    /// Overwrite the fields this update carries.
    pub fn apply_to(&self, cfg: &mut SynthConfig) {
        if let Some(v) = self.sample_rate { cfg.sample_rate = v; }
        if let Some(v) = self.base_frequency { cfg.base_frequency = v; }
        if let Some(v) = self.duration_per_column { cfg.duration_per_column = v; }
        if let Some(v) = self.detune_amount { cfg.detune_amount = v; }
        if let Some(v) = self.stereo_width { cfg.stereo_width = v; }
        if let Some(v) = self.harmonic_count { cfg.harmonic_count = Some(v); }
        if let Some(v) = self.harmonic_mode { cfg.harmonic_mode = v; }
        if let Some(v) = self.tonal_notes { cfg.tonal_notes = v; }
        if let Some(v) = self.base_octave { cfg.base_octave = v; }
        if let Some(v) = self.phase_amount { cfg.phase_amount = v; }
        if let Some(v) = self.attack_time { cfg.attack_time = v; }
        if let Some((kind, secs)) = self.tail {
            cfg.tail_kind = kind;
            cfg.tail_time = secs;
        }
    }

    /// `SynthConfig::default()` with this update applied.
    pub fn resolve(&self) -> SynthConfig {
        let mut cfg = SynthConfig::default();
        self.apply_to(&mut cfg);
        cfg
    }
}

/// Full replacement: parameters resolved against defaults, plus the image.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigMessage {
    pub config: SynthConfig,
    /// `None` when `pixelData` was missing or malformed; the engine then stays silent.
    pub pixels: Option<PixelBuffer>,
}

/// One control message.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// Replace everything and restart playback from column 0.
    Config(ConfigMessage),
    /// Adjust some parameters; playback position is kept.
    Params(ParamUpdate),
    /// Swap the image; playback position is kept.
    Pixels(PixelBuffer),
}

impl Message {
    /// Parse one JSON message.
    ///
    /// Errors only for an unusable envelope (bad JSON, unknown `type`, a
    /// `pixels` message without a valid buffer). Bad individual fields are
    /// dropped silently.
    pub fn from_json(text: &str) -> Result<Self, MessageError> {
        let raw: RawMessage = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    /// Same as [`Message::from_json`] for an already-parsed value.
    pub fn from_value(value: Value) -> Result<Self, MessageError> {
        let raw: RawMessage = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawMessage) -> Result<Self, MessageError> {
        Ok(match raw {
            RawMessage::Config(fields) => {
                let pixels = match fields.pixel_data.as_ref().map(PixelBuffer::from_json) {
                    Some(Ok(buf)) => Some(buf),
                    Some(Err(e)) => {
                        warn!("config pixelData rejected, rendering silence: {e}");
                        None
                    }
                    None => {
                        warn!("config without pixelData, rendering silence");
                        None
                    }
                };
                let config = fields.validate(true).resolve();
                Message::Config(ConfigMessage { config, pixels })
            }
            RawMessage::Params(fields) => Message::Params(fields.validate(false)),
            RawMessage::Pixels(p) => {
                let value = p.pixel_data.ok_or(MessageError::MissingPixels)?;
                let buf = PixelBuffer::from_json(&value).map_err(MessageError::from)?;
                Message::Pixels(buf)
            }
        })
    }

    /// Short tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Config(_) => "config",
            Message::Params(_) => "params",
            Message::Pixels(_) => "pixels",
        }
    }
}

impl From<PixelBuffer> for Message {
    fn from(buf: PixelBuffer) -> Self { Message::Pixels(buf) }
}

impl From<ParamUpdate> for Message {
    fn from(p: ParamUpdate) -> Self { Message::Params(p) }
}

// ---------------------------------- Wire shapes ----------------------------------

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawMessage {
    Config(RawFields),
    Params(RawFields),
    Pixels(RawPixels),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFields {
    sample_rate: Option<Value>,
    base_frequency: Option<Value>,
    /// Older hosts send `baseFreq`.
    base_freq: Option<Value>,
    duration_per_column: Option<Value>,
    detune_amount: Option<Value>,
    stereo_width: Option<Value>,
    harmonic_count: Option<Value>,
    harmonic_mode: Option<Value>,
    tonal_notes: Option<Value>,
    base_octave: Option<Value>,
    phase_amount: Option<Value>,
    attack_time: Option<Value>,
    decay_time: Option<Value>,
    release_time: Option<Value>,
    pixel_data: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPixels {
    pixel_data: Option<Value>,
}

impl RawFields {
    /// `sampleRate` is only honoured on full config messages.
    fn validate(&self, with_sample_rate: bool) -> ParamUpdate {
        let check = |v: &Option<Value>, f: fn(&Value) -> Option<f32>| v.as_ref().and_then(f);
        let tail = {
            let release = check(&self.release_time, config::non_negative).map(|s| (TailKind::Release, s));
            let decay = check(&self.decay_time, config::non_negative).map(|s| (TailKind::Decay, s));
            release.or(decay)
        };
        ParamUpdate {
            sample_rate: if with_sample_rate { check(&self.sample_rate, config::positive) } else { None },
            base_frequency: check(&self.base_frequency, config::positive)
                .or_else(|| check(&self.base_freq, config::positive)),
            duration_per_column: check(&self.duration_per_column, config::positive),
            detune_amount: check(&self.detune_amount, config::non_negative),
            stereo_width: check(&self.stereo_width, config::non_negative),
            harmonic_count: self.harmonic_count.as_ref().and_then(config::harmonic_count),
            harmonic_mode: self.harmonic_mode.as_ref().and_then(config::harmonic_mode),
            tonal_notes: self.tonal_notes.as_ref().and_then(config::tonal_notes),
            base_octave: self.base_octave.as_ref().and_then(config::base_octave),
            phase_amount: check(&self.phase_amount, config::non_negative),
            attack_time: check(&self.attack_time, config::non_negative),
            tail,
        }
    }
}
