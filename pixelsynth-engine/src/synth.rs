//! The engine proper: one snapshot, one clock, per-sample rendering.
//!
//! States
//! - Unconfigured: no snapshot, rendering writes nothing
//! - Configured  : a `config` installed a snapshot and reset the clock
//! - Streaming   : every rendered frame advances the clock by one; later
//!   snapshots from `params`/`pixels` are swapped in without touching it
//!
//! `Synth` is single-threaded. For a realtime host, split it with
//! [`crate::realtime::split`] so messages arrive over a lock-free queue.

use crate::bank;
use crate::clock::Clock;
use crate::graph::{planar_frames, write_interleaved, write_planar};
use crate::message::Message;
use crate::notify::{ColumnEvent, ColumnSink};
use crate::snapshot::{apply_message, Snapshot};

#[derive(Debug, Default)]
pub struct Synth {
    snapshot: Option<Box<Snapshot>>,
    clock: Clock,
}

impl Synth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a message directly. Allocates; not for the audio thread.
    ///
    /// Returns `false` when the message was ignored (no config yet).
    pub fn handle(&mut self, message: Message) -> bool {
        match apply_message(self.snapshot.as_deref(), message) {
            Some(t) => {
                drop(self.install(Box::new(t.snapshot), t.reset));
                true
            }
            None => false,
        }
    }

    /// Swap in a prepared snapshot; returns the previous one so the caller
    /// decides where it gets freed. `reset` restarts playback at column 0.
    #[inline]
    pub fn install(&mut self, snapshot: Box<Snapshot>, reset: bool) -> Option<Box<Snapshot>> {
        if reset {
            self.clock.reset();
        }
        self.snapshot.replace(snapshot)
    }

    #[inline] pub fn snapshot(&self) -> Option<&Snapshot> { self.snapshot.as_deref() }
    #[inline] pub fn clock(&self) -> &Clock { &self.clock }
    #[inline] pub fn is_configured(&self) -> bool { self.snapshot.is_some() }

    /// Produce the next stereo frame, or `None` when unconfigured.
    ///
    /// Without an image the clock still advances and the frame is silent.
    #[inline]
    pub fn next_frame<S: ColumnSink + ?Sized>(&mut self, sink: &mut S) -> Option<(f32, f32)> {
        let snap = self.snapshot.as_deref()?;
        let cfg = snap.config();
        let Some(tick) = self.clock.step(snap.samples_per_column(), snap.width(), cfg.sample_rate) else {
            return Some((0.0, 0.0));
        };
        if tick.entered {
            #[allow(clippy::cast_possible_truncation)]
            sink.column_changed(ColumnEvent { column: tick.column as u32 });
        }
        let pixels = snap.pixels()?;
        Some(bank::render_frame(snap, pixels, &tick))
    }

    /// Fill a planar block. Writes nothing when unconfigured or channel-less.
    pub fn render_planar<S: ColumnSink + ?Sized>(&mut self, outputs: &mut [&mut [f32]], sink: &mut S) {
        if outputs.is_empty() || !self.is_configured() {
            return;
        }
        for i in 0..planar_frames(outputs) {
            let Some(frame) = self.next_frame(sink) else { return };
            write_planar(outputs, i, frame);
        }
    }

    /// Fill an interleaved block of `channels` samples per frame.
    pub fn render_interleaved<S: ColumnSink + ?Sized>(&mut self, out: &mut [f32], channels: usize, sink: &mut S) {
        if channels == 0 || !self.is_configured() {
            return;
        }
        for frame in out.chunks_exact_mut(channels) {
            let Some(s) = self.next_frame(sink) else { return };
            write_interleaved(frame, s);
        }
    }

    /// Render `frames` stereo frames offline. Returns interleaved L/R samples
    /// and every column event raised along the way.
    pub fn render_offline(&mut self, frames: usize) -> (Vec<f32>, Vec<ColumnEvent>) {
        let mut out = vec![0.0; frames * 2];
        let mut events = Vec::new();
        self.render_interleaved(&mut out, 2, &mut events);
        (out, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ParamUpdate;
    use crate::notify::Discard;

    fn configure(synth: &mut Synth, json: &str) {
        assert!(synth.handle(Message::from_json(json).unwrap()));
    }

    const ORANGE: &str = r#"{"type":"config","sampleRate":48000,"durationPerColumn":0.1,
        "baseFrequency":220,"harmonicCount":1,"harmonicMode":"all",
        "pixelData":{"width":1,"height":1,"data":[255,128,0,255]}}"#;

    /// Frequency estimate from positive-going zero crossings.
    fn zero_crossing_hz(x: &[f32], sr: f32) -> f32 {
        let ups: Vec<f32> = x
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[0] <= 0.0 && w[1] > 0.0)
            .map(|(i, w)| i as f32 + w[0] / (w[0] - w[1]))
            .collect();
        let span = ups.last().unwrap() - ups.first().unwrap();
        (ups.len() - 1) as f32 * sr / span
    }

    #[test]
    fn unconfigured_writes_nothing() {
        let mut s = Synth::new();
        let mut buf = [7.0f32; 8];
        s.render_interleaved(&mut buf, 2, &mut Discard);
        assert!(buf.iter().all(|&v| v == 7.0));
        assert_eq!(s.clock().sample_counter(), 0);
        assert!(!s.handle(ParamUpdate::default().into()));
    }

    #[test]
    fn orange_pixel_plays_left_at_220() {
        let mut s = Synth::new();
        configure(&mut s, ORANGE);
        let (out, events) = s.render_offline(4800);
        assert_eq!(events, vec![ColumnEvent { column: 0 }]);
        assert_eq!(s.clock().sample_counter(), 4800);

        let left: Vec<f32> = out.chunks(2).map(|f| f[0]).collect();
        let right: Vec<f32> = out.chunks(2).map(|f| f[1]).collect();
        assert!(left.iter().any(|v| v.abs() > 0.5));
        assert!(right.iter().all(|v| v.abs() < 1e-6));

        let f = zero_crossing_hz(&left, 48_000.0);
        let expected = 220.0 * (1.0 + (128.0 / 255.0 - 0.5) * 0.1);
        assert!((f - expected).abs() < 0.5, "f={f} expected={expected}");
    }

    #[test]
    fn column_events_fire_once_per_transition() {
        let mut s = Synth::new();
        configure(
            &mut s,
            r#"{"type":"config","sampleRate":100,"durationPerColumn":0.1,"baseFrequency":10,
               "pixelData":{"width":4,"height":1,"data":[255,0,0,255,255,0,0,255,255,0,0,255,255,0,0,255]}}"#,
        );
        let (_, events) = s.render_offline(45);
        let cols: Vec<u32> = events.iter().map(|e| e.column).collect();
        assert_eq!(cols, vec![0, 1, 2, 3, 0]);
    }

    #[test]
    fn params_do_not_reset_position_but_config_does() {
        let mut s = Synth::new();
        configure(&mut s, ORANGE);
        s.render_offline(1000);
        assert!(s.handle(Message::from_json(r#"{"type":"params","stereoWidth":0}"#).unwrap()));
        assert_eq!(s.clock().sample_counter(), 1000);
        assert_eq!(s.snapshot().unwrap().config().stereo_width, 0.0);

        // centered now: both channels carry signal
        let (out, events) = s.render_offline(64);
        assert!(events.is_empty());
        assert!(out.chunks(2).any(|f| f[1].abs() > 0.1));

        configure(&mut s, ORANGE);
        assert_eq!(s.clock().sample_counter(), 0);
        assert_eq!(s.clock().last_column(), -1);
    }

    #[test]
    fn pixel_swap_keeps_position() {
        let mut s = Synth::new();
        configure(&mut s, ORANGE);
        s.render_offline(10);
        assert!(s.handle(
            Message::from_json(r#"{"type":"pixels","pixelData":{"width":2,"height":1,"data":[0,0,0,255,0,0,0,255]}}"#)
                .unwrap()
        ));
        let (out, _) = s.render_offline(10);
        assert_eq!(s.clock().sample_counter(), 20);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn config_without_image_is_silent_but_clocked() {
        let mut s = Synth::new();
        configure(&mut s, r#"{"type":"config","sampleRate":48000,"durationPerColumn":0.1,"baseFrequency":220}"#);
        let mut buf = [7.0f32; 16];
        s.render_interleaved(&mut buf, 2, &mut Discard);
        assert!(buf.iter().all(|&v| v == 0.0));
        assert_eq!(s.clock().sample_counter(), 8);
    }

    #[test]
    fn planar_and_mono_outputs() {
        let mut s = Synth::new();
        configure(&mut s, ORANGE);
        let mut l = [0.0f32; 32];
        let mut r = [0.0f32; 32];
        {
            let mut outs: [&mut [f32]; 2] = [&mut l, &mut r];
            s.render_planar(&mut outs, &mut Discard);
        }
        assert_eq!(s.clock().sample_counter(), 32);
        assert!(l.iter().any(|v| v.abs() > 0.1));

        let mut none: [&mut [f32]; 0] = [];
        s.render_planar(&mut none, &mut Discard);
        assert_eq!(s.clock().sample_counter(), 32);
    }

    #[test]
    fn long_columns_keep_phase_accuracy() {
        // 20 s column: the sine argument would reach ~155k rad in f32
        let mut s = Synth::new();
        configure(
            &mut s,
            r#"{"type":"config","sampleRate":8000,"durationPerColumn":20,"baseFrequency":1234,
               "harmonicCount":1,"detuneAmount":0,"stereoWidth":0,"phaseAmount":0,
               "pixelData":{"width":1,"height":1,"data":[255,0,0,255]}}"#,
        );
        let (out, events) = s.render_offline(160_000);
        assert_eq!(events.len(), 1);
        let gain = std::f64::consts::FRAC_PI_4.cos() * 0.8;
        for n in 152_000..160_000usize {
            let t = n as f64 / 8000.0;
            let want = (std::f64::consts::TAU * 1234.0 * t).sin() * gain;
            let got = f64::from(out[n * 2]);
            assert!((got - want).abs() < 1e-4, "frame {n}: got {got}, want {want}");
        }
    }

    /// 1000 Hz, 100-sample columns, one centered red partial starting at its peak.
    fn attack_config(attack: &str) -> String {
        format!(
            r#"{{"type":"config","sampleRate":1000,"durationPerColumn":0.1,"baseFrequency":10,
               "harmonicCount":1,"detuneAmount":0,"stereoWidth":0,"phaseAmount":0.25,{attack}
               "pixelData":{{"width":2,"height":1,"data":[255,0,0,255,255,0,0,255]}}}}"#
        )
    }

    fn centered_peak(frame: usize) -> f32 {
        let t = (frame % 100) as f32 / 1000.0;
        (std::f32::consts::TAU * 10.0 * t).cos() * std::f32::consts::FRAC_PI_4.cos() * 0.8
    }

    #[test]
    fn attack_ramps_each_column_through_the_render_path() {
        let mut s = Synth::new();
        configure(&mut s, &attack_config(r#""attackTime":0.05,"#));
        assert_eq!(s.snapshot().unwrap().envelope().attack_samples(), 50);
        let (out, _) = s.render_offline(200);
        let left = |n: usize| out[n * 2];

        // column starts are fully closed: the partial is skipped, not just quiet
        assert_eq!((out[0], out[1]), (0.0, 0.0));
        assert_eq!((out[200], out[201]), (0.0, 0.0));
        // halfway up the ramp
        assert!((left(25) - 0.5 * centered_peak(25)).abs() < 1e-4, "{}", left(25));
        // past the attack window: full level
        for n in [60, 99, 160, 199] {
            assert!((left(n) - centered_peak(n)).abs() < 1e-4, "frame {n}: {}", left(n));
        }
    }

    #[test]
    fn tonal_config_plays_middle_c() {
        let mut s = Synth::new();
        configure(
            &mut s,
            r#"{"type":"config","sampleRate":48000,"durationPerColumn":0.1,"baseFrequency":220,
               "harmonicCount":1,"harmonicMode":"tonal","tonalNotes":[0],"baseOctave":4,
               "detuneAmount":0,"pixelData":{"width":1,"height":1,"data":[255,0,0,255]}}"#,
        );
        let (out, _) = s.render_offline(4800);
        let left: Vec<f32> = out.chunks(2).map(|f| f[0]).collect();
        let f = zero_crossing_hz(&left, 48_000.0);
        let middle_c = 440.0 * 2f32.powf(-9.0 / 12.0);
        assert!((f - middle_c).abs() < 0.5, "f={f} expected={middle_c}");
    }

    #[test]
    fn attack_params_update_keeps_position() {
        let mut s = Synth::new();
        configure(&mut s, &attack_config(""));
        s.render_offline(130);
        assert!(s.handle(Message::from_json(r#"{"type":"params","attackTime":0.05}"#).unwrap()));
        assert_eq!(s.clock().sample_counter(), 130);
        assert_eq!(s.snapshot().unwrap().envelope().attack_samples(), 50);

        // mid-column (index 30): ramp is at 0.6
        let (out, events) = s.render_offline(71);
        assert!(events.iter().map(|e| e.column).eq([0]));
        assert!((out[0] - 0.6 * centered_peak(130)).abs() < 1e-4, "{}", out[0]);
        // next column start is closed
        assert_eq!((out[140], out[141]), (0.0, 0.0));
    }

    #[test]
    fn white_image_can_exceed_unity() {
        let mut s = Synth::new();
        configure(
            &mut s,
            r#"{"type":"config","sampleRate":48000,"durationPerColumn":0.1,"baseFrequency":220,
               "phaseAmount":0.25,"pixelData":{"width":1,"height":1,"data":[255,255,255,255]}}"#,
        );
        let (out, _) = s.render_offline(1);
        assert!(out[1] > 1.0, "right={}", out[1]);
    }
}
