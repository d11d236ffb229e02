//! Real-time playback through cpal.

use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use pixelsynth_engine::realtime::{split, DEFAULT_COMMAND_CAPACITY, DEFAULT_EVENT_CAPACITY};
use pixelsynth_engine::{BlockRenderer, ControlError, SynthController, SynthProcessor};
use tracing::{debug, info, warn};

use crate::source::Scheduled;

/// Largest block rendered in one go; bigger device buffers are split.
const MAX_BLOCK_FRAMES: usize = 4096;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct PlayOptions {
    pub device_name: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub duration: Option<f64>,
    pub gain: f32,
    pub print_columns: bool,
}

pub fn list_output_devices() -> Result<()> {
    let host = cpal::default_host();
    println!("Available output devices:");
    for dev in host.output_devices()? {
        println!("- {}", dev.name()?);
    }
    Ok(())
}

fn pick_device(name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    if let Some(name) = name {
        for d in host.output_devices()? {
            if d.name()? == name {
                return Ok(d);
            }
        }
        bail!("requested device not found: {name}");
    }
    host.default_output_device().ok_or_else(|| anyhow!("no default output device"))
}

fn choose_config(
    device: &cpal::Device,
    req_sr: Option<u32>,
    req_ch: Option<u16>,
) -> Result<cpal::SupportedStreamConfig> {
    if req_sr.is_none() && req_ch.is_none() {
        return Ok(device.default_output_config()?);
    }

    // Closest range wins: sample-rate distance dominates channel distance.
    let mut best: Option<(u64, cpal::SupportedStreamConfigRange)> = None;
    for range in device.supported_output_configs()? {
        let ch = range.channels();
        let (lo, hi) = (range.min_sample_rate().0, range.max_sample_rate().0);

        let ch_pen = req_ch.map_or(0, |c| u64::from(ch.abs_diff(c)));
        let sr_pen = req_sr.map_or(0, |sr| {
            if (lo..=hi).contains(&sr) {
                0
            } else {
                u64::from(lo.abs_diff(sr).min(hi.abs_diff(sr)))
            }
        });

        let score = sr_pen.saturating_mul(1000) + ch_pen;
        if best.as_ref().map_or(true, |(s, _)| score < *s) {
            best = Some((score, range));
        }
    }

    let (_, range) = best.ok_or_else(|| anyhow!("no supported output configs"))?;
    let pick_sr = match req_sr {
        Some(sr) => cpal::SampleRate(sr.clamp(range.min_sample_rate().0, range.max_sample_rate().0)),
        None => range.max_sample_rate(),
    };
    Ok(range.with_sample_rate(pick_sr))
}

fn build_stream<T>(
    device: &cpal::Device,
    cfg: &cpal::StreamConfig,
    mut processor: SynthProcessor,
    gain: f32,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let channels = usize::from(cfg.channels);
    let mut scratch = vec![0.0f32; MAX_BLOCK_FRAMES * channels.max(1)];
    let err_fn = |e: cpal::StreamError| warn!("stream error: {e}");

    let stream = device.build_output_stream(
        cfg,
        move |output: &mut [T], _| {
            for chunk in output.chunks_mut(scratch.len()) {
                let block = &mut scratch[..chunk.len()];
                block.fill(0.0);
                processor.render_interleaved(block, channels);
                // the engine is not limited; the device format is
                for (o, s) in chunk.iter_mut().zip(block.iter()) {
                    *o = T::from_sample((s * gain).clamp(-1.0, 1.0));
                }
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}

/// Post every message that is due. Returns how many remain.
fn post_due(ctl: &mut SynthController, script: &mut Vec<Scheduled>, elapsed: f64) -> usize {
    while let Some(next) = script.first() {
        if next.at > elapsed {
            break;
        }
        match ctl.post(next.message.clone()) {
            Ok(applied) => {
                debug!(kind = next.message.kind(), at = next.at, applied, "posted");
                script.remove(0);
            }
            // retry on the next poll
            Err(ControlError::QueueFull) => break,
            Err(e) => {
                warn!("dropping message: {e}");
                script.remove(0);
            }
        }
    }
    script.len()
}

pub fn play(mut script: Vec<Scheduled>, opts: &PlayOptions) -> Result<()> {
    let device = pick_device(opts.device_name.as_deref())?;
    let sup_cfg = choose_config(&device, opts.sample_rate, opts.channels)?;
    let sample_format = sup_cfg.sample_format();
    let mut cfg = sup_cfg.config();
    if let Some(sr) = opts.sample_rate {
        cfg.sample_rate = cpal::SampleRate(sr);
    }
    if let Some(ch) = opts.channels {
        cfg.channels = ch;
    }

    #[allow(clippy::cast_precision_loss)]
    let rate = cfg.sample_rate.0 as f32;
    crate::source::retarget_sample_rate(&mut script, rate);

    info!(device = %device.name()?, ?cfg, ?sample_format, "opening output");

    let (mut ctl, processor) = split(DEFAULT_COMMAND_CAPACITY, DEFAULT_EVENT_CAPACITY);
    post_due(&mut ctl, &mut script, 0.0);

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &cfg, processor, opts.gain)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &cfg, processor, opts.gain)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &cfg, processor, opts.gain)?,
        other => bail!("unsupported device sample format: {other:?}"),
    };
    stream.play()?;

    match opts.duration {
        Some(d) => info!("playing for {d} s"),
        None => info!("playing; press Ctrl+C to stop"),
    }

    let start = Instant::now();
    loop {
        let elapsed = start.elapsed().as_secs_f64();
        if opts.duration.is_some_and(|d| elapsed >= d) {
            break;
        }
        post_due(&mut ctl, &mut script, elapsed);
        for event in ctl.drain_events() {
            if opts.print_columns {
                println!("{}", event.to_json());
            } else {
                debug!(column = event.column, "column");
            }
        }
        ctl.collect_garbage();
        std::thread::sleep(POLL_INTERVAL);
    }
    Ok(())
}
