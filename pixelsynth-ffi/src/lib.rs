//! C ABI wrapper for the pixelsynth engine.
//!
//! Exposes a small set of functions to create/destroy an engine, post JSON
//! control messages, render interleaved f32 samples, and poll column
//! notifications.
//!
//! ABI notes
//! - All functions are `extern "C"` and `#[no_mangle]`.
//! - Opaque handle type: `PixelSynth` (heap-allocated; you own/delete it).
//! - Output is stereo internally; 1 channel gets the mid downmix, channels
//!   past the second are zeroed.
//!
//! Threading
//! - Control functions (`post_json`, `poll_column`) may run on one thread and
//!   `render_interleaved_f32` on another. Each side must stay on one thread.
//! - `create`/`destroy` must not race with anything.

use std::ffi::{c_char, CStr};
use std::ptr::addr_of_mut;

use pixelsynth_engine::realtime::{split, DEFAULT_COMMAND_CAPACITY, DEFAULT_EVENT_CAPACITY};
use pixelsynth_engine::{BlockRenderer, ControlError, SynthController, SynthProcessor};

/// Message applied.
pub const PIXELSYNTH_OK: i32 = 1;
/// Message valid but ignored (`params`/`pixels` before any `config`).
pub const PIXELSYNTH_IGNORED: i32 = 0;
/// Not valid JSON, unknown `type`, or an unusable `pixelData`.
pub const PIXELSYNTH_ERR_MESSAGE: i32 = -1;
/// Command queue full; retry after the next render call.
pub const PIXELSYNTH_ERR_QUEUE_FULL: i32 = -2;
/// Null pointer or non-UTF-8 text.
pub const PIXELSYNTH_ERR_ARGUMENT: i32 = -3;

/// Opaque engine handle. The two halves are only ever borrowed separately.
pub struct PixelSynth {
    controller: SynthController,
    processor: SynthProcessor,
}

// --- Creation / destruction -------------------------------------------------------

/// Create an engine with default queue capacities. It stays silent until a
/// `config` message is posted.
#[no_mangle]
pub extern "C" fn pixelsynth_create() -> *mut PixelSynth {
    pixelsynth_create_with_capacity(DEFAULT_COMMAND_CAPACITY as u32, DEFAULT_EVENT_CAPACITY as u32)
}

/// Create an engine with explicit command/notification queue capacities.
#[no_mangle]
pub extern "C" fn pixelsynth_create_with_capacity(commands: u32, events: u32) -> *mut PixelSynth {
    let (controller, processor) = split(commands as usize, events as usize);
    Box::into_raw(Box::new(PixelSynth { controller, processor }))
}

/// Destroy an engine previously returned by `pixelsynth_create*`.
#[no_mangle]
pub extern "C" fn pixelsynth_destroy(engine: *mut PixelSynth) {
    if !engine.is_null() {
        unsafe { drop(Box::from_raw(engine)); }
    }
}

// --- Control -----------------------------------------------------------------------

/// Post one JSON control message (NUL-terminated UTF-8).
///
/// Returns one of the `PIXELSYNTH_*` codes.
#[no_mangle]
pub extern "C" fn pixelsynth_post_json(engine: *mut PixelSynth, json: *const c_char) -> i32 {
    if engine.is_null() || json.is_null() {
        return PIXELSYNTH_ERR_ARGUMENT;
    }
    let Ok(text) = unsafe { CStr::from_ptr(json) }.to_str() else {
        return PIXELSYNTH_ERR_ARGUMENT;
    };
    let ctl = unsafe { &mut *addr_of_mut!((*engine).controller) };
    match ctl.post_json(text) {
        Ok(true) => PIXELSYNTH_OK,
        Ok(false) => PIXELSYNTH_IGNORED,
        Err(ControlError::QueueFull) => PIXELSYNTH_ERR_QUEUE_FULL,
        Err(ControlError::Message(_)) => PIXELSYNTH_ERR_MESSAGE,
    }
}

/// Pop the next column notification. Returns the column index, or -1 when
/// none is pending. Also releases snapshots the audio side has retired.
#[no_mangle]
pub extern "C" fn pixelsynth_poll_column(engine: *mut PixelSynth) -> i64 {
    if engine.is_null() {
        return -1;
    }
    let ctl = unsafe { &mut *addr_of_mut!((*engine).controller) };
    ctl.collect_garbage();
    ctl.pop_event().map_or(-1, |e| i64::from(e.column))
}

// --- Rendering -------------------------------------------------------------------

/// Render `frames` of audio into an interleaved f32 buffer with `channels`
/// channels. The buffer is left untouched before the first `config`.
///
/// Returns the number of frames rendered (0 on error or when unconfigured).
#[no_mangle]
pub extern "C" fn pixelsynth_render_interleaved_f32(
    engine: *mut PixelSynth,
    out_interleaved: *mut f32,
    frames: u32,
    channels: u32,
) -> u32 {
    if engine.is_null() || out_interleaved.is_null() || frames == 0 || channels == 0 {
        return 0;
    }
    let Some(len) = (frames as usize).checked_mul(channels as usize) else { return 0 };
    let out = unsafe { std::slice::from_raw_parts_mut(out_interleaved, len) };
    let p = unsafe { &mut *addr_of_mut!((*engine).processor) };

    p.render_interleaved(out, channels as usize);
    if p.synth().is_configured() { frames } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn post(e: *mut PixelSynth, json: &str) -> i32 {
        let c = CString::new(json).unwrap();
        pixelsynth_post_json(e, c.as_ptr())
    }

    #[test]
    fn lifecycle_through_the_c_surface() {
        let e = pixelsynth_create();
        let mut buf = [0.0f32; 40];
        assert_eq!(pixelsynth_render_interleaved_f32(e, buf.as_mut_ptr(), 20, 2), 0);
        assert_eq!(post(e, r#"{"type":"params","stereoWidth":0}"#), PIXELSYNTH_IGNORED);
        assert_eq!(post(e, "nope"), PIXELSYNTH_ERR_MESSAGE);
        assert_eq!(
            post(
                e,
                r#"{"type":"config","sampleRate":1000,"durationPerColumn":0.01,"baseFrequency":50,
                    "pixelData":{"width":2,"height":1,"data":[255,0,0,255,0,0,255,255]}}"#
            ),
            PIXELSYNTH_OK
        );
        assert_eq!(pixelsynth_render_interleaved_f32(e, buf.as_mut_ptr(), 20, 2), 20);
        assert!(buf.iter().any(|v| *v != 0.0));
        assert_eq!(pixelsynth_poll_column(e), 0);
        assert_eq!(pixelsynth_poll_column(e), 1);
        assert_eq!(pixelsynth_poll_column(e), -1);
        pixelsynth_destroy(e);
    }

    #[test]
    fn null_arguments_are_rejected() {
        assert_eq!(pixelsynth_post_json(std::ptr::null_mut(), std::ptr::null()), PIXELSYNTH_ERR_ARGUMENT);
        assert_eq!(pixelsynth_poll_column(std::ptr::null_mut()), -1);
        assert_eq!(pixelsynth_render_interleaved_f32(std::ptr::null_mut(), std::ptr::null_mut(), 4, 2), 0);
        pixelsynth_destroy(std::ptr::null_mut());

        let e = pixelsynth_create_with_capacity(1, 1);
        assert_eq!(pixelsynth_post_json(e, std::ptr::null()), PIXELSYNTH_ERR_ARGUMENT);
        pixelsynth_destroy(e);
    }
}
