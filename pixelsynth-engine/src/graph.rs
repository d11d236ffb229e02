//! Host-facing render boundary.
//!
//! Hosts (cpal callback, C ABI, offline renderers) drive the engine through
//! [`BlockRenderer`], one block per callback. The engine itself produces one
//! stereo frame at a time; the helpers here fan that frame out to whatever
//! channel layout the host hands us.
//!
//! Layout rules
//! - 0 channels: nothing is written
//! - 1 channel : mid downmix `(L + R) / 2`
//! - 2 channels: L, R
//! - more      : L, R, then zeros

/// Something that fills audio blocks on the realtime thread.
///
/// Implementations must not block or allocate.
pub trait BlockRenderer {
    /// Planar output: one slice per channel. Renders `min(len)` frames.
    fn render_block(&mut self, outputs: &mut [&mut [f32]]);

    /// Interleaved output with `channels` samples per frame.
    fn render_interleaved(&mut self, out: &mut [f32], channels: usize);
}

/// Frames available in a planar block: the shortest channel wins.
#[inline]
pub fn planar_frames(outputs: &[&mut [f32]]) -> usize {
    outputs.iter().map(|ch| ch.len()).min().unwrap_or(0)
}

/// Write one stereo frame into frame `i` of a planar block.
#[inline]
pub fn write_planar(outputs: &mut [&mut [f32]], i: usize, (l, r): (f32, f32)) {
    match outputs {
        [] => {}
        [mono] => mono[i] = 0.5 * (l + r),
        [left, right, rest @ ..] => {
            left[i] = l;
            right[i] = r;
            for ch in rest {
                ch[i] = 0.0;
            }
        }
    }
}

/// Write one stereo frame into an interleaved frame slice.
#[inline]
pub fn write_interleaved(frame: &mut [f32], (l, r): (f32, f32)) {
    match frame {
        [] => {}
        [mono] => *mono = 0.5 * (l + r),
        [left, right, rest @ ..] => {
            *left = l;
            *right = r;
            rest.fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_layouts() {
        let mut a = [9.0; 2];
        let mut b = [9.0; 3];
        let mut c = [9.0; 2];
        {
            let mut outs: [&mut [f32]; 3] = [&mut a, &mut b, &mut c];
            assert_eq!(planar_frames(&outs), 2);
            write_planar(&mut outs, 1, (0.25, -0.5));
        }
        assert_eq!(a, [9.0, 0.25]);
        assert_eq!(b, [9.0, -0.5, 9.0]);
        assert_eq!(c, [9.0, 0.0]);

        let mut m = [0.0; 1];
        let mut outs: [&mut [f32]; 1] = [&mut m];
        write_planar(&mut outs, 0, (1.0, 0.0));
        assert_eq!(m, [0.5]);
        assert_eq!(planar_frames(&[]), 0);
    }

    #[test]
    fn interleaved_layouts() {
        let mut quad = [9.0; 4];
        write_interleaved(&mut quad, (0.1, 0.2));
        assert_eq!(quad, [0.1, 0.2, 0.0, 0.0]);
        let mut mono = [9.0; 1];
        write_interleaved(&mut mono, (0.2, 0.4));
        assert!((mono[0] - 0.3).abs() < 1e-7);
    }
}
