//! Immutable RGBA pixel grid.
//!
//! Row-major, 4 bytes per pixel. Rows are harmonics, columns are time slices.
//! A buffer is never mutated after construction; swapping images means
//! publishing a new `Arc<PixelBuffer>`.

use serde_json::Value;

use crate::config::number;
use crate::error::PixelError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Box<[u8]>,
}

impl PixelBuffer {
    /// Wrap `data` (RGBA, row-major). Trailing bytes past `width*height*4` are dropped.
    pub fn new(width: usize, height: usize, mut data: Vec<u8>) -> Result<Self, PixelError> {
        let expected = byte_len(width, height)?;
        if data.len() < expected {
            return Err(PixelError::TooShort { expected, actual: data.len() });
        }
        data.truncate(expected);
        Ok(Self { width, height, data: data.into_boxed_slice() })
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> [u8; 4],
    ) -> Result<Self, PixelError> {
        let mut data = Vec::with_capacity(byte_len(width, height)?);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::new(width, height, data)
    }

    /// Parse the protocol's `pixelData` object: `{ width, height, data: [u8…] }`.
    ///
    /// Data entries are rounded and clamped into `0..=255`; anything that is not
    /// a number makes the whole buffer invalid.
    pub fn from_json(value: &Value) -> Result<Self, PixelError> {
        let obj = value.as_object().ok_or(PixelError::Shape)?;
        let width = dimension(obj.get("width"))?;
        let height = dimension(obj.get("height"))?;
        let raw = obj.get("data").and_then(Value::as_array).ok_or(PixelError::Shape)?;
        let expected = byte_len(width, height)?;
        if raw.len() < expected {
            return Err(PixelError::TooShort { expected, actual: raw.len() });
        }
        let mut data = Vec::with_capacity(expected);
        for v in &raw[..expected] {
            let n = number(v).ok_or(PixelError::Shape)?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            data.push(n.round().clamp(0.0, 255.0) as u8);
        }
        Self::new(width, height, data)
    }

    #[inline] pub fn width(&self) -> usize { self.width }
    #[inline] pub fn height(&self) -> usize { self.height }
    #[inline] pub fn as_bytes(&self) -> &[u8] { &self.data }

    /// RGBA at column `x`, row `y`; `None` when out of bounds.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

fn byte_len(width: usize, height: usize) -> Result<usize, PixelError> {
    if width == 0 || height == 0 {
        return Err(PixelError::Empty);
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .ok_or(PixelError::TooLarge { width, height })
}

fn dimension(v: Option<&Value>) -> Result<usize, PixelError> {
    let n = v.and_then(number).ok_or(PixelError::Shape)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(PixelError::Shape);
    }
    if n < 1.0 {
        return Err(PixelError::Empty);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(n as usize)
}
