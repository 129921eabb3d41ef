//! Per-pixel delta calculation.
//!
//! Every pixel pair is reduced to one scalar: the average of the absolute
//! component differences. Special values survive into the field, but the
//! two aggregates treat them differently. The max skips non-finite deltas
//! so a single infinity doesn't make every other difference look like
//! zero, while the mean includes them so specials always fail a comparison.

use crate::buffer::PixelSlice;
use crate::component::{self, ComponentCodec};
use crate::pixel_format::FormatError;

/// Dense `width` x `height` field of per-pixel deltas, row 0 first.
///
/// May contain NaN and infinity.
#[derive(Clone, Debug, PartialEq)]
pub struct DeltaField {
    values: Vec<f32>,
    width: u32,
    height: u32,
}

impl DeltaField {
    /// Wrap precomputed delta values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != width * height`.
    pub fn from_values(width: u32, height: u32, values: Vec<f32>) -> Self {
        assert_eq!(
            values.len(),
            width as usize * height as usize,
            "expected {width}x{height} delta values"
        );
        Self {
            values,
            width,
            height,
        }
    }

    /// Field width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Field height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width and height.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// All values, row by row.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Delta of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        assert!(x < self.width && y < self.height, "delta ({x}, {y}) out of bounds");
        self.values[y as usize * self.width as usize + x as usize]
    }

    /// Whether the field has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the field and return its values.
    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}

/// Calculate the delta field, the max delta and the mean delta of two
/// images.
///
/// The format of `expected` determines how both sides are decoded. Each
/// side is walked with its own offset and stride.
///
/// # Errors
///
/// Returns a [`FormatError`] without reading any pixels if the expected
/// format is unknown, packed depth/stencil or implementation-specific.
///
/// # Panics
///
/// Panics if the two images differ in size or pixel size.
pub fn calculate_delta(
    actual: &PixelSlice<'_>,
    expected: &PixelSlice<'_>,
) -> Result<(DeltaField, f32, f32), FormatError> {
    let desc = match expected.format().descriptor() {
        Ok(desc) => desc,
        Err(err) => {
            log::error!("can't calculate image delta: {err}");
            return Err(err);
        }
    };
    assert_eq!(actual.size(), expected.size(), "image sizes don't match");
    assert_eq!(
        actual.format().pixel_size(),
        desc.bytes_per_pixel(),
        "pixel sizes don't match"
    );

    let codec = component::codec(desc.channel_type());
    let channels = desc.channels();
    let pixel_size = desc.bytes_per_pixel();
    let (width, height) = expected.size();

    let mut values = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        let actual_row = actual.row(y).chunks_exact(pixel_size);
        let expected_row = expected.row(y).chunks_exact(pixel_size);
        for (a, e) in actual_row.zip(expected_row) {
            values.push(pixel_delta(codec, channels, a, e));
        }
    }

    let max = finite_max(&values);
    let mean = compensated_mean(&values);
    log::trace!("delta of {width}x{height} {desc} images: max {max}, mean {mean}");
    Ok((DeltaField::from_values(width, height, values), max, mean))
}

fn pixel_delta(codec: &ComponentCodec, channels: usize, actual: &[u8], expected: &[u8]) -> f32 {
    let sum: f64 = actual
        .chunks_exact(codec.size)
        .zip(expected.chunks_exact(codec.size))
        .take(channels)
        .map(|(a, e)| component_delta((codec.read)(a), (codec.read)(e)))
        .sum();
    (sum / channels as f64) as f32
}

/// `|a - e|`, zero when both are NaN or both are the same infinity.
#[inline]
fn component_delta(actual: f64, expected: f64) -> f64 {
    if actual == expected || (actual.is_nan() && expected.is_nan()) {
        0.0
    } else {
        (actual - expected).abs()
    }
}

fn finite_max(values: &[f32]) -> f32 {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0, f32::max)
}

/// Kahan-summed mean. Any NaN or infinity poisons the result.
fn compensated_mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0f64;
    let mut compensation = 0.0f64;
    for &value in values {
        let y = f64::from(value) - compensation;
        let t = sum + y;
        compensation = (t - sum) - y;
        sum = t;
    }
    (sum / values.len() as f64) as f32
}
