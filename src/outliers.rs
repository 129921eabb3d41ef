//! Listing of the pixels with the largest deltas.

use core::fmt::{self, Write};

use crate::buffer::PixelSlice;
use crate::component;
use crate::delta::DeltaField;
use crate::numfmt::General;
use crate::pixel_format::FormatError;
use crate::sink::{Highlight, TextSink};
use crate::thresholds::Thresholds;
use crate::visualize::MARGIN;

/// Number of outliers listed in comparison messages.
pub const DEFAULT_OUTLIER_LIMIT: usize = 10;

/// One listed pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Outlier {
    /// Column, from the left.
    pub x: u32,
    /// Row, from the bottom.
    pub y: u32,
    /// Delta of the pixel.
    pub delta: f32,
    /// Actual pixel, printed.
    pub actual: String,
    /// Expected pixel, printed.
    pub expected: String,
}

/// Pixels above the outlier cutoff, worst first.
///
/// A pixel is an outlier if its delta is NaN, infinite, or above the lower
/// of the two thresholds. Non-finite deltas sort before all finite ones;
/// pixels with equal deltas are listed in reverse raster order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutlierReport {
    total: usize,
    entries: Vec<Outlier>,
}

impl OutlierReport {
    /// Select outliers of `field` and print the first `limit` of them.
    ///
    /// Pixels are printed in the format of `expected`.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] if the expected format can't be compared.
    pub fn collect(
        field: &DeltaField,
        actual: &PixelSlice<'_>,
        expected: &PixelSlice<'_>,
        thresholds: Thresholds,
        limit: usize,
    ) -> Result<Self, FormatError> {
        let desc = expected.format().descriptor()?;
        let cutoff = thresholds.outlier_cutoff();

        let mut selected: Vec<(f32, usize)> = field
            .values()
            .iter()
            .enumerate()
            .filter(|&(_, &delta)| !delta.is_finite() || delta > cutoff)
            .map(|(i, &delta)| {
                let key = if delta.is_finite() { delta } else { f32::INFINITY };
                (key, i)
            })
            .collect();
        selected.sort_unstable_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));

        let width = field.width() as usize;
        let entries = selected
            .iter()
            .take(limit)
            .map(|&(_, i)| {
                let x = (i % width) as u32;
                let y = (i / width) as u32;
                Outlier {
                    x,
                    y,
                    delta: field.values()[i],
                    actual: component::pixel_to_string(desc, actual.pixel(x, y)),
                    expected: component::pixel_to_string(desc, expected.pixel(x, y)),
                }
            })
            .collect();

        Ok(Self {
            total: selected.len(),
            entries,
        })
    }

    /// Whether no pixel is above the cutoff.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of pixels above the cutoff, listed or not.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Listed pixels, worst first.
    #[inline]
    pub fn entries(&self) -> &[Outlier] {
        &self.entries
    }

    /// Whether some outliers were left out.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.entries.len() < self.total
    }

    /// Write the header and one line per listed pixel, separated by `\n`
    /// with no trailing newline. An empty report writes nothing.
    ///
    /// With colors enabled, deltas above the max threshold are red, the
    /// others yellow.
    pub fn write(&self, sink: &mut TextSink<'_>, thresholds: Thresholds) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        if self.is_truncated() {
            write!(
                sink,
                "        Top {} out of {} pixels above max/mean threshold:",
                self.entries.len(),
                self.total
            )?;
        } else {
            sink.write_str("        Pixels above max/mean threshold:")?;
        }

        for entry in &self.entries {
            write!(
                sink,
                "\n{MARGIN}[{},{}] {}, expected {} (Δ = ",
                entry.x, entry.y, entry.actual, entry.expected
            )?;
            let highlight = if entry.delta > thresholds.max() {
                Highlight::Red
            } else {
                Highlight::Yellow
            };
            sink.write_highlighted(Some(highlight), format_args!("{}", General::f32(entry.delta)))?;
            sink.write_char(')')?;
        }
        Ok(())
    }
}
