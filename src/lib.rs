//! Image comparison for test suites.
//!
//! Compares an actual image against an expected one and, when they
//! differ, explains how:
//!
//! - [`ImageComparator`] / [`Comparison`]: thresholds, verdict, messages
//!   and diagnostic saving
//! - [`calculate_delta`] / [`DeltaField`]: per-pixel deltas with max and
//!   mean
//! - [`render_delta_image`]: ASCII-art thumbnail of the deltas
//! - [`OutlierReport`]: the worst pixels, printed in their own format
//! - [`PixelSlice`] / [`PixelBuffer`] / [`PixelFormat`]: raw pixel views
//!   over any plain 1-4 component format
//! - [`ImageImporter`] / [`ImageConverter`] / [`PluginManager`]: file
//!   access, with [`AnyImageImporter`] and [`AnyImageConverter`] built in
//!
//! Row 0 of every image is its bottom row.

#![forbid(unsafe_code)]

mod buffer;
mod builtin;
mod compare;
mod component;
mod delta;
mod format;
mod numfmt;
mod outliers;
mod output;
mod pixel;
mod pixel_format;
mod plugins;
mod sink;
mod source;
#[cfg(test)]
mod test_data;
mod thresholds;
mod traits;
mod visualize;

pub use buffer::{
    BufferError, ChannelEncoding, ChannelLayout, ChannelType, PixelBuffer, PixelDescriptor,
    PixelSlice, PixelStorage,
};
pub use builtin::{AnyImageConverter, AnyImageImporter};
pub use compare::{
    CONVERTER_PLUGIN, Comparison, IMPORTER_PLUGIN, ImageComparator, SaveError, StatusFlags,
    Verdict,
};
pub use delta::{DeltaField, calculate_delta};
pub use format::ImageFormat;
pub use numfmt::General;
pub use outliers::{DEFAULT_OUTLIER_LIMIT, Outlier, OutlierReport};
pub use output::{CompressedImage, ImageData};
pub use pixel::{Component, PixelComponents, PixelView, infer_format, slice_with_format};
pub use pixel_format::{FormatError, PixelFormat};
pub use plugins::PluginManager;
pub use sink::{ColorMode, TextSink};
pub use source::ImageSource;
pub use thresholds::Thresholds;
pub use traits::{ConvertError, ImageConverter, ImageImporter, ImportError, Plugin};
pub use visualize::render_delta_image;

// Re-exports for typed pixel views.
pub use half::f16;
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb;
pub use rgb::{Rgb, Rgba};
