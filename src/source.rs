//! Inputs of a comparison.

use std::path::Path;

use imgref::ImgRef;

use crate::buffer::PixelSlice;
use crate::pixel::{PixelComponents, PixelView};

/// One side of a comparison.
///
/// Converted from a [`PixelSlice`], an `ImgRef` of typed pixels or a
/// file path.
#[derive(Clone, Copy, Debug)]
pub enum ImageSource<'a> {
    /// Pixels with a known format.
    Image(PixelSlice<'a>),
    /// Typed pixels whose format is inferred from the other side.
    Pixels(PixelView<'a>),
    /// Image file, opened with the `AnyImageImporter` plugin.
    File(&'a Path),
}

impl ImageSource<'_> {
    /// Whether the image comes from a file.
    #[inline]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Path of a file source.
    pub fn path(&self) -> Option<&Path> {
        match *self {
            Self::File(path) => Some(path),
            Self::Image(_) | Self::Pixels(_) => None,
        }
    }
}

impl<'a> From<PixelSlice<'a>> for ImageSource<'a> {
    fn from(slice: PixelSlice<'a>) -> Self {
        Self::Image(slice)
    }
}

impl<'a> From<PixelView<'a>> for ImageSource<'a> {
    fn from(view: PixelView<'a>) -> Self {
        Self::Pixels(view)
    }
}

impl<'a, P: PixelComponents> From<ImgRef<'a, P>> for ImageSource<'a> {
    fn from(img: ImgRef<'a, P>) -> Self {
        Self::Pixels(PixelView::from(img))
    }
}

impl<'a> From<&'a Path> for ImageSource<'a> {
    fn from(path: &'a Path) -> Self {
        Self::File(path)
    }
}
