//! Decoded image data returned by importers.

use crate::buffer::PixelBuffer;

/// Block-compressed image that can't be compared pixel by pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedImage {
    format: String,
    width: u32,
    height: u32,
}

impl CompressedImage {
    /// Describe a compressed image by its format name and size.
    pub fn new(format: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            format: format.into(),
            width,
            height,
        }
    }

    /// Name of the compression format, such as `DXT1`.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Image opened by an [`ImageImporter`](crate::ImageImporter).
#[derive(Debug)]
pub enum ImageData {
    /// Plain pixels, row 0 at the bottom.
    Uncompressed(PixelBuffer),
    /// Compressed pixels.
    Compressed(CompressedImage),
}

impl ImageData {
    /// Whether the pixels are compressed.
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Compressed(_))
    }

    /// Width and height.
    pub fn size(&self) -> (u32, u32) {
        match self {
            Self::Uncompressed(buffer) => (buffer.width(), buffer.height()),
            Self::Compressed(image) => (image.width(), image.height()),
        }
    }

    /// The plain pixels, if not compressed.
    pub fn pixels(&self) -> Option<&PixelBuffer> {
        match self {
            Self::Uncompressed(buffer) => Some(buffer),
            Self::Compressed(_) => None,
        }
    }
}

impl From<PixelBuffer> for ImageData {
    fn from(buffer: PixelBuffer) -> Self {
        Self::Uncompressed(buffer)
    }
}

impl From<CompressedImage> for ImageData {
    fn from(image: CompressedImage) -> Self {
        Self::Compressed(image)
    }
}
