//! Importer and converter plugin traits.
//!
//! File-backed comparisons open images through an [`ImageImporter`] and
//! save diagnostics through an [`ImageConverter`], both looked up by name
//! in a [`PluginManager`](crate::PluginManager). Implement these traits to
//! plug in other codecs.

use std::io;
use std::path::{Path, PathBuf};

use crate::buffer::{BufferError, PixelSlice};
use crate::format::ImageFormat;
use crate::output::ImageData;
use crate::pixel_format::PixelFormat;

/// Anything that can be registered in a plugin manager.
pub trait Plugin {
    /// Name the plugin is looked up by.
    fn name(&self) -> &str;
}

/// Opens image files.
pub trait ImageImporter: Plugin {
    /// Open and decode the image at `path`.
    ///
    /// Uncompressed images are returned with row 0 at the bottom.
    fn open(&self, path: &Path) -> Result<ImageData, ImportError>;
}

/// Writes images to files.
pub trait ImageConverter: Plugin {
    /// File extensions this converter can write.
    fn extensions(&self) -> &[&str];

    /// Encode `image` into the file at `path`, picking the container
    /// from the extension.
    fn convert_to_file(&self, image: &PixelSlice<'_>, path: &Path) -> Result<(), ConvertError>;
}

/// Errors from [`ImageImporter::open`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("{0} files without compression are not supported")]
    Unsupported(ImageFormat),
}

/// Errors from [`ImageConverter::convert_to_file`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConvertError {
    #[error("can't determine the file format of {}", .0.display())]
    UnknownExtension(PathBuf),
    #[error("writing {0} files is not supported")]
    UnsupportedFormat(ImageFormat),
    #[error("{0} can't be written")]
    UnsupportedPixelFormat(PixelFormat),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
