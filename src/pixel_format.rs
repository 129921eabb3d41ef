//! Pixel formats accepted by the comparison engine.

use core::fmt;

use crate::buffer::PixelDescriptor;

/// Format of one pixel.
///
/// Plain color formats carry a [`PixelDescriptor`]. Depth and stencil
/// formats that store a single plain value compare like the matching
/// one-component color format; packed depth/stencil, implementation-specific
/// and unknown formats can't be compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Plain color format.
    Color(PixelDescriptor),
    /// 16-bit normalized depth.
    Depth16Unorm,
    /// 32-bit float depth.
    Depth32F,
    /// 8-bit stencil.
    Stencil8UI,
    /// 16-bit normalized depth with 8-bit stencil.
    Depth16UnormStencil8UI,
    /// 24-bit normalized depth with 8-bit stencil, packed in 32 bits.
    Depth24UnormStencil8UI,
    /// 32-bit float depth with 8-bit stencil.
    Depth32FStencil8UI,
    /// Opaque format of some graphics API, with its pixel size in bytes.
    ImplementationSpecific { code: u32, pixel_size: usize },
    /// Value not recognized by this crate.
    Unknown(u32),
}

impl PixelFormat {
    /// Size of one pixel in bytes, zero if not known.
    pub const fn pixel_size(self) -> usize {
        match self {
            Self::Color(desc) => desc.bytes_per_pixel(),
            Self::Depth16Unorm => 2,
            Self::Depth32F => 4,
            Self::Stencil8UI => 1,
            Self::Depth16UnormStencil8UI | Self::Depth24UnormStencil8UI => 4,
            Self::Depth32FStencil8UI => 8,
            Self::ImplementationSpecific { pixel_size, .. } => pixel_size,
            Self::Unknown(_) => 0,
        }
    }

    /// The plain descriptor used to compare pixels of this format.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] for formats that can't be compared.
    pub const fn descriptor(self) -> Result<PixelDescriptor, FormatError> {
        match self {
            Self::Color(desc) => Ok(desc),
            Self::Depth16Unorm => Ok(PixelDescriptor::R16_UNORM),
            Self::Depth32F => Ok(PixelDescriptor::R32F),
            Self::Stencil8UI => Ok(PixelDescriptor::R8UI),
            Self::Depth16UnormStencil8UI
            | Self::Depth24UnormStencil8UI
            | Self::Depth32FStencil8UI => Err(FormatError::PackedDepthStencil),
            Self::ImplementationSpecific { .. } => Err(FormatError::ImplementationSpecific),
            Self::Unknown(code) => Err(FormatError::Unknown(code)),
        }
    }
}

impl From<PixelDescriptor> for PixelFormat {
    fn from(desc: PixelDescriptor) -> Self {
        Self::Color(desc)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(desc) => write!(f, "PixelFormat::{desc}"),
            Self::Depth16Unorm => f.write_str("PixelFormat::Depth16Unorm"),
            Self::Depth32F => f.write_str("PixelFormat::Depth32F"),
            Self::Stencil8UI => f.write_str("PixelFormat::Stencil8UI"),
            Self::Depth16UnormStencil8UI => f.write_str("PixelFormat::Depth16UnormStencil8UI"),
            Self::Depth24UnormStencil8UI => f.write_str("PixelFormat::Depth24UnormStencil8UI"),
            Self::Depth32FStencil8UI => f.write_str("PixelFormat::Depth32FStencil8UI"),
            Self::ImplementationSpecific { code, .. } => {
                write!(f, "PixelFormat::ImplementationSpecific({code:#x})")
            }
            Self::Unknown(code) => write!(f, "PixelFormat({code:#x})"),
        }
    }
}

/// Reason a pixel format can't be compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FormatError {
    #[error("unknown format PixelFormat({0:#x})")]
    Unknown(u32),
    #[error("packed depth/stencil formats are not supported yet")]
    PackedDepthStencil,
    #[error("can't compare implementation-specific pixel formats")]
    ImplementationSpecific,
}
