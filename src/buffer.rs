//! Pixel storage and strided pixel views.
//!
//! A [`PixelSlice`] is a borrowed rectangle of raw, native-endian pixel
//! bytes tagged with a [`PixelFormat`]. Its layout inside the backing
//! memory is described by [`PixelStorage`], so two slices being compared
//! may be sub-rectangles of differently padded buffers.
//!
//! Row 0 is the bottom row of the image.

use core::fmt;

use crate::pixel_format::PixelFormat;

// ---------------------------------------------------------------------------
// Descriptor enums
// ---------------------------------------------------------------------------

/// Channel storage type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ChannelType {
    /// 8-bit unsigned integer.
    U8,
    /// 8-bit signed integer.
    I8,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit signed integer.
    I16,
    /// 32-bit unsigned integer.
    U32,
    /// 32-bit signed integer.
    I32,
    /// IEEE 754 half-precision float.
    F16,
    /// IEEE 754 single-precision float.
    F32,
}

impl ChannelType {
    /// Byte size of a single channel value.
    #[inline]
    pub const fn byte_size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
        }
    }

    /// Bit width of a single channel value.
    #[inline]
    pub const fn bits(self) -> usize {
        self.byte_size() * 8
    }

    /// Whether the type is a floating-point type.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    /// Whether the type is a signed integer type.
    #[inline]
    pub const fn is_signed_integer(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32)
    }
}

/// Number of components per pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum ChannelLayout {
    /// One component.
    R = 1,
    /// Two components.
    Rg = 2,
    /// Three components.
    Rgb = 3,
    /// Four components.
    Rgba = 4,
}

impl ChannelLayout {
    /// Number of channels in this layout.
    #[inline]
    pub const fn channels(self) -> usize {
        self as usize
    }

    /// Layout with the given number of channels, if it is 1-4.
    pub const fn from_channels(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(Self::R),
            2 => Some(Self::Rg),
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::R => "R",
            Self::Rg => "RG",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
        }
    }
}

/// How the stored channel values are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ChannelEncoding {
    /// Integer mapped to `[0, 1]` (unsigned) or `[-1, 1]` (signed).
    Normalized,
    /// 8-bit unsigned, sRGB transfer curve.
    Srgb,
    /// Plain integer.
    Integer,
    /// Floating point.
    Float,
}

// ---------------------------------------------------------------------------
// PixelDescriptor
// ---------------------------------------------------------------------------

/// Semantic type of one pixel of a plain color format.
///
/// Only valid combinations can be constructed: floats are always
/// [`ChannelEncoding::Float`], normalization needs an 8- or 16-bit integer
/// type and sRGB needs [`ChannelType::U8`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PixelDescriptor {
    channel_type: ChannelType,
    layout: ChannelLayout,
    encoding: ChannelEncoding,
}

impl PixelDescriptor {
    /// Create a descriptor, or `None` for an invalid combination.
    pub const fn new(
        channel_type: ChannelType,
        layout: ChannelLayout,
        encoding: ChannelEncoding,
    ) -> Option<Self> {
        let valid = match encoding {
            ChannelEncoding::Float => channel_type.is_float(),
            ChannelEncoding::Normalized => matches!(
                channel_type,
                ChannelType::U8 | ChannelType::I8 | ChannelType::U16 | ChannelType::I16
            ),
            ChannelEncoding::Srgb => matches!(channel_type, ChannelType::U8),
            ChannelEncoding::Integer => !channel_type.is_float(),
        };
        if valid {
            Some(Self {
                channel_type,
                layout,
                encoding,
            })
        } else {
            None
        }
    }

    /// The most generic descriptor for a channel type: normalized for 8-
    /// and 16-bit integers, plain integer for 32-bit ones, float for floats.
    pub const fn generic(channel_type: ChannelType, layout: ChannelLayout) -> Self {
        let encoding = match channel_type {
            ChannelType::U8 | ChannelType::I8 | ChannelType::U16 | ChannelType::I16 => {
                ChannelEncoding::Normalized
            }
            ChannelType::U32 | ChannelType::I32 => ChannelEncoding::Integer,
            ChannelType::F16 | ChannelType::F32 => ChannelEncoding::Float,
        };
        Self {
            channel_type,
            layout,
            encoding,
        }
    }

    const fn raw(
        channel_type: ChannelType,
        layout: ChannelLayout,
        encoding: ChannelEncoding,
    ) -> Self {
        Self {
            channel_type,
            layout,
            encoding,
        }
    }

    // Named constants ---------------------------------------------------------

    /// One 8-bit normalized unsigned component.
    pub const R8_UNORM: Self =
        Self::raw(ChannelType::U8, ChannelLayout::R, ChannelEncoding::Normalized);
    /// Two 8-bit normalized unsigned components.
    pub const RG8_UNORM: Self =
        Self::raw(ChannelType::U8, ChannelLayout::Rg, ChannelEncoding::Normalized);
    /// 8-bit normalized RGB.
    pub const RGB8_UNORM: Self =
        Self::raw(ChannelType::U8, ChannelLayout::Rgb, ChannelEncoding::Normalized);
    /// 8-bit normalized RGBA.
    pub const RGBA8_UNORM: Self =
        Self::raw(ChannelType::U8, ChannelLayout::Rgba, ChannelEncoding::Normalized);
    /// 8-bit sRGB RGB.
    pub const RGB8_SRGB: Self =
        Self::raw(ChannelType::U8, ChannelLayout::Rgb, ChannelEncoding::Srgb);
    /// 8-bit sRGB RGBA.
    pub const RGBA8_SRGB: Self =
        Self::raw(ChannelType::U8, ChannelLayout::Rgba, ChannelEncoding::Srgb);
    /// One 8-bit unsigned integer component.
    pub const R8UI: Self = Self::raw(ChannelType::U8, ChannelLayout::R, ChannelEncoding::Integer);
    /// Two 8-bit unsigned integer components.
    pub const RG8UI: Self = Self::raw(ChannelType::U8, ChannelLayout::Rg, ChannelEncoding::Integer);
    /// 8-bit unsigned integer RGB.
    pub const RGB8UI: Self =
        Self::raw(ChannelType::U8, ChannelLayout::Rgb, ChannelEncoding::Integer);
    /// One 16-bit normalized unsigned component.
    pub const R16_UNORM: Self =
        Self::raw(ChannelType::U16, ChannelLayout::R, ChannelEncoding::Normalized);
    /// Two 16-bit normalized unsigned components.
    pub const RG16_UNORM: Self =
        Self::raw(ChannelType::U16, ChannelLayout::Rg, ChannelEncoding::Normalized);
    /// 16-bit normalized RGB.
    pub const RGB16_UNORM: Self =
        Self::raw(ChannelType::U16, ChannelLayout::Rgb, ChannelEncoding::Normalized);
    /// 16-bit normalized RGBA.
    pub const RGBA16_UNORM: Self =
        Self::raw(ChannelType::U16, ChannelLayout::Rgba, ChannelEncoding::Normalized);
    /// One 32-bit unsigned integer component.
    pub const R32UI: Self = Self::raw(ChannelType::U32, ChannelLayout::R, ChannelEncoding::Integer);
    /// One 32-bit signed integer component.
    pub const R32I: Self = Self::raw(ChannelType::I32, ChannelLayout::R, ChannelEncoding::Integer);
    /// Two half-float components.
    pub const RG16F: Self = Self::raw(ChannelType::F16, ChannelLayout::Rg, ChannelEncoding::Float);
    /// Half-float RGBA.
    pub const RGBA16F: Self =
        Self::raw(ChannelType::F16, ChannelLayout::Rgba, ChannelEncoding::Float);
    /// One single-precision float component.
    pub const R32F: Self = Self::raw(ChannelType::F32, ChannelLayout::R, ChannelEncoding::Float);
    /// Two single-precision float components.
    pub const RG32F: Self = Self::raw(ChannelType::F32, ChannelLayout::Rg, ChannelEncoding::Float);
    /// Single-precision float RGB.
    pub const RGB32F: Self =
        Self::raw(ChannelType::F32, ChannelLayout::Rgb, ChannelEncoding::Float);
    /// Single-precision float RGBA.
    pub const RGBA32F: Self =
        Self::raw(ChannelType::F32, ChannelLayout::Rgba, ChannelEncoding::Float);

    // Methods -----------------------------------------------------------------

    /// Channel storage type.
    #[inline]
    pub const fn channel_type(self) -> ChannelType {
        self.channel_type
    }

    /// Channel layout.
    #[inline]
    pub const fn layout(self) -> ChannelLayout {
        self.layout
    }

    /// Channel interpretation.
    #[inline]
    pub const fn encoding(self) -> ChannelEncoding {
        self.encoding
    }

    /// Number of channels.
    #[inline]
    pub const fn channels(self) -> usize {
        self.layout.channels()
    }

    /// Bytes per pixel.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        self.channel_type.byte_size() * self.layout.channels()
    }

    /// Whether pixels of this format are best shown as a hex color.
    ///
    /// True for 8-bit normalized or sRGB RGB and RGBA.
    #[inline]
    pub const fn prints_as_hex_color(self) -> bool {
        matches!(self.channel_type, ChannelType::U8)
            && matches!(
                self.encoding,
                ChannelEncoding::Normalized | ChannelEncoding::Srgb
            )
            && matches!(self.layout, ChannelLayout::Rgb | ChannelLayout::Rgba)
    }
}

impl fmt::Display for PixelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match (self.encoding, self.channel_type.is_signed_integer()) {
            (ChannelEncoding::Normalized, false) => "Unorm",
            (ChannelEncoding::Normalized, true) => "Snorm",
            (ChannelEncoding::Srgb, _) => "Srgb",
            (ChannelEncoding::Integer, false) => "UI",
            (ChannelEncoding::Integer, true) => "I",
            (ChannelEncoding::Float, _) => "F",
        };
        write!(
            f,
            "{}{}{}",
            self.layout.prefix(),
            self.channel_type.bits(),
            suffix
        )
    }
}

// ---------------------------------------------------------------------------
// PixelStorage
// ---------------------------------------------------------------------------

/// Placement of an image inside its backing memory.
///
/// Rows are padded to `alignment` bytes. A nonzero `row_length` makes
/// rows longer than the image width, and `skip` offsets the first pixel,
/// which together describe a sub-rectangle of a larger image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelStorage {
    alignment: usize,
    row_length: u32,
    skip: (u32, u32),
}

impl Default for PixelStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelStorage {
    /// Four-byte row alignment, rows as long as the image, no skip.
    pub const fn new() -> Self {
        Self {
            alignment: 4,
            row_length: 0,
            skip: (0, 0),
        }
    }

    /// Tightly packed rows.
    pub const fn packed() -> Self {
        Self::new().with_alignment(1)
    }

    /// Set the row alignment in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not 1, 2, 4 or 8.
    pub const fn with_alignment(mut self, alignment: usize) -> Self {
        assert!(
            matches!(alignment, 1 | 2 | 4 | 8),
            "row alignment has to be 1, 2, 4 or 8"
        );
        self.alignment = alignment;
        self
    }

    /// Set the row length in pixels. Zero means the image width.
    pub const fn with_row_length(mut self, row_length: u32) -> Self {
        self.row_length = row_length;
        self
    }

    /// Set the number of pixels (`x`) and rows (`y`) skipped before the
    /// first pixel.
    pub const fn with_skip(mut self, x: u32, y: u32) -> Self {
        self.skip = (x, y);
        self
    }

    /// Row alignment in bytes.
    #[inline]
    pub const fn alignment(self) -> usize {
        self.alignment
    }

    /// Row length in pixels, zero when it equals the image width.
    #[inline]
    pub const fn row_length(self) -> u32 {
        self.row_length
    }

    /// Skipped pixels and rows.
    #[inline]
    pub const fn skip(self) -> (u32, u32) {
        self.skip
    }

    /// Byte offset of the first pixel and byte stride between rows.
    pub fn data_properties(self, pixel_size: usize, width: u32) -> (usize, usize) {
        let row_pixels = if self.row_length > 0 {
            self.row_length
        } else {
            width
        };
        let stride = align_up(row_pixels as usize * pixel_size, self.alignment);
        let offset = self.skip.1 as usize * stride + self.skip.0 as usize * pixel_size;
        (offset, stride)
    }
}

// ---------------------------------------------------------------------------
// BufferError
// ---------------------------------------------------------------------------

/// Errors from pixel view construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BufferError {
    /// Data slice is too small for the given dimensions and storage.
    #[error("data slice is too small, got {actual} bytes but {required} required")]
    InsufficientData { required: usize, actual: usize },
    /// Stride is smaller than `width * pixel_size`.
    #[error("stride is smaller than width * pixel size")]
    StrideTooSmall,
    /// Dimensions overflow the address space.
    #[error("image dimensions overflow")]
    InvalidDimensions,
    /// The pixel format has no known pixel size.
    #[error("{0} has no known pixel size")]
    UnsizedFormat(PixelFormat),
}

// ---------------------------------------------------------------------------
// PixelSlice (borrowed, immutable)
// ---------------------------------------------------------------------------

/// Borrowed, possibly strided view of pixel data.
#[derive(Clone, Copy)]
pub struct PixelSlice<'a> {
    data: &'a [u8],
    format: PixelFormat,
    width: u32,
    height: u32,
    offset: usize,
    stride: usize,
}

impl<'a> PixelSlice<'a> {
    /// Create a view of `width` x `height` pixels laid out in `data`
    /// according to `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data does not cover the described region or
    /// a non-empty image has a format without a known pixel size.
    pub fn new(
        storage: PixelStorage,
        format: PixelFormat,
        width: u32,
        height: u32,
        data: &'a [u8],
    ) -> Result<Self, BufferError> {
        let pixel_size = format.pixel_size();
        let (offset, stride) = storage.data_properties(pixel_size, width);
        Self::from_raw_parts(data, format, width, height, offset, stride)
    }

    /// Create a view from an explicit byte offset and row stride.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new), plus [`BufferError::StrideTooSmall`].
    pub fn from_raw_parts(
        data: &'a [u8],
        format: PixelFormat,
        width: u32,
        height: u32,
        offset: usize,
        stride: usize,
    ) -> Result<Self, BufferError> {
        if width > 0 && height > 0 {
            let pixel_size = format.pixel_size();
            if pixel_size == 0 {
                return Err(BufferError::UnsizedFormat(format));
            }
            let row_bytes = (width as usize)
                .checked_mul(pixel_size)
                .ok_or(BufferError::InvalidDimensions)?;
            if stride < row_bytes {
                return Err(BufferError::StrideTooSmall);
            }
            let required = required_bytes(offset, height, stride, row_bytes)?;
            if data.len() < required {
                return Err(BufferError::InsufficientData {
                    required,
                    actual: data.len(),
                });
            }
        }
        Ok(Self {
            data,
            format,
            width,
            height,
            offset,
            stride,
        })
    }

    /// An empty 0x0 view of the given format.
    pub const fn empty(format: PixelFormat) -> Self {
        Self {
            data: &[],
            format,
            width: 0,
            height: 0,
            offset: 0,
            stride: 0,
        }
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width and height.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Byte stride between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Pixel bytes for row `y`, without padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &'a [u8] {
        assert!(
            y < self.height,
            "row index {y} out of bounds (height: {})",
            self.height
        );
        if self.width == 0 {
            return &[];
        }
        let start = self.offset + y as usize * self.stride;
        let len = self.width as usize * self.format.pixel_size();
        &self.data[start..start + len]
    }

    /// Bytes of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &'a [u8] {
        assert!(
            x < self.width,
            "pixel x={x} out of bounds (width: {})",
            self.width
        );
        let size = self.format.pixel_size();
        let start = x as usize * size;
        &self.row(y)[start..start + size]
    }

    /// Zero-copy sub-rectangle view. Stride stays the same as the parent.
    ///
    /// # Panics
    ///
    /// Panics if the crop region is out of bounds.
    pub fn crop_view(&self, x: u32, y: u32, w: u32, h: u32) -> PixelSlice<'a> {
        assert!(
            x.checked_add(w).is_some_and(|end| end <= self.width),
            "crop x={x} w={w} exceeds width {}",
            self.width
        );
        assert!(
            y.checked_add(h).is_some_and(|end| end <= self.height),
            "crop y={y} h={h} exceeds height {}",
            self.height
        );
        PixelSlice {
            data: self.data,
            format: self.format,
            width: w,
            height: h,
            offset: self.offset + y as usize * self.stride + x as usize * self.format.pixel_size(),
            stride: self.stride,
        }
    }
}

impl fmt::Debug for PixelSlice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelSlice({}x{}, {})",
            self.width, self.height, self.format
        )
    }
}

// ---------------------------------------------------------------------------
// PixelBuffer (owned)
// ---------------------------------------------------------------------------

/// Owned pixel data with format and storage metadata.
#[derive(Clone)]
pub struct PixelBuffer {
    data: Vec<u8>,
    storage: PixelStorage,
    format: PixelFormat,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Wrap an existing `Vec<u8>` laid out according to `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vec does not cover the described region.
    pub fn new(
        storage: PixelStorage,
        format: PixelFormat,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Result<Self, BufferError> {
        PixelSlice::new(storage, format, width, height, &data)?;
        Ok(Self {
            data,
            storage,
            format,
            width,
            height,
        })
    }

    /// Copy a view into a new, tightly packed buffer.
    pub fn from_slice(slice: &PixelSlice<'_>) -> Self {
        let row_bytes = slice.width as usize * slice.format.pixel_size();
        let mut data = Vec::with_capacity(row_bytes * slice.height as usize);
        for y in 0..slice.height {
            data.extend_from_slice(slice.row(y));
        }
        Self {
            data,
            storage: PixelStorage::packed(),
            format: slice.format,
            width: slice.width,
            height: slice.height,
        }
    }

    /// Consume the buffer and return the backing `Vec<u8>`.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Storage parameters of the backing data.
    #[inline]
    pub fn storage(&self) -> PixelStorage {
        self.storage
    }

    /// Borrow the full buffer as a [`PixelSlice`].
    pub fn as_slice(&self) -> PixelSlice<'_> {
        let (offset, stride) = self
            .storage
            .data_properties(self.format.pixel_size(), self.width);
        PixelSlice {
            data: &self.data,
            format: self.format,
            width: self.width,
            height: self.height,
            offset,
            stride,
        }
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelBuffer({}x{}, {})",
            self.width, self.height, self.format
        )
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[inline]
const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

fn required_bytes(
    offset: usize,
    height: u32,
    stride: usize,
    row_bytes: usize,
) -> Result<usize, BufferError> {
    (height as usize - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_bytes))
        .and_then(|v| v.checked_add(offset))
        .ok_or(BufferError::InvalidDimensions)
}
