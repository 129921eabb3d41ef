//! Typed pixel views.
//!
//! Any `imgref::ImgRef` over a plain pixel type (a scalar, a `[T; N]`
//! array, `rgb::Rgb` or `rgb::Rgba` of a supported component type) can be
//! compared directly. The view is reinterpreted as bytes without copying
//! and its format is inferred, preferring the format of the image it is
//! compared against.

use core::fmt;

use half::f16;
use imgref::ImgRef;
use rgb::{Rgb, Rgba};

use crate::buffer::{ChannelLayout, ChannelType, PixelDescriptor, PixelSlice};
use crate::pixel_format::PixelFormat;

/// A single pixel component.
pub trait Component: bytemuck::Pod {
    /// Storage type of the component.
    const CHANNEL_TYPE: ChannelType;
}

/// A pixel made of one to four [`Component`]s.
pub trait PixelComponents: bytemuck::Pod {
    /// Storage type of each component.
    const CHANNEL_TYPE: ChannelType;
    /// Number of components.
    const LAYOUT: ChannelLayout;
}

macro_rules! impl_component {
    ($($ty:ty => $channel_type:ident),* $(,)?) => {
        $(
            impl Component for $ty {
                const CHANNEL_TYPE: ChannelType = ChannelType::$channel_type;
            }

            impl PixelComponents for $ty {
                const CHANNEL_TYPE: ChannelType = ChannelType::$channel_type;
                const LAYOUT: ChannelLayout = ChannelLayout::R;
            }
        )*
    };
}

impl_component!(
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    f16 => F16,
    f32 => F32,
);

macro_rules! impl_pixel {
    ($($pixel:ty => $layout:ident),* $(,)?) => {
        $(impl<T: Component> PixelComponents for $pixel {
            const CHANNEL_TYPE: ChannelType = T::CHANNEL_TYPE;
            const LAYOUT: ChannelLayout = ChannelLayout::$layout;
        })*
    };
}

impl_pixel!(
    [T; 1] => R,
    [T; 2] => Rg,
    [T; 3] => Rgb,
    [T; 4] => Rgba,
    Rgb<T> => Rgb,
    Rgba<T> => Rgba,
);

/// Pick the format for a view of `P` pixels compared against an image of
/// format `expected`.
///
/// The expected format wins when its components have the same type and
/// count, which keeps normalized, sRGB and depth formats intact. Otherwise
/// the generic format for the component type is used.
pub fn infer_format<P: PixelComponents>(expected: PixelFormat) -> PixelFormat {
    infer(P::CHANNEL_TYPE, P::LAYOUT, expected)
}

fn infer(channel_type: ChannelType, layout: ChannelLayout, expected: PixelFormat) -> PixelFormat {
    if let Ok(desc) = expected.descriptor() {
        if desc.channel_type() == channel_type && desc.layout() == layout {
            return expected;
        }
    }
    PixelFormat::Color(PixelDescriptor::generic(channel_type, layout))
}

/// Reinterpret a typed view as a [`PixelSlice`] of the given format.
///
/// # Panics
///
/// Panics if the size of `P` doesn't match the pixel size of `format`.
pub fn slice_with_format<'a, P: PixelComponents>(
    img: ImgRef<'a, P>,
    format: PixelFormat,
) -> PixelSlice<'a> {
    PixelView::from(img).with_format(format)
}

/// Typed pixels with the pixel type erased, waiting for a format.
///
/// Created from an `ImgRef`. The final format is picked with
/// [`infer`](Self::infer) once the image it is compared against is known.
#[derive(Clone, Copy)]
pub struct PixelView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    channel_type: ChannelType,
    layout: ChannelLayout,
}

impl<'a> PixelView<'a> {
    /// Width and height.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Component type.
    #[inline]
    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    /// Component count.
    #[inline]
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// View with the format inferred against `expected`, see
    /// [`infer_format`].
    pub fn infer(self, expected: PixelFormat) -> PixelSlice<'a> {
        self.with_format(infer(self.channel_type, self.layout, expected))
    }

    /// View with the generic format of the component type.
    pub fn generic(self) -> PixelSlice<'a> {
        self.with_format(PixelFormat::Color(PixelDescriptor::generic(
            self.channel_type,
            self.layout,
        )))
    }

    /// View with an explicit format.
    ///
    /// # Panics
    ///
    /// Panics if the pixel size doesn't match the pixel size of `format`.
    pub fn with_format(self, format: PixelFormat) -> PixelSlice<'a> {
        let pixel_size = self.channel_type.byte_size() * self.layout.channels();
        assert_eq!(
            pixel_size,
            format.pixel_size(),
            "pixel type size doesn't match {format}"
        );
        // ImgRef guarantees its buffer covers `stride * (height - 1) + width`
        match PixelSlice::from_raw_parts(
            self.data,
            format,
            self.width,
            self.height,
            0,
            self.stride,
        ) {
            Ok(slice) => slice,
            Err(err) => panic!("invalid pixel view: {err}"),
        }
    }
}

impl<'a, P: PixelComponents> From<ImgRef<'a, P>> for PixelView<'a> {
    fn from(img: ImgRef<'a, P>) -> Self {
        Self {
            data: bytemuck::cast_slice(img.buf()),
            width: img.width() as u32,
            height: img.height() as u32,
            stride: img.stride() * core::mem::size_of::<P>(),
            channel_type: P::CHANNEL_TYPE,
            layout: P::LAYOUT,
        }
    }
}

impl fmt::Debug for PixelView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelView({}x{}, {:?} x{})",
            self.width,
            self.height,
            self.channel_type,
            self.layout.channels()
        )
    }
}

impl<'a, P: PixelComponents> From<ImgRef<'a, P>> for PixelSlice<'a> {
    /// View with the generic format of `P`.
    fn from(img: ImgRef<'a, P>) -> Self {
        PixelView::from(img).generic()
    }
}
