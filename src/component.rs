//! Component codec table.
//!
//! Every [`ChannelType`] maps to one [`ComponentCodec`] entry that knows
//! the component size, how to widen it to `f64` for delta math and how to
//! print it. Supporting a new component type is a new table entry.

use core::fmt;

use half::f16;

use crate::buffer::{ChannelType, PixelDescriptor};
use crate::numfmt::{FLOAT_PRECISION, General, HALF_PRECISION};

/// Decode and print functions for one component type.
#[derive(Clone, Copy)]
pub(crate) struct ComponentCodec {
    pub size: usize,
    pub read: fn(&[u8]) -> f64,
    pub print: fn(&[u8], &mut dyn fmt::Write) -> fmt::Result,
}

macro_rules! integer_codec {
    ($ty:ty) => {
        ComponentCodec {
            size: core::mem::size_of::<$ty>(),
            read: |b| f64::from(<$ty>::from_ne_bytes(array(b))),
            print: |b, out| write!(out, "{}", <$ty>::from_ne_bytes(array(b))),
        }
    };
}

const U8: ComponentCodec = integer_codec!(u8);
const I8: ComponentCodec = integer_codec!(i8);
const U16: ComponentCodec = integer_codec!(u16);
const I16: ComponentCodec = integer_codec!(i16);
const U32: ComponentCodec = integer_codec!(u32);
const I32: ComponentCodec = integer_codec!(i32);

const F16: ComponentCodec = ComponentCodec {
    size: 2,
    read: |b| f16::from_ne_bytes(array(b)).to_f64(),
    print: |b, out| {
        let value = f16::from_ne_bytes(array(b)).to_f64();
        write!(out, "{}", General::new(value, HALF_PRECISION))
    },
};

const F32: ComponentCodec = ComponentCodec {
    size: 4,
    read: |b| f64::from(f32::from_ne_bytes(array(b))),
    print: |b, out| {
        let value = f64::from(f32::from_ne_bytes(array(b)));
        write!(out, "{}", General::new(value, FLOAT_PRECISION))
    },
};

/// Codec for a channel type.
pub(crate) const fn codec(channel_type: ChannelType) -> &'static ComponentCodec {
    match channel_type {
        ChannelType::U8 => &U8,
        ChannelType::I8 => &I8,
        ChannelType::U16 => &U16,
        ChannelType::I16 => &I16,
        ChannelType::U32 => &U32,
        ChannelType::I32 => &I32,
        ChannelType::F16 => &F16,
        ChannelType::F32 => &F32,
    }
}

/// Copy the leading bytes of a component into a fixed-size array.
#[inline]
fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// Print one pixel: `#rrggbb[aa]` for 8-bit colors, `Vector(a, b, ...)`
/// otherwise.
pub(crate) fn write_pixel(
    out: &mut dyn fmt::Write,
    desc: PixelDescriptor,
    pixel: &[u8],
) -> fmt::Result {
    if desc.prints_as_hex_color() {
        out.write_char('#')?;
        for byte in &pixel[..desc.channels()] {
            write!(out, "{byte:02x}")?;
        }
        return Ok(());
    }

    let codec = codec(desc.channel_type());
    out.write_str("Vector(")?;
    for (i, component) in pixel
        .chunks_exact(codec.size)
        .take(desc.channels())
        .enumerate()
    {
        if i > 0 {
            out.write_str(", ")?;
        }
        (codec.print)(component, out)?;
    }
    out.write_char(')')
}

struct PixelText<'a> {
    desc: PixelDescriptor,
    pixel: &'a [u8],
}

impl fmt::Display for PixelText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pixel(f, self.desc, self.pixel)
    }
}

/// Pixel printed into a `String`.
pub(crate) fn pixel_to_string(desc: PixelDescriptor, pixel: &[u8]) -> String {
    PixelText { desc, pixel }.to_string()
}
