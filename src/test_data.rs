//! Fixture images shared by the unit tests.

use crate::buffer::{PixelDescriptor, PixelSlice, PixelStorage};
use crate::pixel_format::PixelFormat;

pub static ACTUAL_RED_DATA: [f32; 9] = [
    0.3, 1.0, 0.9, //
    0.9, 0.6, 0.2, //
    -0.1, 1.0, 0.0,
];

pub static EXPECTED_RED_DATA: [f32; 9] = [
    0.65, 1.0, 0.6, //
    0.91, 0.6, 0.1, //
    0.02, 0.0, 0.0,
];

pub static DELTA_RED: [f32; 9] = [
    0.35, 0.0, 0.3, //
    0.01, 0.0, 0.1, //
    0.12, 1.0, 0.0,
];

pub static ACTUAL_RGB_DATA: [u8; 24] = [
    0, 0, 0, 0, 0, 0, 0, 0, //
    0x56, 0xf8, 0x3a, 0x56, 0x47, 0xec, 0, 0, //
    0x23, 0x57, 0x10, 0xab, 0xcd, 0x85, 0, 0,
];

pub static EXPECTED_RGB_DATA: [u8; 24] = [
    0, 0, 0, 0x55, 0xf8, 0x3a, 0x56, 0x10, 0xed, 0, 0, 0, //
    0, 0, 0, 0x23, 0x27, 0x10, 0xab, 0xcd, 0xfa, 0, 0, 0,
];

// Expected number vs inf and nan (and inverse), inf in both with the same
// and opposite sign, nan in both, then two plain numbers
pub static ACTUAL_SPECIALS_DATA: [f32; 9] = [
    f32::INFINITY,
    0.3,
    f32::NAN,
    0.3,
    f32::NEG_INFINITY,
    f32::NEG_INFINITY,
    f32::NAN,
    0.3,
    3.0,
];

pub static EXPECTED_SPECIALS_DATA: [f32; 9] = [
    1.0,
    f32::NEG_INFINITY,
    0.3,
    f32::NAN,
    f32::NEG_INFINITY,
    f32::INFINITY,
    f32::NAN,
    0.65,
    -0.1,
];

pub static DELTA_SPECIALS: [f32; 9] = [
    f32::INFINITY,
    f32::INFINITY,
    f32::NAN,
    f32::NAN,
    0.0,
    f32::INFINITY,
    0.0,
    0.35,
    3.1,
];

const R32F: PixelFormat = PixelFormat::Color(PixelDescriptor::R32F);
const RGB8: PixelFormat = PixelFormat::Color(PixelDescriptor::RGB8_UNORM);

fn floats(data: &'static [f32]) -> &'static [u8] {
    bytemuck::cast_slice(data)
}

/// 3x3 R32F, packed.
pub fn actual_red() -> PixelSlice<'static> {
    PixelSlice::new(PixelStorage::new(), R32F, 3, 3, floats(&ACTUAL_RED_DATA)).unwrap()
}

/// 3x3 R32F, packed.
pub fn expected_red() -> PixelSlice<'static> {
    PixelSlice::new(PixelStorage::new(), R32F, 3, 3, floats(&EXPECTED_RED_DATA)).unwrap()
}

/// 2x2 RGB8, one row skipped, rows padded to 8 bytes.
pub fn actual_rgb() -> PixelSlice<'static> {
    PixelSlice::new(
        PixelStorage::new().with_skip(0, 1),
        RGB8,
        2,
        2,
        &ACTUAL_RGB_DATA,
    )
    .unwrap()
}

/// 2x2 RGB8 inside a 3-pixel-wide image, one pixel skipped.
pub fn expected_rgb() -> PixelSlice<'static> {
    PixelSlice::new(
        PixelStorage::new().with_skip(1, 0).with_row_length(3),
        RGB8,
        2,
        2,
        &EXPECTED_RGB_DATA,
    )
    .unwrap()
}

/// 9x1 R32F with special values.
pub fn actual_specials() -> PixelSlice<'static> {
    PixelSlice::new(PixelStorage::new(), R32F, 9, 1, floats(&ACTUAL_SPECIALS_DATA)).unwrap()
}

/// 9x1 R32F with special values.
pub fn expected_specials() -> PixelSlice<'static> {
    PixelSlice::new(PixelStorage::new(), R32F, 9, 1, floats(&EXPECTED_SPECIALS_DATA)).unwrap()
}

/// Whether `value` is within `1e-5` of `expected`, treating NaN as equal to
/// NaN and infinities as equal to themselves.
pub fn float_eq(value: f32, expected: f32) -> bool {
    if expected.is_nan() {
        value.is_nan()
    } else if expected.is_infinite() {
        value == expected
    } else {
        (value - expected).abs() <= 1e-5
    }
}

/// Whether `text` is a NaN token as printed by the crate.
pub fn is_nan_token(text: &str) -> bool {
    matches!(text, "nan" | "-nan")
}
