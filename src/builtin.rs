//! Built-in importer and converter backed by the `image` crate.
//!
//! [`AnyImageImporter`] reads PNG and TGA files and recognizes compressed
//! DDS files without decoding them. [`AnyImageConverter`] writes PNG and
//! TGA, picking the container from the file extension.
//!
//! Both use bottom-up row order: row 0 of a [`PixelBuffer`] is the last
//! row of the file.

use std::fs;
use std::path::Path;

use image::{ColorType, DynamicImage};

use crate::buffer::{
    ChannelLayout, ChannelType, PixelBuffer, PixelDescriptor, PixelSlice, PixelStorage,
};
use crate::format::{DdsHeader, ImageFormat};
use crate::output::{CompressedImage, ImageData};
use crate::pixel_format::PixelFormat;
use crate::traits::{ConvertError, ImageConverter, ImageImporter, ImportError, Plugin};

/// Opens PNG, TGA and compressed DDS files.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyImageImporter;

impl Plugin for AnyImageImporter {
    fn name(&self) -> &str {
        "AnyImageImporter"
    }
}

impl ImageImporter for AnyImageImporter {
    fn open(&self, path: &Path) -> Result<ImageData, ImportError> {
        let data = fs::read(path)?;
        let format = ImageFormat::detect(&data)
            .or_else(|| ImageFormat::from_path(path))
            .ok_or(ImportError::UnknownFormat)?;
        log::debug!("opening {} as {format}", path.display());

        let Some(codec) = format.codec() else {
            return open_dds(&data);
        };
        let image = image::load_from_memory_with_format(&data, codec)?;
        Ok(decoded_to_buffer(image.flipv())?.into())
    }
}

fn open_dds(data: &[u8]) -> Result<ImageData, ImportError> {
    let header = DdsHeader::parse(data).ok_or(ImportError::UnknownFormat)?;
    match header.four_cc {
        Some(code) => Ok(CompressedImage::new(
            String::from_utf8_lossy(&code).trim_end_matches('\0'),
            header.width,
            header.height,
        )
        .into()),
        None => Err(ImportError::Unsupported(ImageFormat::Dds)),
    }
}

fn decoded_to_buffer(image: DynamicImage) -> Result<PixelBuffer, ImportError> {
    let (width, height) = (image.width(), image.height());
    let (desc, data) = match image {
        DynamicImage::ImageLuma8(buf) => (PixelDescriptor::R8_UNORM, buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => (PixelDescriptor::RG8_UNORM, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (PixelDescriptor::RGB8_UNORM, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (PixelDescriptor::RGBA8_UNORM, buf.into_raw()),
        DynamicImage::ImageLuma16(buf) => (PixelDescriptor::R16_UNORM, to_bytes(&buf.into_raw())),
        DynamicImage::ImageLumaA16(buf) => (PixelDescriptor::RG16_UNORM, to_bytes(&buf.into_raw())),
        DynamicImage::ImageRgb16(buf) => (PixelDescriptor::RGB16_UNORM, to_bytes(&buf.into_raw())),
        DynamicImage::ImageRgba16(buf) => {
            (PixelDescriptor::RGBA16_UNORM, to_bytes(&buf.into_raw()))
        }
        DynamicImage::ImageRgb32F(buf) => (PixelDescriptor::RGB32F, to_bytes(&buf.into_raw())),
        DynamicImage::ImageRgba32F(buf) => (PixelDescriptor::RGBA32F, to_bytes(&buf.into_raw())),
        other => (PixelDescriptor::RGBA8_UNORM, other.to_rgba8().into_raw()),
    };
    Ok(PixelBuffer::new(
        PixelStorage::packed(),
        PixelFormat::Color(desc),
        width,
        height,
        data,
    )?)
}

fn to_bytes<T: bytemuck::Pod>(values: &[T]) -> Vec<u8> {
    bytemuck::cast_slice::<T, u8>(values).to_vec()
}

/// Writes PNG and TGA files.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyImageConverter;

impl Plugin for AnyImageConverter {
    fn name(&self) -> &str {
        "AnyImageConverter"
    }
}

impl ImageConverter for AnyImageConverter {
    fn extensions(&self) -> &[&str] {
        &["png", "tga", "icb", "vda", "vst"]
    }

    fn convert_to_file(&self, image: &PixelSlice<'_>, path: &Path) -> Result<(), ConvertError> {
        let format = ImageFormat::from_path(path)
            .ok_or_else(|| ConvertError::UnknownExtension(path.to_path_buf()))?;
        let codec = format
            .codec()
            .ok_or(ConvertError::UnsupportedFormat(format))?;
        let color = color_type(image.format())
            .ok_or(ConvertError::UnsupportedPixelFormat(image.format()))?;

        let row_bytes = image.width() as usize * image.format().pixel_size();
        let mut data = Vec::with_capacity(row_bytes * image.height() as usize);
        for y in (0..image.height()).rev() {
            data.extend_from_slice(image.row(y));
        }

        image::save_buffer_with_format(path, &data, image.width(), image.height(), color, codec)?;
        log::debug!("wrote {} as {format}", path.display());
        Ok(())
    }
}

fn color_type(format: PixelFormat) -> Option<ColorType> {
    let desc = format.descriptor().ok()?;
    Some(match (desc.channel_type(), desc.layout()) {
        (ChannelType::U8, ChannelLayout::R) => ColorType::L8,
        (ChannelType::U8, ChannelLayout::Rg) => ColorType::La8,
        (ChannelType::U8, ChannelLayout::Rgb) => ColorType::Rgb8,
        (ChannelType::U8, ChannelLayout::Rgba) => ColorType::Rgba8,
        (ChannelType::U16, ChannelLayout::R) => ColorType::L16,
        (ChannelType::U16, ChannelLayout::Rg) => ColorType::La16,
        (ChannelType::U16, ChannelLayout::Rgb) => ColorType::Rgb16,
        (ChannelType::U16, ChannelLayout::Rgba) => ColorType::Rgba16,
        (ChannelType::F32, ChannelLayout::Rgb) => ColorType::Rgb32F,
        (ChannelType::F32, ChannelLayout::Rgba) => ColorType::Rgba32F,
        _ => return None,
    })
}
