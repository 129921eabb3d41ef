//! Image file container detection.

use std::path::Path;

/// File containers known to the built-in plugins.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Tga,
    Dds,
}

/// Size of the DDS magic plus header.
pub(crate) const DDS_HEADER_SIZE: usize = 128;

impl ImageFormat {
    /// Detect format from magic bytes. Returns `None` if unrecognized.
    ///
    /// TGA has no magic bytes and is only found by
    /// [`from_extension`](Self::from_extension).
    pub fn detect(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.len() >= 8 && data[..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
            return Some(ImageFormat::Png);
        }

        // DDS: "DDS " followed by a 124-byte header
        if data.len() >= 8 && data[..4] == *b"DDS " && data[4..8] == 124u32.to_le_bytes() {
            return Some(ImageFormat::Dds);
        }

        None
    }

    /// Detect format from file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "tga" | "icb" | "vda" | "vst" => Some(ImageFormat::Tga),
            "dds" => Some(ImageFormat::Dds),
            _ => None,
        }
    }

    /// Detect format from the extension of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Common file extensions.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Png => &["png"],
            ImageFormat::Tga => &["tga", "icb", "vda", "vst"],
            ImageFormat::Dds => &["dds"],
        }
    }

    /// Matching `image` crate format, if the crate can read and write it.
    pub(crate) fn codec(self) -> Option<image::ImageFormat> {
        match self {
            ImageFormat::Png => Some(image::ImageFormat::Png),
            ImageFormat::Tga => Some(image::ImageFormat::Tga),
            ImageFormat::Dds => None,
        }
    }
}

impl core::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Tga => "TGA",
            ImageFormat::Dds => "DDS",
        })
    }
}

/// Compression of a DDS file, read from its header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DdsHeader {
    pub width: u32,
    pub height: u32,
    /// Four-character code of a compressed pixel format.
    pub four_cc: Option<[u8; 4]>,
}

impl DdsHeader {
    const FLAG_FOUR_CC: u32 = 0x4;

    /// Parse the header, `None` if the data is too short or not DDS.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < DDS_HEADER_SIZE || ImageFormat::detect(data) != Some(ImageFormat::Dds) {
            return None;
        }
        let u32_at = |offset: usize| {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&data[offset..offset + 4]);
            u32::from_le_bytes(bytes)
        };
        let mut four_cc = [0u8; 4];
        four_cc.copy_from_slice(&data[84..88]);
        Some(Self {
            height: u32_at(12),
            width: u32_at(16),
            four_cc: (u32_at(80) & Self::FLAG_FOUR_CC != 0).then_some(four_cc),
        })
    }
}

#[cfg(test)]
pub(crate) fn dds_header(width: u32, height: u32, four_cc: Option<&[u8; 4]>) -> Vec<u8> {
    let mut data = vec![0u8; DDS_HEADER_SIZE];
    data[..4].copy_from_slice(b"DDS ");
    data[4..8].copy_from_slice(&124u32.to_le_bytes());
    data[12..16].copy_from_slice(&height.to_le_bytes());
    data[16..20].copy_from_slice(&width.to_le_bytes());
    data[76..80].copy_from_slice(&32u32.to_le_bytes());
    if let Some(code) = four_cc {
        data[80..84].copy_from_slice(&DdsHeader::FLAG_FOUR_CC.to_le_bytes());
        data[84..88].copy_from_slice(code);
    }
    data
}
