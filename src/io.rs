use ab_glyph::FontArc;
use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::{DynamicImage, ImageEncoder, ImageError, RgbaImage};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("image error: {0}")]
    Image(#[from] ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid font {name}: {reason}")]
    InvalidFont { name: String, reason: String },
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Raster formats the exporter can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
    Tga,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "bmp" => Some(SaveFormat::Bmp),
            "tga" => Some(SaveFormat::Tga),
            _ => None,
        }
    }

    /// Infer from the file extension, defaulting to PNG.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_name)
            .unwrap_or_default()
    }
}

/// Decode any supported image file into straight-alpha RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage, IoError> {
    let img = image::open(path)?.into_rgba8();
    info!("loaded {} ({}x{})", path.display(), img.width(), img.height());
    Ok(img)
}

/// Wrap a raw RGBA buffer, checking its length against the dimensions.
pub fn image_from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<RgbaImage, IoError> {
    let expected = width as usize * height as usize * 4;
    let actual = pixels.len();
    RgbaImage::from_raw(width, height, pixels).ok_or(IoError::BufferSize { expected, actual })
}

pub fn load_font(path: &Path) -> Result<FontArc, IoError> {
    let bytes = std::fs::read(path)?;
    font_from_bytes(&path.display().to_string(), bytes)
}

pub fn font_from_bytes(name: &str, bytes: Vec<u8>) -> Result<FontArc, IoError> {
    FontArc::try_from_vec(bytes).map_err(|e| IoError::InvalidFont { name: name.to_string(), reason: e.to_string() })
}

/// Encode and write an image to a file.
pub fn encode_and_write(image: &RgbaImage, path: &Path, format: SaveFormat, quality: u8) -> Result<(), IoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            PngEncoder::new(&mut writer).write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
            encoder.encode(rgb_image.as_raw(), rgb_image.width(), rgb_image.height(), image::ColorType::Rgb8)?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(image.as_raw(), image.width(), image.height(), image::ColorType::Rgba8)?;
        }
        SaveFormat::Tga => {
            TgaEncoder::new(&mut writer).encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
    }
    info!("wrote {} ({})", path.display(), format.extension());
    Ok(())
}
