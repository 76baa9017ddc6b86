use std::io::Cursor;

use anyhow::Context as _;

use crate::foundation::error::{CutoutError, CutoutResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Immutable decoded bitmap, straight-alpha RGBA8.
///
/// Produced from an uploaded file or a network response body and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct Image {
    pixels: image::RgbaImage,
}

impl Image {
    /// Decode any format the `image` crate recognises from its magic bytes.
    pub fn decode(bytes: &[u8]) -> CutoutResult<Self> {
        let dyn_img = image::load_from_memory(bytes)
            .map_err(|e| CutoutError::decode(format!("decode image from memory: {e}")))?;
        Self::from_rgba(dyn_img.to_rgba8())
    }

    /// Wrap an already decoded buffer.
    pub fn from_rgba(pixels: image::RgbaImage) -> CutoutResult<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(CutoutError::validation("image has zero width or height"));
        }
        Ok(Self { pixels })
    }

    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Straight-alpha pixels.
    pub fn as_rgba(&self) -> &image::RgbaImage {
        &self.pixels
    }

    /// Premultiplied RGBA8 copy resampled to `width x height` (no resample when sizes match).
    pub fn to_premul_rgba8(&self, width: u32, height: u32) -> Vec<u8> {
        let mut data = if (width, height) == (self.width(), self.height()) {
            self.pixels.as_raw().clone()
        } else {
            image::imageops::resize(
                &self.pixels,
                width,
                height,
                image::imageops::FilterType::Triangle,
            )
            .into_raw()
        };
        premultiply_rgba8_in_place(&mut data);
        data
    }
}

/// Encode straight-alpha RGBA8 pixels as PNG.
pub fn encode_png_rgba8(width: u32, height: u32, rgba: Vec<u8>) -> CutoutResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| CutoutError::encode("rgba buffer does not match dimensions"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
