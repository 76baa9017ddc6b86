use std::io::Cursor;

use crate::assets::decode::Image;
use crate::foundation::error::{CutoutError, CutoutResult};

/// Premultiplied RGBA8 pixel buffer, row-major, tightly packed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RgbaLayer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbaLayer {
    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw premultiplied pixels.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Premultiplied pixel at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    fn resize_cleared(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(pixel_count(width, height) * 4, 0);
    }
}

/// Single-channel mask: 0 excludes a pixel, 255 keeps it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaskLayer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MaskLayer {
    /// All-zero mask of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let mut mask = Self::default();
        mask.resize_cleared(width, height);
        mask
    }

    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// One intensity byte per pixel.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Intensity at `(x, y)`, if in bounds.
    pub fn value(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y as usize * self.width as usize + x as usize])
    }

    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &mut self.data[start..start + w]
    }

    /// Zero every pixel.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Serialize as a grayscale PNG for upload.
    pub fn encode_png(&self) -> CutoutResult<Vec<u8>> {
        if self.width == 0 || self.height == 0 {
            return Err(CutoutError::mask_export("mask has no pixels"));
        }
        let img = image::GrayImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| CutoutError::mask_export("mask buffer does not match dimensions"))?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| CutoutError::mask_export(e.to_string()))?;
        Ok(buf)
    }

    fn resize_cleared(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(pixel_count(width, height), 0);
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    (width as usize).saturating_mul(height as usize)
}

/// Base, mask and display layers of one editing session.
///
/// All three share one pixel size, set by [`LayerStore::load_base`] and never changed by
/// anything else.
#[derive(Clone, Debug, Default)]
pub struct LayerStore {
    base: RgbaLayer,
    mask: MaskLayer,
    display: RgbaLayer,
}

impl LayerStore {
    /// Empty store (0x0 layers) until the first load.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once an image has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.base.width > 0 && self.base.height > 0
    }

    /// Shared pixel size of all three layers.
    pub fn size(&self) -> (u32, u32) {
        (self.base.width, self.base.height)
    }

    /// Current best-known image.
    pub fn base(&self) -> &RgbaLayer {
        &self.base
    }

    /// User-edited mask.
    pub fn mask(&self) -> &MaskLayer {
        &self.mask
    }

    /// Mutable mask, for the drawing controller.
    pub fn mask_mut(&mut self) -> &mut MaskLayer {
        &mut self.mask
    }

    /// Last composite.
    pub fn display(&self) -> &RgbaLayer {
        &self.display
    }

    /// Borrow the layers the compositor reads and the one it writes.
    pub fn composite_targets(&mut self) -> (&RgbaLayer, &MaskLayer, &mut RgbaLayer) {
        (&self.base, &self.mask, &mut self.display)
    }

    /// Resize every layer to `image`, draw it into the base layer and zero the mask.
    ///
    /// The display layer is reallocated blank; callers re-render to fill it.
    pub fn load_base(&mut self, image: &Image) {
        let (w, h) = (image.width(), image.height());
        self.base.resize_cleared(w, h);
        self.mask.resize_cleared(w, h);
        self.display.resize_cleared(w, h);
        self.base.data = image.to_premul_rgba8(w, h);
        tracing::debug!(width = w, height = h, "loaded base layer");
    }

    /// Redraw the base layer from `image`, stretched to the existing pixel size.
    pub fn replace_base(&mut self, image: &Image) -> CutoutResult<()> {
        if !self.is_loaded() {
            return Err(CutoutError::validation(
                "replace_base called before any image was loaded",
            ));
        }
        let (w, h) = self.size();
        if (image.width(), image.height()) != (w, h) {
            tracing::debug!(
                from_w = image.width(),
                from_h = image.height(),
                to_w = w,
                to_h = h,
                "stretching replacement to base size"
            );
        }
        self.base.data = image.to_premul_rgba8(w, h);
        Ok(())
    }

    /// Zero the mask without touching the base layer.
    pub fn clear_mask(&mut self) {
        self.mask.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/store.rs"]
mod tests;
