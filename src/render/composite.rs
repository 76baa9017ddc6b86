use crate::config::TintConfig;
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{CutoutError, CutoutResult};
use crate::foundation::math::mul_div255_u8;
use crate::layers::store::{MaskLayer, RgbaLayer};

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Source-over blend of premultiplied `src` onto `dst`, with `src` scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Builds the on-screen preview: base layer, then a keep wash where the mask is set and a
/// fainter remove wash where it is not.
///
/// Per mask intensity `r`, the keep tint has alpha `r` and is drawn at the keep opacity; the
/// remove tint has alpha `round((255 - r) * remove_strength)` and is drawn at full opacity.
/// Both tints are tabulated once per renderer.
#[derive(Clone, Debug)]
pub struct CompositeRenderer {
    keep_opacity: f32,
    keep_lut: Box<[PremulRgba8; 256]>,
    remove_lut: Box<[PremulRgba8; 256]>,
}

impl CompositeRenderer {
    /// Tabulate tints for `tints`.
    pub fn new(tints: TintConfig) -> Self {
        let [kr, kg, kb] = tints.keep_rgb;
        let [rr, rg, rb] = tints.remove_rgb;
        let mut keep_lut = Box::new([[0u8; 4]; 256]);
        let mut remove_lut = Box::new([[0u8; 4]; 256]);
        for r in 0..=255u8 {
            keep_lut[usize::from(r)] = Rgba8Premul::from_straight_rgba(kr, kg, kb, r).to_array();
            remove_lut[usize::from(r)] =
                Rgba8Premul::from_straight_rgba(rr, rg, rb, remove_alpha(r, tints.remove_strength))
                    .to_array();
        }
        Self {
            keep_opacity: tints.keep_opacity,
            keep_lut,
            remove_lut,
        }
    }

    /// Keep-tint pixel for mask intensity `r`, before the keep opacity is applied.
    pub fn keep_tint(&self, r: u8) -> PremulRgba8 {
        self.keep_lut[usize::from(r)]
    }

    /// Remove-tint pixel for mask intensity `r`.
    pub fn remove_tint(&self, r: u8) -> PremulRgba8 {
        self.remove_lut[usize::from(r)]
    }

    /// Overwrite `out` with the composite of `base` and `mask`.
    ///
    /// Reads only `base` and `mask`, so repeated calls over unchanged layers produce identical
    /// output.
    #[tracing::instrument(skip_all, fields(width = out.width(), height = out.height()))]
    pub fn render(&self, base: &RgbaLayer, mask: &MaskLayer, out: &mut RgbaLayer) -> CutoutResult<()> {
        let size = (out.width(), out.height());
        if (base.width(), base.height()) != size || (mask.width(), mask.height()) != size {
            return Err(CutoutError::validation(
                "composite expects base, mask and display layers of equal size",
            ));
        }

        for ((d, b), &r) in out
            .data_mut()
            .chunks_exact_mut(4)
            .zip(base.data().chunks_exact(4))
            .zip(mask.data())
        {
            let px = [b[0], b[1], b[2], b[3]];
            let px = over(px, self.keep_lut[usize::from(r)], self.keep_opacity);
            let px = over(px, self.remove_lut[usize::from(r)], 1.0);
            d.copy_from_slice(&px);
        }
        Ok(())
    }
}

/// Alpha of the remove tint for mask intensity `r`.
pub fn remove_alpha(r: u8, strength: f32) -> u8 {
    let inv = f32::from(255 - r);
    (inv * strength.clamp(0.0, 1.0)).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
