use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::config::SizePolicy;
use crate::foundation::core::SourceFile;
use crate::foundation::error::{CutoutError, CutoutResult};

/// Fits image uploads under a byte budget by re-encoding as JPEG at decreasing quality, then by
/// shrinking dimensions at the quality floor.
///
/// Never fails: when the input cannot be decoded or encoded, the original file comes back
/// untouched and the failure is logged.
#[derive(Clone, Debug)]
pub struct ImageSizeAdapter {
    policy: SizePolicy,
}

impl ImageSizeAdapter {
    /// Build an adapter with the given policy.
    pub fn new(policy: SizePolicy) -> Self {
        Self { policy }
    }

    /// The quality/downscale ladder in use.
    pub fn policy(&self) -> &SizePolicy {
        &self.policy
    }

    /// Return a file no larger than `max_bytes` when the ladder allows it.
    ///
    /// Files already within budget are returned as-is (same shared bytes). If every rung is still
    /// over budget, the last (most shrunken) candidate is returned, or the original when that
    /// candidate is not smaller than it.
    #[tracing::instrument(skip(self, file), fields(name = %file.name, size = file.size()))]
    pub fn adapt(&self, file: &SourceFile, max_bytes: u64) -> SourceFile {
        if file.size() <= max_bytes {
            return file.clone();
        }
        match self.shrink(file, max_bytes) {
            Ok(out) => {
                tracing::debug!(out_size = out.size(), "adapted upload");
                out
            }
            Err(err) => {
                tracing::warn!(error = %err, "image compression failed; uploading original");
                file.clone()
            }
        }
    }

    fn shrink(&self, file: &SourceFile, max_bytes: u64) -> CutoutResult<SourceFile> {
        let p = &self.policy;
        let decoded = image::load_from_memory(file.bytes())
            .map_err(|e| CutoutError::decode(format!("decode upload: {e}")))?
            .to_rgb8();

        let (w, h) = fit_within(decoded.width(), decoded.height(), p.max_dimension);
        let fitted = if (w, h) == decoded.dimensions() {
            decoded
        } else {
            image::imageops::resize(&decoded, w, h, FilterType::Triangle)
        };

        let mut quality = p.start_quality.max(p.min_quality);
        let mut last = loop {
            let bytes = encode_jpeg(&fitted, quality)?;
            tracing::debug!(quality, len = bytes.len(), "quality rung");
            if bytes.len() as u64 <= max_bytes {
                return Ok(jpeg_file(&file.name, bytes));
            }
            if quality <= p.min_quality {
                break bytes;
            }
            quality = quality.saturating_sub(p.quality_step.max(1)).max(p.min_quality);
        };

        for attempt in 1..=p.max_downscale_attempts {
            let factor = p.downscale_ratio.powi(attempt as i32);
            let (sw, sh) = scale_dims(w, h, factor);
            let scaled = image::imageops::resize(&fitted, sw, sh, FilterType::Triangle);
            let bytes = encode_jpeg(&scaled, p.min_quality)?;
            tracing::debug!(attempt, width = sw, height = sh, len = bytes.len(), "downscale rung");
            if bytes.len() as u64 <= max_bytes {
                return Ok(jpeg_file(&file.name, bytes));
            }
            last = bytes;
        }

        if last.len() as u64 >= file.size() {
            tracing::debug!("no candidate beat the original size");
            return Ok(file.clone());
        }
        Ok(jpeg_file(&file.name, last))
    }
}

/// Uniformly scale `(width, height)` so the longer edge is at most `max_dimension`.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let long = width.max(height);
    if long <= max_dimension || long == 0 {
        return (width, height);
    }
    scale_dims(width, height, f64::from(max_dimension) / f64::from(long))
}

fn scale_dims(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let sw = ((f64::from(width) * factor).round() as u32).max(1);
    let sh = ((f64::from(height) * factor).round() as u32).max(1);
    (sw, sh)
}

fn encode_jpeg(img: &image::RgbImage, quality: u8) -> CutoutResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        .map_err(|e| CutoutError::encode(format!("jpeg q{quality}: {e}")))?;
    Ok(buf)
}

fn jpeg_file(original_name: &str, bytes: Vec<u8>) -> SourceFile {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("upload");
    SourceFile::new(format!("{stem}.jpg"), "image/jpeg", bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/adapt/size.rs"]
mod tests;
