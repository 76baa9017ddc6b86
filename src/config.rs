//! Editor configuration: upload size policy, endpoints, brush limits and overlay tints.
//!
//! Every field has a default, so an empty JSON object (or no file at all) yields the stock
//! configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;

use crate::draw::controller::DrawMode;
use crate::foundation::error::{CutoutError, CutoutResult};

/// Environment variable that overrides [`EndpointConfig::base_url`].
pub const API_URL_ENV: &str = "CUTOUT_API_URL";

/// Top-level configuration for an editing session and its remote pipeline.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Upload size budget and recompression policy.
    pub size: SizePolicy,
    /// Background-removal service location.
    pub endpoints: EndpointConfig,
    /// Brush defaults and limits.
    pub brush: BrushConfig,
    /// Overlay tint colours.
    pub tints: TintConfig,
}

/// Byte budgets and the quality/downscale ladder used to fit an upload.
///
/// Qualities are JPEG quality units (1..=100).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizePolicy {
    /// Ceiling applied to every upload before the first attempt.
    pub max_upload_bytes: u64,
    /// Tighter ceiling used for the single retry after an oversized-payload rejection.
    pub retry_max_bytes: u64,
    /// Longest edge allowed after the initial downscale.
    pub max_dimension: u32,
    /// First re-encode quality.
    pub start_quality: u8,
    /// Quality decrement between attempts.
    pub quality_step: u8,
    /// Lowest quality tried before falling back to downscaling.
    pub min_quality: u8,
    /// Per-attempt dimension factor once the quality floor is reached.
    pub downscale_ratio: f64,
    /// Number of downscale attempts at the quality floor.
    pub max_downscale_attempts: u32,
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self {
            max_upload_bytes: 4 * 1024 * 1024,
            retry_max_bytes: 2 * 1024 * 1024,
            max_dimension: 2048,
            start_quality: 92,
            quality_step: 7,
            min_quality: 50,
            downscale_ratio: 0.8,
            max_downscale_attempts: 4,
        }
    }
}

/// Where the auto-remove and refine endpoints live.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointConfig {
    /// Scheme, host and port of the background-removal service.
    pub base_url: String,
    /// Path of the auto-remove endpoint.
    pub remove_path: String,
    /// Path of the mask-guided refine endpoint.
    pub refine_path: String,
    /// Whole-request timeout.
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            remove_path: "/remove-bg".to_string(),
            refine_path: "/remove-bg-refine".to_string(),
            timeout_secs: 60,
        }
    }
}

impl EndpointConfig {
    /// Full URL of the auto-remove endpoint.
    pub fn remove_url(&self) -> String {
        join_url(&self.base_url, &self.remove_path)
    }

    /// Full URL of the refine endpoint.
    pub fn refine_url(&self) -> String {
        join_url(&self.base_url, &self.refine_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Brush defaults and the slider range.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrushConfig {
    /// Diameter at session start, in image pixels.
    pub default_diameter: f64,
    /// Smallest selectable diameter.
    pub min_diameter: f64,
    /// Largest selectable diameter.
    pub max_diameter: f64,
    /// Mode at session start.
    pub default_mode: DrawMode,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            default_diameter: 48.0,
            min_diameter: 4.0,
            max_diameter: 200.0,
            default_mode: DrawMode::Pencil,
        }
    }
}

/// Keep/remove overlay colours (straight RGB) and their strengths.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TintConfig {
    /// Colour washed over kept regions.
    pub keep_rgb: [u8; 3],
    /// Global opacity of the keep wash.
    pub keep_opacity: f32,
    /// Colour washed over removed regions.
    pub remove_rgb: [u8; 3],
    /// Fraction of the inverse mask used as the remove wash alpha.
    pub remove_strength: f32,
}

impl Default for TintConfig {
    fn default() -> Self {
        Self {
            keep_rgb: [0, 200, 150],
            keep_opacity: 0.35,
            remove_rgb: [180, 60, 60],
            remove_strength: 0.28,
        }
    }
}

impl EditorConfig {
    /// Read and validate a JSON configuration file.
    pub fn from_json_path(path: &Path) -> CutoutResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| CutoutError::serde(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply environment overrides (currently [`API_URL_ENV`]).
    pub fn apply_env(&mut self) {
        self.apply_lookup(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.endpoints.base_url = url.trim().to_string();
        }
    }

    /// Reject values the editor cannot operate with.
    pub fn validate(&self) -> CutoutResult<()> {
        let s = &self.size;
        if s.max_upload_bytes == 0 || s.retry_max_bytes == 0 {
            return Err(CutoutError::validation("size budgets must be > 0"));
        }
        if s.max_dimension == 0 {
            return Err(CutoutError::validation("size.max_dimension must be > 0"));
        }
        if !(1..=100).contains(&s.start_quality) || !(1..=100).contains(&s.min_quality) {
            return Err(CutoutError::validation("jpeg qualities must be in 1..=100"));
        }
        if s.min_quality > s.start_quality {
            return Err(CutoutError::validation(
                "size.min_quality must be <= size.start_quality",
            ));
        }
        if s.quality_step == 0 {
            return Err(CutoutError::validation("size.quality_step must be > 0"));
        }
        if !(s.downscale_ratio > 0.0 && s.downscale_ratio < 1.0) {
            return Err(CutoutError::validation(
                "size.downscale_ratio must be in (0, 1)",
            ));
        }

        let b = &self.brush;
        if !(b.min_diameter > 0.0 && b.min_diameter <= b.max_diameter) {
            return Err(CutoutError::validation(
                "brush diameters must satisfy 0 < min <= max",
            ));
        }
        if !(b.min_diameter..=b.max_diameter).contains(&b.default_diameter) {
            return Err(CutoutError::validation(
                "brush.default_diameter must lie within [min, max]",
            ));
        }

        let t = &self.tints;
        if !(0.0..=1.0).contains(&t.keep_opacity) || !(0.0..=1.0).contains(&t.remove_strength) {
            return Err(CutoutError::validation(
                "tint opacity and strength must be in [0, 1]",
            ));
        }

        if self.endpoints.base_url.trim().is_empty() {
            return Err(CutoutError::validation("endpoints.base_url must be set"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
