use std::path::Path;

use anyhow::Context;

use crate::draw::controller::{DrawMode, PointerEvent};
use crate::foundation::core::Point;
use crate::foundation::error::{CutoutError, CutoutResult};
use crate::session::editor::EditorSession;

/// A recorded sequence of brush strokes in mask pixel coordinates.
///
/// ```json
/// { "strokes": [ { "mode": "pencil", "diameter": 32, "points": [[10, 10], [80, 40]] } ] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrokeScript {
    /// Strokes in drawing order.
    pub strokes: Vec<Stroke>,
}

/// One press-drag-release gesture.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stroke {
    /// Pencil or eraser.
    #[serde(default)]
    pub mode: DrawMode,
    /// Brush diameter; the session's current diameter when absent.
    #[serde(default)]
    pub diameter: Option<f64>,
    /// Samples in mask pixels; the first is the press, the last the release.
    pub points: Vec<[f64; 2]>,
}

impl StrokeScript {
    /// Parse a script from JSON text.
    pub fn from_json_str(s: &str) -> CutoutResult<Self> {
        let script: Self = serde_json::from_str(s)
            .map_err(|e| CutoutError::serde(format!("stroke script: {e}")))?;
        script.validate()?;
        Ok(script)
    }

    /// Read and parse a script file.
    pub fn from_json_path(path: &Path) -> CutoutResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read stroke script {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Every stroke has at least one finite point.
    pub fn validate(&self) -> CutoutResult<()> {
        for (i, stroke) in self.strokes.iter().enumerate() {
            if stroke.points.is_empty() {
                return Err(CutoutError::validation(format!("stroke {i} has no points")));
            }
            if stroke.points.iter().flatten().any(|v| !v.is_finite()) {
                return Err(CutoutError::validation(format!(
                    "stroke {i} has a non-finite coordinate"
                )));
            }
        }
        Ok(())
    }

    /// Feed the strokes to `session` as pointer events over its current surface.
    ///
    /// Pixel positions are converted to client coordinates through the surface rectangle, so the
    /// session maps them back onto the same pixels.
    #[tracing::instrument(skip(self, session), fields(strokes = self.strokes.len()))]
    pub fn replay(&self, session: &mut EditorSession) -> CutoutResult<()> {
        let rect = session.surface_rect();
        let (w, h) = session.layers().size();
        if rect.width() <= 0.0 || rect.height() <= 0.0 || w == 0 || h == 0 {
            return Err(CutoutError::validation(
                "strokes need a loaded image and a laid-out surface",
            ));
        }
        let to_client = |[x, y]: [f64; 2]| {
            Point::new(
                rect.x0 + x * rect.width() / f64::from(w),
                rect.y0 + y * rect.height() / f64::from(h),
            )
        };

        for (i, stroke) in self.strokes.iter().enumerate() {
            let pointer_id = i as u64 + 1;
            let event = |p: [f64; 2]| {
                let c = to_client(p);
                PointerEvent::new(pointer_id, c.x, c.y)
            };
            session.set_draw_mode(stroke.mode);
            if let Some(d) = stroke.diameter {
                session.set_brush_diameter(d);
            }

            let Some((first, rest)) = stroke.points.split_first() else {
                continue;
            };
            session.pointer_down(event(*first));
            for p in rest {
                session.pointer_move(event(*p));
            }
            session.pointer_up(event(*rest.last().unwrap_or(first)));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/strokes.rs"]
mod tests;
