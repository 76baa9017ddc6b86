use crate::config::BrushConfig;
use crate::draw::raster::{fill_circle, stroke_segment};
use crate::foundation::core::{Point, Rect};
use crate::foundation::error::CutoutResult;
use crate::layers::store::MaskLayer;
use crate::render::frame::FrameScheduler;

/// What the brush writes into the mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    /// Mark pixels as kept (255).
    #[default]
    Pencil,
    /// Mark pixels as removed (0).
    Eraser,
}

impl DrawMode {
    /// Mask intensity written by this mode.
    pub fn mask_value(self) -> u8 {
        match self {
            Self::Pencil => 255,
            Self::Eraser => 0,
        }
    }
}

/// Current brush, read by the pointer handlers at event time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushSettings {
    /// Pencil or eraser.
    pub mode: DrawMode,
    /// Dab diameter and stroke width, in mask pixels.
    pub diameter: f64,
}

/// A pointer sample in client (CSS) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// Device identifier used for capture.
    pub pointer_id: u64,
    /// Position in client coordinates.
    pub client: Point,
}

impl PointerEvent {
    /// Event for `pointer_id` at `(x, y)`.
    pub fn new(pointer_id: u64, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            client: Point::new(x, y),
        }
    }
}

/// The element the mask is drawn through.
pub trait PointerSurface {
    /// On-screen bounds in client coordinates.
    fn bounding_rect(&self) -> Rect;

    /// Route all further events of `pointer_id` to this surface.
    fn set_pointer_capture(&mut self, pointer_id: u64) -> CutoutResult<()>;

    /// Undo [`PointerSurface::set_pointer_capture`].
    fn release_pointer_capture(&mut self, pointer_id: u64) -> CutoutResult<()>;
}

/// Map client coordinates into mask pixel space.
///
/// `x = (cx - left) * (width_px / width_css)`, likewise for `y`. Returns `None` when the surface
/// has no on-screen area.
pub fn map_to_pixels(client: Point, rect: Rect, pixel_size: (u32, u32)) -> Option<Point> {
    let (css_w, css_h) = (rect.width(), rect.height());
    if css_w <= 0.0 || css_h <= 0.0 {
        return None;
    }
    Some(Point::new(
        (client.x - rect.x0) * (f64::from(pixel_size.0) / css_w),
        (client.y - rect.y0) * (f64::from(pixel_size.1) / css_h),
    ))
}

/// Drawing state: idle, or mid-stroke with the last mapped position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawState {
    /// No button held.
    Idle,
    /// Button held; `last` is the previous sample in mask pixels.
    Drawing {
        /// Previous sample.
        last: Point,
    },
}

/// Turns pointer press/move/release into mask dabs and strokes.
///
/// Every mutation requests a composite from the [`FrameScheduler`] instead of rendering.
#[derive(Clone, Debug)]
pub struct PointerDrawingController {
    brush: BrushSettings,
    min_diameter: f64,
    max_diameter: f64,
    state: DrawState,
}

impl PointerDrawingController {
    /// Controller starting from the configured brush defaults.
    pub fn new(cfg: &BrushConfig) -> Self {
        Self {
            brush: BrushSettings {
                mode: cfg.default_mode,
                diameter: cfg.default_diameter,
            },
            min_diameter: cfg.min_diameter,
            max_diameter: cfg.max_diameter,
            state: DrawState::Idle,
        }
    }

    /// Current brush.
    pub fn brush(&self) -> BrushSettings {
        self.brush
    }

    /// Switch between pencil and eraser; applies to the next event, even mid-stroke.
    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        self.brush.mode = mode;
    }

    /// Set the brush diameter, clamped to the configured range. Returns the value applied.
    pub fn set_brush_diameter(&mut self, diameter: f64) -> f64 {
        let d = if diameter.is_finite() {
            diameter.clamp(self.min_diameter, self.max_diameter)
        } else {
            self.brush.diameter
        };
        self.brush.diameter = d;
        d
    }

    /// Current state.
    pub fn state(&self) -> DrawState {
        self.state
    }

    /// True between press and release.
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }

    /// Last recorded position, while drawing.
    pub fn last_position(&self) -> Option<Point> {
        match self.state {
            DrawState::Drawing { last } => Some(last),
            DrawState::Idle => None,
        }
    }

    /// Press: capture the pointer, dab at the press position, enter `Drawing`.
    pub fn pointer_down(
        &mut self,
        ev: PointerEvent,
        surface: &mut dyn PointerSurface,
        mask: &mut MaskLayer,
        frames: &mut FrameScheduler,
    ) {
        let Some(pos) = map_to_pixels(
            ev.client,
            surface.bounding_rect(),
            (mask.width(), mask.height()),
        ) else {
            tracing::debug!("pointer down on a surface with no area; ignored");
            return;
        };
        if let Err(err) = surface.set_pointer_capture(ev.pointer_id) {
            tracing::debug!(error = %err, pointer_id = ev.pointer_id, "pointer capture failed");
        }
        self.state = DrawState::Drawing { last: pos };
        fill_circle(mask, pos, self.brush.diameter, self.brush.mode.mask_value());
        frames.request();
    }

    /// Move: while drawing, stroke from the last position to this one.
    pub fn pointer_move(
        &mut self,
        ev: PointerEvent,
        surface: &dyn PointerSurface,
        mask: &mut MaskLayer,
        frames: &mut FrameScheduler,
    ) {
        let DrawState::Drawing { last } = self.state else {
            return;
        };
        let Some(pos) = map_to_pixels(
            ev.client,
            surface.bounding_rect(),
            (mask.width(), mask.height()),
        ) else {
            return;
        };
        stroke_segment(
            mask,
            last,
            pos,
            self.brush.diameter,
            self.brush.mode.mask_value(),
        );
        self.state = DrawState::Drawing { last: pos };
        frames.request();
    }

    /// Release (observed globally): leave `Drawing` and release capture, ignoring failures.
    pub fn pointer_up(
        &mut self,
        ev: PointerEvent,
        surface: &mut dyn PointerSurface,
        frames: &mut FrameScheduler,
    ) {
        self.state = DrawState::Idle;
        if let Err(err) = surface.release_pointer_capture(ev.pointer_id) {
            tracing::debug!(error = %err, pointer_id = ev.pointer_id, "pointer release failed");
        }
        frames.request();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/draw/controller.rs"]
mod tests;
