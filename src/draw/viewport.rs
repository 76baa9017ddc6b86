use crate::draw::controller::PointerSurface;
use crate::foundation::core::Rect;
use crate::foundation::error::{CutoutError, CutoutResult};

/// Largest square (whole CSS pixels, at least 1) that fits `container`, anchored at its origin.
pub fn fit_square(container: Rect) -> Rect {
    let side = container.width().min(container.height()).floor().max(1.0);
    Rect::new(
        container.x0,
        container.y0,
        container.x0 + side,
        container.y0 + side,
    )
}

/// The square edit surface: its on-screen rectangle and which pointer it has captured.
#[derive(Clone, Debug, Default)]
pub struct SquareSurface {
    rect: Rect,
    captured: Option<u64>,
}

impl SquareSurface {
    /// Surface occupying `rect` in client coordinates.
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            captured: None,
        }
    }

    /// Refit to a resized container.
    pub fn fit_to_container(&mut self, container: Rect) -> Rect {
        self.rect = fit_square(container);
        self.rect
    }

    /// Pointer currently captured, if any.
    pub fn captured(&self) -> Option<u64> {
        self.captured
    }
}

impl PointerSurface for SquareSurface {
    fn bounding_rect(&self) -> Rect {
        self.rect
    }

    fn set_pointer_capture(&mut self, pointer_id: u64) -> CutoutResult<()> {
        self.captured = Some(pointer_id);
        Ok(())
    }

    fn release_pointer_capture(&mut self, pointer_id: u64) -> CutoutResult<()> {
        if self.captured != Some(pointer_id) {
            return Err(CutoutError::validation(format!(
                "pointer {pointer_id} is not captured"
            )));
        }
        self.captured = None;
        Ok(())
    }
}
