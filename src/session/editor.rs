use std::collections::HashSet;

use crate::adapt::size::ImageSizeAdapter;
use crate::assets::decode::{Image, encode_png_rgba8};
use crate::config::EditorConfig;
use crate::draw::controller::{
    BrushSettings, DrawMode, PointerDrawingController, PointerEvent, PointerSurface as _,
};
use crate::draw::viewport::SquareSurface;
use crate::foundation::core::{Rect, SourceFile};
use crate::foundation::error::{CutoutError, CutoutResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;
use crate::layers::store::LayerStore;
use crate::remote::pipeline::RemoteRefinePipeline;
use crate::remote::transport::Transport;
use crate::render::composite::CompositeRenderer;
use crate::render::frame::{FrameScheduler, FrameStats};

/// A failure worded for the user, as shown in a blocking alert.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Alert {
    message: String,
    #[source]
    cause: CutoutError,
}

impl Alert {
    fn new(prefix: &str, cause: CutoutError) -> Self {
        let message = match &cause {
            CutoutError::NoSource | CutoutError::Busy => cause.to_string(),
            _ if prefix.is_empty() => cause.to_string(),
            _ => format!("{prefix}{cause}"),
        };
        Self { message, cause }
    }

    /// Text shown to the user.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying error.
    pub fn cause(&self) -> &CutoutError {
        &self.cause
    }
}

/// Which round trip a ticket stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TicketKind {
    /// Automatic removal after a load.
    AutoRemove,
    /// Mask-guided refine.
    Refine,
}

/// An issued network request: what to send and the load generation it belongs to.
///
/// Settled exactly once through [`EditorSession::finish`].
#[derive(Debug)]
pub struct RemoteTicket {
    id: u64,
    kind: TicketKind,
    generation: u64,
    file: SourceFile,
    mask_png: Option<Vec<u8>>,
}

impl RemoteTicket {
    /// Request kind.
    pub fn kind(&self) -> TicketKind {
        self.kind
    }

    /// Load generation at issue time.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// File to upload.
    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// Exported mask (refine only).
    pub fn mask_png(&self) -> Option<&[u8]> {
        self.mask_png.as_deref()
    }

    /// Perform the round trip on `pipeline`.
    pub fn send<T: Transport>(
        &self,
        pipeline: &mut RemoteRefinePipeline<T>,
    ) -> CutoutResult<Vec<u8>> {
        match (self.kind, self.mask_png.as_deref()) {
            (TicketKind::Refine, Some(mask)) => pipeline.refine(&self.file, mask),
            (TicketKind::Refine, None) => {
                Err(CutoutError::mask_export("refine ticket has no mask"))
            }
            (TicketKind::AutoRemove, _) => pipeline.auto_remove(&self.file),
        }
    }
}

/// What happened to a finished request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// The reply replaced the base layer.
    Applied,
    /// A newer image was loaded meanwhile; the reply was dropped.
    Stale,
}

/// One page instance of the mask editor.
///
/// Owns the layers, the drawing controller, the render scheduler and the request bookkeeping.
/// The host feeds it pointer events, container resizes and display-refresh ticks.
pub struct EditorSession {
    config: EditorConfig,
    adapter: ImageSizeAdapter,
    layers: LayerStore,
    controller: PointerDrawingController,
    surface: SquareSurface,
    frames: FrameScheduler,
    renderer: CompositeRenderer,
    source: Option<SourceFile>,
    result_png: Option<Vec<u8>>,
    generation: u64,
    next_ticket: u64,
    outstanding: HashSet<u64>,
}

impl EditorSession {
    /// Fresh session with no image.
    pub fn new(config: EditorConfig) -> Self {
        Self {
            adapter: ImageSizeAdapter::new(config.size),
            controller: PointerDrawingController::new(&config.brush),
            renderer: CompositeRenderer::new(config.tints),
            layers: LayerStore::new(),
            surface: SquareSurface::default(),
            frames: FrameScheduler::new(),
            source: None,
            result_png: None,
            generation: 0,
            next_ticket: 0,
            outstanding: HashSet::new(),
            config,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Layers, for display and inspection.
    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    /// Current brush.
    pub fn brush(&self) -> BrushSettings {
        self.controller.brush()
    }

    /// True between pointer press and release.
    pub fn is_drawing(&self) -> bool {
        self.controller.is_drawing()
    }

    /// Select pencil or eraser.
    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        self.controller.set_draw_mode(mode);
    }

    /// Set the brush diameter (clamped); returns the value applied.
    pub fn set_brush_diameter(&mut self, diameter: f64) -> f64 {
        self.controller.set_brush_diameter(diameter)
    }

    /// The uploaded (possibly recompressed) file, once an image is loaded.
    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    /// PNG returned by the last successful round trip.
    pub fn result_png(&self) -> Option<&[u8]> {
        self.result_png.as_deref()
    }

    /// True while any request is outstanding; refine is unavailable meanwhile.
    pub fn is_loading(&self) -> bool {
        !self.outstanding.is_empty()
    }

    /// Whether the refine action can be invoked right now.
    pub fn can_refine(&self) -> bool {
        !self.is_loading() && self.source.is_some()
    }

    /// Number of loads so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Render request counters.
    pub fn frame_stats(&self) -> FrameStats {
        self.frames.stats()
    }

    /// On-screen rectangle of the edit surface.
    pub fn surface_rect(&self) -> Rect {
        self.surface.bounding_rect()
    }

    /// The container was laid out or resized: refit the square surface and recomposite.
    pub fn resize_container(&mut self, container: Rect) -> Rect {
        let rect = self.surface.fit_to_container(container);
        self.frames.request();
        rect
    }

    /// Pointer pressed over the edit surface.
    pub fn pointer_down(&mut self, ev: PointerEvent) {
        self.controller.pointer_down(
            ev,
            &mut self.surface,
            self.layers.mask_mut(),
            &mut self.frames,
        );
    }

    /// Pointer moved over (or captured by) the edit surface.
    pub fn pointer_move(&mut self, ev: PointerEvent) {
        self.controller
            .pointer_move(ev, &self.surface, self.layers.mask_mut(), &mut self.frames);
    }

    /// Pointer released anywhere.
    pub fn pointer_up(&mut self, ev: PointerEvent) {
        self.controller
            .pointer_up(ev, &mut self.surface, &mut self.frames);
    }

    /// The "Clear" action: zero the mask.
    pub fn clear_mask(&mut self) {
        self.layers.clear_mask();
        self.frames.request();
    }

    /// Ask for a composite on the next refresh.
    pub fn request_render(&mut self) {
        self.frames.request();
    }

    /// Display-refresh tick: composite once if anything asked for it. Returns whether it ran.
    pub fn on_animation_frame(&mut self) -> bool {
        if !self.layers.is_loaded() || !self.frames.take_pending() {
            return false;
        }
        let (base, mask, display) = self.layers.composite_targets();
        if let Err(err) = self.renderer.render(base, mask, display) {
            tracing::warn!(error = %err, "composite failed");
            return false;
        }
        true
    }

    /// Straight-alpha PNG of the current display layer.
    pub fn display_png(&self) -> CutoutResult<Vec<u8>> {
        let display = self.layers.display();
        let mut rgba = display.data().to_vec();
        unpremultiply_rgba8_in_place(&mut rgba);
        encode_png_rgba8(display.width(), display.height(), rgba)
    }

    /// Load a user-selected file: fit it to the upload budget, decode it into fresh layers and
    /// issue the auto-remove request.
    #[tracing::instrument(skip(self, file), fields(name = %file.name, size = file.size()))]
    pub fn load_file(&mut self, file: SourceFile) -> Result<RemoteTicket, Alert> {
        let file = self.adapter.adapt(&file, self.config.size.max_upload_bytes);
        let image =
            Image::decode(file.bytes()).map_err(|e| Alert::new("Could not open image: ", e))?;

        self.layers.load_base(&image);
        self.generation += 1;
        self.source = Some(file.clone());
        self.result_png = None;
        self.frames.request();

        Ok(RemoteTicket {
            id: self.issue(),
            kind: TicketKind::AutoRemove,
            generation: self.generation,
            file,
            mask_png: None,
        })
    }

    /// Decode an image and load it without issuing any request (local preview).
    pub fn load_local(&mut self, file: SourceFile) -> Result<(), Alert> {
        let ticket = self.load_file(file)?;
        self.outstanding.remove(&ticket.id);
        tracing::debug!(generation = ticket.generation, "loaded without auto-remove");
        Ok(())
    }

    /// Validate refine preconditions, export the mask and issue the refine request.
    pub fn begin_refine(&mut self) -> Result<RemoteTicket, Alert> {
        if self.is_loading() {
            return Err(Alert::new("", CutoutError::Busy));
        }
        let Some(file) = self.source.clone() else {
            return Err(Alert::new("", CutoutError::NoSource));
        };
        let mask_png = self
            .layers
            .mask()
            .encode_png()
            .map_err(|e| Alert::new("Error: ", e))?;

        self.result_png = None;
        Ok(RemoteTicket {
            id: self.issue(),
            kind: TicketKind::Refine,
            generation: self.generation,
            file,
            mask_png: Some(mask_png),
        })
    }

    fn issue(&mut self) -> u64 {
        self.next_ticket += 1;
        self.outstanding.insert(self.next_ticket);
        self.next_ticket
    }

    /// Settle a request. Always clears its loading mark; applies the reply only if no newer
    /// image was loaded since the ticket was issued.
    ///
    /// A ticket that is no longer outstanding is ignored and reported as stale.
    pub fn finish(
        &mut self,
        ticket: RemoteTicket,
        reply: CutoutResult<Vec<u8>>,
    ) -> Result<RemoteOutcome, Alert> {
        if !self.outstanding.remove(&ticket.id) {
            tracing::debug!(ticket = ticket.id, "ignoring an already settled ticket");
            return Ok(RemoteOutcome::Stale);
        }

        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping reply for a replaced image"
            );
            return Ok(RemoteOutcome::Stale);
        }

        let prefix = match ticket.kind {
            TicketKind::AutoRemove => "Auto background removal failed: ",
            TicketKind::Refine => "Error: ",
        };
        let png = reply.map_err(|e| Alert::new(prefix, e))?;
        let image = Image::decode(&png).map_err(|e| Alert::new(prefix, e))?;
        self.layers
            .replace_base(&image)
            .map_err(|e| Alert::new(prefix, e))?;
        self.result_png = Some(png);
        self.frames.request();
        Ok(RemoteOutcome::Applied)
    }

    /// Issue, send and settle the auto-remove request for `file`.
    pub fn load_and_auto_remove<T: Transport>(
        &mut self,
        file: SourceFile,
        pipeline: &mut RemoteRefinePipeline<T>,
    ) -> Result<RemoteOutcome, Alert> {
        let ticket = self.load_file(file)?;
        let reply = ticket.send(pipeline);
        self.finish(ticket, reply)
    }

    /// Issue, send and settle a refine request.
    pub fn refine_with<T: Transport>(
        &mut self,
        pipeline: &mut RemoteRefinePipeline<T>,
    ) -> Result<RemoteOutcome, Alert> {
        let ticket = self.begin_refine()?;
        let reply = ticket.send(pipeline);
        self.finish(ticket, reply)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
