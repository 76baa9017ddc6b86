//! Cutout is the engine behind a background-removal mask editor.
//!
//! The crate holds everything below the page: pixel layers, pointer-to-mask drawing, per-frame
//! compositing and the upload / remove / refine round trips against an external
//! background-removal service. A small contact-form relay rides along.
//!
//! - Create an [`EditorSession`] and lay it out with [`EditorSession::resize_container`]
//! - Load a [`SourceFile`]; settle the returned [`RemoteTicket`] through a
//!   [`RemoteRefinePipeline`]
//! - Feed pointer events, call [`EditorSession::on_animation_frame`] once per display refresh
//! - Refine with the painted mask via [`EditorSession::refine_with`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod adapt;
pub(crate) mod config;
pub(crate) mod contact;
pub(crate) mod draw;
pub(crate) mod layers;
pub(crate) mod remote;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::foundation::core::{
    Point, Rect, Rgba8Premul, SourceFile, content_type_for_name,
};
pub use crate::foundation::error::{CutoutError, CutoutResult};

pub use crate::adapt::size::{ImageSizeAdapter, fit_within};
pub use crate::assets::decode::Image;
pub use crate::config::{
    API_URL_ENV, BrushConfig, EditorConfig, EndpointConfig, SizePolicy, TintConfig,
};
pub use crate::contact::mail::{HttpMailTransport, MailConfig, MailMessage, MailTransport};
pub use crate::contact::relay::{ContactBody, ContactRelay, ContactReply, ContactSubmission};
pub use crate::draw::controller::{
    BrushSettings, DrawMode, DrawState, PointerDrawingController, PointerEvent, PointerSurface,
    map_to_pixels,
};
pub use crate::draw::viewport::{SquareSurface, fit_square};
pub use crate::layers::store::{LayerStore, MaskLayer, RgbaLayer};
pub use crate::remote::pipeline::{RemoteRefinePipeline, RequestState};
pub use crate::remote::transport::{
    Endpoint, FormPart, HttpReply, HttpTransport, RecordedRequest, ScriptedTransport, Transport,
};
pub use crate::render::composite::CompositeRenderer;
pub use crate::render::frame::{FrameScheduler, FrameStats};
pub use crate::session::editor::{
    Alert, EditorSession, RemoteOutcome, RemoteTicket, TicketKind,
};
pub use crate::session::strokes::{Stroke, StrokeScript};
