use std::io::Cursor;

use super::*;
use crate::remote::transport::{Endpoint, HttpReply, ScriptedTransport};

fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn white_file(width: u32, height: u32) -> SourceFile {
    SourceFile::new("white.png", "image/png", png(width, height, [255; 4]))
}

fn session() -> EditorSession {
    EditorSession::new(EditorConfig::default())
}

#[test]
fn load_sizes_layers_and_marks_loading() {
    let mut s = session();
    let ticket = s.load_file(white_file(120, 80)).unwrap();

    assert_eq!(ticket.kind(), TicketKind::AutoRemove);
    assert_eq!(ticket.generation(), 1);
    assert!(ticket.mask_png().is_none());
    assert!(s.is_loading());
    assert!(!s.can_refine());
    assert_eq!(s.layers().size(), (120, 80));
    assert!(s.layers().mask().data().iter().all(|&v| v == 0));

    assert!(s.on_animation_frame());
    assert_eq!(s.layers().display().pixel(0, 0), Some([234, 201, 201, 255]));
    assert!(!s.on_animation_frame());
}

#[test]
fn undecodable_file_is_reported_and_nothing_is_loaded() {
    let mut s = session();
    let alert = s
        .load_file(SourceFile::new("x.png", "image/png", b"nope".to_vec()))
        .unwrap_err();
    assert!(alert.message().starts_with("Could not open image: "));
    assert!(!s.is_loading());
    assert_eq!(s.generation(), 0);
    assert!(s.source().is_none());
}

#[test]
fn refine_without_image_alerts_and_sends_nothing() {
    let mut s = session();
    let mut p = RemoteRefinePipeline::new(ScriptedTransport::new(), s.config().size);
    let alert = s.refine_with(&mut p).unwrap_err();
    assert_eq!(alert.message(), "Upload or use the sample image first.");
    assert!(matches!(alert.cause(), CutoutError::NoSource));
    assert!(p.transport().requests().is_empty());
}

#[test]
fn refine_is_refused_while_a_request_is_outstanding() {
    let mut s = session();
    let _ticket = s.load_file(white_file(10, 10)).unwrap();
    let alert = s.begin_refine().unwrap_err();
    assert!(matches!(alert.cause(), CutoutError::Busy));
}

#[test]
fn settling_a_ticket_twice_keeps_other_requests_outstanding() {
    let mut s = session();
    let ticket = s.load_file(white_file(10, 10)).unwrap();
    let duplicate = RemoteTicket {
        id: ticket.id,
        kind: ticket.kind,
        generation: ticket.generation,
        file: ticket.file.clone(),
        mask_png: None,
    };

    s.finish(duplicate, Err(CutoutError::network("down")))
        .unwrap_err();
    assert!(!s.is_loading());

    let refine = s.begin_refine().unwrap();
    let again = RemoteTicket {
        id: ticket.id,
        kind: ticket.kind,
        generation: ticket.generation,
        file: ticket.file.clone(),
        mask_png: None,
    };
    assert_eq!(
        s.finish(again, Err(CutoutError::network("down"))).unwrap(),
        RemoteOutcome::Stale
    );
    assert!(s.is_loading());
    assert!(!s.can_refine());
    assert!(matches!(
        s.begin_refine().unwrap_err().cause(),
        CutoutError::Busy
    ));

    s.finish(refine, Err(CutoutError::network("down")))
        .unwrap_err();
    assert!(!s.is_loading());
}

#[test]
fn failed_auto_remove_clears_loading_and_keeps_the_image() {
    let mut s = session();
    let ticket = s.load_file(white_file(10, 10)).unwrap();
    let alert = s
        .finish(ticket, Err(CutoutError::network("connection refused")))
        .unwrap_err();

    assert!(
        alert
            .message()
            .starts_with("Auto background removal failed: ")
    );
    assert!(!s.is_loading());
    assert!(s.can_refine());
    assert_eq!(s.layers().base().pixel(3, 3), Some([255; 4]));
}

#[test]
fn cutout_reply_is_stretched_into_the_base_layer() {
    let mut s = session();
    let ticket = s.load_file(white_file(40, 20)).unwrap();
    let reply = png(10, 10, [0, 0, 0, 0]);
    assert_eq!(
        s.finish(ticket, Ok(reply.clone())).unwrap(),
        RemoteOutcome::Applied
    );

    assert_eq!(s.layers().size(), (40, 20));
    assert_eq!(s.layers().base().pixel(39, 19), Some([0, 0, 0, 0]));
    assert_eq!(s.result_png(), Some(reply.as_slice()));
    assert!(!s.is_loading());
}

#[test]
fn reply_for_a_replaced_image_is_dropped() {
    let mut s = session();
    let first = s.load_file(white_file(10, 10)).unwrap();
    let second = s.load_file(white_file(30, 30)).unwrap();
    assert_eq!(second.generation(), 2);

    let outcome = s.finish(first, Ok(png(10, 10, [0, 0, 0, 0]))).unwrap();
    assert_eq!(outcome, RemoteOutcome::Stale);
    assert_eq!(s.layers().size(), (30, 30));
    assert_eq!(s.layers().base().pixel(0, 0), Some([255; 4]));
    assert!(s.is_loading());

    s.finish(second, Err(CutoutError::network("down")))
        .unwrap_err();
    assert!(!s.is_loading());
}

#[test]
fn painted_mask_reaches_the_refine_request() {
    let mut s = session();
    s.resize_container(Rect::new(0.0, 0.0, 200.0, 300.0));
    let mut t = ScriptedTransport::new();
    t.push_reply(HttpReply::png(png(100, 100, [10, 20, 30, 255])))
        .push_reply(HttpReply::png(png(100, 100, [0, 0, 0, 0])));
    let mut p = RemoteRefinePipeline::new(t, s.config().size);

    s.load_and_auto_remove(white_file(100, 100), &mut p).unwrap();
    s.set_brush_diameter(20.0);
    s.pointer_down(PointerEvent::new(1, 100.0, 100.0));
    s.pointer_up(PointerEvent::new(1, 100.0, 100.0));
    assert_eq!(s.layers().mask().value(50, 50), Some(255));

    assert_eq!(s.refine_with(&mut p).unwrap(), RemoteOutcome::Applied);
    let reqs = p.transport().requests();
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[1].endpoint, Endpoint::Refine);

    let mask = image::load_from_memory(&reqs[1].parts[1].bytes)
        .unwrap()
        .to_luma8();
    assert_eq!(mask.dimensions(), (100, 100));
    assert_eq!(mask.get_pixel(50, 50).0, [255]);
    assert_eq!(mask.get_pixel(5, 5).0, [0]);
    assert_eq!(s.layers().base().pixel(50, 50), Some([0, 0, 0, 0]));
}

#[test]
fn bursts_of_pointer_moves_render_once_per_frame() {
    let mut s = session();
    s.load_local(white_file(64, 64)).unwrap();
    s.resize_container(Rect::new(0.0, 0.0, 64.0, 64.0));
    assert!(s.on_animation_frame());

    s.pointer_down(PointerEvent::new(1, 10.0, 10.0));
    for x in 11..40 {
        s.pointer_move(PointerEvent::new(1, f64::from(x), 10.0));
    }
    assert!(s.on_animation_frame());
    assert!(!s.on_animation_frame());

    let stats = s.frame_stats();
    assert_eq!(stats.rendered, 2);
    assert!(stats.coalesced >= 29);
}

#[test]
fn clear_zeroes_the_mask_and_schedules_a_render() {
    let mut s = session();
    s.load_local(white_file(20, 20)).unwrap();
    s.resize_container(Rect::new(0.0, 0.0, 20.0, 20.0));
    s.on_animation_frame();
    s.pointer_down(PointerEvent::new(1, 10.0, 10.0));
    s.pointer_up(PointerEvent::new(1, 10.0, 10.0));
    s.on_animation_frame();

    s.clear_mask();
    assert!(s.layers().mask().data().iter().all(|&v| v == 0));
    assert!(s.on_animation_frame());
    assert_eq!(s.layers().display().pixel(10, 10), Some([234, 201, 201, 255]));
}
