use std::io::Cursor;

use super::*;
use crate::config::EditorConfig;
use crate::foundation::core::{Rect, SourceFile};

fn loaded_session(width: u32, height: u32, container: Rect) -> EditorSession {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 200, 200, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    let mut s = EditorSession::new(EditorConfig::default());
    s.load_local(SourceFile::new("grey.png", "image/png", buf))
        .unwrap();
    s.resize_container(container);
    s
}

#[test]
fn parses_modes_and_optional_diameter() {
    let script = StrokeScript::from_json_str(
        r#"{"strokes":[
            {"mode":"pencil","diameter":10,"points":[[1,2],[3,4]]},
            {"mode":"eraser","points":[[5,5]]},
            {"points":[[0,0]]}
        ]}"#,
    )
    .unwrap();
    assert_eq!(script.strokes.len(), 3);
    assert_eq!(script.strokes[0].diameter, Some(10.0));
    assert_eq!(script.strokes[1].mode, DrawMode::Eraser);
    assert_eq!(script.strokes[2].mode, DrawMode::Pencil);
}

#[test]
fn rejects_empty_strokes_and_unknown_fields() {
    assert!(StrokeScript::from_json_str(r#"{"strokes":[{"points":[]}]}"#).is_err());
    assert!(StrokeScript::from_json_str(r#"{"strokes":[],"extra":1}"#).is_err());
    assert!(StrokeScript::from_json_str(r#"{"strokes":[{"mode":"marker","points":[[0,0]]}]}"#).is_err());
}

#[test]
fn replay_paints_in_pixel_space_on_a_non_square_image() {
    // 200x100 pixels shown through a 50x50 CSS square.
    let mut s = loaded_session(200, 100, Rect::new(10.0, 10.0, 60.0, 200.0));
    let script = StrokeScript::from_json_str(
        r#"{"strokes":[{"mode":"pencil","diameter":10,"points":[[20,50],[180,50]]}]}"#,
    )
    .unwrap();
    script.replay(&mut s).unwrap();

    let mask = s.layers().mask();
    for x in 20..=180 {
        assert_eq!(mask.value(x, 50), Some(255), "gap at x={x}");
    }
    assert_eq!(mask.value(100, 40), Some(0));
    assert_eq!(mask.value(5, 50), Some(0));
    assert!(!s.is_drawing());
}

#[test]
fn eraser_stroke_removes_earlier_paint() {
    let mut s = loaded_session(100, 100, Rect::new(0.0, 0.0, 100.0, 100.0));
    let script = StrokeScript::from_json_str(
        r#"{"strokes":[
            {"mode":"pencil","diameter":40,"points":[[50,50]]},
            {"mode":"eraser","diameter":10,"points":[[50,50]]}
        ]}"#,
    )
    .unwrap();
    script.replay(&mut s).unwrap();
    assert_eq!(s.layers().mask().value(50, 50), Some(0));
    assert_eq!(s.layers().mask().value(50, 65), Some(255));
    assert_eq!(s.brush().mode, DrawMode::Eraser);
}

#[test]
fn replay_needs_a_laid_out_surface() {
    let mut s = EditorSession::new(EditorConfig::default());
    let script = StrokeScript::from_json_str(r#"{"strokes":[{"points":[[1,1]]}]}"#).unwrap();
    assert!(matches!(
        script.replay(&mut s),
        Err(CutoutError::Validation(_))
    ));
}
