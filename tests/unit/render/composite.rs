use super::*;
use crate::assets::decode::Image;
use crate::layers::store::LayerStore;

fn loaded_store(width: u32, height: u32, px: [u8; 4]) -> LayerStore {
    let img =
        Image::from_rgba(image::RgbaImage::from_pixel(width, height, image::Rgba(px))).unwrap();
    let mut store = LayerStore::new();
    store.load_base(&img);
    store
}

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src, 1.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn remove_alpha_is_28_percent_of_inverse_mask() {
    assert_eq!(remove_alpha(0, 0.28), 71);
    assert_eq!(remove_alpha(255, 0.28), 0);
    assert_eq!(remove_alpha(155, 0.28), 28);
}

#[test]
fn tint_tables_follow_mask_intensity() {
    let r = CompositeRenderer::new(TintConfig::default());
    assert_eq!(r.keep_tint(255), [0, 200, 150, 255]);
    assert_eq!(r.keep_tint(0)[3], 0);
    assert_eq!(r.remove_tint(255)[3], 0);
    assert_eq!(r.remove_tint(0), [50, 17, 17, 71]);
}

#[test]
fn unmasked_pixels_get_red_wash_and_kept_pixels_get_green_wash() {
    let mut store = loaded_store(2, 1, [255, 255, 255, 255]);
    store.mask_mut().row_mut(0)[1] = 255;

    let renderer = CompositeRenderer::new(TintConfig::default());
    let (base, mask, display) = store.composite_targets();
    renderer.render(base, mask, display).unwrap();

    assert_eq!(store.display().pixel(0, 0), Some([234, 201, 201, 255]));
    assert_eq!(store.display().pixel(1, 0), Some([166, 236, 218, 255]));
}

#[test]
fn render_is_idempotent() {
    let mut store = loaded_store(16, 8, [40, 90, 160, 200]);
    for x in 3..9 {
        store.mask_mut().row_mut(4)[x] = 255;
    }
    let renderer = CompositeRenderer::new(TintConfig::default());

    let (base, mask, display) = store.composite_targets();
    renderer.render(base, mask, display).unwrap();
    let first = store.display().data().to_vec();

    let (base, mask, display) = store.composite_targets();
    renderer.render(base, mask, display).unwrap();
    assert_eq!(store.display().data(), first.as_slice());
}

#[test]
fn mismatched_layer_sizes_are_rejected() {
    let mut a = loaded_store(4, 4, [0, 0, 0, 255]);
    let b = loaded_store(2, 2, [0, 0, 0, 255]);
    let renderer = CompositeRenderer::new(TintConfig::default());
    let (_, _, display) = a.composite_targets();
    assert!(renderer.render(b.base(), b.mask(), display).is_err());
}
