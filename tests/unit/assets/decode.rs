use super::*;

fn png_bytes(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_png_dimensions_and_premul_copy() {
    let src = image::RgbaImage::from_raw(1, 1, vec![100u8, 50u8, 200u8, 128u8]).unwrap();
    let img = Image::decode(&png_bytes(src)).unwrap();
    assert_eq!((img.width(), img.height()), (1, 1));
    assert_eq!(img.as_rgba().as_raw(), &[100, 50, 200, 128]);
    assert_eq!(
        img.to_premul_rgba8(1, 1),
        vec![
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_rejects_garbage() {
    assert!(matches!(
        Image::decode(b"definitely not an image"),
        Err(CutoutError::Decode(_))
    ));
}

#[test]
fn premul_copy_resamples_to_requested_size() {
    let src = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
    let img = Image::from_rgba(src).unwrap();
    let data = img.to_premul_rgba8(8, 4);
    assert_eq!(data.len(), 8 * 4 * 4);
    assert!(data.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
}

#[test]
fn zero_sized_images_are_rejected() {
    assert!(Image::from_rgba(image::RgbaImage::new(0, 3)).is_err());
}

#[test]
fn encode_png_roundtrips_through_decode() {
    let png = encode_png_rgba8(2, 1, vec![1, 2, 3, 255, 4, 5, 6, 255]).unwrap();
    let img = Image::decode(&png).unwrap();
    assert_eq!(img.as_rgba().as_raw(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    assert!(encode_png_rgba8(2, 2, vec![0; 4]).is_err());
}
