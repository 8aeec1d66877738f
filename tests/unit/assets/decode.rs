use std::io::Cursor;

use super::*;

fn png_bytes(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100u8, 50u8, 200u8, 128u8]).unwrap();
    let prepared = decode_image(&png_bytes(img)).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn fully_transparent_pixels_drop_color() {
    let img = image::RgbaImage::from_raw(1, 1, vec![255u8, 255, 255, 0]).unwrap();
    let prepared = decode_image(&png_bytes(img)).unwrap();
    assert_eq!(prepared.rgba8_premul.as_slice(), &[0, 0, 0, 0]);
}

#[tokio::test]
async fn decode_layer_tags_failures_with_layer() {
    let err = decode_layer(Layer::Signature, Arc::new(b"not an image".to_vec()))
        .await
        .unwrap_err();
    match err {
        PledgeError::Decode { layer, .. } => assert_eq!(layer, Layer::Signature),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn decode_layer_returns_raster() {
    let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
    let raster = decode_layer(Layer::Photo, Arc::new(png_bytes(img)))
        .await
        .unwrap();
    assert_eq!((raster.width, raster.height), (3, 2));
    assert_eq!(raster.pixel(2, 1), Some([10, 20, 30, 255]));
}
