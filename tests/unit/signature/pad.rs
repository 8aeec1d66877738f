use super::*;
use crate::assets::decode::decode_image;

fn mounted_pad() -> SignaturePad {
    let mut pad = SignaturePad::new(PadConfig::default());
    pad.mount(PixelSize::new(300, 100));
    pad
}

#[test]
fn unmounted_pad_ignores_everything() {
    let mut pad = SignaturePad::new(PadConfig::default());
    pad.begin_stroke(Point::new(10.0, 10.0));
    pad.extend_stroke(Point::new(50.0, 50.0));
    assert_eq!(pad.end_stroke(), None);
    assert!(!pad.has_ink());
    pad.clear();
    assert!(pad.snapshot().is_none());
}

#[test]
fn end_stroke_produces_transparent_png_with_ink() {
    let mut pad = mounted_pad();
    pad.begin_stroke(Point::new(10.0, 50.0));
    pad.extend_stroke(Point::new(290.0, 50.0));
    let png = pad.end_stroke().expect("snapshot after a stroke");
    assert_eq!(png.format, crate::assets::raster::EncodedFormat::Png);

    let img = decode_image(&png.bytes).unwrap();
    assert_eq!((img.width, img.height), (600, 200));
    // Corner stays transparent.
    assert_eq!(img.pixel(0, 0), Some([0, 0, 0, 0]));
    // Display (150, 50) maps to buffer (300, 100), which is on the line.
    let on_line = img.pixel(300, 100).unwrap();
    assert!(on_line[3] > 200, "ink alpha {on_line:?}");
}

#[test]
fn display_points_are_rescaled_into_buffer_space() {
    let mut pad = mounted_pad();
    pad.begin_stroke(Point::new(100.0, 10.0));
    pad.extend_stroke(Point::new(100.0, 90.0));
    let img = decode_image(&pad.end_stroke().unwrap().bytes).unwrap();
    // x=100 on a 300px display is x=200 in the 600px buffer.
    assert!(img.pixel(200, 100).unwrap()[3] > 200);
    assert_eq!(img.pixel(100, 100).unwrap()[3], 0);
}

#[test]
fn single_point_renders_a_dot() {
    let mut pad = mounted_pad();
    pad.begin_stroke(Point::new(150.0, 50.0));
    let img = decode_image(&pad.end_stroke().unwrap().bytes).unwrap();
    assert!(img.pixel(300, 100).unwrap()[3] > 0);
}

#[test]
fn clear_then_end_stroke_is_absent() {
    let mut pad = mounted_pad();
    pad.begin_stroke(Point::new(10.0, 10.0));
    pad.extend_stroke(Point::new(20.0, 20.0));
    assert!(pad.end_stroke().is_some());

    pad.clear();
    assert!(pad.snapshot().is_none());
    assert!(!pad.has_ink());
    assert_eq!(pad.end_stroke(), None);
}

#[test]
fn move_without_press_is_ignored() {
    let mut pad = mounted_pad();
    pad.extend_stroke(Point::new(10.0, 10.0));
    assert!(!pad.has_ink());
    assert_eq!(pad.end_stroke(), None);
}

#[test]
fn end_without_active_stroke_keeps_snapshot() {
    let mut pad = mounted_pad();
    pad.begin_stroke(Point::new(10.0, 10.0));
    pad.extend_stroke(Point::new(60.0, 10.0));
    let first = pad.end_stroke().unwrap();
    assert_eq!(pad.end_stroke(), Some(first));
}

#[test]
fn ink_survives_unmount_and_remount() {
    let mut pad = mounted_pad();
    pad.begin_stroke(Point::new(10.0, 10.0));
    pad.extend_stroke(Point::new(60.0, 10.0));
    pad.end_stroke();
    pad.unmount();
    assert!(pad.has_ink());
    pad.mount(PixelSize::new(600, 200));
    assert!(pad.snapshot().is_some());
}

#[test]
fn ink_color_is_applied() {
    let mut pad = mounted_pad();
    pad.begin_stroke(Point::new(20.0, 50.0));
    pad.extend_stroke(Point::new(280.0, 50.0));
    pad.end_stroke();
    let raster = pad.raster().unwrap();
    let [r, g, b, a] = raster.pixel(300, 100).unwrap();
    assert_eq!(a, 255);
    assert!(r.abs_diff(0x1e) <= 2 && g.abs_diff(0x3a) <= 2 && b.abs_diff(0x8a) <= 2);
}
