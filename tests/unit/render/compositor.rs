use std::io::Cursor;

use super::*;
use crate::assets::source::MemorySource;
use crate::foundation::error::ErrorKind;
use crate::foundation::core::Point;

fn png(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    png(image::RgbaImage::from_pixel(w, h, image::Rgba(rgba)))
}

fn compositor(template: Vec<u8>) -> Compositor {
    Compositor::new(
        Arc::new(MemorySource::new("template", template)),
        CertificateStyle::from_config(&CampaignConfig::default()).unwrap(),
    )
}

#[test]
fn cover_fixes_the_shorter_side_to_the_diameter() {
    let clip = Circle::new(Point::new(100.0, 100.0), 10.0);

    let landscape = cover_transform(400.0, 200.0, clip);
    let bounds = landscape.transform_rect_bbox(Rect::new(0.0, 0.0, 400.0, 200.0));
    assert!((bounds.height() - 20.0).abs() < 1e-9);
    assert!((bounds.width() - 40.0).abs() < 1e-9);
    assert!((bounds.center().x - 100.0).abs() < 1e-9);

    let portrait = cover_transform(100.0, 300.0, clip);
    let bounds = portrait.transform_rect_bbox(Rect::new(0.0, 0.0, 100.0, 300.0));
    assert!((bounds.width() - 20.0).abs() < 1e-9);
    assert!((bounds.height() - 60.0).abs() < 1e-9);
    assert!((bounds.center().y - 100.0).abs() < 1e-9);
}

#[test]
fn stretch_maps_onto_the_box_exactly() {
    let target = Rect::new(10.0, 20.0, 70.0, 50.0);
    let t = stretch_transform(600.0, 200.0, target);
    let bounds = t.transform_rect_bbox(Rect::new(0.0, 0.0, 600.0, 200.0));
    assert!((bounds.x0 - 10.0).abs() < 1e-9 && (bounds.y0 - 20.0).abs() < 1e-9);
    assert!((bounds.x1 - 70.0).abs() < 1e-9 && (bounds.y1 - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn stages_run_in_order_and_skip_absent_layers() {
    let c = compositor(solid(200, 150, [255, 255, 255, 255]));

    let mut stages = Vec::new();
    let record = PledgeRecord::new("Jane")
        .with_photo(EncodedImage::png(solid(8, 8, [255, 0, 0, 255])))
        .with_signature(EncodedImage::png(solid(6, 2, [0, 0, 255, 255])));
    c.compose_with_progress(&record, |s| stages.push(s))
        .await
        .unwrap();
    assert_eq!(
        stages,
        vec![
            CompositorStage::LoadTemplate,
            CompositorStage::DrawBackground,
            CompositorStage::DrawName,
            CompositorStage::DrawPhoto,
            CompositorStage::DrawSignature,
            CompositorStage::Encode,
            CompositorStage::Done,
        ]
    );

    let mut stages = Vec::new();
    c.compose_with_progress(&PledgeRecord::new("Jane"), |s| stages.push(s))
        .await
        .unwrap();
    assert_eq!(
        stages,
        vec![
            CompositorStage::LoadTemplate,
            CompositorStage::DrawBackground,
            CompositorStage::DrawName,
            CompositorStage::Encode,
            CompositorStage::Done,
        ]
    );
}

#[tokio::test]
async fn background_is_the_template_pixels() {
    let c = compositor(solid(40, 30, [10, 20, 30, 255]));
    let frame = c.render(&PledgeRecord::default()).await.unwrap();
    assert_eq!(frame.image.size(), crate::foundation::core::PixelSize::new(40, 30));
    assert_eq!(frame.image.pixel(0, 0), Some([10, 20, 30, 255]));
    assert_eq!(frame.image.pixel(39, 29), Some([10, 20, 30, 255]));
}

#[tokio::test]
async fn signature_without_photo_uses_the_fallback_box() {
    let c = compositor(solid(1000, 1000, [255, 255, 255, 255]));
    let record = PledgeRecord::default()
        .with_signature(EncodedImage::png(solid(10, 10, [0, 0, 255, 255])));
    let frame = c.render(&record).await.unwrap();

    // Fallback box center: (57.8 + 11)%, (60.5 + 5.25)% of 1000.
    let ink = frame.image.pixel(688, 657).unwrap();
    assert!(ink[0] <= 2 && ink[1] <= 2 && ink[2] >= 253, "signature pixel {ink:?}");
    // Center of the regular box (66%, 75%) lies outside the fallback box.
    assert_eq!(frame.image.pixel(660, 750), Some([255, 255, 255, 255]));
}

#[tokio::test]
async fn photo_decode_failure_is_tagged_with_its_layer() {
    let c = compositor(solid(20, 20, [255, 255, 255, 255]));
    let record = PledgeRecord::new("Jane").with_photo(EncodedImage::jpeg(vec![1, 2, 3]));
    let err = c.compose(&record).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(matches!(
        err,
        PledgeError::Decode {
            layer: Layer::Photo,
            ..
        }
    ));
}

#[tokio::test]
async fn unreadable_template_is_a_template_decode_error() {
    let c = Compositor::new(
        Arc::new(crate::assets::source::FileSource::new("no/such/template.jpg")),
        CertificateStyle::from_config(&CampaignConfig::default()).unwrap(),
    );
    let err = c.compose(&PledgeRecord::new("Jane")).await.unwrap_err();
    assert!(matches!(
        err,
        PledgeError::Decode {
            layer: Layer::Template,
            ..
        }
    ));
    assert_eq!(
        err.user_message(),
        "Error loading certificate image. Please try again."
    );
}

#[test]
fn configured_name_font_is_read_when_the_style_is_built() {
    let config = CampaignConfig {
        name_font: Some("no/such/font.ttf".into()),
        ..CampaignConfig::default()
    };
    let err = CertificateStyle::from_config(&config).unwrap_err();
    assert!(err.to_string().contains("no/such/font.ttf"), "{err}");

    let style = CertificateStyle::from_config(&CampaignConfig::default()).unwrap();
    assert_eq!(
        style.name_font,
        FontChoice::Family("Barlow, sans-serif".to_string())
    );
}
