use super::*;
use crate::camera::session::CameraConfig;
use crate::camera::still::StillFrameDevices;
use crate::config::FlowVariant;
use crate::foundation::error::ErrorKind;
use crate::wizard::analytics::RecordingSink;

fn wizard() -> PledgeWizard {
    PledgeWizard::new(Arc::new(CampaignConfig::default()))
}

fn devices() -> StillFrameDevices {
    StillFrameDevices::new(image::RgbaImage::from_pixel(
        32,
        24,
        image::Rgba([10, 120, 10, 255]),
    ))
}

fn certificate(byte: u8) -> GeneratedCertificate {
    GeneratedCertificate::new(EncodedImage::jpeg(vec![byte; 8]), PixelSize::new(4, 4))
}

fn fill_name(w: &mut PledgeWizard, name: &str) {
    w.open_dialog(Dialog::Name).unwrap();
    w.set_name_draft(name).unwrap();
    w.confirm_name().unwrap();
}

fn fill_signature(w: &mut PledgeWizard) {
    w.open_dialog(Dialog::Signature).unwrap();
    let pad = w.signature_pad_mut().unwrap();
    pad.begin_stroke(Point::new(10.0, 10.0));
    pad.extend_stroke(Point::new(200.0, 80.0));
    w.confirm_signature().unwrap();
}

async fn fill_photo(w: &mut PledgeWizard, dev: &StillFrameDevices) {
    w.open_dialog(Dialog::Photo).unwrap();
    let ticket = w.request_camera().unwrap();
    let session = CameraSession::open(dev, ticket.facing(), &CameraConfig::default()).await;
    assert!(w.camera_opened(ticket, session).unwrap());
    w.capture_photo().unwrap();
}

#[test]
fn flow_variants_pick_the_first_screen() {
    assert_eq!(wizard().step(), Step::Intro);
    let cfg = CampaignConfig {
        flow: FlowVariant::EditorFirst,
        ..CampaignConfig::default()
    };
    let w = PledgeWizard::new(Arc::new(cfg));
    assert_eq!(w.step(), Step::Editor);
}

#[test]
fn name_draft_is_not_committed_until_confirmed() {
    let mut w = wizard();
    w.start().unwrap();
    w.open_dialog(Dialog::Name).unwrap();
    w.set_name_draft("  Jane Doe ").unwrap();
    assert_eq!(w.record().name, "");
    w.close_dialog();
    assert_eq!(w.record().name, "");

    fill_name(&mut w, "  Jane Doe ");
    assert_eq!(w.record().name, "Jane Doe");
    assert_eq!(w.dialog(), None);
}

#[test]
fn blank_name_cannot_be_confirmed() {
    let mut w = wizard();
    w.start().unwrap();
    w.open_dialog(Dialog::Name).unwrap();
    w.set_name_draft("   ").unwrap();
    let err = w.confirm_name().unwrap_err();
    assert_eq!(err.missing_fields(), &[RecordField::Name]);
    assert_eq!(w.dialog(), Some(Dialog::Name));
}

#[test]
fn submit_with_empty_name_names_the_field_and_stays_on_editor() {
    let mut w = wizard();
    w.start().unwrap();
    fill_signature(&mut w);
    let err = w.submit().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.missing_fields(), &[RecordField::Name, RecordField::Photo]);
    assert!(err.to_string().contains("name"));
    assert_eq!(w.step(), Step::Editor);
    assert!(!w.is_composing());
}

#[test]
fn signature_requires_ink() {
    let mut w = wizard();
    w.start().unwrap();
    w.open_dialog(Dialog::Signature).unwrap();
    let err = w.confirm_signature().unwrap_err();
    assert_eq!(err.missing_fields(), &[RecordField::Signature]);

    let pad = w.signature_pad_mut().unwrap();
    pad.begin_stroke(Point::new(5.0, 5.0));
    pad.end_stroke();
    w.clear_signature().unwrap();
    assert!(w.confirm_signature().is_err());
    assert!(w.record().signature.is_none());
}

#[test]
fn external_signature_images_can_be_committed() {
    let mut w = wizard();
    w.start().unwrap();
    assert!(w.confirm_signature_image(EncodedImage::png(vec![1])).is_err());
    w.open_dialog(Dialog::Signature).unwrap();
    let err = w.confirm_signature_image(EncodedImage::png(Vec::new())).unwrap_err();
    assert_eq!(err.missing_fields(), &[RecordField::Signature]);
    w.confirm_signature_image(EncodedImage::png(vec![1, 2])).unwrap();
    assert_eq!(w.record().signature, Some(EncodedImage::png(vec![1, 2])));
    assert_eq!(w.dialog(), None);
}

#[test]
fn pad_is_only_reachable_while_its_dialog_is_open() {
    let mut w = wizard();
    w.start().unwrap();
    assert!(w.signature_pad_mut().is_none());
    w.open_dialog(Dialog::Signature).unwrap();
    assert!(w.signature_pad_mut().is_some());
    w.open_dialog(Dialog::Name).unwrap();
    assert!(w.signature_pad_mut().is_none());
}

#[test]
fn clicks_on_the_template_open_dialogs() {
    let mut w = wizard();
    w.start().unwrap();
    let displayed = PixelSize::new(1000, 750);
    let hit = w.click(Point::new(500.0, 300.0), displayed).unwrap();
    assert_eq!(hit, Some(Dialog::Name));
    assert_eq!(w.dialog(), Some(Dialog::Name));
    assert_eq!(w.click(Point::new(5.0, 5.0), displayed).unwrap(), None);
}

#[tokio::test]
async fn full_flow_reaches_complete_and_downloads() {
    let dev = devices();
    let sink = Arc::new(RecordingSink::new());
    let mut w = wizard().with_analytics(sink.clone());
    w.start().unwrap();
    fill_name(&mut w, "Jane Doe");
    fill_photo(&mut w, &dev).await;
    fill_signature(&mut w);
    assert_eq!(dev.live_streams(), 0);
    assert_eq!(w.progress().fields_done, 3);

    assert!(w.download().is_err());
    let ticket = w.submit().unwrap();
    assert!(w.finish_compose(ticket, Ok(certificate(1))).unwrap());
    assert_eq!(w.step(), Step::Complete);
    assert_eq!(sink.events().len(), 1);
    assert_eq!(sink.events()[0].name(), "generate_certificate");

    let dl = w.download().unwrap();
    assert_eq!(dl.file_name, "Arthritis_Pledge_Certificate_Jane_Doe.jpg");

    w.finish().unwrap();
    assert_eq!(w.progress().fraction, 1.0);
    w.restart();
    assert_eq!(w.step(), Step::Intro);
    assert_eq!(w.record(), &PledgeRecord::default());
}

#[tokio::test]
async fn failed_compose_keeps_editor_and_allows_retry() {
    let dev = devices();
    let sink = Arc::new(RecordingSink::new());
    let mut w = wizard().with_analytics(sink.clone());
    w.start().unwrap();
    fill_name(&mut w, "Jane");
    fill_photo(&mut w, &dev).await;
    fill_signature(&mut w);

    let ticket = w.submit().unwrap();
    let err = w
        .finish_compose(
            ticket,
            Err(PledgeError::decode(
                crate::foundation::error::Layer::Template,
                "bad bytes",
            )),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(w.step(), Step::Editor);
    assert!(w.record().generated.is_none());
    assert!(sink.events().is_empty());

    let ticket = w.submit().unwrap();
    assert!(w.finish_compose(ticket, Ok(certificate(2))).unwrap());
    assert_eq!(sink.events().len(), 1);
}

#[tokio::test]
async fn stale_compose_results_are_ignored() {
    let dev = devices();
    let sink = Arc::new(RecordingSink::new());
    let mut w = wizard().with_analytics(sink.clone());
    w.start().unwrap();
    fill_name(&mut w, "Jane");
    fill_photo(&mut w, &dev).await;
    fill_signature(&mut w);

    let first = w.submit().unwrap();
    let second = w.submit().unwrap();
    assert!(!w.finish_compose(first, Ok(certificate(1))).unwrap());
    assert!(w.finish_compose(second, Ok(certificate(2))).unwrap());
    assert!(!w.finish_compose(second, Ok(certificate(3))).unwrap());
    assert_eq!(w.record().generated, Some(certificate(2)));
    assert_eq!(sink.events().len(), 1);

    w.edit().unwrap();
    let ticket = w.submit().unwrap();
    w.restart();
    assert!(!w.finish_compose(ticket, Ok(certificate(4))).unwrap());
    assert_eq!(w.step(), Step::Intro);
}

#[tokio::test]
async fn camera_opening_after_dismissal_is_released() {
    let dev = devices();
    let mut w = wizard();
    w.start().unwrap();
    w.open_dialog(Dialog::Photo).unwrap();
    let ticket = w.request_camera().unwrap();
    w.close_dialog();

    let session = CameraSession::open(&dev, ticket.facing(), &CameraConfig::default()).await;
    assert_eq!(dev.live_streams(), 1);
    assert!(!w.camera_opened(ticket, session).unwrap());
    assert_eq!(dev.live_streams(), 0);
    assert!(w.camera().is_none());
}

#[tokio::test]
async fn closing_the_photo_dialog_releases_the_camera() {
    let dev = devices();
    let mut w = wizard();
    w.start().unwrap();
    w.open_dialog(Dialog::Photo).unwrap();
    let ticket = w.request_camera().unwrap();
    let session = CameraSession::open(&dev, ticket.facing(), &CameraConfig::default()).await;
    w.camera_opened(ticket, session).unwrap();
    assert_eq!(dev.live_streams(), 1);
    w.close_dialog();
    assert_eq!(dev.live_streams(), 0);
}

#[tokio::test]
async fn switching_remembers_facing_and_survives_failure() {
    let dev = devices().without(FacingMode::Back);
    let mut w = wizard();
    w.start().unwrap();
    w.open_dialog(Dialog::Photo).unwrap();
    let ticket = w.request_camera().unwrap();
    let session = CameraSession::open(&dev, ticket.facing(), &CameraConfig::default()).await;
    w.camera_opened(ticket, session).unwrap();

    let (ticket, session) = w.begin_switch().unwrap();
    assert_eq!(ticket.facing(), FacingMode::Back);
    let result = session.switch_facing(&dev).await;
    let err = w.camera_opened(ticket, result).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Device);
    assert!(w.camera().is_none());
    assert_eq!(dev.live_streams(), 0);
    assert_eq!(w.facing(), FacingMode::Back);
    assert!(w.capture_photo().is_err());
    assert!(w.record().photo.is_none());
}

#[tokio::test]
async fn capture_before_first_frame_keeps_the_camera() {
    let dev = devices().with_warmup(5);
    let mut w = wizard();
    w.start().unwrap();
    w.open_dialog(Dialog::Photo).unwrap();
    let ticket = w.request_camera().unwrap();
    let session = CameraSession::open(&dev, ticket.facing(), &CameraConfig::default()).await;
    w.camera_opened(ticket, session).unwrap();

    let err = w.capture_photo().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotReady);
    assert!(w.camera().is_some());
    assert!(w.record().photo.is_none());
}

#[tokio::test]
async fn editing_after_completion_discards_the_certificate() {
    let dev = devices();
    let mut w = wizard();
    w.start().unwrap();
    fill_name(&mut w, "Jane Doe");
    fill_photo(&mut w, &dev).await;
    fill_signature(&mut w);
    let ticket = w.submit().unwrap();
    assert!(w.finish_compose(ticket, Ok(certificate(1))).unwrap());

    // Going back to the editor alone keeps it.
    w.edit().unwrap();
    assert_eq!(w.record().generated, Some(certificate(1)));
    assert_eq!(w.progress().fraction, 1.0);

    fill_name(&mut w, "John Smith");
    assert!(w.record().generated.is_none());
    let err = w.download().unwrap_err();
    assert_eq!(err.user_message(), "Certificate not ready yet. Please wait.");
    assert_eq!(w.progress().fraction, 0.75);

    let ticket = w.submit().unwrap();
    assert!(w.finish_compose(ticket, Ok(certificate(2))).unwrap());
    w.edit().unwrap();
    w.remove_photo().unwrap();
    assert!(w.record().generated.is_none());
    assert!(w.download().is_err());
    assert_eq!(w.submit().unwrap_err().missing_fields(), &[RecordField::Photo]);
}

#[tokio::test]
async fn photo_can_be_removed_and_retaken() {
    let dev = devices();
    let mut w = wizard();
    w.start().unwrap();
    fill_photo(&mut w, &dev).await;
    assert!(w.record().photo.is_some());
    w.remove_photo().unwrap();
    assert!(w.record().photo.is_none());
    fill_photo(&mut w, &dev).await;
    assert!(w.record().photo.is_some());
    assert_eq!(dev.max_live_streams(), 1);
}

#[test]
fn invalid_transitions_are_validation_errors() {
    let mut w = wizard();
    assert_eq!(w.edit().unwrap_err().kind(), ErrorKind::Validation);
    assert!(w.finish().is_err());
    assert!(w.submit().is_err());
    assert!(w.open_dialog(Dialog::Name).is_err());
    w.start().unwrap();
    assert!(w.start().is_err());
    assert!(w.set_name_draft("x").is_err());
}

#[test]
fn progress_counts_fields() {
    let mut w = wizard();
    assert_eq!(w.progress().fraction, 0.0);
    w.start().unwrap();
    fill_name(&mut w, "Jane");
    let p = w.progress();
    assert_eq!((p.fields_done, p.fields_total), (1, 3));
    assert_eq!(p.fraction, 0.25);
}
