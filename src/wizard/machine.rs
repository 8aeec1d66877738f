//! Screen and dialog state machine around one [`PledgeRecord`].
//!
//! The wizard never awaits. Work that suspends (opening a camera, compositing) is started by the
//! shell with a ticket issued here, and its result is handed back together with that ticket.
//! A ticket issued before the user navigated away is stale and its result is discarded.

use std::sync::Arc;

use crate::{
    assets::raster::EncodedImage,
    camera::device::FacingMode,
    camera::session::CameraSession,
    config::CampaignConfig,
    foundation::core::{PixelSize, Point},
    foundation::error::{PledgeError, PledgeResult, RecordField},
    signature::pad::SignaturePad,
    wizard::analytics::{AnalyticsEvent, AnalyticsSink},
    wizard::record::{Download, GeneratedCertificate, PledgeRecord, download_file_name},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Intro,
    Editor,
    Complete,
    Outro,
}

/// Editor sub-dialogs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialog {
    Name,
    Photo,
    Signature,
}

/// Permission to deliver one camera-open result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraTicket {
    epoch: u64,
    facing: FacingMode,
}

impl CameraTicket {
    /// Facing mode the shell should request.
    pub fn facing(&self) -> FacingMode {
        self.facing
    }
}

/// Permission to deliver one composite result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComposeTicket {
    epoch: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Progress {
    pub step: Step,
    pub fields_done: usize,
    pub fields_total: usize,
    /// 0.0 on the intro, 1.0 once finished.
    pub fraction: f32,
}

pub struct PledgeWizard {
    config: Arc<CampaignConfig>,
    step: Step,
    dialog: Option<Dialog>,
    record: PledgeRecord,
    name_draft: String,
    pad: SignaturePad,
    camera: Option<CameraSession>,
    facing: FacingMode,
    dialog_epoch: u64,
    compose_epoch: u64,
    composing: bool,
    analytics: Option<Arc<dyn AnalyticsSink>>,
}

impl std::fmt::Debug for PledgeWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PledgeWizard")
            .field("step", &self.step)
            .field("dialog", &self.dialog)
            .field("record", &self.record)
            .field("camera", &self.camera)
            .field("composing", &self.composing)
            .finish()
    }
}

impl PledgeWizard {
    pub fn new(config: Arc<CampaignConfig>) -> Self {
        Self {
            step: config.flow.start_step(),
            dialog: None,
            record: PledgeRecord::default(),
            name_draft: String::new(),
            pad: SignaturePad::new(config.signature_pad),
            camera: None,
            facing: config.camera.facing,
            dialog_epoch: 0,
            compose_epoch: 0,
            composing: false,
            analytics: None,
            config,
        }
    }

    pub fn with_analytics(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(sink);
        self
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn dialog(&self) -> Option<Dialog> {
        self.dialog
    }

    pub fn record(&self) -> &PledgeRecord {
        &self.record
    }

    pub fn name_draft(&self) -> &str {
        &self.name_draft
    }

    /// Facing mode the next camera open will use.
    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn camera(&self) -> Option<&CameraSession> {
        self.camera.as_ref()
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    pub fn start(&mut self) -> PledgeResult<()> {
        self.expect_step(Step::Intro, "start")?;
        self.go(Step::Editor);
        Ok(())
    }

    pub fn open_dialog(&mut self, dialog: Dialog) -> PledgeResult<()> {
        self.expect_step(Step::Editor, "open a dialog")?;
        self.close_dialog();
        self.dialog_epoch += 1;
        self.dialog = Some(dialog);
        match dialog {
            Dialog::Name => self.name_draft = self.record.name.clone(),
            Dialog::Signature => self.pad.mount(self.pad.buffer_size()),
            Dialog::Photo => {}
        }
        tracing::debug!(?dialog, "dialog opened");
        Ok(())
    }

    /// Open whatever dialog sits under a click on the displayed editor template.
    pub fn click(&mut self, at: Point, displayed: PixelSize) -> PledgeResult<Option<Dialog>> {
        self.expect_step(Step::Editor, "open a dialog")?;
        let hit = self.config.regions.hit_test(at, displayed);
        if let Some(dialog) = hit {
            self.open_dialog(dialog)?;
        }
        Ok(hit)
    }

    /// Dismiss the open dialog, dropping its draft and releasing the camera.
    pub fn close_dialog(&mut self) {
        let Some(dialog) = self.dialog.take() else {
            return;
        };
        self.dialog_epoch += 1;
        self.name_draft.clear();
        self.pad.unmount();
        if let Some(mut camera) = self.camera.take() {
            camera.close();
        }
        tracing::debug!(?dialog, "dialog closed");
    }

    pub fn set_name_draft(&mut self, text: impl Into<String>) -> PledgeResult<()> {
        self.expect_dialog(Dialog::Name)?;
        self.name_draft = text.into();
        Ok(())
    }

    /// Commit the trimmed draft as the name and close the dialog.
    pub fn confirm_name(&mut self) -> PledgeResult<()> {
        self.expect_dialog(Dialog::Name)?;
        let name = self.name_draft.trim();
        if name.is_empty() {
            return Err(PledgeError::MissingFields(vec![RecordField::Name]));
        }
        self.record.name = name.to_string();
        self.record_changed();
        self.close_dialog();
        Ok(())
    }

    /// Ask for a camera stream. Any live session is released first.
    pub fn request_camera(&mut self) -> PledgeResult<CameraTicket> {
        self.expect_dialog(Dialog::Photo)?;
        if let Some(mut camera) = self.camera.take() {
            camera.close();
        }
        self.dialog_epoch += 1;
        Ok(CameraTicket {
            epoch: self.dialog_epoch,
            facing: self.facing,
        })
    }

    /// Deliver the outcome of a camera request.
    ///
    /// Returns `Ok(false)` when the ticket is stale; a stale session is closed on the spot.
    pub fn camera_opened(
        &mut self,
        ticket: CameraTicket,
        result: PledgeResult<CameraSession>,
    ) -> PledgeResult<bool> {
        if ticket.epoch != self.dialog_epoch || self.dialog != Some(Dialog::Photo) {
            match result {
                Ok(mut stale) => {
                    stale.close();
                    tracing::warn!("camera opened after the photo dialog moved on; released");
                }
                Err(e) => tracing::debug!(error = %e, "stale camera failure ignored"),
            }
            return Ok(false);
        }
        match result {
            Ok(session) => {
                self.facing = session.facing();
                self.camera = Some(session);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "camera unavailable");
                Err(e)
            }
        }
    }

    /// Hand out the live session for a facing switch, with the ticket its replacement must use.
    ///
    /// The caller drives [`CameraSession::switch_facing`] and reports back through
    /// [`PledgeWizard::camera_opened`].
    pub fn begin_switch(&mut self) -> Option<(CameraTicket, CameraSession)> {
        if self.dialog != Some(Dialog::Photo) {
            return None;
        }
        let session = self.camera.take()?;
        self.dialog_epoch += 1;
        self.facing = session.facing().toggled();
        Some((
            CameraTicket {
                epoch: self.dialog_epoch,
                facing: self.facing,
            },
            session,
        ))
    }

    /// Snapshot the live camera into the record, then release it and close the dialog.
    ///
    /// On failure (e.g. no frame yet) the camera stays open and the record is untouched.
    pub fn capture_photo(&mut self) -> PledgeResult<()> {
        self.expect_dialog(Dialog::Photo)?;
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| PledgeError::not_ready("camera is not open"))?;
        let photo = camera.snapshot()?;
        self.record.photo = Some(photo);
        self.record_changed();
        self.close_dialog();
        Ok(())
    }

    pub fn remove_photo(&mut self) -> PledgeResult<()> {
        self.expect_step(Step::Editor, "remove the photo")?;
        if self.record.photo.take().is_some() {
            self.record_changed();
        }
        Ok(())
    }

    /// The pad, while the signature dialog is open.
    pub fn signature_pad_mut(&mut self) -> Option<&mut SignaturePad> {
        (self.dialog == Some(Dialog::Signature)).then_some(&mut self.pad)
    }

    pub fn clear_signature(&mut self) -> PledgeResult<()> {
        self.expect_dialog(Dialog::Signature)?;
        self.pad.clear();
        Ok(())
    }

    /// Commit the drawn signature and close the dialog.
    pub fn confirm_signature(&mut self) -> PledgeResult<()> {
        self.expect_dialog(Dialog::Signature)?;
        let Some(signature) = self.pad.end_stroke() else {
            return Err(PledgeError::MissingFields(vec![RecordField::Signature]));
        };
        self.record.signature = Some(signature);
        self.record_changed();
        self.close_dialog();
        Ok(())
    }

    /// Commit a signature produced outside the pad (e.g. an uploaded PNG) and close the dialog.
    pub fn confirm_signature_image(&mut self, signature: EncodedImage) -> PledgeResult<()> {
        self.expect_dialog(Dialog::Signature)?;
        if signature.is_empty() {
            return Err(PledgeError::MissingFields(vec![RecordField::Signature]));
        }
        self.record.signature = Some(signature);
        self.record_changed();
        self.close_dialog();
        Ok(())
    }

    /// Validate the record and authorize one composite.
    pub fn submit(&mut self) -> PledgeResult<ComposeTicket> {
        if !matches!(self.step, Step::Editor | Step::Complete) {
            return Err(self.bad_transition("submit"));
        }
        self.close_dialog();
        let missing = self.record.missing_fields();
        if !missing.is_empty() {
            return Err(PledgeError::MissingFields(missing));
        }
        self.compose_epoch += 1;
        self.composing = true;
        tracing::debug!(epoch = self.compose_epoch, "compose requested");
        Ok(ComposeTicket {
            epoch: self.compose_epoch,
        })
    }

    /// Deliver a composite. Returns `Ok(false)` for a stale ticket.
    pub fn finish_compose(
        &mut self,
        ticket: ComposeTicket,
        result: PledgeResult<GeneratedCertificate>,
    ) -> PledgeResult<bool> {
        if !self.composing || ticket.epoch != self.compose_epoch {
            tracing::warn!("stale compose result dropped");
            return Ok(false);
        }
        self.composing = false;
        let certificate = result?;

        if let Some(sink) = &self.analytics {
            sink.record(AnalyticsEvent::CertificateGenerated {
                campaign: self.config.title.clone(),
                label: certificate.fingerprint_hex(),
            });
        }
        self.record.generated = Some(certificate);
        self.go(Step::Complete);
        Ok(true)
    }

    pub fn edit(&mut self) -> PledgeResult<()> {
        self.expect_step(Step::Complete, "edit")?;
        self.go(Step::Editor);
        Ok(())
    }

    pub fn finish(&mut self) -> PledgeResult<()> {
        self.expect_step(Step::Complete, "finish")?;
        self.go(Step::Outro);
        Ok(())
    }

    /// Forget everything and return to the campaign's first screen.
    pub fn restart(&mut self) {
        self.close_dialog();
        self.record = PledgeRecord::default();
        self.pad = SignaturePad::new(self.config.signature_pad);
        self.compose_epoch += 1;
        self.composing = false;
        self.go(self.config.flow.start_step());
    }

    pub fn progress(&self) -> Progress {
        let fields_done = self.record.fields_done();
        let fraction = match self.step {
            Step::Intro => 0.0,
            Step::Outro => 1.0,
            Step::Editor | Step::Complete => {
                let units = fields_done + usize::from(self.record.generated.is_some());
                units as f32 / 4.0
            }
        };
        Progress {
            step: self.step,
            fields_done,
            fields_total: 3,
            fraction,
        }
    }

    /// The generated certificate under its download file name.
    ///
    /// Only available while the certificate still matches the record.
    pub fn download(&self) -> PledgeResult<Download> {
        let certificate = self
            .record
            .generated
            .as_ref()
            .ok_or_else(|| PledgeError::validation("Certificate not ready yet. Please wait."))?;
        let file_name = download_file_name(
            &self.config.file_prefix,
            &self.record.name,
            self.config.file_extension(),
        );
        Ok(Download::new(file_name, &certificate.image))
    }

    fn go(&mut self, next: Step) {
        tracing::debug!(from = ?self.step, to = ?next, "step");
        self.step = next;
    }

    // A certificate built from, or being built from, the old record no longer matches it.
    fn record_changed(&mut self) {
        if self.composing {
            self.compose_epoch += 1;
            self.composing = false;
        }
        if self.record.generated.take().is_some() {
            tracing::debug!("certificate discarded after record edit");
        }
    }

    fn expect_step(&self, step: Step, action: &str) -> PledgeResult<()> {
        if self.step != step {
            return Err(self.bad_transition(action));
        }
        Ok(())
    }

    fn expect_dialog(&self, dialog: Dialog) -> PledgeResult<()> {
        if self.dialog != Some(dialog) {
            return Err(PledgeError::validation(format!(
                "{dialog:?} dialog is not open"
            )));
        }
        Ok(())
    }

    fn bad_transition(&self, action: &str) -> PledgeError {
        PledgeError::validation(format!("cannot {action} on the {:?} step", self.step))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/wizard/machine.rs"]
mod tests;
