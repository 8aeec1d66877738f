//! Campaign configuration: every constant that differs between pledge campaigns.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use crate::{
    camera::session::CameraConfig,
    foundation::core::Rgba8,
    foundation::error::{PledgeError, PledgeResult},
    layout::anchors::AnchorSet,
    layout::regions::HitRegions,
    signature::pad::PadConfig,
    wizard::machine::Step,
};

/// Screen order of a campaign.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowVariant {
    /// Intro screen first; restart returns to the intro.
    #[default]
    WithIntro,
    /// Straight into the editor; restart returns to the editor.
    EditorFirst,
}

impl FlowVariant {
    pub fn start_step(self) -> Step {
        match self {
            Self::WithIntro => Step::Intro,
            Self::EditorFirst => Step::Editor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub title: String,
    pub file_prefix: String,
    pub file_extension: String,
    pub flow: FlowVariant,
    pub name_color: Rgba8,
    pub ink_color: Rgba8,
    /// Color transparent pixels are flattened onto when encoding JPEG.
    pub background: Rgba8,
    pub anchors: AnchorSet,
    pub regions: HitRegions,
    pub signature_pad: PadConfig,
    pub camera: CameraConfig,
    pub jpeg_quality: u8,
    /// Template shown while editing, with placeholder hints.
    pub editor_template: Option<PathBuf>,
    /// Clean template used for the exported certificate.
    pub final_template: Option<PathBuf>,
    /// Font file for the name. When unset the name uses `name_font_family`.
    pub name_font: Option<PathBuf>,
    /// Family list looked up among the installed fonts, e.g. `"Barlow, sans-serif"`.
    pub name_font_family: String,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        let ink_color = Rgba8::opaque(0x1e, 0x3a, 0x8a);
        Self {
            title: "Arthritis Pledge".to_string(),
            file_prefix: "Arthritis_Pledge_Certificate".to_string(),
            file_extension: "jpg".to_string(),
            flow: FlowVariant::default(),
            name_color: Rgba8::opaque(0x33, 0x58, 0x9e),
            ink_color,
            background: Rgba8::WHITE,
            anchors: AnchorSet::default(),
            regions: HitRegions::default(),
            signature_pad: PadConfig {
                ink: ink_color,
                ..PadConfig::default()
            },
            camera: CameraConfig::default(),
            jpeg_quality: 92,
            editor_template: None,
            final_template: None,
            name_font: None,
            name_font_family: "Barlow, sans-serif".to_string(),
        }
    }
}

impl CampaignConfig {
    /// Parse and validate a JSON configuration. Missing keys take their default values.
    pub fn from_reader<R: Read>(r: R) -> PledgeResult<Self> {
        let mut cfg: Self = serde_json::from_reader(r)
            .map_err(|e| PledgeError::validation(format!("parse campaign config JSON: {e}")))?;
        cfg.sync_ink();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> PledgeResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Load from a JSON file. Relative template and font paths are resolved against the file's
    /// directory.
    pub fn load(path: impl AsRef<Path>) -> PledgeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PledgeError::validation(format!("open campaign config '{}': {e}", path.display()))
        })?;
        let mut cfg = Self::from_reader(BufReader::new(f))?;

        if let Some(dir) = path.parent() {
            for file in [
                &mut cfg.editor_template,
                &mut cfg.final_template,
                &mut cfg.name_font,
            ]
            .into_iter()
            .flatten()
            {
                if file.is_relative() {
                    *file = dir.join(&*file);
                }
            }
        }

        tracing::debug!(path = %path.display(), title = %cfg.title, "campaign config loaded");
        Ok(cfg)
    }

    pub fn validate(&self) -> PledgeResult<()> {
        if self.file_prefix.contains(['/', '\\']) {
            return Err(PledgeError::validation(
                "file_prefix must not contain path separators",
            ));
        }
        let ext = self.file_extension.trim_start_matches('.');
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PledgeError::validation(format!(
                "file_extension must be alphanumeric (got '{}')",
                self.file_extension
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PledgeError::validation("jpeg_quality must be in 1..=100"));
        }
        if !(1..=100).contains(&self.camera.snapshot_quality) {
            return Err(PledgeError::validation(
                "camera.snapshot_quality must be in 1..=100",
            ));
        }
        if self.camera.ideal_width == 0 || self.camera.ideal_height == 0 {
            return Err(PledgeError::validation(
                "camera ideal resolution must be > 0",
            ));
        }
        let pad = &self.signature_pad;
        if pad.width == 0 || pad.height == 0 || pad.width > 4096 || pad.height > 4096 {
            return Err(PledgeError::validation(
                "signature_pad size must be within 1..=4096",
            ));
        }
        if !pad.stroke_width.is_finite() || pad.stroke_width <= 0.0 {
            return Err(PledgeError::validation(
                "signature_pad stroke_width must be finite and > 0",
            ));
        }

        if self.name_font.is_none() && self.name_font_family.trim().is_empty() {
            return Err(PledgeError::validation(
                "name_font_family must not be empty when name_font is unset",
            ));
        }

        self.anchors.validate()?;
        for (what, region) in [
            ("name", self.regions.name),
            ("photo", self.regions.photo),
            ("signature", self.regions.signature),
        ] {
            let values = [region.x, region.y, region.width, region.height];
            if values
                .iter()
                .any(|v| !v.is_finite() || !(0.0..=100.0).contains(v))
            {
                return Err(PledgeError::validation(format!(
                    "region {what} must use percentages in 0..=100"
                )));
            }
        }
        Ok(())
    }

    pub fn file_extension(&self) -> &str {
        self.file_extension.trim_start_matches('.')
    }

    // A config that only sets `ink_color` should still draw with it.
    fn sync_ink(&mut self) {
        if self.signature_pad.ink == PadConfig::default().ink {
            self.signature_pad.ink = self.ink_color;
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
