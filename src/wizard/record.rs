use crate::{
    assets::raster::EncodedImage,
    foundation::core::PixelSize,
    foundation::error::RecordField,
    foundation::math::Fnv1a64,
};

/// The pledge being filled in. Only confirmed values live here; drafts stay in the wizard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PledgeRecord {
    pub name: String,
    pub photo: Option<EncodedImage>,
    /// Transparent-background PNG.
    pub signature: Option<EncodedImage>,
    pub generated: Option<GeneratedCertificate>,
}

impl PledgeRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_photo(mut self, photo: EncodedImage) -> Self {
        self.photo = Some(photo);
        self
    }

    pub fn with_signature(mut self, signature: EncodedImage) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Fields that still block submission, in display order.
    pub fn missing_fields(&self) -> Vec<RecordField> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push(RecordField::Name);
        }
        if self.photo.is_none() {
            missing.push(RecordField::Photo);
        }
        if self.signature.is_none() {
            missing.push(RecordField::Signature);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Number of the three input fields that are filled in.
    pub fn fields_done(&self) -> usize {
        3 - self.missing_fields().len()
    }
}

/// Encoded output of one successful composite. Replaced wholesale on regenerate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedCertificate {
    pub image: EncodedImage,
    pub size: PixelSize,
    /// FNV-1a 64 of the encoded bytes.
    pub fingerprint: u64,
}

impl GeneratedCertificate {
    pub fn new(image: EncodedImage, size: PixelSize) -> Self {
        let mut h = Fnv1a64::new_default();
        h.write_bytes(&image.bytes);
        Self {
            image,
            size,
            fingerprint: h.finish(),
        }
    }

    pub fn fingerprint_hex(&self) -> String {
        format!("{:016x}", self.fingerprint)
    }
}

/// A file ready to hand to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: std::sync::Arc<Vec<u8>>,
}

impl Download {
    pub fn new(file_name: impl Into<String>, image: &EncodedImage) -> Self {
        Self {
            file_name: file_name.into(),
            mime: image.format.mime(),
            bytes: image.bytes.clone(),
        }
    }
}

/// `<prefix>_<name>.<ext>`, with each run of non-alphanumeric characters in `name` collapsed to
/// one underscore and leading/trailing separators dropped.
pub fn download_file_name(prefix: &str, name: &str, extension: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(ch);
        } else {
            pending_sep = true;
        }
    }

    let ext = extension.trim_start_matches('.');
    match (prefix.is_empty(), slug.is_empty()) {
        (false, false) => format!("{prefix}_{slug}.{ext}"),
        (false, true) => format!("{prefix}.{ext}"),
        (true, false) => format!("{slug}.{ext}"),
        (true, true) => format!("certificate.{ext}"),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/wizard/record.rs"]
mod tests;
