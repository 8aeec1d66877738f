use std::fmt;

/// Convenience result type used across the crate.
pub type PledgeResult<T> = Result<T, PledgeError>;

/// A user-facing field of the pledge record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    /// Typed name.
    Name,
    /// Captured photo.
    Photo,
    /// Drawn signature.
    Signature,
}

impl RecordField {
    /// Stable lowercase identifier, used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Photo => "photo",
            Self::Signature => "signature",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image-bearing layer of a certificate composite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Base certificate artwork.
    Template,
    /// Captured photo.
    Photo,
    /// Signature ink.
    Signature,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Template => "template",
            Self::Photo => "photo",
            Self::Signature => "signature",
        })
    }
}

/// Coarse error classification, one entry per recoverable failure family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input; the user corrects it and retries.
    Validation,
    /// Camera access denied.
    Permission,
    /// No capture device, or the device is busy.
    Device,
    /// An image failed to decode during compositing.
    Decode,
    /// A frame was requested before the video stream produced one.
    NotReady,
    /// The final raster could not be encoded.
    Encode,
    /// Lower-level failure from a dependency or IO.
    Other,
}

/// Top-level error taxonomy used by every public API.
#[derive(thiserror::Error, Debug)]
pub enum PledgeError {
    /// Invalid user-provided or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Required record fields are missing.
    #[error("validation error: missing required field(s): {}", join_fields(.0))]
    MissingFields(Vec<RecordField>),

    /// Camera access denied by the platform or the user.
    #[error("permission error: {0}")]
    Permission(String),

    /// No capture device, or the device could not be acquired.
    #[error("device error: {0}")]
    Device(String),

    /// An image source failed to load or decode.
    #[error("decode error: {layer} image: {message}")]
    Decode {
        /// Layer whose source failed.
        layer: Layer,
        /// Underlying failure description.
        message: String,
    },

    /// Snapshot requested before the stream reported a decoded frame.
    #[error("not ready: {0}")]
    NotReady(String),

    /// The final raster could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn join_fields(fields: &[RecordField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl PledgeError {
    /// Build a [`PledgeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PledgeError::Permission`] value.
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    /// Build a [`PledgeError::Device`] value.
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Build a [`PledgeError::Decode`] value for `layer`.
    pub fn decode(layer: Layer, msg: impl Into<String>) -> Self {
        Self::Decode {
            layer,
            message: msg.into(),
        }
    }

    /// Build a [`PledgeError::NotReady`] value.
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    /// Build a [`PledgeError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::MissingFields(_) => ErrorKind::Validation,
            Self::Permission(_) => ErrorKind::Permission,
            Self::Device(_) => ErrorKind::Device,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::NotReady(_) => ErrorKind::NotReady,
            Self::Encode(_) => ErrorKind::Encode,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether the user can retry the failed action from the state it left behind.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Other)
    }

    /// Fields named by a [`PledgeError::MissingFields`] error, empty otherwise.
    pub fn missing_fields(&self) -> &[RecordField] {
        match self {
            Self::MissingFields(fields) => fields,
            _ => &[],
        }
    }

    /// Message suitable for showing to the person filling in the pledge.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::MissingFields(_) => {
                "Please complete all fields: name, photo, and signature".to_string()
            }
            Self::Permission(_) => "Unable to access camera. Please check permissions.".to_string(),
            Self::Device(_) => "Unable to access camera. Please try again.".to_string(),
            Self::Decode {
                layer: Layer::Template,
                ..
            } => "Error loading certificate image. Please try again.".to_string(),
            Self::Decode { layer, .. } => {
                format!("Error loading {layer}. Please try again.")
            }
            Self::NotReady(_) => {
                "Camera not ready. Please wait a moment and try again.".to_string()
            }
            Self::Encode(_) | Self::Other(_) => {
                "Something went wrong while creating your certificate. Please try again."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
