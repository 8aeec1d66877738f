//! Video capture device seam.
//!
//! Platform shells implement [`MediaDevices`] on top of their media stack; the crate ships
//! [`crate::camera::still::StillFrameDevices`] for headless use.

use async_trait::async_trait;

use crate::foundation::core::PixelSize;
use crate::foundation::error::PledgeResult;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Selfie camera.
    #[default]
    Front,
    Back,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stream request asks for. The resolution is a hint, not a requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

/// A source of camera streams.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Acquire a live stream, or fail with [`crate::PledgeError::Permission`] /
    /// [`crate::PledgeError::Device`].
    async fn get_user_media(&self, constraints: MediaConstraints)
    -> PledgeResult<Box<dyn VideoStream>>;
}

/// A live device stream. Holding one holds the device.
pub trait VideoStream: Send {
    /// Frame dimensions, `None` until the first frame has been decoded.
    fn video_size(&self) -> Option<PixelSize>;

    /// Copy out the most recent frame.
    fn grab_frame(&mut self) -> PledgeResult<image::RgbaImage>;

    /// Stop every track and release the device. Idempotent.
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}
