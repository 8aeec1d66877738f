use crate::{
    assets::raster::EncodedImage,
    camera::device::{FacingMode, MediaConstraints, MediaDevices, VideoStream},
    foundation::core::PixelSize,
    foundation::error::{PledgeError, PledgeResult},
    render::encode::encode_rgba_image_jpeg,
};

/// Stream request and snapshot settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub ideal_width: u32,
    pub ideal_height: u32,
    /// Facing mode used the first time the camera opens.
    pub facing: FacingMode,
    /// JPEG quality (1..=100) of captured photos.
    pub snapshot_quality: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing: FacingMode::Front,
            snapshot_quality: 90,
        }
    }
}

impl CameraConfig {
    pub fn constraints(&self, facing: FacingMode) -> MediaConstraints {
        MediaConstraints {
            facing,
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
        }
    }
}

/// Sole owner of one live camera stream.
///
/// The stream is stopped by [`CameraSession::close`], by [`CameraSession::switch_facing`] before
/// the replacement is requested, and by `Drop` on every other path.
pub struct CameraSession {
    stream: Option<Box<dyn VideoStream>>,
    facing: FacingMode,
    config: CameraConfig,
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("facing", &self.facing)
            .field("open", &self.is_open())
            .finish()
    }
}

impl CameraSession {
    /// Request a stream. On failure nothing is held.
    #[tracing::instrument(skip(devices, config))]
    pub async fn open(
        devices: &dyn MediaDevices,
        facing: FacingMode,
        config: &CameraConfig,
    ) -> PledgeResult<Self> {
        let stream = devices
            .get_user_media(config.constraints(facing))
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "camera open failed"))?;
        tracing::debug!("camera stream acquired");
        Ok(Self {
            stream: Some(stream),
            facing,
            config: *config,
        })
    }

    /// Replace this session with one facing the other way.
    ///
    /// The current stream is stopped before the new one is requested. If the request fails the
    /// old session is already gone.
    pub async fn switch_facing(mut self, devices: &dyn MediaDevices) -> PledgeResult<Self> {
        let next = self.facing.toggled();
        let config = self.config;
        self.close();
        drop(self);
        Self::open(devices, next, &config).await
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn is_open(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_live())
    }

    /// Dimensions of the live video, `None` before the first frame.
    pub fn video_size(&self) -> Option<PixelSize> {
        self.stream
            .as_ref()
            .and_then(|s| s.video_size())
            .filter(|s| !s.is_empty())
    }

    /// Capture the current frame as JPEG.
    pub fn snapshot(&mut self) -> PledgeResult<EncodedImage> {
        if self.video_size().is_none() {
            return Err(PledgeError::not_ready("video has not produced a frame yet"));
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(PledgeError::not_ready("camera is closed"));
        };
        let frame = stream.grab_frame()?;
        encode_rgba_image_jpeg(&frame, self.config.snapshot_quality)
    }

    /// Stop all tracks and release the device. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::debug!(facing = %self.facing, "camera stream released");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/camera/session.rs"]
mod tests;
