//! In-process camera that streams a fixed image.
//!
//! Behaves like a single physical device: a second stream cannot be opened while one is live.

use std::{
    cell::Cell,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    camera::device::{FacingMode, MediaConstraints, MediaDevices, VideoStream},
    foundation::core::PixelSize,
    foundation::error::{PledgeError, PledgeResult},
};

#[derive(Debug, Default)]
struct Counters {
    live: AtomicUsize,
    max_live: AtomicUsize,
    opened: AtomicUsize,
}

#[derive(Clone, Debug)]
pub struct StillFrameDevices {
    frame: Arc<image::RgbaImage>,
    warmup_polls: u32,
    front: bool,
    back: bool,
    permission_denied: bool,
    counters: Arc<Counters>,
}

impl StillFrameDevices {
    /// Both facing modes serve `frame`, ready immediately.
    pub fn new(frame: image::RgbaImage) -> Self {
        Self {
            frame: Arc::new(frame),
            warmup_polls: 0,
            front: true,
            back: true,
            permission_denied: false,
            counters: Arc::default(),
        }
    }

    /// Report no video size for the first `polls` size queries of each stream.
    pub fn with_warmup(mut self, polls: u32) -> Self {
        self.warmup_polls = polls;
        self
    }

    pub fn without(mut self, facing: FacingMode) -> Self {
        match facing {
            FacingMode::Front => self.front = false,
            FacingMode::Back => self.back = false,
        }
        self
    }

    pub fn deny_permission(mut self) -> Self {
        self.permission_denied = true;
        self
    }

    pub fn live_streams(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live streams ever observed.
    pub fn max_live_streams(&self) -> usize {
        self.counters.max_live.load(Ordering::SeqCst)
    }

    pub fn streams_opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaDevices for StillFrameDevices {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> PledgeResult<Box<dyn VideoStream>> {
        if self.permission_denied {
            return Err(PledgeError::permission("camera permission denied"));
        }
        let available = match constraints.facing {
            FacingMode::Front => self.front,
            FacingMode::Back => self.back,
        };
        if !available {
            return Err(PledgeError::device(format!(
                "no {} camera available",
                constraints.facing
            )));
        }
        if self.counters.live.load(Ordering::SeqCst) > 0 {
            return Err(PledgeError::device("camera is busy"));
        }

        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_live.fetch_max(live, Ordering::SeqCst);
        self.counters.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(StillStream {
            frame: self.frame.clone(),
            warmup_left: Cell::new(self.warmup_polls),
            live: true,
            counters: self.counters.clone(),
        }))
    }
}

struct StillStream {
    frame: Arc<image::RgbaImage>,
    warmup_left: Cell<u32>,
    live: bool,
    counters: Arc<Counters>,
}

impl VideoStream for StillStream {
    fn video_size(&self) -> Option<PixelSize> {
        if !self.live {
            return None;
        }
        let left = self.warmup_left.get();
        if left > 0 {
            self.warmup_left.set(left - 1);
            return None;
        }
        Some(PixelSize::new(self.frame.width(), self.frame.height()))
    }

    fn grab_frame(&mut self) -> PledgeResult<image::RgbaImage> {
        if !self.live {
            return Err(PledgeError::not_ready("stream is stopped"));
        }
        Ok(self.frame.as_ref().clone())
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for StillStream {
    fn drop(&mut self) {
        self.stop();
    }
}
