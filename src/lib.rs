//! `pledgecert` builds personalized pledge certificates.
//!
//! A [`PledgeWizard`] collects a name, a camera photo and a drawn signature into a
//! [`PledgeRecord`]. A [`Compositor`] then layers them onto a template image and encodes the
//! result:
//!
//! - name text at a percentage anchor, sized relative to the template width
//! - the photo cover-scaled into a circular clip
//! - the signature stretched into its box
//!
//! All geometry is resolved against the template's decoded pixel size, so output does not depend
//! on how the template is displayed.
#![forbid(unsafe_code)]

pub mod assets;
pub mod camera;
pub mod config;
pub mod foundation;
pub mod layout;
pub mod render;
pub mod signature;
pub mod wizard;

pub use crate::assets::raster::{EncodedFormat, EncodedImage, RasterImage};
pub use crate::assets::source::{FileSource, ImageSource, MemorySource};
pub use crate::assets::text::FontChoice;
pub use crate::camera::device::{FacingMode, MediaConstraints, MediaDevices, VideoStream};
pub use crate::camera::session::{CameraConfig, CameraSession};
pub use crate::camera::still::StillFrameDevices;
pub use crate::config::{CampaignConfig, FlowVariant};
pub use crate::foundation::core::{Circle, PixelSize, Point, Rect, Rgba8};
pub use crate::foundation::error::{ErrorKind, Layer, PledgeError, PledgeResult, RecordField};
pub use crate::layout::anchors::{AnchorSet, BoxAnchor, CircleAnchor, ResolvedAnchors, TextAnchor};
pub use crate::layout::regions::HitRegions;
pub use crate::render::compositor::{
    CertificateFrame, CertificateStyle, Compositor, CompositorStage,
};
pub use crate::signature::pad::{PadConfig, SignaturePad};
pub use crate::wizard::analytics::{AnalyticsEvent, AnalyticsSink, RecordingSink, TracingSink};
pub use crate::wizard::machine::{
    CameraTicket, ComposeTicket, Dialog, PledgeWizard, Progress, Step,
};
pub use crate::wizard::record::{Download, GeneratedCertificate, PledgeRecord, download_file_name};
