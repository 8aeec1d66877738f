//! Camera capture: the device seam, the owning session, and a still-image device.

pub mod device;
pub mod session;
pub mod still;
