//! CPU rasterization and encoding of certificates.

/// Layered certificate compositing.
pub mod compositor;
/// JPEG and PNG encoders.
pub mod encode;
/// `vello_cpu` surfaces and layer compositing.
pub mod surface;
