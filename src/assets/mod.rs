//! Image and font inputs of the compositor.

/// Decoding encoded bytes into premultiplied rasters.
pub mod decode;
/// Raster and encoded image containers.
pub mod raster;
/// Template image sources.
pub mod source;
/// Name text shaping.
pub mod text;
