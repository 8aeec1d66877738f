use std::sync::Arc;

use crate::foundation::core::PixelSize;
use crate::foundation::error::{PledgeError, PledgeResult};
use crate::foundation::math::unpremul_u8;

/// Decoded bitmap in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Wrap premultiplied bytes, checking the buffer length.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> PledgeResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba8_premul.len() != expected {
            return Err(PledgeError::validation(format!(
                "raster byte length {} does not match {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Premultiplied RGBA of one pixel, `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.rgba8_premul.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert to a straight-alpha `image` buffer.
    pub fn to_rgba_image(&self) -> PledgeResult<image::RgbaImage> {
        let mut straight = self.rgba8_premul.as_ref().clone();
        for px in straight.chunks_exact_mut(4) {
            let a = px[3];
            px[0] = unpremul_u8(px[0], a);
            px[1] = unpremul_u8(px[1], a);
            px[2] = unpremul_u8(px[2], a);
        }
        image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| PledgeError::validation("raster buffer does not match its size"))
    }
}

/// Encoding of an [`EncodedImage`] payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncodedFormat {
    /// Lossless, keeps alpha (signatures).
    Png,
    /// Lossy, opaque (photos, certificates).
    Jpeg,
}

impl EncodedFormat {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Encoded image bytes as handed between capture producers and the compositor.
///
/// Cloning is cheap: the payload is shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: EncodedFormat,
    pub bytes: Arc<Vec<u8>>,
}

impl EncodedImage {
    pub fn new(format: EncodedFormat, bytes: Vec<u8>) -> Self {
        Self {
            format,
            bytes: Arc::new(bytes),
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(EncodedFormat::Png, bytes)
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(EncodedFormat::Jpeg, bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
