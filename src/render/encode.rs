use std::io::Cursor;

use image::{ImageEncoder, codecs::jpeg::JpegEncoder};

use crate::{
    assets::raster::{EncodedImage, RasterImage},
    foundation::core::Rgba8,
    foundation::error::{PledgeError, PledgeResult},
    foundation::math::{add_sat_u8, mul_div255_u8},
};

/// Flatten a premultiplied raster over an opaque `background` and encode it as JPEG.
pub fn encode_jpeg(img: &RasterImage, background: Rgba8, quality: u8) -> PledgeResult<EncodedImage> {
    let bg = Rgba8 { a: 255, ..background };
    let mut rgb = Vec::with_capacity((img.width as usize) * (img.height as usize) * 3);
    for px in img.rgba8_premul.chunks_exact(4) {
        let inv = 255u16 - u16::from(px[3]);
        rgb.push(add_sat_u8(px[0], mul_div255_u8(u16::from(bg.r), inv)));
        rgb.push(add_sat_u8(px[1], mul_div255_u8(u16::from(bg.g), inv)));
        rgb.push(add_sat_u8(px[2], mul_div255_u8(u16::from(bg.b), inv)));
    }
    encode_rgb_jpeg(&rgb, img.width, img.height, quality)
}

/// Encode a straight-alpha frame (e.g. a camera grab) as JPEG, discarding alpha.
pub fn encode_rgba_image_jpeg(img: &image::RgbaImage, quality: u8) -> PledgeResult<EncodedImage> {
    let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    encode_rgb_jpeg(rgb.as_raw(), img.width(), img.height(), quality)
}

/// Encode a premultiplied raster as PNG, keeping transparency.
pub fn encode_png(img: &RasterImage) -> PledgeResult<EncodedImage> {
    let rgba = img.to_rgba_image()?;
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(Cursor::new(&mut buf))
        .write_image(
            rgba.as_raw(),
            img.width,
            img.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| PledgeError::encode(format!("png: {e}")))?;
    Ok(EncodedImage::png(buf))
}

fn encode_rgb_jpeg(rgb: &[u8], width: u32, height: u32, quality: u8) -> PledgeResult<EncodedImage> {
    if !(1..=100).contains(&quality) {
        return Err(PledgeError::validation(format!(
            "jpeg quality must be in 1..=100 (got {quality})"
        )));
    }
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality)
        .write_image(rgb, width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| PledgeError::encode(format!("jpeg: {e}")))?;
    Ok(EncodedImage::jpeg(buf))
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
