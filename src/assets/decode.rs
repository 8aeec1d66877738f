use std::sync::Arc;

use anyhow::Context;

use crate::{
    assets::raster::RasterImage,
    foundation::error::{Layer, PledgeError, PledgeResult},
};

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> PledgeResult<RasterImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(raster_from_rgba(dyn_img.to_rgba8()))
}

/// Premultiply a straight-alpha `image` buffer into a [`RasterImage`].
pub fn raster_from_rgba(rgba: image::RgbaImage) -> RasterImage {
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    RasterImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    }
}

/// Decode one compositing layer off the async executor.
///
/// Any failure, including a zero-sized image, is reported as [`PledgeError::Decode`] for
/// `layer`.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub async fn decode_layer(layer: Layer, bytes: Arc<Vec<u8>>) -> PledgeResult<RasterImage> {
    let decoded = tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| PledgeError::decode(layer, format!("decode task failed: {e}")))?;

    match decoded {
        Ok(img) if img.width == 0 || img.height == 0 => {
            Err(PledgeError::decode(layer, "image has no pixels"))
        }
        Ok(img) => Ok(img),
        Err(e) => Err(PledgeError::decode(layer, format!("{e:#}"))),
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
