//! `vello_cpu` plumbing shared by the compositor and the signature pad.
//!
//! `vello_cpu` renders into a fresh buffer, so layered drawing works by rendering each layer into
//! a transparent scratch pixmap and compositing it over the target in premultiplied space.

use std::sync::Arc;

use kurbo::{PathEl, Shape};

use crate::{
    assets::raster::RasterImage,
    foundation::core::{Affine, BezPath, PixelSize, Rect},
    foundation::error::{PledgeError, PledgeResult},
    foundation::math::{add_sat_u8, mul_div255_u8},
};

/// One mutable raster target.
pub struct Surface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl Surface {
    pub fn new(size: PixelSize) -> PledgeResult<Self> {
        let (width, height) = size.to_u16()?;
        Ok(Self {
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
        })
    }

    /// Surface initialized with a copy of `img`.
    pub fn from_raster(img: &RasterImage) -> PledgeResult<Self> {
        let (width, height) = img.size().to_u16()?;
        Ok(Self {
            width,
            height,
            pixmap: pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?,
        })
    }

    pub fn size(&self) -> PixelSize {
        PixelSize::new(u32::from(self.width), u32::from(self.height))
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Rasterize with `draw` into a scratch buffer and composite it over this surface.
    pub fn draw_over(
        &mut self,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> PledgeResult<()>,
    ) -> PledgeResult<()> {
        let full = self.bounds();
        self.draw_over_in(full, |ctx, _| draw(ctx))
    }

    /// Like [`Surface::draw_over`], but the layer is first multiplied by the alpha of `mask`.
    pub fn draw_over_masked(
        &mut self,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> PledgeResult<()>,
        mask: impl FnOnce(&mut vello_cpu::RenderContext) -> PledgeResult<()>,
    ) -> PledgeResult<()> {
        let full = self.bounds();
        self.draw_over_masked_in(full, |ctx, _| draw(ctx), |ctx, _| mask(ctx))
    }

    /// Composite a layer that only covers `region`.
    ///
    /// The scratch buffer spans `region` (rounded outward, clamped to the surface). `draw`
    /// receives the surface-to-buffer transform and must prepend it to every transform it sets.
    pub fn draw_over_in(
        &mut self,
        region: Rect,
        draw: impl FnOnce(&mut vello_cpu::RenderContext, Affine) -> PledgeResult<()>,
    ) -> PledgeResult<()> {
        let Some(area) = self.pixel_area(region)? else {
            return Ok(());
        };
        let layer = render_layer(area.width, area.height, |ctx| draw(ctx, area.to_local()))?;
        self.over_area(&area, layer.data_as_u8_slice())
    }

    /// Masked variant of [`Surface::draw_over_in`]; both closures get the same transform.
    pub fn draw_over_masked_in(
        &mut self,
        region: Rect,
        draw: impl FnOnce(&mut vello_cpu::RenderContext, Affine) -> PledgeResult<()>,
        mask: impl FnOnce(&mut vello_cpu::RenderContext, Affine) -> PledgeResult<()>,
    ) -> PledgeResult<()> {
        let Some(area) = self.pixel_area(region)? else {
            return Ok(());
        };
        let mut layer = render_layer(area.width, area.height, |ctx| draw(ctx, area.to_local()))?;
        let mask = render_layer(area.width, area.height, |ctx| mask(ctx, area.to_local()))?;
        mask_alpha_in_place(layer.data_as_u8_slice_mut(), mask.data_as_u8_slice())?;
        self.over_area(&area, layer.data_as_u8_slice())
    }

    /// Replace the surface content with `draw` rendered onto transparent.
    pub fn draw_replace(
        &mut self,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> PledgeResult<()>,
    ) -> PledgeResult<()> {
        self.pixmap = render_layer(self.width, self.height, draw)?;
        Ok(())
    }

    /// Copy the current pixels out as a [`RasterImage`].
    pub fn snapshot(&self) -> RasterImage {
        RasterImage {
            width: u32::from(self.width),
            height: u32::from(self.height),
            rgba8_premul: Arc::new(self.pixmap.data_as_u8_slice().to_vec()),
        }
    }

    pub fn into_raster(self) -> RasterImage {
        self.snapshot()
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    fn pixel_area(&self, region: Rect) -> PledgeResult<Option<PixelArea>> {
        if !region.is_finite() {
            return Err(PledgeError::validation("layer region must be finite"));
        }
        let r = region.expand().intersect(self.bounds());
        if r.width() < 1.0 || r.height() < 1.0 {
            return Ok(None);
        }
        Ok(Some(PixelArea {
            x: r.x0 as u16,
            y: r.y0 as u16,
            width: r.width() as u16,
            height: r.height() as u16,
        }))
    }

    fn over_area(&mut self, area: &PixelArea, src: &[u8]) -> PledgeResult<()> {
        let stride = usize::from(self.width) * 4;
        let row_len = usize::from(area.width) * 4;
        let dst = self.pixmap.data_as_u8_slice_mut();
        for (row, src_row) in src.chunks_exact(row_len).enumerate() {
            let start = (usize::from(area.y) + row) * stride + usize::from(area.x) * 4;
            let dst_row = dst
                .get_mut(start..start + row_len)
                .ok_or_else(|| PledgeError::validation("layer area outside the surface"))?;
            premul_over_in_place(dst_row, src_row)?;
        }
        Ok(())
    }
}

/// Integer pixel rectangle inside a surface.
struct PixelArea {
    x: u16,
    y: u16,
    width: u16,
    height: u16,
}

impl PixelArea {
    fn to_local(&self) -> Affine {
        Affine::translate((-f64::from(self.x), -f64::from(self.y)))
    }
}

fn render_layer(
    width: u16,
    height: u16,
    draw: impl FnOnce(&mut vello_cpu::RenderContext) -> PledgeResult<()>,
) -> PledgeResult<vello_cpu::Pixmap> {
    let mut ctx = vello_cpu::RenderContext::new(width, height);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    draw(&mut ctx)?;
    ctx.flush();

    let mut tmp = vello_cpu::Pixmap::new(width, height);
    clear_pixmap(&mut tmp, [0, 0, 0, 0]);
    ctx.render_to_pixmap(&mut tmp);
    Ok(tmp)
}

/// Image paint plus its intrinsic size.
#[derive(Clone)]
pub struct ImagePaint {
    pub paint: vello_cpu::Image,
    pub width: f64,
    pub height: f64,
}

impl ImagePaint {
    pub fn from_raster(img: &RasterImage) -> PledgeResult<Self> {
        let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
        Ok(Self {
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            width: f64::from(img.width),
            height: f64::from(img.height),
        })
    }

    /// Fill the image's own rectangle under `transform`.
    pub fn draw(&self, ctx: &mut vello_cpu::RenderContext, transform: Affine) {
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(self.paint.clone());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, self.width, self.height));
    }
}

/// Flatten any kurbo shape into a path in `vello_cpu`'s kurbo version.
pub fn shape_to_cpu(shape: &impl Shape) -> vello_cpu::kurbo::BezPath {
    let mut path = BezPath::new();
    for el in shape.path_elements(0.1) {
        path.push(el);
    }
    bezpath_to_cpu(&path)
}

pub fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

pub fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> PledgeResult<vello_cpu::Pixmap> {
    let (w, h) = PixelSize::new(width, height).to_u16()?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(PledgeError::validation("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    let mut may_have_opacities = false;
    for px in bytes.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

/// Premultiplied source-over: `dst = src + dst * (1 - src.a)`.
pub fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> PledgeResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(PledgeError::validation(
            "premul_over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = s[3] as u16;
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - sa;
        d[3] = add_sat_u8(sa as u8, mul_div255_u8(d[3] as u16, inv));
        for c in 0..3 {
            let dc = mul_div255_u8(d[c] as u16, inv);
            d[c] = add_sat_u8(s[c], dc);
        }
    }
    Ok(())
}

/// Scale every premultiplied pixel of `layer` by the alpha of `mask`.
pub fn mask_alpha_in_place(layer: &mut [u8], mask: &[u8]) -> PledgeResult<()> {
    if layer.len() != mask.len() || !layer.len().is_multiple_of(4) {
        return Err(PledgeError::validation(
            "mask_alpha_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (l, m) in layer.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let w = u16::from(m[3]);
        for c in l.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), w);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
