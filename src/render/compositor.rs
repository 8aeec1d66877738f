//! Certificate compositing: template, name, circular photo, signature, then JPEG.
//!
//! Every layer is decoded before it is drawn and drawn before the next layer is decoded, so the
//! target surface only ever sees one writer and layers land in a fixed order.

use std::sync::Arc;

use anyhow::Context;
use kurbo::Shape;

use crate::{
    assets::decode::decode_layer,
    assets::raster::{EncodedImage, RasterImage},
    assets::source::ImageSource,
    assets::text::{FontChoice, PreparedText, TextLayoutEngine},
    config::CampaignConfig,
    foundation::core::{Affine, Circle, Rect, Rgba8},
    foundation::error::{Layer, PledgeError, PledgeResult},
    layout::anchors::{AnchorSet, ResolvedAnchors},
    render::encode::encode_jpeg,
    render::surface::{ImagePaint, Surface, affine_to_cpu, shape_to_cpu},
    wizard::record::{GeneratedCertificate, PledgeRecord},
};

/// Pipeline stages, reported in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositorStage {
    LoadTemplate,
    DrawBackground,
    DrawName,
    DrawPhoto,
    DrawSignature,
    Encode,
    Done,
}

/// Everything about the look of a certificate except the template itself.
#[derive(Clone, Debug)]
pub struct CertificateStyle {
    pub anchors: AnchorSet,
    pub name_color: Rgba8,
    pub background: Rgba8,
    pub jpeg_quality: u8,
    pub name_font: FontChoice,
}

impl CertificateStyle {
    /// Style of a campaign. A configured `name_font` file is read here.
    pub fn from_config(config: &CampaignConfig) -> PledgeResult<Self> {
        let name_font = match &config.name_font {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("read name font '{}'", path.display()))?;
                FontChoice::Bytes(Arc::new(bytes))
            }
            None => FontChoice::Family(config.name_font_family.clone()),
        };
        Ok(Self {
            anchors: config.anchors,
            name_color: config.name_color,
            background: config.background,
            jpeg_quality: config.jpeg_quality,
            name_font,
        })
    }

    pub fn with_font(mut self, font_bytes: Vec<u8>) -> Self {
        self.name_font = FontChoice::Bytes(Arc::new(font_bytes));
        self
    }
}

/// Composited certificate before encoding.
#[derive(Clone, Debug)]
pub struct CertificateFrame {
    pub image: RasterImage,
    /// Geometry the layers were placed with.
    pub anchors: ResolvedAnchors,
}

pub struct Compositor {
    template: Arc<dyn ImageSource>,
    style: CertificateStyle,
}

impl Compositor {
    pub fn new(template: Arc<dyn ImageSource>, style: CertificateStyle) -> Self {
        Self { template, style }
    }

    pub fn style(&self) -> &CertificateStyle {
        &self.style
    }

    /// Composite `record` onto the template without encoding.
    pub async fn render(&self, record: &PledgeRecord) -> PledgeResult<CertificateFrame> {
        self.run(record, &mut |_| {}).await
    }

    /// Composite and encode `record`.
    pub async fn compose(&self, record: &PledgeRecord) -> PledgeResult<GeneratedCertificate> {
        self.compose_with_progress(record, |_| {}).await
    }

    /// Like [`Compositor::compose`], calling `on_stage` as each stage starts.
    pub async fn compose_with_progress(
        &self,
        record: &PledgeRecord,
        mut on_stage: impl FnMut(CompositorStage) + Send,
    ) -> PledgeResult<GeneratedCertificate> {
        let frame = self.run(record, &mut on_stage).await?;

        on_stage(CompositorStage::Encode);
        let background = self.style.background;
        let quality = self.style.jpeg_quality;
        let image = frame.image;
        let size = image.size();
        let encoded: EncodedImage =
            tokio::task::spawn_blocking(move || encode_jpeg(&image, background, quality))
                .await
                .map_err(|e| PledgeError::encode(format!("encode task failed: {e}")))??;

        on_stage(CompositorStage::Done);
        tracing::info!(%size, bytes = encoded.len(), "certificate composed");
        Ok(GeneratedCertificate::new(encoded, size))
    }

    #[tracing::instrument(
        skip(self, record, on_stage),
        fields(
            template = %self.template.describe(),
            photo = record.photo.is_some(),
            signature = record.signature.is_some()
        )
    )]
    async fn run(
        &self,
        record: &PledgeRecord,
        on_stage: &mut (dyn FnMut(CompositorStage) + Send),
    ) -> PledgeResult<CertificateFrame> {
        on_stage(CompositorStage::LoadTemplate);
        let bytes = self
            .template
            .load()
            .await
            .map_err(|e| PledgeError::decode(Layer::Template, e.to_string()))?;
        let template = decode_layer(Layer::Template, bytes).await?;
        let anchors = self.style.anchors.resolve(template.size());
        tracing::debug!(size = %anchors.template, "template loaded");

        on_stage(CompositorStage::DrawBackground);
        let mut surface = Surface::from_raster(&template)?;
        drop(template);

        on_stage(CompositorStage::DrawName);
        self.draw_name(&mut surface, &record.name, &anchors)?;

        if let Some(photo) = &record.photo {
            on_stage(CompositorStage::DrawPhoto);
            let photo = decode_layer(Layer::Photo, photo.bytes.clone()).await?;
            tracing::debug!(
                cx = anchors.photo.center.x,
                cy = anchors.photo.center.y,
                radius = anchors.photo.radius,
                "drawing photo"
            );
            draw_photo(&mut surface, &photo, anchors.photo)?;
        }

        if let Some(signature) = &record.signature {
            on_stage(CompositorStage::DrawSignature);
            let signature = decode_layer(Layer::Signature, signature.bytes.clone()).await?;
            let target = anchors.signature_box(record.photo.is_some());
            tracing::debug!(
                x = target.x0,
                y = target.y0,
                w = target.width(),
                h = target.height(),
                "drawing signature"
            );
            draw_stretched(&mut surface, &signature, target)?;
        }

        Ok(CertificateFrame {
            image: surface.into_raster(),
            anchors,
        })
    }

    fn draw_name(
        &self,
        surface: &mut Surface,
        name: &str,
        anchors: &ResolvedAnchors,
    ) -> PledgeResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }

        let mut engine = TextLayoutEngine::new();
        let prepared = engine.layout_bold_line(
            name,
            &self.style.name_font,
            anchors.name.font_px,
            self.style.name_color.into(),
        )?;
        let origin = anchors.name.origin;
        tracing::debug!(
            x = origin.x,
            y = origin.y,
            font_px = anchors.name.font_px,
            "drawing name"
        );
        let top = origin.y - f64::from(prepared.baseline);
        let overhang = f64::from(anchors.name.font_px) * 0.5;
        let region = Rect::new(
            origin.x,
            top,
            origin.x + f64::from(prepared.layout.width()),
            top + f64::from(prepared.layout.height()),
        )
        .inflate(overhang, overhang);
        surface.draw_over_in(region, |ctx, local| {
            draw_text(ctx, &prepared, local * Affine::translate((origin.x, top)));
            Ok(())
        })
    }
}

/// Draw a prepared layout whose top-left corner `transform` maps into place.
fn draw_text(ctx: &mut vello_cpu::RenderContext, text: &PreparedText, transform: Affine) {
    // Fonts by (blob id, collection index); fallback can mix several in one line.
    let mut fonts: Vec<(u64, u32, vello_cpu::peniko::FontData)> = Vec::new();
    ctx.set_transform(affine_to_cpu(transform));

    for line in text.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let shaped = run.run().font();
            let key = (shaped.data.id(), shaped.index);
            let font = match fonts.iter().find(|(id, index, _)| (*id, *index) == key) {
                Some((_, _, font)) => font.clone(),
                None => {
                    let font = vello_cpu::peniko::FontData::new(
                        vello_cpu::peniko::Blob::from(shaped.data.data().to_vec()),
                        shaped.index,
                    );
                    fonts.push((key.0, key.1, font.clone()));
                    font
                }
            };

            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));

            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

/// Transform that scales an image of `w`×`h` to cover `clip` while keeping its aspect ratio,
/// centered on the circle.
pub fn cover_transform(w: f64, h: f64, clip: Circle) -> Affine {
    let diameter = clip.radius * 2.0;
    let aspect = w / h;
    let (draw_w, draw_h) = if aspect > 1.0 {
        (diameter * aspect, diameter)
    } else {
        (diameter, diameter / aspect)
    };
    Affine::translate((clip.center.x - draw_w / 2.0, clip.center.y - draw_h / 2.0))
        * Affine::scale(draw_w / w)
}

/// Transform that maps an image of `w`×`h` exactly onto `target`.
pub fn stretch_transform(w: f64, h: f64, target: Rect) -> Affine {
    Affine::translate((target.x0, target.y0))
        * Affine::scale_non_uniform(target.width() / w, target.height() / h)
}

fn draw_photo(surface: &mut Surface, photo: &RasterImage, clip: Circle) -> PledgeResult<()> {
    let paint = ImagePaint::from_raster(photo)?;
    let transform = cover_transform(paint.width, paint.height, clip);
    let mask = shape_to_cpu(&clip);
    surface.draw_over_masked_in(
        clip.bounding_box(),
        |ctx, local| {
            paint.draw(ctx, local * transform);
            Ok(())
        },
        |ctx, local| {
            ctx.set_transform(affine_to_cpu(local));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
            ctx.fill_path(&mask);
            Ok(())
        },
    )
}

fn draw_stretched(surface: &mut Surface, img: &RasterImage, target: Rect) -> PledgeResult<()> {
    let paint = ImagePaint::from_raster(img)?;
    let transform = stretch_transform(paint.width, paint.height, target);
    surface.draw_over_in(target, |ctx, local| {
        paint.draw(ctx, local * transform);
        Ok(())
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
