//! Freehand signature capture onto a fixed-resolution transparent buffer.
//!
//! Pointer positions arrive in display coordinates and are mapped into buffer pixels, so the ink
//! stays crisp whatever size the pad is shown at. Strokes are kept as point lists and the buffer
//! is re-rasterized from them on demand.

use crate::{
    assets::raster::{EncodedImage, RasterImage},
    foundation::core::{BezPath, Circle, PixelSize, Point, Rgba8},
    foundation::error::PledgeResult,
    render::encode::encode_png,
    render::surface::{Surface, bezpath_to_cpu, shape_to_cpu},
};

/// Buffer geometry and pen of a signature pad.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PadConfig {
    pub width: u32,
    pub height: u32,
    pub stroke_width: f64,
    pub ink: Rgba8,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 200,
            stroke_width: 3.0,
            ink: Rgba8::opaque(0x1e, 0x3a, 0x8a),
        }
    }
}

pub struct SignaturePad {
    config: PadConfig,
    displayed: Option<PixelSize>,
    strokes: Vec<Vec<Point>>,
    drawing: bool,
    surface: Option<Surface>,
    dirty: bool,
    snapshot: Option<EncodedImage>,
}

impl SignaturePad {
    pub fn new(config: PadConfig) -> Self {
        Self {
            config,
            displayed: None,
            strokes: Vec::new(),
            drawing: false,
            surface: None,
            dirty: false,
            snapshot: None,
        }
    }

    pub fn config(&self) -> &PadConfig {
        &self.config
    }

    pub fn buffer_size(&self) -> PixelSize {
        PixelSize::new(self.config.width, self.config.height)
    }

    pub fn is_mounted(&self) -> bool {
        self.displayed.is_some()
    }

    /// Attach the pad to an on-screen area of `displayed` size.
    pub fn mount(&mut self, displayed: PixelSize) {
        self.displayed = Some(displayed);
    }

    /// Detach from the screen. Ink and snapshot survive; an in-progress stroke ends.
    pub fn unmount(&mut self) {
        self.displayed = None;
        self.drawing = false;
    }

    pub fn resize_display(&mut self, displayed: PixelSize) {
        if self.displayed.is_some() {
            self.displayed = Some(displayed);
        }
    }

    pub fn begin_stroke(&mut self, at: Point) {
        let Some(p) = self.to_buffer(at) else {
            return;
        };
        self.strokes.push(vec![p]);
        self.drawing = true;
        self.dirty = true;
    }

    pub fn extend_stroke(&mut self, at: Point) {
        if !self.drawing {
            return;
        }
        let Some(p) = self.to_buffer(at) else {
            return;
        };
        if let Some(stroke) = self.strokes.last_mut() {
            stroke.push(p);
            self.dirty = true;
        }
    }

    /// Finish the active stroke and snapshot the buffer as PNG.
    ///
    /// Returns `None` while nothing has been drawn, including right after [`SignaturePad::clear`].
    /// Without an active stroke the existing snapshot is returned unchanged.
    pub fn end_stroke(&mut self) -> Option<EncodedImage> {
        if self.displayed.is_none() {
            return None;
        }
        if !self.drawing {
            return self.snapshot.clone();
        }
        self.drawing = false;
        if self.strokes.is_empty() {
            return None;
        }
        match self.render().and_then(|raster| encode_png(&raster)) {
            Ok(png) => {
                self.snapshot = Some(png);
            }
            Err(e) => {
                tracing::warn!(error = %e, "signature snapshot failed");
            }
        }
        self.snapshot.clone()
    }

    /// Wipe to transparent and forget the last snapshot.
    pub fn clear(&mut self) {
        if self.displayed.is_none() {
            return;
        }
        self.strokes.clear();
        self.drawing = false;
        self.snapshot = None;
        self.dirty = true;
    }

    pub fn snapshot(&self) -> Option<&EncodedImage> {
        self.snapshot.as_ref()
    }

    pub fn has_ink(&self) -> bool {
        !self.strokes.is_empty()
    }

    /// Current buffer contents, e.g. for live preview.
    pub fn raster(&mut self) -> PledgeResult<RasterImage> {
        self.render()
    }

    fn to_buffer(&self, at: Point) -> Option<Point> {
        let displayed = self.displayed?;
        if displayed.is_empty() {
            return None;
        }
        let sx = f64::from(self.config.width) / displayed.width_f64();
        let sy = f64::from(self.config.height) / displayed.height_f64();
        Some(Point::new(at.x * sx, at.y * sy))
    }

    fn render(&mut self) -> PledgeResult<RasterImage> {
        let mut surface = match self.surface.take() {
            Some(s) => s,
            None => {
                self.dirty = true;
                Surface::new(self.buffer_size())?
            }
        };
        if self.dirty {
            let strokes = &self.strokes;
            let config = self.config;
            surface.draw_replace(|ctx| {
                paint_strokes(ctx, strokes, &config);
                Ok(())
            })?;
            self.dirty = false;
        }
        let raster = surface.snapshot();
        self.surface = Some(surface);
        Ok(raster)
    }
}

fn paint_strokes(ctx: &mut vello_cpu::RenderContext, strokes: &[Vec<Point>], config: &PadConfig) {
    let ink = config.ink;
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        ink.r, ink.g, ink.b, ink.a,
    ));
    ctx.set_stroke(
        vello_cpu::kurbo::Stroke::new(config.stroke_width)
            .with_caps(vello_cpu::kurbo::Cap::Round)
            .with_join(vello_cpu::kurbo::Join::Round),
    );

    for stroke in strokes {
        match stroke.as_slice() {
            [] => {}
            [dot] => {
                let circle = Circle::new(*dot, config.stroke_width / 2.0);
                ctx.fill_path(&shape_to_cpu(&circle));
            }
            [first, rest @ ..] => {
                let mut path = BezPath::new();
                path.move_to(*first);
                for p in rest {
                    path.line_to(*p);
                }
                ctx.stroke_path(&bezpath_to_cpu(&path));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/signature/pad.rs"]
mod tests;
