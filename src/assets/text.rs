use std::sync::Arc;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{PledgeError, PledgeResult};

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Where the glyphs of the name come from.
#[derive(Clone, PartialEq, Eq)]
pub enum FontChoice {
    /// Bytes of a font file, registered with the layout engine.
    Bytes(Arc<Vec<u8>>),
    /// CSS-style family list resolved against the installed fonts.
    Family(String),
}

impl std::fmt::Debug for FontChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Family(family) => f.debug_tuple("Family").field(family).finish(),
        }
    }
}

/// Name line shaped and ready to rasterize.
///
/// Glyph runs carry the font data they were shaped with.
#[derive(Clone)]
pub struct PreparedText {
    /// Single-line layout, origin at its top-left corner.
    pub layout: Arc<parley::Layout<TextBrushRgba8>>,
    /// Distance from the layout top to the first baseline, in pixels.
    pub baseline: f32,
    /// Family list the layout was shaped with.
    pub font_family: String,
}

impl std::fmt::Debug for PreparedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedText")
            .field("layout_ptr", &Arc::as_ptr(&self.layout))
            .field("baseline", &self.baseline)
            .field("font_family", &self.font_family)
            .finish()
    }
}

/// Stateful helper for building Parley text layouts.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape one bold, left-aligned line of text.
    ///
    /// Fails when no font could be resolved for a non-blank `text`.
    pub fn layout_bold_line(
        &mut self,
        text: &str,
        font: &FontChoice,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> PledgeResult<PreparedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PledgeError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let family = match font {
            FontChoice::Bytes(bytes) => self.register(bytes)?,
            FontChoice::Family(family) => family.clone(),
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::BOLD,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        if !text.trim().is_empty() && !has_glyphs(&layout) {
            return Err(PledgeError::validation(format!(
                "no font found for '{family}'"
            )));
        }

        let baseline = layout
            .lines()
            .next()
            .map(|line| line.metrics().baseline)
            .unwrap_or(0.0);

        Ok(PreparedText {
            layout: Arc::new(layout),
            baseline,
            font_family: family,
        })
    }

    // Returns the primary family name of the registered font.
    fn register(&mut self, bytes: &Arc<Vec<u8>>) -> PledgeResult<String> {
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            PledgeError::validation("no font families registered from font bytes")
        })?;

        Ok(self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PledgeError::validation("registered font family has no name"))?
            .to_string())
    }
}

fn has_glyphs(layout: &parley::Layout<TextBrushRgba8>) -> bool {
    layout.lines().any(|line| {
        line.items().any(|item| match item {
            parley::layout::PositionedLayoutItem::GlyphRun(run) => {
                !run.run().font().data.data().is_empty() && run.glyphs().any(|g| g.id != 0)
            }
            parley::layout::PositionedLayoutItem::InlineBox(_) => false,
        })
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
