//! Percentage-based anchors resolved against a template's decoded pixel size.
//!
//! Anchors never look at display (on-screen) dimensions: the exported certificate is laid out
//! against the template's own pixels, so the result is identical for any viewport.

use crate::foundation::core::{Circle, PixelSize, Point, Rect};
use crate::foundation::error::{PledgeError, PledgeResult};

/// Text baseline origin plus a font size relative to template width.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextAnchor {
    /// Left edge of the baseline, percent of width.
    pub x: f64,
    /// Baseline, percent of height.
    pub y: f64,
    /// Font size, percent of width.
    pub font_size: f64,
}

/// Circle center plus a radius relative to template width.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CircleAnchor {
    /// Center, percent of width.
    pub x: f64,
    /// Center, percent of height.
    pub y: f64,
    /// Radius, percent of width.
    pub radius: f64,
}

/// Axis-aligned box: x/width against template width, y/height against template height.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoxAnchor {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Resolved text placement in template pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedText {
    /// Left end of the baseline.
    pub origin: Point,
    /// Font size in pixels, rounded to a whole pixel.
    pub font_px: f32,
}

fn pct(size: f64, percent: f64) -> f64 {
    size * (percent / 100.0)
}

impl TextAnchor {
    pub fn resolve(self, size: PixelSize) -> ResolvedText {
        ResolvedText {
            origin: Point::new(pct(size.width_f64(), self.x), pct(size.height_f64(), self.y)),
            font_px: pct(size.width_f64(), self.font_size).round() as f32,
        }
    }
}

impl CircleAnchor {
    pub fn resolve(self, size: PixelSize) -> Circle {
        Circle::new(
            Point::new(pct(size.width_f64(), self.x), pct(size.height_f64(), self.y)),
            pct(size.width_f64(), self.radius),
        )
    }
}

impl BoxAnchor {
    pub fn resolve(self, size: PixelSize) -> Rect {
        let x0 = pct(size.width_f64(), self.x);
        let y0 = pct(size.height_f64(), self.y);
        Rect::new(
            x0,
            y0,
            x0 + pct(size.width_f64(), self.width),
            y0 + pct(size.height_f64(), self.height),
        )
    }

    /// Whether `p`, given as percentages of the same reference box, lies inside.
    pub fn contains_percent(self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Every anchor the compositor needs, for one campaign.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnchorSet {
    pub name: TextAnchor,
    pub photo: CircleAnchor,
    pub signature: BoxAnchor,
    /// Signature box used when the record carries no photo.
    pub signature_without_photo: BoxAnchor,
}

impl Default for AnchorSet {
    fn default() -> Self {
        Self {
            name: TextAnchor {
                x: 41.0,
                y: 41.4,
                font_size: 2.8,
            },
            photo: CircleAnchor {
                x: 40.5,
                y: 73.0,
                radius: 8.0,
            },
            signature: BoxAnchor {
                x: 53.0,
                y: 67.5,
                width: 26.0,
                height: 15.0,
            },
            signature_without_photo: BoxAnchor {
                x: 57.8,
                y: 60.5,
                width: 22.0,
                height: 10.5,
            },
        }
    }
}

/// [`AnchorSet`] resolved for one template size.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedAnchors {
    pub template: PixelSize,
    pub name: ResolvedText,
    pub photo: Circle,
    pub signature: Rect,
    pub signature_without_photo: Rect,
}

impl ResolvedAnchors {
    /// Signature box for a record with or without a photo.
    pub fn signature_box(&self, has_photo: bool) -> Rect {
        if has_photo {
            self.signature
        } else {
            self.signature_without_photo
        }
    }
}

impl AnchorSet {
    pub fn resolve(&self, template: PixelSize) -> ResolvedAnchors {
        ResolvedAnchors {
            template,
            name: self.name.resolve(template),
            photo: self.photo.resolve(template),
            signature: self.signature.resolve(template),
            signature_without_photo: self.signature_without_photo.resolve(template),
        }
    }

    pub fn validate(&self) -> PledgeResult<()> {
        let check = |what: &str, v: f64, allow_zero: bool| -> PledgeResult<()> {
            if !v.is_finite() || !(0.0..=100.0).contains(&v) || (!allow_zero && v == 0.0) {
                return Err(PledgeError::validation(format!(
                    "anchor {what} must be a percentage in 0..=100 (got {v})"
                )));
            }
            Ok(())
        };

        check("name.x", self.name.x, true)?;
        check("name.y", self.name.y, true)?;
        check("name.font_size", self.name.font_size, false)?;
        check("photo.x", self.photo.x, true)?;
        check("photo.y", self.photo.y, true)?;
        check("photo.radius", self.photo.radius, false)?;
        for (prefix, b) in [
            ("signature", self.signature),
            ("signature_without_photo", self.signature_without_photo),
        ] {
            check(&format!("{prefix}.x"), b.x, true)?;
            check(&format!("{prefix}.y"), b.y, true)?;
            check(&format!("{prefix}.width"), b.width, false)?;
            check(&format!("{prefix}.height"), b.height, false)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/anchors.rs"]
mod tests;
