//! Clickable areas on the editor template that open the matching sub-dialog.

use crate::foundation::core::{PixelSize, Point};
use crate::layout::anchors::BoxAnchor;
use crate::wizard::machine::Dialog;

/// Editor hit regions, as percentages of the displayed template.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HitRegions {
    pub name: BoxAnchor,
    pub photo: BoxAnchor,
    pub signature: BoxAnchor,
}

impl Default for HitRegions {
    fn default() -> Self {
        Self {
            name: BoxAnchor {
                x: 38.0,
                y: 37.0,
                width: 35.0,
                height: 6.0,
            },
            photo: BoxAnchor {
                x: 32.0,
                y: 63.0,
                width: 17.0,
                height: 20.0,
            },
            signature: BoxAnchor {
                x: 53.0,
                y: 68.0,
                width: 17.0,
                height: 10.0,
            },
        }
    }
}

impl HitRegions {
    /// Map a pointer position on the displayed template to the dialog it opens.
    ///
    /// `point` is relative to the top-left corner of the displayed template and `displayed` is
    /// its on-screen size, which need not match the template's pixel size.
    pub fn hit_test(&self, point: Point, displayed: PixelSize) -> Option<Dialog> {
        if displayed.is_empty() {
            return None;
        }
        let px = point.x / displayed.width_f64() * 100.0;
        let py = point.y / displayed.height_f64() * 100.0;

        [
            (self.name, Dialog::Name),
            (self.photo, Dialog::Photo),
            (self.signature, Dialog::Signature),
        ]
        .into_iter()
        .find(|(region, _)| region.contains_percent(px, py))
        .map(|(_, dialog)| dialog)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/regions.rs"]
mod tests;
