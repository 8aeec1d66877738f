//! Resolution-independent placement of certificate layers and editor hit areas.

/// Percentage anchors resolved against a template's pixel size.
pub mod anchors;
/// Editor click regions.
pub mod regions;
