/// Freehand signature pad.
pub mod pad;
