//! The pledge flow: record, state machine, analytics hook.

pub mod analytics;
pub mod machine;
pub mod record;
