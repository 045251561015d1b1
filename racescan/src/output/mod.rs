//! Rendering of analysis results.
//!
//! The engine only guarantees the warning field contract; everything here is
//! presentation. `reports` prints the human-readable tables, `json` emits
//! the stable machine-readable shape.

pub mod json;
pub mod reports;
