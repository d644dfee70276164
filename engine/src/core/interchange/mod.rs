//! Interchange Timeline
//!
//! Parsed export of the edit, read by the enrichment pass. Clips are matched
//! back to shots by `clip_index`.

mod lookup;
mod models;

pub use lookup::*;
pub use models::*;
