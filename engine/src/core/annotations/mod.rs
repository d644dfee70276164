//! Annotation Store
//!
//! The only durable state of the pipeline: a JSON blob kept in a single
//! metadata slot on a clip (shot descriptors) or on the timeline itself
//! (editorial package).
//!
//! Hosts offer no way to delete a slot, so clearing writes `{}`.

mod editorial;
mod store;

pub use editorial::*;
pub use store::*;
