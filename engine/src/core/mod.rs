//! Shotline Core
//!
//! Timeline-to-shot resolution pipeline.
//! Create stage: selection, shot building and annotation. Collect stage:
//! reading annotations back, then enrichment from the interchange timeline.

pub mod annotations;
pub mod bins;
pub mod enrich;
pub mod fs;
pub mod interchange;
pub mod selection;
pub mod session;
pub mod settings;
pub mod shots;
pub mod template;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
