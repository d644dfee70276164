//! Shotline Core Library
//!
//! Turns clips on an editorial timeline into named, hierarchical shots,
//! keeps them as annotations on the clips so runs can be resumed, and
//! enriches collected shots with resolution data from an interchange export.
//!
//! ## Stages
//!
//! - **create**: [`core::session::ShotSession::create`] selects clips, builds
//!   descriptors and persists them on their clips.
//! - **collect**: [`core::session::ShotSession::collect`] reads them back.
//! - **enrich**: [`core::enrich::enrich_all`] matches collected shots to an
//!   [`core::interchange::InterchangeTimeline`].

pub mod core;

pub use crate::core::{CoreError, CoreResult};
