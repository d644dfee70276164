//! Template System
//!
//! Naming and hierarchy templates for derived shots.
//!
//! # Modules
//!
//! - `resolver`: `{token}` expansion and `#` shot numbering

pub mod resolver;

pub use resolver::{pad_hashes, resolve, resolve_shot, tokens, ShotCounter, TokenContext};
