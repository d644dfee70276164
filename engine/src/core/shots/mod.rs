//! Shots Module
//!
//! Derived shots and the sub-products published from them.
//!
//! # Modules
//!
//! - `models`: `ShotDescriptor`, `SubProduct` and frame data
//! - `registry`: sub-product builders keyed by creator identifier
//! - `builder`: per-clip shot construction

mod builder;
mod models;
mod registry;

pub use builder::{BuiltShot, ShotBuilder};
pub use models::*;
pub use registry::*;
