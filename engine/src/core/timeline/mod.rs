//! Timeline Module
//!
//! Host-side timeline structure consumed by the selection and build stages.

mod models;

pub use models::*;
