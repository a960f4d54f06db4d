//! Utility types and functions shared by the loaders and the store.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math re-exports from glam and Houdini coordinate conversion

mod error;
mod math;

pub use error::*;
pub use math::*;
