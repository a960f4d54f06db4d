//! # Houdini point cache
//!
//! Loader and temporal query engine for point caches exported from Houdini:
//! `.hcsv`, text `.hjson` (or its legacy tagged binary variant) and compact
//! binary `.hbjson`.
//!
//! Every format is normalized into one column-major sample table with dense
//! point ids, per-point sample lists sorted by time, and derived spawn time,
//! life and type per point. Queries interpolate any attribute of a point at
//! an arbitrary time.
//!
//! ## Modules
//!
//! - [`util`] - Errors, float helpers, coordinate conversion
//! - [`core`] - Attribute schema, the [`PointCache`] store and its queries
//! - [`loader`] - Token readers, format parsers, dispatch and raw export
//!
//! ## Example
//!
//! ```ignore
//! use houdini_pointcache::prelude::*;
//!
//! let cache = PointCache::load("sparks.hcsv")?;
//! let mut state = SpawnState::default();
//! for id in cache.point_ids_to_spawn_at_time(0.5, &mut state).ids() {
//!     let p = cache.point_position_at_time(id, 0.5);
//!     println!("{id}: {p:?}");
//! }
//! ```

pub mod core;
pub mod loader;
pub mod util;

pub use crate::core::PointCache;
pub use loader::{FileType, LoadOptions};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        GpuSnapshot, IndexAtTime, PointCache, SampleBracket, SpawnRange, SpawnState,
        SpecialAttribute,
    };
    pub use crate::loader::{export_raw, export_raw_to_path, FileType, LoadOptions};
    pub use crate::util::{Error, Quat, Result, Vec3, Vec4};
}
