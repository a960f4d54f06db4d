//! Core layer - the normalized store and everything that queries it.
//!
//! This module provides:
//! - [`SpecialAttribute`] / [`AttributeSchema`] - Role resolution and attribute expansion
//! - [`PointBuilder`] - Dense point ids and lifecycle derivation during a parse
//! - [`PointCache`] - The immutable column-major sample store
//! - [`SampleBracket`] / [`IndexAtTime`] - Time lookup results
//! - [`SpawnState`] / [`SpawnRange`] - Incremental spawn queries
//! - [`RawData`] - Compressed copy of the source file
//! - [`GpuSnapshot`] - Frozen buffers for device upload

mod attribute;
mod builder;
mod cache;
mod compression;
mod query;
mod sample;
mod snapshot;
mod spawn;

pub use attribute::{find_attribute, AttributeSchema, SpecialAttribute, SpecialIndexes};
pub use builder::{Observation, PointBuilder, PointTables};
pub use cache::{AttributeEntry, CacheSummary, FrameStats, ParsedCache, PointCache, SpecialEntry};
pub use compression::{compress, decompress, RawData};
pub use sample::{IndexAtTime, SampleBracket};
pub use snapshot::{publish, GpuSnapshot, SnapshotReceiver};
pub use spawn::{SpawnRange, SpawnState};
