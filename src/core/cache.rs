//! The loaded point cache.
//!
//! [`PointCache`] owns the column-major sample table, the expanded attribute
//! names, the special role table and the per-point lifecycle arrays. It is
//! immutable once built; queries live in `query` and `spawn`.

use serde::Serialize;

use super::attribute::{find_attribute, AttributeSchema, SpecialAttribute, SpecialIndexes};
use super::builder::PointTables;
use super::compression::RawData;
use crate::loader::FileType;
use crate::util::UNSET;

// ============================================================================
// Parse output
// ============================================================================

/// Frame bookkeeping gathered while loading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub number_of_frames: usize,
    pub first_frame: f32,
    pub last_frame: f32,
    pub min_sample_time: f32,
    pub max_sample_time: f32,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            number_of_frames: 0,
            first_frame: f32::MAX,
            last_frame: UNSET,
            min_sample_time: f32::MAX,
            max_sample_time: UNSET,
        }
    }
}

impl FrameStats {
    /// Widen the time range to include `time`.
    pub fn add_time(&mut self, time: f32) {
        if time < self.min_sample_time {
            self.min_sample_time = time;
        }
        if time > self.max_sample_time {
            self.max_sample_time = time;
        }
    }

    /// Widen the frame range to include `frame`.
    pub fn add_frame(&mut self, frame: f32) {
        if frame < self.first_frame {
            self.first_frame = frame;
        }
        if frame > self.last_frame {
            self.last_frame = frame;
        }
    }
}

/// Everything a parser hands over to build a [`PointCache`].
#[derive(Debug)]
pub struct ParsedCache {
    pub schema: AttributeSchema,
    pub number_of_samples: usize,
    /// Column-major: `sample + attribute * number_of_samples`.
    pub samples: Vec<f32>,
    pub points: PointTables,
    pub frames: FrameStats,
}

// ============================================================================
// Store
// ============================================================================

/// Normalized point cache.
#[derive(Clone, Debug)]
pub struct PointCache {
    number_of_samples: usize,
    number_of_attributes: usize,
    number_of_points: usize,
    frames: FrameStats,
    samples: Vec<f32>,
    attribute_names: Vec<String>,
    special: SpecialIndexes,
    point_value_indexes: Vec<Vec<usize>>,
    spawn_times: Vec<f32>,
    life_values: Vec<f32>,
    point_types: Vec<i32>,
    format: FileType,
    raw_data: Option<RawData>,
}

impl PointCache {
    pub(crate) fn from_parsed(parsed: ParsedCache, format: FileType, raw_data: Option<RawData>) -> Self {
        let ParsedCache {
            schema,
            number_of_samples,
            samples,
            points,
            frames,
        } = parsed;

        Self {
            number_of_samples,
            number_of_attributes: schema.number_of_attributes,
            number_of_points: points.len(),
            frames,
            samples,
            attribute_names: schema.names,
            special: schema.special,
            point_value_indexes: points.point_value_indexes,
            spawn_times: points.spawn_times,
            life_values: points.life_values,
            point_types: points.point_types,
            format,
            raw_data,
        }
    }

    // ------------------------------------------------------------------------
    // Counts
    // ------------------------------------------------------------------------

    #[inline]
    pub fn number_of_samples(&self) -> usize {
        self.number_of_samples
    }

    #[inline]
    pub fn number_of_attributes(&self) -> usize {
        self.number_of_attributes
    }

    /// Distinct points; equals the sample count when there is no id column.
    #[inline]
    pub fn number_of_points(&self) -> usize {
        self.number_of_points
    }

    #[inline]
    pub fn frame_stats(&self) -> &FrameStats {
        &self.frames
    }

    /// Longest per-point sample list.
    pub fn max_number_of_point_value_indexes(&self) -> usize {
        self.point_value_indexes.iter().map(Vec::len).max().unwrap_or(0)
    }

    // ------------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------------

    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    pub fn special_indexes(&self) -> &SpecialIndexes {
        &self.special
    }

    /// Column of a special role, if present and in range.
    pub fn role_index(&self, role: SpecialAttribute) -> Option<usize> {
        self.special
            .get(role)
            .filter(|&column| column < self.number_of_attributes)
    }

    pub fn has_role(&self, role: SpecialAttribute) -> bool {
        self.role_index(role).is_some()
    }

    /// Column for `name`; see [`find_attribute`].
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        find_attribute(&self.attribute_names, name)
    }

    // ------------------------------------------------------------------------
    // Bulk arrays
    // ------------------------------------------------------------------------

    /// Column-major sample table.
    pub fn float_sample_data(&self) -> &[f32] {
        &self.samples
    }

    pub fn point_value_indexes(&self) -> &[Vec<usize>] {
        &self.point_value_indexes
    }

    pub fn spawn_times(&self) -> &[f32] {
        &self.spawn_times
    }

    pub fn life_values(&self) -> &[f32] {
        &self.life_values
    }

    pub fn point_types(&self) -> &[i32] {
        &self.point_types
    }

    // ------------------------------------------------------------------------
    // Source
    // ------------------------------------------------------------------------

    pub fn format(&self) -> FileType {
        self.format
    }

    pub fn raw_data(&self) -> Option<&RawData> {
        self.raw_data.as_ref()
    }

    /// Serializable overview of the cache.
    pub fn summary(&self) -> CacheSummary {
        let attributes = self
            .attribute_names
            .iter()
            .enumerate()
            .map(|(index, name)| AttributeEntry {
                index,
                name: name.clone(),
            })
            .collect();

        let special_attributes = SpecialAttribute::ALL
            .iter()
            .filter_map(|&role| {
                self.role_index(role).map(|index| SpecialEntry {
                    role,
                    name: role.label(),
                    index,
                })
            })
            .collect();

        CacheSummary {
            format: self.format.format_id().to_string(),
            number_of_samples: self.number_of_samples,
            number_of_attributes: self.number_of_attributes,
            number_of_points: self.number_of_points,
            number_of_frames: self.frames.number_of_frames,
            first_frame: self.frames.first_frame,
            last_frame: self.frames.last_frame,
            min_sample_time: self.frames.min_sample_time,
            max_sample_time: self.frames.max_sample_time,
            first_spawn_time: self.spawn_times.first().copied(),
            last_spawn_time: self.spawn_times.last().copied(),
            max_samples_per_point: self.max_number_of_point_value_indexes(),
            attributes,
            special_attributes,
            raw_format: self.raw_data.as_ref().map(|r| r.format_id().to_string()),
            raw_size: self.raw_data.as_ref().map(RawData::uncompressed_size),
            raw_compressed_size: self.raw_data.as_ref().map(RawData::compressed_size),
        }
    }
}

// ============================================================================
// Summary
// ============================================================================

#[derive(Clone, Debug, Serialize)]
pub struct AttributeEntry {
    pub index: usize,
    pub name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SpecialEntry {
    pub role: SpecialAttribute,
    pub name: &'static str,
    pub index: usize,
}

/// Overview returned by [`PointCache::summary`].
#[derive(Clone, Debug, Serialize)]
pub struct CacheSummary {
    pub format: String,
    pub number_of_samples: usize,
    pub number_of_attributes: usize,
    pub number_of_points: usize,
    pub number_of_frames: usize,
    pub first_frame: f32,
    pub last_frame: f32,
    pub min_sample_time: f32,
    pub max_sample_time: f32,
    pub first_spawn_time: Option<f32>,
    pub last_spawn_time: Option<f32>,
    pub max_samples_per_point: usize,
    pub attributes: Vec<AttributeEntry>,
    pub special_attributes: Vec<SpecialEntry>,
    pub raw_format: Option<String>,
    pub raw_size: Option<usize>,
    pub raw_compressed_size: Option<usize>,
}
