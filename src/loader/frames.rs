//! Header and frame processing shared by the JSON-family formats.
//!
//! Text JSON, HBJSON and the tagged binary variant all describe the same
//! logical layout: a header declaring attributes and counts, then a list of
//! frames that each hold one row per point. Parsers decode their own syntax
//! into [`Header`] and [`Frame`] values and hand them to a
//! [`FrameAssembler`], which owns the sample table and point builder.

use std::cmp::Ordering;

use tracing::debug;

use crate::core::{
    AttributeSchema, FrameStats, Observation, ParsedCache, PointBuilder, SpecialAttribute,
};
use crate::util::{Error, Result, UNSET};

// ============================================================================
// Header
// ============================================================================

/// Declared layout of a JSON-family cache.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    pub version: String,
    pub num_samples: usize,
    pub num_frames: usize,
    pub num_points: usize,
    pub num_attrib: usize,
    pub attrib_name: Vec<String>,
    pub attrib_size: Vec<usize>,
    /// One marker per component, `0` for "native". May be empty.
    pub attrib_data_type: Vec<u8>,
    pub data_type: String,
}

impl Header {
    /// Values per sample row in the file.
    pub fn component_count(&self) -> usize {
        self.attrib_size.iter().sum()
    }

    /// Cross-check the header arrays against the declared counts.
    pub fn validate(&self) -> Result<()> {
        if self.attrib_name.len() != self.num_attrib {
            return Err(Error::header("attrib_name", self.num_attrib, self.attrib_name.len()));
        }
        if self.attrib_size.len() != self.num_attrib {
            return Err(Error::header("attrib_size", self.num_attrib, self.attrib_size.len()));
        }
        let components = self.component_count();
        if !self.attrib_data_type.is_empty() && self.attrib_data_type.len() != components {
            return Err(Error::header(
                "attrib_data_type",
                components,
                self.attrib_data_type.len(),
            ));
        }
        Ok(())
    }

    /// Marker byte of each `attrib_data_type` entry: its first character.
    pub fn data_type_markers<S: AsRef<str>>(entries: &[S]) -> Vec<u8> {
        entries
            .iter()
            .map(|s| s.as_ref().bytes().next().unwrap_or(0))
            .collect()
    }
}

// ============================================================================
// Frames
// ============================================================================

/// One decoded frame: every row shares `time`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub number: f32,
    pub time: f32,
    pub num_points: usize,
    pub rows: Vec<Vec<f32>>,
}

/// True if a later row is older than the first one.
pub fn needs_age_sort(rows: &[Vec<f32>], age: usize) -> bool {
    let Some(first) = rows.first().and_then(|r| r.get(age)) else {
        return false;
    };
    rows.iter().skip(1).any(|r| r.get(age).is_some_and(|a| a > first))
}

/// Column value used as a sort key; missing columns sort lowest.
#[inline]
pub(crate) fn sort_key(row: &[f32], column: Option<usize>) -> f32 {
    column.and_then(|c| row.get(c).copied()).unwrap_or(f32::MIN)
}

/// Order rows by time ascending, then age descending, then id ascending.
pub(crate) fn compare_rows(
    a: &[f32],
    b: &[f32],
    time: Option<usize>,
    age: Option<usize>,
    id: Option<usize>,
) -> Ordering {
    sort_key(a, time)
        .total_cmp(&sort_key(b, time))
        .then_with(|| sort_key(b, age).total_cmp(&sort_key(a, age)))
        .then_with(|| sort_key(a, id).total_cmp(&sort_key(b, id)))
}

/// Builds the sample table frame by frame.
pub struct FrameAssembler {
    schema: AttributeSchema,
    components: usize,
    num_samples: usize,
    num_frames: usize,
    samples: Vec<f32>,
    builder: PointBuilder,
    stats: FrameStats,
    next_sample: usize,
    id: Option<usize>,
    age: Option<usize>,
    life: Option<usize>,
    kind: Option<usize>,
    time: Option<usize>,
}

impl FrameAssembler {
    /// Resolve the header's attributes and preallocate every buffer.
    pub fn new(header: &Header) -> Result<Self> {
        header.validate()?;

        let (schema, components) = AttributeSchema::from_header(&header.attrib_name, &header.attrib_size);
        let role = |r| schema.role_index(r);
        let (id, age, life, kind, time) = (
            role(SpecialAttribute::PointId),
            role(SpecialAttribute::Age),
            role(SpecialAttribute::Life),
            role(SpecialAttribute::Type),
            role(SpecialAttribute::Time),
        );

        // Without ids every sample is its own point
        let point_count = if id.is_some() {
            header.num_points
        } else {
            header.num_samples
        };

        debug!(
            version = %header.version,
            samples = header.num_samples,
            frames = header.num_frames,
            points = header.num_points,
            attributes = schema.number_of_attributes,
            "Read point cache header"
        );

        Ok(Self {
            samples: vec![UNSET; header.num_samples * schema.number_of_attributes],
            builder: PointBuilder::with_point_count(point_count, life.is_some()),
            components,
            num_samples: header.num_samples,
            num_frames: header.num_frames,
            stats: FrameStats::default(),
            next_sample: 0,
            schema,
            id,
            age,
            life,
            kind,
            time,
        })
    }

    /// Values per row in the file.
    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    /// Column of the age attribute, if any.
    #[inline]
    pub fn age_index(&self) -> Option<usize> {
        self.age
    }

    #[inline]
    pub fn frames_seen(&self) -> usize {
        self.stats.number_of_frames
    }

    /// Store a frame's rows, remap ids, and update lifecycles.
    ///
    /// The stored time of every row is the frame time, whatever the file
    /// holds in a time attribute.
    pub fn push_frame(&mut self, mut frame: Frame) -> Result<()> {
        self.stats.number_of_frames += 1;
        self.stats.add_time(frame.time);
        self.stats.add_frame(frame.number);

        if frame.rows.len() != frame.num_points {
            return Err(Error::header("frame num_points", frame.num_points, frame.rows.len()));
        }

        if let Some(age) = self.age {
            if needs_age_sort(&frame.rows, age) {
                let id = self.id;
                frame
                    .rows
                    .sort_by(|a, b| compare_rows(a, b, None, Some(age), id));
            }
        }

        let ns = self.num_samples;
        for (offset, row) in frame.rows.iter().enumerate() {
            let sample = self.next_sample + offset;
            if sample >= ns {
                return Err(Error::header("num_samples", ns, sample + 1));
            }
            if row.len() != self.components {
                return Err(Error::header("sample values", self.components, row.len()));
            }

            let mut point = sample;
            for (attr, &value) in row.iter().enumerate() {
                let mut value = value;
                if Some(attr) == self.id {
                    point = self.builder.assign(value)?;
                    value = point as f32;
                }
                self.samples[sample + attr * ns] = value;
            }

            if let Some(t) = self.time {
                self.samples[sample + t * ns] = frame.time;
            }

            let column = |c: Option<usize>| c.map(|c| self.samples[sample + c * ns]);
            let obs = Observation {
                time: frame.time,
                age: column(self.age),
                life: column(self.life),
                kind: column(self.kind),
            };
            self.builder.observe(point, sample, obs)?;
        }

        self.next_sample += frame.rows.len();
        Ok(())
    }

    /// Check the frame count and hand over the finished table.
    pub fn finish(self) -> Result<ParsedCache> {
        if self.stats.number_of_frames != self.num_frames {
            return Err(Error::header("num_frames", self.num_frames, self.stats.number_of_frames));
        }

        Ok(ParsedCache {
            schema: self.schema,
            number_of_samples: self.num_samples,
            samples: self.samples,
            points: self.builder.finish(),
            frames: self.stats,
        })
    }
}
