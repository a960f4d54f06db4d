//! CSV point cache parser (`.hcsv`).
//!
//! Line 0 is the title row (unless a custom one is supplied), every other
//! non-empty line is one sample. Vector values may be packed in a single
//! quoted field such as `"(1,2,3)"`; the first data row decides which
//! columns are packed.

use tracing::{debug, warn};

use super::frames::compare_rows;
use crate::core::{
    AttributeSchema, FrameStats, Observation, ParsedCache, PointBuilder, SpecialAttribute,
};
use crate::util::{Error, Result};

/// Numeric value of a CSV field; anything unparsable reads as 0.
fn parse_value(field: &str) -> f32 {
    field.trim().parse().unwrap_or(0.0)
}

/// Split a row on commas, dropping empty fields.
fn split_row(row: &str) -> Vec<f32> {
    row.split(',')
        .filter(|field| !field.is_empty())
        .map(parse_value)
        .collect()
}

/// True when rows are not already in (time asc, age desc) order.
fn needs_sort(rows: &[Vec<f32>], time: usize, age: Option<usize>) -> bool {
    let mut previous: Option<(f32, f32)> = None;
    for row in rows {
        let t = row.get(time).copied();
        let a = age.and_then(|c| row.get(c).copied());
        if t.is_none() && a.is_none() {
            continue;
        }

        let (prev_time, prev_age) = previous.unwrap_or((0.0, 0.0));
        let current = (t.unwrap_or(prev_time), a.unwrap_or(prev_age));
        if previous.is_some()
            && (prev_time > current.0 || (prev_time == current.0 && prev_age < current.1))
        {
            return true;
        }
        previous = Some(current);
    }
    false
}

/// Parse CSV text into a sample table.
///
/// `custom_title_row` replaces line 0 unless it is empty once spaces are
/// removed.
pub fn parse(text: &str, custom_title_row: Option<&str>) -> Result<ParsedCache> {
    let lines: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();
    if lines.len() < 2 {
        return Err(Error::invalid("not enough rows in the file"));
    }
    let number_of_samples = lines.len() - 1;

    let title = match custom_title_row {
        Some(custom) if !custom.replace(' ', "").is_empty() => custom,
        _ => lines[0],
    };

    let (schema, has_packed) = AttributeSchema::from_csv_title(title, lines[1])?;
    let number_of_attributes = schema.number_of_attributes;

    let mut rows: Vec<Vec<f32>> = Vec::with_capacity(number_of_samples);
    for (index, line) in lines[1..].iter().enumerate() {
        let row = if has_packed {
            split_row(&line.replace(&['(', ')', '"'][..], ""))
        } else {
            split_row(line)
        };
        if row.len() != number_of_attributes {
            warn!(
                "Row {} has {} values instead of the expected {}",
                index + 1,
                row.len(),
                number_of_attributes
            );
        }
        rows.push(row);
    }

    let time = schema.role_index(SpecialAttribute::Time);
    let age = schema.role_index(SpecialAttribute::Age);
    let id = schema.role_index(SpecialAttribute::PointId);
    let life = schema.role_index(SpecialAttribute::Life);
    let kind = schema.role_index(SpecialAttribute::Type);

    if let Some(t) = time {
        if needs_sort(&rows, t, age) {
            debug!("Sorting CSV rows by time");
            rows.sort_by(|a, b| compare_rows(a, b, time, age, id));
        }
    }

    let ns = number_of_samples;
    let mut samples = vec![0.0f32; ns * number_of_attributes];
    let mut builder = PointBuilder::new(life.is_some());
    let mut frames = FrameStats {
        first_frame: 0.0,
        last_frame: 0.0,
        ..FrameStats::default()
    };

    for (sample, row) in rows.iter().enumerate() {
        let mut point = sample;
        for col in 0..number_of_attributes {
            let mut value = match row.get(col) {
                Some(&v) => v,
                None => {
                    warn!("Row {} has no value for column {}", sample + 1, col + 1);
                    0.0
                }
            };
            if Some(col) == id {
                point = builder.assign(value)?;
                value = point as f32;
            }
            samples[sample + col * ns] = value;
        }

        let column = |c: Option<usize>| c.map(|c| samples[sample + c * ns]);
        let current_time = column(time).unwrap_or(0.0);
        if time.is_some() {
            frames.add_time(current_time);
        }

        let obs = Observation {
            time: current_time,
            age: column(age),
            life: column(life),
            kind: column(kind),
        };
        builder.observe(point, sample, obs)?;
    }

    if time.is_none() {
        frames.min_sample_time = 0.0;
        frames.max_sample_time = 0.0;
    }

    let points = builder.finish();
    debug!(
        samples = ns,
        attributes = number_of_attributes,
        points = points.len(),
        "Parsed CSV point cache"
    );

    Ok(ParsedCache {
        schema,
        number_of_samples: ns,
        samples,
        points,
        frames,
    })
}
