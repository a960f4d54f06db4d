//! Point identity and lifecycle derivation.
//!
//! A [`PointBuilder`] is threaded through a single parse pass. It remaps
//! source point ids to dense ids in first-seen order, collects each point's
//! sample rows, and records spawn time, life and type at first observation.

use std::collections::HashMap;

use crate::util::{Error, Result, UNSET};

/// Per-point tables produced by a finished build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointTables {
    /// Sample rows of each point, in observation order.
    pub point_value_indexes: Vec<Vec<usize>>,
    pub spawn_times: Vec<f32>,
    pub life_values: Vec<f32>,
    pub point_types: Vec<i32>,
}

impl PointTables {
    #[inline]
    pub fn len(&self) -> usize {
        self.spawn_times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spawn_times.is_empty()
    }
}

/// Values of one sample that feed the lifecycle rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct Observation {
    pub time: f32,
    pub age: Option<f32>,
    pub life: Option<f32>,
    pub kind: Option<f32>,
}

/// Build-time state of a single parse pass.
#[derive(Debug, Default)]
pub struct PointBuilder {
    id_map: HashMap<i64, usize>,
    /// Upper bound on dense ids, when declared by a header.
    limit: Option<usize>,
    /// True if the source carries an explicit life column.
    has_life: bool,
    tables: PointTables,
}

impl PointBuilder {
    /// Growable builder for sources without a declared point count.
    pub fn new(has_life: bool) -> Self {
        Self {
            has_life,
            ..Self::default()
        }
    }

    /// Builder sized from a declared point count. Ids past it are errors.
    pub fn with_point_count(num_points: usize, has_life: bool) -> Self {
        let mut builder = Self {
            limit: Some(num_points),
            has_life,
            ..Self::default()
        };
        builder.grow_to(num_points);
        builder
    }

    /// Number of distinct source ids seen so far.
    #[inline]
    pub fn ids_seen(&self) -> usize {
        self.id_map.len()
    }

    /// Dense id of `source_id`, assigning the next one if unseen.
    ///
    /// Source ids are floored before lookup.
    pub fn assign(&mut self, source_id: f32) -> Result<usize> {
        let key = source_id.floor() as i64;
        let next = self.id_map.len();
        let dense = *self.id_map.entry(key).or_insert(next);
        if let Some(limit) = self.limit {
            if dense >= limit {
                return Err(Error::invalid(format!(
                    "point id {} is out of the declared range of {} points",
                    dense, limit
                )));
            }
        }
        Ok(dense)
    }

    /// Record that `sample` belongs to `point` and apply the lifecycle rules.
    pub fn observe(&mut self, point: usize, sample: usize, obs: Observation) -> Result<()> {
        match self.limit {
            Some(limit) if point >= limit => {
                return Err(Error::invalid(format!(
                    "point {} is out of the declared range of {} points",
                    point, limit
                )));
            }
            None if point >= self.tables.len() => self.grow_to(point + 1),
            _ => {}
        }

        let t = &mut self.tables;
        t.point_value_indexes[point].push(sample);

        if t.spawn_times[point] == UNSET {
            t.spawn_times[point] = match obs.age {
                Some(age) => obs.time - age,
                None => obs.time,
            };
            if self.has_life {
                if let Some(life) = obs.life {
                    t.life_values[point] = life;
                }
            }
        }

        if !self.has_life {
            let elapsed = obs.time - t.spawn_times[point];
            if t.life_values[point] < elapsed {
                t.life_values[point] = elapsed;
            }
        }

        if t.point_types[point] < 0 {
            t.point_types[point] = obs.kind.map_or(0, |k| k as i32);
        }
        Ok(())
    }

    fn grow_to(&mut self, len: usize) {
        let t = &mut self.tables;
        t.point_value_indexes.resize_with(len, Vec::new);
        t.spawn_times.resize(len, UNSET);
        t.life_values.resize(len, UNSET);
        t.point_types.resize(len, -1);
    }

    pub fn finish(self) -> PointTables {
        self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(time: f32) -> Observation {
        Observation {
            time,
            ..Default::default()
        }
    }

    #[test]
    fn test_dense_first_seen() {
        let mut b = PointBuilder::new(false);
        assert_eq!(b.assign(42.0).unwrap(), 0);
        assert_eq!(b.assign(7.9).unwrap(), 1);
        assert_eq!(b.assign(42.5).unwrap(), 0);
        assert_eq!(b.assign(7.0).unwrap(), 1);
        assert_eq!(b.assign(-3.0).unwrap(), 2);
        assert_eq!(b.ids_seen(), 3);
    }

    #[test]
    fn test_declared_limit() {
        let mut b = PointBuilder::with_point_count(1, false);
        assert_eq!(b.assign(5.0).unwrap(), 0);
        assert!(b.assign(6.0).is_err());
        assert!(b.observe(1, 0, at(0.0)).is_err());
    }

    #[test]
    fn test_running_life() {
        let mut b = PointBuilder::new(false);
        b.observe(0, 0, at(1.0)).unwrap();
        b.observe(0, 1, at(1.5)).unwrap();
        b.observe(0, 2, at(3.0)).unwrap();
        let t = b.finish();
        assert_eq!(t.point_value_indexes, vec![vec![0, 1, 2]]);
        assert_eq!(t.spawn_times, vec![1.0]);
        assert_eq!(t.life_values, vec![2.0]);
        assert_eq!(t.point_types, vec![0]);
    }

    #[test]
    fn test_age_and_explicit_life() {
        let mut b = PointBuilder::new(true);
        let obs = Observation {
            time: 2.0,
            age: Some(0.5),
            life: Some(4.0),
            kind: Some(3.7),
        };
        b.observe(0, 0, obs).unwrap();
        b.observe(0, 1, Observation { life: Some(9.0), ..obs }).unwrap();
        let t = b.finish();
        assert_eq!(t.spawn_times, vec![1.5]);
        assert_eq!(t.life_values, vec![4.0]);
        assert_eq!(t.point_types, vec![3]);
    }

    #[test]
    fn test_gaps_stay_unset() {
        let mut b = PointBuilder::with_point_count(3, false);
        b.observe(2, 0, at(0.25)).unwrap();
        let t = b.finish();
        assert_eq!(t.len(), 3);
        assert_eq!(t.spawn_times[0], UNSET);
        assert_eq!(t.point_types[1], -1);
        assert_eq!(t.spawn_times[2], 0.25);
    }
}
