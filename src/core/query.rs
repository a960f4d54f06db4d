//! Sample lookups and point-at-time interpolation.
//!
//! All queries are read-only and report misses as `None`: an index out of
//! range, an absent role, or a point with no samples.

use super::attribute::SpecialAttribute;
use super::cache::PointCache;
use super::sample::{IndexAtTime, SampleBracket};
use crate::util::{convert_quat, convert_vector, lerp, nearly_equal, Quat, Vec3, Vec4, UNSET};

// ============================================================================
// Per-sample values
// ============================================================================

impl PointCache {
    /// Raw value at `(sample, attribute)`.
    pub fn float_value(&self, sample: usize, attribute: usize) -> Option<f32> {
        if sample >= self.number_of_samples() || attribute >= self.number_of_attributes() {
            return None;
        }
        self.float_sample_data()
            .get(sample + attribute * self.number_of_samples())
            .copied()
    }

    pub fn float_value_for_name(&self, sample: usize, name: &str) -> Option<f32> {
        self.float_value(sample, self.attribute_index(name)?)
    }

    /// Three consecutive columns starting at `attribute`.
    ///
    /// `scale` converts meters to centimeters, `swap` exchanges Y and Z.
    pub fn vector_value(&self, sample: usize, attribute: usize, swap: bool, scale: bool) -> Option<Vec3> {
        let v = Vec3::new(
            self.float_value(sample, attribute)?,
            self.float_value(sample, attribute + 1)?,
            self.float_value(sample, attribute + 2)?,
        );
        Some(convert_vector(v, swap, scale))
    }

    pub fn vector_value_for_name(&self, sample: usize, name: &str, swap: bool, scale: bool) -> Option<Vec3> {
        self.vector_value(sample, self.attribute_index(name)?, swap, scale)
    }

    /// Four consecutive columns starting at `attribute`.
    pub fn vector4_value(&self, sample: usize, attribute: usize) -> Option<Vec4> {
        Some(Vec4::new(
            self.float_value(sample, attribute)?,
            self.float_value(sample, attribute + 1)?,
            self.float_value(sample, attribute + 2)?,
            self.float_value(sample, attribute + 3)?,
        ))
    }

    pub fn vector4_value_for_name(&self, sample: usize, name: &str) -> Option<Vec4> {
        self.vector4_value(sample, self.attribute_index(name)?)
    }

    /// Quaternion stored as `x, y, z, w`, optionally converted to Z-up.
    pub fn quat_value(&self, sample: usize, attribute: usize, convert: bool) -> Option<Quat> {
        let v = self.vector4_value(sample, attribute)?;
        let q = Quat::from_xyzw(v.x, v.y, v.z, v.w);
        Some(if convert { convert_quat(q) } else { q })
    }

    pub fn quat_value_for_name(&self, sample: usize, name: &str, convert: bool) -> Option<Quat> {
        self.quat_value(sample, self.attribute_index(name)?, convert)
    }

    // ------------------------------------------------------------------------
    // Role accessors
    // ------------------------------------------------------------------------

    /// Position, swapped and scaled.
    pub fn position_value(&self, sample: usize) -> Option<Vec3> {
        self.vector_value(sample, self.role_index(SpecialAttribute::Position)?, true, true)
    }

    /// Normal, swapped.
    pub fn normal_value(&self, sample: usize) -> Option<Vec3> {
        self.vector_value(sample, self.role_index(SpecialAttribute::Normal)?, true, false)
    }

    /// Velocity, swapped.
    pub fn velocity_value(&self, sample: usize) -> Option<Vec3> {
        self.vector_value(sample, self.role_index(SpecialAttribute::Velocity)?, true, false)
    }

    /// RGB from the color role; alpha from the alpha role or 1.
    pub fn color_value(&self, sample: usize) -> Option<Vec4> {
        let rgb = self.vector_value(sample, self.role_index(SpecialAttribute::Color)?, false, false)?;
        let alpha = self
            .role_index(SpecialAttribute::Alpha)
            .and_then(|column| self.float_value(sample, column))
            .unwrap_or(1.0);
        Some(rgb.extend(alpha))
    }

    pub fn time_value(&self, sample: usize) -> Option<f32> {
        self.float_value(sample, self.role_index(SpecialAttribute::Time)?)
    }

    pub fn impulse_value(&self, sample: usize) -> Option<f32> {
        self.float_value(sample, self.role_index(SpecialAttribute::Impulse)?)
    }

    // ========================================================================
    // Time lookups
    // ========================================================================

    /// Greatest sample index whose time is at most `time`, scanning in
    /// stored order.
    ///
    /// Saturates to the last sample when `time` is past the end. Without a
    /// time column the last sample is returned as [`IndexAtTime::Untimed`].
    pub fn last_sample_index_at_time(&self, time: f32) -> IndexAtTime {
        let last = self.number_of_samples().checked_sub(1);
        if !self.has_role(SpecialAttribute::Time) {
            return IndexAtTime::Untimed(last);
        }

        if let Some(t) = last.and_then(|i| self.time_value(i)) {
            if t < time {
                return IndexAtTime::Timed(last);
            }
        }

        let mut found = None;
        for n in 0..self.number_of_samples() {
            let Some(t) = self.time_value(n) else {
                continue;
            };
            if t == time {
                found = Some(n);
            } else if t > time {
                return IndexAtTime::Timed(n.checked_sub(1));
            }
        }

        IndexAtTime::Timed(found.or(last))
    }

    /// Samples of `point` bracketing `time`.
    ///
    /// A sample within tolerance of `time` is an exact hit. Samples missing
    /// a time value count as time 0.
    pub fn sample_indexes_for_point_at_time(&self, point: usize, time: f32) -> Option<SampleBracket> {
        if point >= self.number_of_points() {
            return None;
        }
        let indexes = self.point_value_indexes().get(point)?;

        let mut prev: Option<(usize, f32)> = None;
        let mut next: Option<(usize, f32)> = None;

        for &n in indexes {
            let current = self.time_value(n).unwrap_or(0.0);

            if nearly_equal(current, time) {
                return Some(SampleBracket::exact(n));
            } else if current < time {
                if prev.map_or(true, |(_, t)| t < current) {
                    prev = Some((n, current));
                }
            } else {
                // Lists are time ordered, the first later sample is the closest
                next = Some((n, current));
                break;
            }
        }

        match (prev, next) {
            (None, None) => None,
            (None, Some((n, _))) => Some(SampleBracket::before(n)),
            (Some((p, _)), None) => Some(SampleBracket::after(p)),
            (Some((p, pt)), Some((n, nt))) => {
                Some(SampleBracket::lerp(p, n, (time - pt) / (nt - pt)))
            }
        }
    }

    // ========================================================================
    // Point-at-time values
    // ========================================================================

    /// Linearly interpolated scalar.
    pub fn point_value_at_time(&self, point: usize, attribute: usize, time: f32) -> Option<f32> {
        let b = self.sample_indexes_for_point_at_time(point, time)?;
        let prev = self.float_value(b.prev, attribute)?;
        let next = self.float_value(b.next, attribute)?;
        Some(lerp(prev, next, b.weight))
    }

    pub fn point_value_at_time_for_name(&self, point: usize, name: &str, time: f32) -> Option<f32> {
        self.point_value_at_time(point, self.attribute_index(name)?, time)
    }

    /// Same lookup as [`point_value_at_time`](Self::point_value_at_time).
    #[inline]
    pub fn point_float_value_at_time(&self, point: usize, attribute: usize, time: f32) -> Option<f32> {
        self.point_value_at_time(point, attribute, time)
    }

    /// Floor of the previous bracketing sample's value; never interpolated.
    pub fn point_int32_value_at_time(&self, point: usize, attribute: usize, time: f32) -> Option<i32> {
        let b = self.sample_indexes_for_point_at_time(point, time)?;
        Some(self.float_value(b.prev, attribute)?.floor() as i32)
    }

    pub fn point_vector_value_at_time(
        &self,
        point: usize,
        attribute: usize,
        time: f32,
        swap: bool,
        scale: bool,
    ) -> Option<Vec3> {
        let b = self.sample_indexes_for_point_at_time(point, time)?;
        let prev = self.vector_value(b.prev, attribute, swap, scale)?;
        let next = self.vector_value(b.next, attribute, swap, scale)?;
        Some(prev.lerp(next, b.weight))
    }

    pub fn point_vector_value_at_time_for_name(
        &self,
        point: usize,
        name: &str,
        time: f32,
        swap: bool,
        scale: bool,
    ) -> Option<Vec3> {
        self.point_vector_value_at_time(point, self.attribute_index(name)?, time, swap, scale)
    }

    /// Interpolated position, swapped and scaled.
    pub fn point_position_at_time(&self, point: usize, time: f32) -> Option<Vec3> {
        let column = self.role_index(SpecialAttribute::Position)?;
        self.point_vector_value_at_time(point, column, time, true, true)
    }

    pub fn point_vector4_value_at_time(&self, point: usize, attribute: usize, time: f32) -> Option<Vec4> {
        let b = self.sample_indexes_for_point_at_time(point, time)?;
        let prev = self.vector4_value(b.prev, attribute)?;
        let next = self.vector4_value(b.next, attribute)?;
        Some(prev.lerp(next, b.weight))
    }

    pub fn point_vector4_value_at_time_for_name(&self, point: usize, name: &str, time: f32) -> Option<Vec4> {
        self.point_vector4_value_at_time(point, self.attribute_index(name)?, time)
    }

    /// Spherically interpolated orientation.
    pub fn point_quat_value_at_time(
        &self,
        point: usize,
        attribute: usize,
        time: f32,
        convert: bool,
    ) -> Option<Quat> {
        let b = self.sample_indexes_for_point_at_time(point, time)?;
        let prev = self.quat_value(b.prev, attribute, convert)?;
        let next = self.quat_value(b.next, attribute, convert)?;
        Some(prev.slerp(next, b.weight))
    }

    pub fn point_quat_value_at_time_for_name(
        &self,
        point: usize,
        name: &str,
        time: f32,
        convert: bool,
    ) -> Option<Quat> {
        self.point_quat_value_at_time(point, self.attribute_index(name)?, time, convert)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Life recorded at spawn.
    pub fn point_life(&self, point: usize) -> Option<f32> {
        self.life_values().get(point).copied()
    }

    /// Type recorded at spawn.
    pub fn point_type(&self, point: usize) -> Option<i32> {
        self.point_types().get(point).copied()
    }

    /// Remaining life at `time`: the full life before spawn, then counting down.
    pub fn point_life_at_time(&self, point: usize, time: f32) -> Option<f32> {
        let spawn = *self.spawn_times().get(point)?;
        let life = self.point_life(point)?;
        if spawn == UNSET || time < spawn {
            return Some(life);
        }
        Some(life - (time - spawn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::tests::sample_cache;

    #[test]
    fn test_float_value_bounds() {
        let cache = sample_cache();
        assert_eq!(cache.float_value(2, 4), Some(1.0));
        assert_eq!(cache.float_value(6, 0), None);
        assert_eq!(cache.float_value(0, 5), None);
        assert_eq!(cache.float_value_for_name(2, "P.y"), Some(2.0));
        assert_eq!(cache.float_value_for_name(2, "nope"), None);
    }

    #[test]
    fn test_vector_conversions() {
        let cache = sample_cache();
        assert_eq!(cache.vector_value(2, 1, false, false), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(cache.vector_value(2, 1, true, true), Some(Vec3::new(100.0, 300.0, 200.0)));
        assert_eq!(cache.position_value(2), Some(Vec3::new(100.0, 300.0, 200.0)));
        assert_eq!(cache.vector_value(2, 3, false, false), None);
        assert_eq!(cache.normal_value(2), None);
        assert_eq!(cache.color_value(2), None);
    }

    #[test]
    fn test_quat_value() {
        let cache = sample_cache();
        // columns P.x P.y P.z time read as a quaternion
        let q = cache.quat_value(2, 1, true).unwrap();
        assert_eq!(q.x, -1.0);
        assert_eq!(q.y, -3.0);
        assert_eq!(q.z, -2.0);
        assert_eq!(q.w, 1.0);
        assert_eq!(cache.quat_value(2, 2, false), None);
    }

    #[test]
    fn test_last_sample_index_at_time() {
        let cache = sample_cache();
        assert_eq!(cache.last_sample_index_at_time(1.2), IndexAtTime::Timed(Some(2)));
        assert_eq!(cache.last_sample_index_at_time(1.0), IndexAtTime::Timed(Some(2)));
        assert_eq!(cache.last_sample_index_at_time(-1.0), IndexAtTime::Timed(None));
        assert_eq!(cache.last_sample_index_at_time(3.0), IndexAtTime::Timed(Some(5)));
        assert_eq!(cache.last_sample_index_at_time(2.5), IndexAtTime::Timed(Some(5)));
    }

    #[test]
    fn test_bracketing() {
        let cache = sample_cache();
        assert_eq!(cache.sample_indexes_for_point_at_time(0, 1.0), Some(SampleBracket::exact(2)));
        assert_eq!(cache.sample_indexes_for_point_at_time(0, -1.0), Some(SampleBracket::before(0)));
        assert_eq!(cache.sample_indexes_for_point_at_time(0, 5.0), Some(SampleBracket::after(4)));
        assert_eq!(
            cache.sample_indexes_for_point_at_time(0, 0.5),
            Some(SampleBracket::lerp(0, 2, 0.5))
        );
        assert_eq!(
            cache.sample_indexes_for_point_at_time(1, 1.0),
            Some(SampleBracket::lerp(1, 3, 0.5))
        );
        assert_eq!(cache.sample_indexes_for_point_at_time(2, 0.0), None);
    }

    #[test]
    fn test_point_values_at_time() {
        let cache = sample_cache();
        assert_eq!(cache.point_value_at_time(0, 2, 0.5), Some(1.0));
        assert_eq!(cache.point_value_at_time_for_name(0, "P.z", 1.5), Some(4.5));
        assert_eq!(cache.point_float_value_at_time(0, 2, 0.5), Some(1.0));
        assert_eq!(cache.point_int32_value_at_time(0, 3, 1.5), Some(3));
        assert_eq!(
            cache.point_position_at_time(0, 0.5),
            Some(Vec3::new(50.0, 150.0, 100.0))
        );
        assert_eq!(
            cache.point_vector_value_at_time_for_name(1, "P", 2.0, false, false),
            Some(Vec3::new(2.5, 2.5, 2.5))
        );
        assert_eq!(
            cache.point_vector4_value_at_time(0, 1, 0.5),
            Some(Vec4::new(0.5, 1.0, 1.5, 0.5))
        );
    }

    #[test]
    fn test_point_quat_slerp_endpoints() {
        let cache = sample_cache();
        let q = cache.quat_value(2, 1, false).unwrap();
        let at = cache.point_quat_value_at_time(0, 1, 1.0, false).unwrap();
        assert!(at.abs_diff_eq(q.normalize(), 1e-5));
        assert!(cache.point_quat_value_at_time_for_name(0, "missing", 0.0, false).is_none());
    }

    #[test]
    fn test_lifecycle() {
        let cache = sample_cache();
        assert_eq!(cache.point_life(0), Some(2.0));
        assert_eq!(cache.point_type(1), Some(0));
        assert_eq!(cache.point_type(9), None);
        assert_eq!(cache.point_life_at_time(1, 0.0), Some(2.0));
        assert_eq!(cache.point_life_at_time(1, 1.5), Some(1.0));
        assert_eq!(cache.point_life_at_time(5, 1.5), None);
    }
}
