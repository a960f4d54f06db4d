//! Incremental "which points became spawn-eligible" tracking.
//!
//! Spawn times are ascending by dense id, so the eligible ids at any time
//! form a prefix `0..=last`. Each call reports the part of that prefix not
//! reported since the caller's state was last reset.

use super::attribute::SpecialAttribute;
use super::cache::PointCache;
use super::sample::IndexAtTime;
use crate::util::UNSET;

/// Caller-owned state carried between spawn queries.
///
/// The cache never stores this; one state per consumer instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnState {
    /// Highest id reported so far, `-1` for none.
    pub last_spawned_id: i32,
    /// Query time of the last call that reported ids.
    pub last_spawn_time: f32,
    /// Query time of the last call.
    pub last_request_time: f32,
}

impl Default for SpawnState {
    fn default() -> Self {
        Self {
            last_spawned_id: -1,
            last_spawn_time: UNSET,
            last_request_time: UNSET,
        }
    }
}

impl SpawnState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Ids reported by one spawn query: `min_id..=max_id` when `count > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnRange {
    pub min_id: i32,
    pub max_id: i32,
    pub count: i32,
}

impl SpawnRange {
    fn span(min_id: i32, max_id: i32) -> Self {
        Self {
            min_id,
            max_id,
            count: max_id - min_id + 1,
        }
    }

    fn empty_at(id: i32) -> Self {
        Self {
            min_id: id,
            max_id: id,
            count: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count <= 0
    }

    /// Reported ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = usize> {
        let (lo, hi) = if self.is_empty() {
            (0, -1)
        } else {
            (self.min_id.max(0), self.max_id)
        };
        (lo..=hi).map(|id| id as usize)
    }
}

fn to_id(index: Option<usize>) -> i32 {
    index.map_or(-1, |i| i as i32)
}

impl PointCache {
    /// Last point id whose spawn time is at most `time`.
    ///
    /// Without time data the last point is returned as
    /// [`IndexAtTime::Untimed`].
    pub fn last_point_id_to_spawn_at_time(&self, time: f32) -> IndexAtTime {
        let n = self.number_of_points();
        let last = n.checked_sub(1);
        let spawn_times = self.spawn_times();

        let Some(&last_spawn) = last.and_then(|i| spawn_times.get(i)) else {
            return IndexAtTime::Untimed(last);
        };
        if !self.has_role(SpecialAttribute::Time) {
            return IndexAtTime::Untimed(last);
        }
        if last_spawn < time {
            return IndexAtTime::Timed(last);
        }

        let mut found = None;
        for (id, &spawn) in spawn_times.iter().enumerate().take(n) {
            if spawn > time {
                break;
            }
            found = Some(id);
        }
        IndexAtTime::Timed(found)
    }

    /// Ids that became eligible since the last call sharing `state`.
    ///
    /// A request time at or before the previous request or the previous
    /// spawning call resets the state, so looping playback re-reports from
    /// id 0. Caches without time data report every point on every call.
    pub fn point_ids_to_spawn_at_time(&self, time: f32, state: &mut SpawnState) -> SpawnRange {
        let range = match self.last_point_id_to_spawn_at_time(time) {
            IndexAtTime::Untimed(last) => SpawnRange::span(0, to_id(last)),
            IndexAtTime::Timed(last) => {
                let last = to_id(last);
                if last < state.last_spawned_id
                    || time <= state.last_spawn_time
                    || time <= state.last_request_time
                {
                    state.last_spawned_id = -1;
                }

                if last < 0 {
                    state.last_spawned_id = -1;
                    SpawnRange::empty_at(last)
                } else if last == state.last_spawned_id {
                    SpawnRange::empty_at(last)
                } else {
                    let range = SpawnRange::span(state.last_spawned_id + 1, last);
                    state.last_spawned_id = range.max_id;
                    state.last_spawn_time = time;
                    range
                }
            }
        };

        state.last_request_time = time;
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::tests::sample_cache;

    #[test]
    fn test_last_point_id() {
        let cache = sample_cache();
        assert_eq!(cache.last_point_id_to_spawn_at_time(-1.0), IndexAtTime::Timed(None));
        assert_eq!(cache.last_point_id_to_spawn_at_time(0.0), IndexAtTime::Timed(Some(0)));
        assert_eq!(cache.last_point_id_to_spawn_at_time(0.5), IndexAtTime::Timed(Some(1)));
        assert_eq!(cache.last_point_id_to_spawn_at_time(9.0), IndexAtTime::Timed(Some(1)));
    }

    #[test]
    fn test_incremental_spawn() {
        let cache = sample_cache();
        let mut state = SpawnState::default();

        let r = cache.point_ids_to_spawn_at_time(-1.0, &mut state);
        assert!(r.is_empty());
        assert_eq!(r.min_id, -1);

        let r = cache.point_ids_to_spawn_at_time(0.0, &mut state);
        assert_eq!(r, SpawnRange { min_id: 0, max_id: 0, count: 1 });

        let r = cache.point_ids_to_spawn_at_time(0.25, &mut state);
        assert!(r.is_empty());
        assert_eq!(r.max_id, 0);

        let r = cache.point_ids_to_spawn_at_time(1.0, &mut state);
        assert_eq!(r, SpawnRange { min_id: 1, max_id: 1, count: 1 });
        assert_eq!(state.last_spawned_id, 1);
        assert_eq!(state.last_spawn_time, 1.0);

        let r = cache.point_ids_to_spawn_at_time(2.0, &mut state);
        assert!(r.is_empty());
        assert_eq!(state.last_request_time, 2.0);
    }

    #[test]
    fn test_spawn_resets_on_loop() {
        let cache = sample_cache();
        let mut state = SpawnState::default();
        cache.point_ids_to_spawn_at_time(3.0, &mut state);
        assert_eq!(state.last_spawned_id, 1);

        let r = cache.point_ids_to_spawn_at_time(0.1, &mut state);
        assert_eq!(r, SpawnRange { min_id: 0, max_id: 0, count: 1 });
        assert_eq!(r.ids().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_range_ids() {
        let r = SpawnRange::span(2, 4);
        assert_eq!(r.ids().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(SpawnRange::empty_at(3).ids().count(), 0);
    }

    #[test]
    fn test_state_reset() {
        let mut state = SpawnState {
            last_spawned_id: 4,
            last_spawn_time: 1.0,
            last_request_time: 1.0,
        };
        state.reset();
        assert_eq!(state, SpawnState::default());
    }
}
