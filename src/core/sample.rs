//! Result types of the time-indexed lookups.

/// Samples bracketing a query time for one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleBracket {
    /// Sample at or before the query time.
    pub prev: usize,
    /// Sample at or after the query time.
    pub next: usize,
    /// Interpolation factor (0.0 = prev, 1.0 = next).
    pub weight: f32,
}

impl SampleBracket {
    /// Exact hit on a stored sample.
    pub fn exact(index: usize) -> Self {
        Self {
            prev: index,
            next: index,
            weight: 1.0,
        }
    }

    /// Query time before every sample: hold the earliest one.
    pub fn before(index: usize) -> Self {
        Self {
            prev: index,
            next: index,
            weight: 0.0,
        }
    }

    /// Query time after every sample: hold the latest one.
    pub fn after(index: usize) -> Self {
        Self::exact(index)
    }

    /// Interpolate between two samples.
    pub fn lerp(prev: usize, next: usize, weight: f32) -> Self {
        Self { prev, next, weight }
    }

    /// Both sides refer to the same sample.
    pub fn is_single(&self) -> bool {
        self.prev == self.next
    }
}

/// Outcome of a "last index at time" scan.
///
/// `Untimed` means the cache carries no usable time data and the value is
/// the saturated last index. The inner `None` means no index qualifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexAtTime {
    Timed(Option<usize>),
    Untimed(Option<usize>),
}

impl IndexAtTime {
    /// The index, whether or not time data was available.
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Timed(i) | Self::Untimed(i) => i,
        }
    }

    pub fn is_timed(self) -> bool {
        matches!(self, Self::Timed(_))
    }
}
