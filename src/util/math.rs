//! Math type re-exports and Houdini-specific conversion helpers.
//!
//! Houdini writes Y-up, meter-scaled data. Consumers of a point cache
//! usually want Z-up centimeters, so vectors get an optional ×100 scale
//! followed by a Y/Z swap, and quaternions get the matching handedness flip.

pub use glam::{Quat, Vec3, Vec4};

/// Meters to centimeters.
pub const HOUDINI_SCALE: f32 = 100.0;

/// Tolerance used for time comparisons.
pub const SMALL_NUMBER: f32 = 1.0e-8;

/// Sentinel for "not yet written" float slots.
pub const UNSET: f32 = -f32::MAX;

/// Float comparison within [`SMALL_NUMBER`].
#[inline]
pub fn nearly_equal(a: f32, b: f32) -> bool {
    (a - b).abs() <= SMALL_NUMBER
}

/// Linear interpolation, `alpha` of 0 gives `a`.
#[inline]
pub fn lerp(a: f32, b: f32, alpha: f32) -> f32 {
    a + alpha * (b - a)
}

/// Apply the optional scale and Y/Z swap to a Houdini vector.
#[inline]
pub fn convert_vector(v: Vec3, swap: bool, scale: bool) -> Vec3 {
    let v = if scale { v * HOUDINI_SCALE } else { v };
    if swap {
        Vec3::new(v.x, v.z, v.y)
    } else {
        v
    }
}

/// Houdini quaternion (x, y, z, w) to Z-up: swap Y/Z and negate the axes.
#[inline]
pub fn convert_quat(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, -q.z, -q.y, q.w)
}
