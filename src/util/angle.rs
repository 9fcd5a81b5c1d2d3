//! Angle wrapping, damping and interpolation helpers for the orbit rig.
//!
//! All interpolation parameters are clamped to `[0, 1]`, so a long frame
//! lands on the destination instead of past it.

use glam::{EulerRot, Quat, Vec3};

/// Smoothness level at which the damping factor bottoms out.
pub const MAX_SMOOTHNESS: f32 = 5.0;

/// Damping factor at smoothness 0 (snappiest).
const DAMPING_SNAPPY: f32 = 10.0;
/// Damping factor at maximum smoothness (slowest).
const DAMPING_SMOOTH: f32 = 1.0;

/// Wrap an angle that has drifted one turn past ±360° and clamp it to
/// `[min, max]`.
///
/// ```
/// use vantage::util::angle::clamp_angle;
/// assert_eq!(clamp_angle(400.0, -360.0, 360.0), 40.0);
/// ```
#[must_use]
pub fn clamp_angle(angle: f32, min: f32, max: f32) -> f32 {
    let mut angle = angle;
    if angle < -360.0 {
        angle += 360.0;
    }
    if angle > 360.0 {
        angle -= 360.0;
    }
    angle.clamp(min, max)
}

/// Exponential damping factor for a user smoothness level in `[0, 5]`.
///
/// Larger values converge faster. Out-of-range levels are clamped, so the
/// result always lies in `[1, 10]`.
#[must_use]
pub fn damping_factor(smoothness: f32) -> f32 {
    let level = smoothness.clamp(0.0, MAX_SMOOTHNESS);
    lerp(DAMPING_SNAPPY, DAMPING_SMOOTH, level * 0.2)
}

/// Linear interpolation with `t` clamped to `[0, 1]`.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Spherical interpolation between two position vectors.
///
/// The direction is rotated by `t` of the angle between the inputs and the
/// magnitude is interpolated linearly. Degenerate inputs (near-zero length
/// or (anti)parallel directions) fall back to a straight lerp.
#[must_use]
pub fn slerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    let t = t.clamp(0.0, 1.0);
    let len_a = a.length();
    let len_b = b.length();
    if len_a < 1e-6 || len_b < 1e-6 {
        return a.lerp(b, t);
    }

    let dir_a = a / len_a;
    let dir_b = b / len_b;
    let cos = dir_a.dot(dir_b).clamp(-1.0, 1.0);
    if cos.abs() > 0.9999 {
        return a.lerp(b, t);
    }

    let axis = dir_a.cross(dir_b).normalize();
    let angle = cos.acos() * t;
    let dir = Quat::from_axis_angle(axis, angle) * dir_a;
    dir * lerp(len_a, len_b, t)
}

/// Orbit orientation for the given pitch and yaw in degrees.
///
/// Yaw turns around world up, then pitch tilts around the camera's right
/// axis. Positive pitch looks down onto the pivot from above.
#[must_use]
pub fn euler_to_quat(pitch: f32, yaw: f32) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        (-yaw).to_radians(),
        (-pitch).to_radians(),
        0.0,
    )
}
