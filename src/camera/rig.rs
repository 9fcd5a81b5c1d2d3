//! Damped orbital camera rig with auto-framing.
//!
//! The rig keeps *destination* values that input moves instantly and
//! *current* values that chase them with an exponential damping factor
//! derived from the user's smoothness level.

use glam::{Quat, Vec2, Vec3};

use crate::camera::bounds::Aabb;
use crate::camera::core::{Camera, Projection};
use crate::error::VantageError;
use crate::options::CameraOptions;
use crate::util::angle::{
    clamp_angle, damping_factor, euler_to_quat, lerp, slerp_vec3,
};

/// Smallest object size used for framing; zero-size bounds are clamped to it.
pub const FIT_EPSILON: f32 = 1e-4;

/// Pan distance per unit of pan input, relative to the current distance.
const PAN_SCALE: f32 = 0.002;
/// Zoom step per unit of zoom input, relative to the destination distance.
const ZOOM_SCALE: f32 = 0.01;
/// Near plane as a fraction of the current distance.
const NEAR_FRACTION: f32 = 0.1;
/// Far plane as a multiple of the maximum distance.
const FAR_MULTIPLIER: f32 = 2.0;
/// Orthographic half height per degree of field of view per unit distance.
const ORTHO_SCALE: f32 = 0.01;

const YAW_LIMIT: f32 = 360.0;
const PITCH_LIMIT: f32 = 90.0;

/// One tick of rig input, already scaled by the user's speed settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RigInput {
    /// Yaw (x) and pitch (y) change in degrees.
    pub rotate: Vec2,
    /// Pan in screen directions (x right, y up).
    pub pan: Vec2,
    /// Zoom amount; positive moves away from the pivot.
    pub zoom: f32,
}

impl RigInput {
    /// Whether this input would move the camera at all.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.rotate == Vec2::ZERO && self.pan == Vec2::ZERO && self.zoom == 0.0
    }
}

/// Complete mutable state of the rig.
///
/// `Copy` so the preview session can carry it across a close/open cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    /// Yaw (x) and pitch (y) the camera is heading toward, in degrees.
    pub destination_yaw_pitch: Vec2,
    /// Pivot the camera is heading toward.
    pub destination_pivot: Vec3,
    /// Current (damped) pivot.
    pub pivot: Vec3,
    /// Distance the camera is heading toward.
    pub destination_distance: f32,
    /// Current (damped) distance from the pivot.
    pub current_distance: f32,
    /// Current (damped) orientation.
    pub current_rotation: Quat,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    /// Closest allowed distance.
    pub min_distance: f32,
    /// Farthest allowed distance.
    pub max_distance: f32,
}

impl Default for OrbitState {
    fn default() -> Self {
        Self {
            destination_yaw_pitch: Vec2::ZERO,
            destination_pivot: Vec3::ZERO,
            pivot: Vec3::ZERO,
            destination_distance: 5.0,
            current_distance: 5.0,
            current_rotation: Quat::IDENTITY,
            field_of_view: 30.0,
            min_distance: 0.1,
            max_distance: 1000.0,
        }
    }
}

/// Camera transform snapshot exposed for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    /// World-space camera position.
    pub position: Vec3,
    /// World-space camera orientation.
    pub rotation: Quat,
    /// Current pivot.
    pub pivot: Vec3,
    /// Destination yaw in degrees.
    pub yaw: f32,
    /// Destination pitch in degrees.
    pub pitch: f32,
    /// Current distance from the pivot.
    pub distance: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
}

/// Orbital camera controller: integrates input, damps toward destinations
/// and frames target bounds.
#[derive(Debug, Clone)]
pub struct OrbitCameraRig {
    state: OrbitState,
    smoothness: f32,
    orthographic: bool,
    orthographic_half_height: f32,
    target_offset: Vec3,
    position: Vec3,
    near: f32,
    far: f32,
}

impl Default for OrbitCameraRig {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitCameraRig {
    /// Rig with default state, already resolved to a valid position.
    #[must_use]
    pub fn new() -> Self {
        let mut rig = Self {
            state: OrbitState::default(),
            smoothness: 2.0,
            orthographic: false,
            orthographic_half_height: 1.0,
            target_offset: Vec3::ZERO,
            position: Vec3::ZERO,
            near: 0.1,
            far: 1.0,
        };
        rig.update_derived();
        rig
    }

    /// Apply camera options (smoothness, projection, field of view, offset).
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::InvalidFieldOfView`] if the configured field
    /// of view is not strictly positive; the other options still apply.
    pub fn apply_options(
        &mut self,
        options: &CameraOptions,
    ) -> Result<(), VantageError> {
        self.smoothness = options.smoothness;
        self.orthographic = options.orthographic;
        self.target_offset = Vec3::from_array(options.target_offset);
        let result = self.set_field_of_view(options.field_of_view);
        self.update_derived();
        result
    }

    /// Set the vertical field of view in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::InvalidFieldOfView`] for non-positive or
    /// non-finite values and leaves the current field of view unchanged.
    pub fn set_field_of_view(&mut self, fov: f32) -> Result<(), VantageError> {
        if !(fov.is_finite() && fov > 0.0) {
            return Err(VantageError::InvalidFieldOfView(fov));
        }
        self.state.field_of_view = fov;
        self.update_derived();
        Ok(())
    }

    /// Switch between perspective and orthographic projection.
    pub fn set_orthographic(&mut self, orthographic: bool) {
        self.orthographic = orthographic;
        self.update_derived();
    }

    /// Whether the projection is orthographic.
    #[must_use]
    pub fn is_orthographic(&self) -> bool {
        self.orthographic
    }

    /// Set the damping level (clamped to `[0, 5]` when used).
    pub fn set_smoothness(&mut self, smoothness: f32) {
        self.smoothness = smoothness;
    }

    /// Consume one tick of input and advance the damped state by `dt`
    /// seconds.
    pub fn integrate(&mut self, input: RigInput, dt: f32) {
        let k = damping_factor(self.smoothness);
        let t = (dt.max(0.0) * k).min(1.0);
        let state = &mut self.state;

        let yaw_pitch = state.destination_yaw_pitch + input.rotate;
        state.destination_yaw_pitch = Vec2::new(
            clamp_angle(yaw_pitch.x, -YAW_LIMIT, YAW_LIMIT),
            clamp_angle(yaw_pitch.y, -PITCH_LIMIT, PITCH_LIMIT),
        );
        let target_rotation = euler_to_quat(
            state.destination_yaw_pitch.y,
            state.destination_yaw_pitch.x,
        );
        state.current_rotation =
            state.current_rotation.slerp(target_rotation, t).normalize();

        let pivot_delta = state.current_rotation
            * Vec3::new(-input.pan.x, input.pan.y, 0.0)
            * (state.current_distance * PAN_SCALE);
        state.destination_pivot += pivot_delta;
        state.pivot = slerp_vec3(state.pivot, state.destination_pivot, t);

        state.destination_distance = (state.destination_distance
            + input.zoom * state.destination_distance.abs() * ZOOM_SCALE)
            .clamp(state.min_distance, state.max_distance);
        state.current_distance = lerp(
            state.current_distance,
            state.destination_distance,
            t,
        )
        .clamp(state.min_distance, state.max_distance);

        self.update_derived();
    }

    /// Frame the given bounds: center the pivot and pick a distance that
    /// fits the largest extent in the field of view.
    ///
    /// Idempotent. Zero-size bounds are treated as [`FIT_EPSILON`] wide.
    pub fn fit_to_bounds(&mut self, bounds: &Aabb) {
        let size = (bounds.extents().max_element() * 2.0).max(FIT_EPSILON);
        let view = 2.0 * (0.5 * self.state.field_of_view.to_radians()).tan();
        let distance = size / view + 0.1 * size;

        let state = &mut self.state;
        state.destination_distance = distance;
        state.destination_pivot = bounds.center();
        state.min_distance = distance * 0.1;
        // Narrow fields of view need more than ten object sizes of room.
        state.max_distance = (size * 10.0).max(distance);
        state.current_distance = state
            .current_distance
            .clamp(state.min_distance, state.max_distance);

        log::debug!(
            "framed bounds {:?}..{:?}: distance {distance:.4}",
            bounds.min,
            bounds.max
        );
        self.update_derived();
    }

    /// Jump every damped value to its destination.
    pub fn snap_to_destination(&mut self) {
        let state = &mut self.state;
        state.current_rotation = euler_to_quat(
            state.destination_yaw_pitch.y,
            state.destination_yaw_pitch.x,
        );
        state.pivot = state.destination_pivot;
        state.current_distance = state.destination_distance;
        self.update_derived();
    }

    /// Copy of the full rig state.
    #[must_use]
    pub fn state(&self) -> OrbitState {
        self.state
    }

    /// Replace the rig state (e.g. after re-opening a session).
    ///
    /// The current distance is re-clamped to the restored limits; a
    /// maximum below the minimum is raised to it.
    pub fn restore(&mut self, state: OrbitState) {
        self.state = state;
        self.state.max_distance =
            self.state.max_distance.max(self.state.min_distance);
        self.state.current_distance = self
            .state
            .current_distance
            .clamp(self.state.min_distance, self.state.max_distance);
        self.update_derived();
    }

    /// Camera transform for display.
    #[must_use]
    pub fn transform(&self) -> CameraTransform {
        CameraTransform {
            position: self.position,
            rotation: self.state.current_rotation,
            pivot: self.state.pivot,
            yaw: self.state.destination_yaw_pitch.x,
            pitch: self.state.destination_yaw_pitch.y,
            distance: self.state.current_distance,
            near: self.near,
            far: self.far,
        }
    }

    /// Near and far clip planes.
    #[must_use]
    pub fn clip_planes(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    /// Half height of the orthographic view volume.
    #[must_use]
    pub fn orthographic_half_height(&self) -> f32 {
        self.orthographic_half_height
    }

    /// Build a render camera for the given aspect ratio.
    #[must_use]
    pub fn camera(&self, aspect: f32) -> Camera {
        let rotation = self.state.current_rotation;
        let projection = if self.orthographic {
            Projection::Orthographic {
                half_height: self.orthographic_half_height,
            }
        } else {
            Projection::Perspective
        };
        Camera {
            eye: self.position,
            target: self.position + rotation * Vec3::NEG_Z,
            up: rotation * Vec3::Y,
            aspect,
            fovy: self.state.field_of_view,
            znear: self.near,
            zfar: self.far,
            projection,
        }
    }

    /// Recompute position, clip planes and orthographic size from the state.
    fn update_derived(&mut self) {
        let state = &self.state;
        let forward = state.current_rotation * Vec3::NEG_Z;
        self.position = state.pivot
            - forward * state.current_distance
            - self.target_offset;
        self.near = state.current_distance * NEAR_FRACTION;
        self.far = state.max_distance * FAR_MULTIPLIER;
        if self.orthographic {
            self.orthographic_half_height = state.destination_distance
                * state.field_of_view
                * ORTHO_SCALE;
        }
    }
}
