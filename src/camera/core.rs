use glam::{Mat4, Vec3};

/// Projection model of the preview camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection using the camera's vertical field of view.
    Perspective,
    /// Orthographic projection with the given half height in world units.
    Orthographic {
        /// Half the visible height at any depth.
        half_height: f32,
    },
}

/// Camera defined by eye position, look target and projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
    /// Perspective or orthographic.
    pub projection: Projection,
}

impl Camera {
    /// World-to-view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// View-to-clip matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        // perspective_rh / orthographic_rh already use the [0,1] depth range
        // (wgpu/Vulkan convention)
        match self.projection {
            Projection::Perspective => Mat4::perspective_rh(
                self.fovy.to_radians(),
                self.aspect,
                self.znear,
                self.zfar,
            ),
            Projection::Orthographic { half_height } => {
                let half_width = half_height * self.aspect;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.znear,
                    self.zfar,
                )
            }
        }
    }

    /// Build the combined view-projection matrix.
    #[must_use]
    pub fn build_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Whether the projection is orthographic.
    #[must_use]
    pub fn is_orthographic(&self) -> bool {
        matches!(self.projection, Projection::Orthographic { .. })
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
/// GPU uniform with everything the object and effect shaders need from the
/// view: matrices, eye, clip planes, light and ground plane.
pub struct ViewUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Inverse of `view_proj`, for reconstructing world rays.
    pub inv_view_proj: [[f32; 4]; 4],
    /// Model matrix of the framed object.
    pub model: [[f32; 4]; 4],
    /// Eye position (w unused).
    pub eye: [f32; 4],
    /// `(near, far, orthographic ? 1 : 0, ground height)`.
    pub clip: [f32; 4],
    /// Direction toward the light (xyz) and ambient term (w).
    pub light: [f32; 4],
}

impl Default for ViewUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewUniform {
    /// Identity matrices, light straight overhead.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            inv_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            eye: [0.0, 0.0, 0.0, 1.0],
            clip: [0.1, 100.0, 0.0, 0.0],
            light: [0.0, 1.0, 0.0, 0.2],
        }
    }

    /// Update matrix and clip fields from the given camera.
    pub fn update_view_proj(&mut self, camera: &Camera) {
        let view_proj = camera.build_matrix();
        self.view_proj = view_proj.to_cols_array_2d();
        self.inv_view_proj = view_proj.inverse().to_cols_array_2d();
        self.eye = camera.eye.extend(1.0).to_array();
        self.clip[0] = camera.znear;
        self.clip[1] = camera.zfar;
        self.clip[2] = if camera.is_orthographic() { 1.0 } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(projection: Projection) -> Camera {
        Camera {
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 4.0 / 3.0,
            fovy: 45.0,
            znear: 0.5,
            zfar: 50.0,
            projection,
        }
    }

    #[test]
    fn target_projects_to_screen_center() {
        for projection in [
            Projection::Perspective,
            Projection::Orthographic { half_height: 2.0 },
        ] {
            let clip = camera(projection).build_matrix() * Vec3::ZERO.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
            assert!(ndc.z > 0.0 && ndc.z < 1.0);
        }
    }

    #[test]
    fn orthographic_half_height_maps_to_ndc_edge() {
        let cam = camera(Projection::Orthographic { half_height: 2.0 });
        let clip = cam.build_matrix() * Vec3::new(0.0, 2.0, 0.0).extend(1.0);
        assert!((clip.y / clip.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn uniform_records_clip_and_projection_kind() {
        let mut uniform = ViewUniform::new();
        uniform.update_view_proj(&camera(Projection::Orthographic {
            half_height: 1.0,
        }));
        assert_eq!(uniform.clip[0], 0.5);
        assert_eq!(uniform.clip[1], 50.0);
        assert_eq!(uniform.clip[2], 1.0);
        assert_eq!(size_of::<ViewUniform>() % 16, 0);
    }
}
