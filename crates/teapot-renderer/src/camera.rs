use glam::{Mat4, Vec3};
use teapot_config::DisplayConfig;

/// Fixed viewpoint at the origin looking down -Z.
///
/// The sensor drives the model, not the camera, so only the projection
/// changes at runtime (on resize).
pub struct Camera {
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(display: &DisplayConfig) -> Self {
        let (width, height) = display.size;
        let mut camera = Self {
            position: Vec3::ZERO,
            fov_y_degrees: display.fov_y_degrees,
            aspect_ratio: 1.0,
            near: display.near,
            far: display.far,
        };
        camera.set_viewport(width, height);
        camera
    }

    /// Update the aspect ratio for a new surface size. A zero height is
    /// treated as one pixel.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect_ratio = width as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + Vec3::NEG_Z, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect_ratio,
            self.near,
            self.far,
        )
    }
}
