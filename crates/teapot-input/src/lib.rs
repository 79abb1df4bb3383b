pub mod mouse;

use glam::{Mat4, Quat, Vec3};

/// Cumulative camera adjustment from pointer input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub rotation: Quat,
    /// Uniform zoom factor.
    pub scale: f32,
    /// Fixed offset applied after zoom and rotation.
    pub translation: Vec3,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            scale: 1.0,
            translation: Vec3::ZERO,
        }
    }
}

impl CameraState {
    /// Transform applied ahead of the sensor-driven rotation.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation,
            self.translation,
        )
    }
}
