use glam::{Mat4, Vec3};
use teapot_config::{SceneConfig, YawAxis};

/// Placement of the drawn object and the axes each angle turns about.
#[derive(Debug, Clone, Copy)]
pub struct ScenePose {
    pub translation: Vec3,
    pub scale: f32,
    pub yaw_axis: YawAxis,
}

impl ScenePose {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            translation: config.translation,
            scale: config.scale,
            yaw_axis: config.yaw_axis,
        }
    }

    /// Axis roll turns about: whichever of Y/Z yaw does not use.
    pub fn roll_axis(&self) -> Vec3 {
        match self.yaw_axis {
            YawAxis::Z => Vec3::Y,
            YawAxis::Y => Vec3::Z,
        }
    }

    fn yaw_vector(&self) -> Vec3 {
        match self.yaw_axis {
            YawAxis::Z => Vec3::Z,
            YawAxis::Y => Vec3::Y,
        }
    }

    /// Rotation from yaw/pitch/roll in degrees. Roll is sign-flipped.
    pub fn rotation_matrix(&self, yaw: f32, pitch: f32, roll: f32) -> Mat4 {
        Mat4::from_axis_angle(self.yaw_vector(), yaw.to_radians())
            * Mat4::from_axis_angle(Vec3::X, pitch.to_radians())
            * Mat4::from_axis_angle(self.roll_axis(), (-roll).to_radians())
    }

    /// translate ∘ overlay ∘ scale ∘ R(yaw) ∘ R(pitch) ∘ R(-roll)
    pub fn model_matrix(&self, overlay: Mat4, yaw: f32, pitch: f32, roll: f32) -> Mat4 {
        Mat4::from_translation(self.translation)
            * overlay
            * Mat4::from_scale(Vec3::splat(self.scale))
            * self.rotation_matrix(yaw, pitch, roll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn model_pose() -> ScenePose {
        ScenePose::from_config(&SceneConfig::model(PathBuf::from("m.obj")))
    }

    fn axes_pose() -> ScenePose {
        ScenePose::from_config(&SceneConfig::axes())
    }

    #[test]
    fn zero_angles_only_place_and_scale() {
        let pose = model_pose();
        let m = pose.model_matrix(Mat4::IDENTITY, 0.0, 0.0, 0.0);
        let p = m.transform_point3(Vec3::new(25.0, 0.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::new(1.0, 0.0, -10.0), 1e-5));
    }

    #[test]
    fn model_yaw_turns_about_z() {
        let r = model_pose().rotation_matrix(90.0, 0.0, 0.0);
        assert!(r.transform_vector3(Vec3::X).abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn axes_yaw_turns_about_y() {
        let r = axes_pose().rotation_matrix(90.0, 0.0, 0.0);
        assert!(r.transform_vector3(Vec3::X).abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn pitch_turns_about_x() {
        let r = model_pose().rotation_matrix(0.0, 90.0, 0.0);
        assert!(r.transform_vector3(Vec3::Y).abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn roll_is_sign_flipped_about_remaining_axis() {
        let r = model_pose().rotation_matrix(0.0, 0.0, 90.0);
        // -90° about Y sends X to +Z.
        assert!(r.transform_vector3(Vec3::X).abs_diff_eq(Vec3::Z, 1e-6));

        let r = axes_pose().rotation_matrix(0.0, 0.0, 90.0);
        // -90° about Z sends X to -Y.
        assert!(r.transform_vector3(Vec3::X).abs_diff_eq(Vec3::NEG_Y, 1e-6));
    }

    #[test]
    fn yaw_is_outermost_rotation() {
        let pose = axes_pose();
        let r = pose.rotation_matrix(90.0, 90.0, 0.0);
        let expected = Mat4::from_rotation_y(90f32.to_radians()) * Mat4::from_rotation_x(90f32.to_radians());
        assert!(r.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn overlay_sits_between_translation_and_scale() {
        let pose = axes_pose();
        let overlay = Mat4::from_scale(Vec3::splat(2.0));
        let m = pose.model_matrix(overlay, 0.0, 0.0, 0.0);
        let p = m.transform_point3(Vec3::X);
        // Zoom scales about the object, not about the camera.
        assert!(p.abs_diff_eq(Vec3::new(2.0, 0.0, -7.0), 1e-6));
    }
}
