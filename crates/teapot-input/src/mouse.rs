use crate::CameraState;
use glam::{Quat, Vec2};
use teapot_config::OverlayConfig;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Left-drag rotates, wheel zooms.
///
/// Every change is folded into the cumulative [`CameraState`]; nothing is
/// ever reset.
pub struct CameraController {
    state: CameraState,
    /// Last pointer position in window pixels.
    cursor: Vec2,
    /// Position latched at the last drag step, while the left button is held.
    dragging: Option<Vec2>,
    degrees_per_pixel: f32,
    zoom_in: f32,
    zoom_out: f32,
}

impl CameraController {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            state: CameraState {
                translation: config.translation,
                ..CameraState::default()
            },
            cursor: Vec2::ZERO,
            dragging: None,
            degrees_per_pixel: config.degrees_per_pixel,
            zoom_in: config.zoom_in,
            zoom_out: config.zoom_out,
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        self.cursor = Vec2::new(x as f32, y as f32);

        if let Some(last) = self.dragging {
            let delta = self.cursor - last;
            self.rotate_by(delta);
            self.dragging = Some(self.cursor);
        }
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => self.dragging = Some(self.cursor),
            ElementState::Released => self.dragging = None,
        }
    }

    /// One zoom step per event, in the direction of the scroll.
    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        let scroll_y = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
        };

        if scroll_y > 0.0 {
            self.state.scale *= self.zoom_in;
        } else if scroll_y < 0.0 {
            self.state.scale *= self.zoom_out;
        }
    }

    /// Horizontal travel turns about the vertical axis, then vertical travel
    /// about the horizontal axis, both in the already-rotated frame.
    fn rotate_by(&mut self, delta: Vec2) {
        let yaw = (delta.x * self.degrees_per_pixel).to_radians();
        let pitch = (delta.y * self.degrees_per_pixel).to_radians();
        self.state.rotation =
            (self.state.rotation * Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch))
                .normalize();
    }
}
