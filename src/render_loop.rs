use crate::stats::{FrameStats, FrameSummary};
use glam::Mat4;
use teapot_imu::transport::TransportError;
use teapot_imu::SampleSource;
use teapot_renderer::ScenePose;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShuttingDown,
}

/// One sample in, one frame out.
///
/// Owns the sample source for the life of the window. The platform event
/// loop decides when a frame is due; this type decides what it shows.
/// Without a source every frame is drawn at zero yaw, pitch and roll.
pub struct RenderLoop {
    state: LoopState,
    source: Option<SampleSource>,
    pose: ScenePose,
    stats: FrameStats,
}

impl RenderLoop {
    pub fn new(source: Option<SampleSource>, pose: ScenePose) -> Self {
        Self {
            state: LoopState::Running,
            source,
            pose,
            stats: FrameStats::new(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Quit or escape. Terminal.
    pub fn request_quit(&mut self) {
        if self.state == LoopState::Running {
            info!(frames = self.stats.frames(), "Shutdown requested");
            self.state = LoopState::ShuttingDown;
        }
    }

    /// Pull the next sample and compose the model transform for it.
    ///
    /// `overlay` is the pointer-driven camera transform. Returns `None` once
    /// shutting down. A transport failure ends the loop.
    pub fn tick(&mut self, overlay: Mat4) -> Result<Option<Mat4>, TransportError> {
        if self.state != LoopState::Running {
            return Ok(None);
        }

        let Some(source) = &mut self.source else {
            return Ok(Some(self.pose.model_matrix(overlay, 0.0, 0.0, 0.0)));
        };

        let reading = match source.next_orientation() {
            Ok(reading) => reading,
            Err(e) => {
                error!(error = %e, "Transport failed, shutting down");
                self.state = LoopState::ShuttingDown;
                return Err(e);
            }
        };

        let a = reading.angles;
        Ok(Some(self.pose.model_matrix(overlay, a.yaw, a.pitch, a.roll)))
    }

    /// Count a presented frame.
    pub fn record_frame(&mut self) {
        self.stats.record_frame();
        let frames = self.stats.frames();
        if frames % 300 == 0 {
            debug!(
                frames,
                fallbacks = self.source.as_ref().map_or(0, SampleSource::fallback_count),
                "Render heartbeat"
            );
        }
    }

    pub fn frames(&self) -> u64 {
        self.stats.frames()
    }

    /// Close the transport and report throughput.
    pub fn finish(self) -> FrameSummary {
        let summary = self.stats.summary();
        if let Some(source) = self.source {
            source.close();
        }
        info!(
            frames = summary.frames,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            fps = summary.fps,
            "Render loop finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use teapot_config::{CalibrationOffsets, SampleMode, SceneConfig};
    use teapot_imu::testing::ScriptedTransport;

    fn render_loop(lines: &[&str], mode: SampleMode) -> RenderLoop {
        let transport = ScriptedTransport::new(lines);
        let source = SampleSource::new(Box::new(transport), mode, CalibrationOffsets::ZERO);
        RenderLoop::new(Some(source), ScenePose::from_config(&SceneConfig::axes()))
    }

    #[test]
    fn identity_sample_only_places_object() {
        let mut rl = render_loop(&["w1.0a0.0b0.0c0.0"], SampleMode::Quaternion);
        let m = rl.tick(Mat4::IDENTITY).unwrap().unwrap();
        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 0.0, -7.0), 1e-5));
    }

    #[test]
    fn garbage_line_still_produces_a_frame() {
        let mut rl = render_loop(&["garbage", "y0p0r90"], SampleMode::Euler);
        assert!(rl.tick(Mat4::IDENTITY).unwrap().is_some());
        rl.record_frame();

        // Tag r is yaw; the axes scene yaws about Y.
        let m = rl.tick(Mat4::IDENTITY).unwrap().unwrap();
        rl.record_frame();
        let dir = m.transform_vector3(Vec3::X);
        assert!(dir.abs_diff_eq(Vec3::NEG_Z, 1e-5));
        assert_eq!(rl.frames(), 2);
    }

    #[test]
    fn transport_error_shuts_down() {
        let mut rl = render_loop(&[], SampleMode::Quaternion);
        assert!(rl.tick(Mat4::IDENTITY).is_err());
        assert_eq!(rl.state(), LoopState::ShuttingDown);
        assert_eq!(rl.tick(Mat4::IDENTITY).unwrap(), None);
    }

    #[test]
    fn quit_stops_consuming_samples() {
        let mut rl = render_loop(&["w1a0b0c0", "w1a0b0c0"], SampleMode::Quaternion);
        rl.tick(Mat4::IDENTITY).unwrap();
        rl.record_frame();
        rl.request_quit();
        assert_eq!(rl.state(), LoopState::ShuttingDown);
        assert_eq!(rl.tick(Mat4::IDENTITY).unwrap(), None);

        let summary = rl.finish();
        assert_eq!(summary.frames, 1);
    }

    #[test]
    fn no_sensor_draws_scene_at_rest() {
        let mut rl = RenderLoop::new(None, ScenePose::from_config(&SceneConfig::axes()));
        for _ in 0..3 {
            let m = rl.tick(Mat4::IDENTITY).unwrap().unwrap();
            assert!(m.transform_point3(Vec3::X).abs_diff_eq(Vec3::new(1.0, 0.0, -7.0), 1e-5));
            rl.record_frame();
        }
        assert_eq!(rl.state(), LoopState::Running);

        rl.request_quit();
        assert_eq!(rl.tick(Mat4::IDENTITY).unwrap(), None);
        assert_eq!(rl.finish().frames, 3);
    }

    #[test]
    fn overlay_applies_before_sensor_rotation() {
        let mut rl = render_loop(&["w1a0b0c0"], SampleMode::Quaternion);
        let zoom = Mat4::from_scale(Vec3::splat(2.0));
        let m = rl.tick(zoom).unwrap().unwrap();
        let p = m.transform_point3(Vec3::Y);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 2.0, -7.0), 1e-5));
    }
}
