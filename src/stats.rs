use std::time::{Duration, Instant};

/// Frames rendered since startup.
#[derive(Debug, Clone)]
pub struct FrameStats {
    frames: u64,
    started: Instant,
}

/// Throughput over the whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSummary {
    pub frames: u64,
    pub elapsed: Duration,
    pub fps: f64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(started: Instant) -> Self {
        Self { frames: 0, started }
    }

    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn summary(&self) -> FrameSummary {
        self.summary_at(Instant::now())
    }

    pub fn summary_at(&self, now: Instant) -> FrameSummary {
        let elapsed = now.saturating_duration_since(self.started);
        let secs = elapsed.as_secs_f64();
        let fps = if secs > 0.0 { self.frames as f64 / secs } else { 0.0 };
        FrameSummary {
            frames: self.frames,
            elapsed,
            fps,
        }
    }
}
