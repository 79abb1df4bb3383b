use glam::Quat;

/// Yaw, pitch and roll in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl EulerAngles {
    pub const ZERO: Self = Self {
        yaw: 0.0,
        pitch: 0.0,
        roll: 0.0,
    };

    pub fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }

    pub fn is_finite(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite() && self.roll.is_finite()
    }
}

/// One orientation record as it came off the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    /// Unit quaternion (not validated).
    Quaternion(Quat),
    Euler(EulerAngles),
}

/// A parsed record, tagged with whether the line actually carried data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Parsed(Orientation),
    /// The line was malformed; the value is the mode's neutral default.
    Fallback(Orientation),
}

impl Sample {
    pub fn orientation(&self) -> Orientation {
        match *self {
            Sample::Parsed(o) | Sample::Fallback(o) => o,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Sample::Fallback(_))
    }
}

/// Final angles for one frame, ready to drive the model transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationReading {
    pub angles: EulerAngles,
    /// True when the sample line could not be parsed.
    pub fallback: bool,
}
