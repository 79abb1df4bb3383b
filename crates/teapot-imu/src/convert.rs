use crate::types::{EulerAngles, Orientation, Sample};
use glam::Quat;
use teapot_config::CalibrationOffsets;

/// Quaternion to yaw/pitch/roll in degrees, before any calibration offset.
///
/// Pitch is negated to match the sensor's mounting. The `asin` argument is
/// clamped to [-1, 1]; without the clamp a slightly non-unit quaternion near
/// ±90° pitch would produce NaN.
pub fn quaternion_to_euler_raw(q: Quat) -> EulerAngles {
    let (w, x, y, z) = (q.w, q.x, q.y, q.z);

    let yaw = (2.0 * (x * y + w * z)).atan2(w * w + x * x - y * y - z * z);

    let sin_pitch = 2.0 * (x * z - w * y);
    if sin_pitch.abs() > 1.0 {
        tracing::trace!(sin_pitch, "Clamping pitch sine");
    }
    let pitch = sin_pitch.clamp(-1.0, 1.0).asin();

    let roll = (2.0 * (w * x + y * z)).atan2(w * w - x * x - y * y + z * z);

    EulerAngles {
        yaw: yaw.to_degrees(),
        pitch: -pitch.to_degrees(),
        roll: roll.to_degrees(),
    }
}

/// Quaternion to calibrated yaw/pitch/roll in degrees.
pub fn quaternion_to_euler(q: Quat, offsets: &CalibrationOffsets) -> EulerAngles {
    apply_offsets(quaternion_to_euler_raw(q), offsets)
}

pub fn apply_offsets(angles: EulerAngles, offsets: &CalibrationOffsets) -> EulerAngles {
    EulerAngles {
        yaw: angles.yaw + offsets.yaw,
        pitch: angles.pitch + offsets.pitch,
        roll: angles.roll + offsets.roll,
    }
}

pub fn remove_offsets(angles: EulerAngles, offsets: &CalibrationOffsets) -> EulerAngles {
    EulerAngles {
        yaw: angles.yaw - offsets.yaw,
        pitch: angles.pitch - offsets.pitch,
        roll: angles.roll - offsets.roll,
    }
}

/// Turns any sample into the angles that drive the model.
///
/// Offsets are a property of the quaternion conversion; Euler samples are
/// already in the sender's frame and pass through untouched.
#[derive(Debug, Clone, Copy)]
pub struct OrientationConverter {
    offsets: CalibrationOffsets,
}

impl OrientationConverter {
    pub fn new(offsets: CalibrationOffsets) -> Self {
        Self { offsets }
    }

    pub fn offsets(&self) -> &CalibrationOffsets {
        &self.offsets
    }

    pub fn convert(&self, sample: &Sample) -> EulerAngles {
        match sample.orientation() {
            Orientation::Quaternion(q) => quaternion_to_euler(q, &self.offsets),
            Orientation::Euler(angles) => angles,
        }
    }
}
