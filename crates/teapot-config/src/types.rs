use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// How each sample line is interpreted. Must match the sender.
    pub sample_mode: SampleMode,
    /// Where samples come from.
    pub transport: TransportConfig,
    /// Additive correction applied after quaternion-to-Euler conversion.
    pub calibration: CalibrationOffsets,
    /// What gets drawn and how it is placed.
    pub scene: SceneConfig,
    /// Mouse drag / wheel camera control.
    pub overlay: OverlayConfig,
    pub display: DisplayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sample_mode: SampleMode::Quaternion,
            transport: TransportConfig::default(),
            calibration: CalibrationOffsets::default(),
            scene: SceneConfig::default(),
            overlay: OverlayConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("serial port name is empty")]
    EmptySerialPort,
    #[error("baud rate must be positive")]
    ZeroBaudRate,
    #[error("scene scale must be positive, got {0}")]
    NonPositiveScale(f32),
    #[error("zoom factors must be positive, got in={zoom_in} out={zoom_out}")]
    NonPositiveZoom { zoom_in: f32, zoom_out: f32 },
    #[error("window size must be non-zero, got {0}x{1}")]
    EmptyWindow(u32, u32),
}

impl AppConfig {
    /// Reject values that would make the viewer unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let TransportConfig::Serial(serial) = &self.transport {
            if serial.port.trim().is_empty() {
                return Err(ConfigError::EmptySerialPort);
            }
            if serial.baud_rate == 0 {
                return Err(ConfigError::ZeroBaudRate);
            }
        }
        if !(self.scene.scale > 0.0) {
            return Err(ConfigError::NonPositiveScale(self.scene.scale));
        }
        if !(self.overlay.zoom_in > 0.0 && self.overlay.zoom_out > 0.0) {
            return Err(ConfigError::NonPositiveZoom {
                zoom_in: self.overlay.zoom_in,
                zoom_out: self.overlay.zoom_out,
            });
        }
        let (w, h) = self.display.size;
        if w == 0 || h == 0 {
            return Err(ConfigError::EmptyWindow(w, h));
        }
        Ok(())
    }
}

/// Wire format of a sample line. Decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMode {
    /// Tags `w`, `a`, `b`, `c` carry a unit quaternion.
    Quaternion,
    /// Tags `y`, `p`, `r` carry roll, pitch and yaw in degrees (in that order).
    Euler,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    Serial(SerialConfig),
    Udp(UdpConfig),
    /// No sensor attached; the scene is drawn at rest.
    Disabled,
}

impl TransportConfig {
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Serial(SerialConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM19`.
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout. A read that times out yields whatever partial line arrived.
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpConfig {
    pub bind_addr: String,
    pub port: u16,
    /// `None` blocks until a datagram arrives.
    pub read_timeout_ms: Option<u64>,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 5555,
            read_timeout_ms: None,
        }
    }
}

/// Per-device correction in degrees, added to the raw converted angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationOffsets {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl CalibrationOffsets {
    pub const ZERO: Self = Self {
        yaw: 0.0,
        pitch: 0.0,
        roll: 0.0,
    };
}

impl Default for CalibrationOffsets {
    /// Values measured for the BNO055 the viewer was first built against.
    fn default() -> Self {
        Self {
            yaw: -40.2381,
            pitch: 7.4261,
            roll: 0.6765,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Uniform scale applied to the drawn geometry.
    pub scale: f32,
    /// World-space offset of the object; negative Z moves it away from the camera.
    #[serde(with = "vec3_serde")]
    pub translation: Vec3,
    /// Axis the yaw angle rotates about. Roll uses the remaining horizontal axis.
    pub yaw_axis: YawAxis,
    pub target: DrawTarget,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::model(PathBuf::from("alfa147.obj"))
    }
}

impl SceneConfig {
    /// A loaded model, yawing about Z.
    pub fn model(path: PathBuf) -> Self {
        Self {
            scale: 0.04,
            translation: Vec3::new(0.0, 0.0, -10.0),
            yaw_axis: YawAxis::Z,
            target: DrawTarget::Model {
                path,
                color: [0.1, 0.3, 0.1],
            },
        }
    }

    /// Procedural reference axes over a coloured slab, yawing about Y.
    pub fn axes() -> Self {
        Self {
            scale: 1.0,
            translation: Vec3::new(0.0, 0.0, -7.0),
            yaw_axis: YawAxis::Y,
            target: DrawTarget::Axes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DrawTarget {
    /// Wavefront OBJ file drawn in a single colour.
    Model { path: PathBuf, color: [f32; 3] },
    Axes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YawAxis {
    Y,
    Z,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    pub enabled: bool,
    /// Rotation applied per pixel of pointer travel while dragging.
    pub degrees_per_pixel: f32,
    /// Scale multiplier per wheel-up notch.
    pub zoom_in: f32,
    /// Scale multiplier per wheel-down notch. Not the inverse of `zoom_in`.
    pub zoom_out: f32,
    /// Initial camera offset, in scene units.
    #[serde(default, with = "vec3_serde")]
    pub translation: Vec3,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            degrees_per_pixel: 0.5,
            zoom_in: 1.05,
            zoom_out: 0.95,
            translation: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub title: String,
    pub size: (u32, u32),
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub clear_color: [f32; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "Teapot IMU orientation viewer".to_string(),
            size: (640, 480),
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            clear_color: [0.0, 0.0, 0.0],
        }
    }
}

// glam's own serde impls are feature-gated; arrays read better in TOML anyway.
mod vec3_serde {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vec3, s: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y, v.z].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec3, D::Error> {
        let [x, y, z] = <[f32; 3]>::deserialize(d)?;
        Ok(Vec3::new(x, y, z))
    }
}
