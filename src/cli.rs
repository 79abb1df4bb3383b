use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use teapot_config::{
    AppConfig, SampleMode, SceneConfig, SerialConfig, TransportConfig, UdpConfig,
};

/// Real-time IMU orientation viewer.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Config file to read instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Read samples from this serial device.
    #[arg(long, value_name = "PORT", conflicts_with = "udp")]
    pub serial: Option<String>,

    /// Serial baud rate.
    #[arg(long, value_name = "RATE")]
    pub baud: Option<u32>,

    /// Receive samples as UDP datagrams on this address.
    #[arg(long, value_name = "ADDR:PORT")]
    pub udp: Option<SocketAddr>,

    /// Run without a sensor and draw the scene at rest.
    #[arg(long, conflicts_with_all = ["serial", "udp", "baud"])]
    pub no_sensor: bool,

    /// Sample lines carry yaw/pitch/roll instead of a quaternion.
    #[arg(long)]
    pub euler: bool,

    /// Draw this OBJ model.
    #[arg(long, value_name = "PATH", conflicts_with = "axes")]
    pub model: Option<PathBuf>,

    /// Draw reference axes over a slab instead of a model.
    #[arg(long)]
    pub axes: bool,

    /// Disable mouse drag and wheel zoom.
    #[arg(long)]
    pub no_overlay: bool,

    /// Write the effective config to the config path and exit.
    #[arg(long)]
    pub init_config: bool,
}

impl Cli {
    /// Fold command-line overrides into a loaded config.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = &self.serial {
            let mut serial = match &config.transport {
                TransportConfig::Serial(s) => s.clone(),
                TransportConfig::Udp(_) | TransportConfig::Disabled => SerialConfig::default(),
            };
            serial.port = port.clone();
            config.transport = TransportConfig::Serial(serial);
        }

        if let Some(addr) = self.udp {
            let read_timeout_ms = match &config.transport {
                TransportConfig::Udp(u) => u.read_timeout_ms,
                TransportConfig::Serial(_) | TransportConfig::Disabled => None,
            };
            config.transport = TransportConfig::Udp(UdpConfig {
                bind_addr: addr.ip().to_string(),
                port: addr.port(),
                read_timeout_ms,
            });
        }

        if let Some(baud) = self.baud {
            if let TransportConfig::Serial(serial) = &mut config.transport {
                serial.baud_rate = baud;
            }
        }

        if self.no_sensor {
            config.transport = TransportConfig::Disabled;
        }

        if self.euler {
            config.sample_mode = SampleMode::Euler;
        }

        if let Some(path) = &self.model {
            config.scene = SceneConfig::model(path.clone());
        } else if self.axes {
            config.scene = SceneConfig::axes();
        }

        if self.no_overlay {
            config.overlay.enabled = false;
        }
    }
}
