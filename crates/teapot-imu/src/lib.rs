pub mod convert;
pub mod protocol;
pub mod transport;
pub mod types;

use convert::OrientationConverter;
use teapot_config::{CalibrationOffsets, SampleMode, TransportConfig};
use transport::{ConnectionError, Transport, TransportError};
use types::OrientationReading;

/// Pulls orientation samples off a transport, one per call.
///
/// Reads a raw line, parses it in the configured mode and converts it to
/// calibrated yaw/pitch/roll. Malformed lines become fallback readings; only
/// transport failures are errors.
pub struct SampleSource {
    transport: Box<dyn Transport>,
    mode: SampleMode,
    converter: OrientationConverter,
    sample_count: u64,
    fallback_count: u64,
}

impl SampleSource {
    /// Open the configured transport and start reading from it.
    pub fn connect(
        config: &TransportConfig,
        mode: SampleMode,
        offsets: CalibrationOffsets,
    ) -> Result<Self, ConnectionError> {
        let transport = transport::open(config)?;
        Ok(Self::new(transport, mode, offsets))
    }

    pub fn new(transport: Box<dyn Transport>, mode: SampleMode, offsets: CalibrationOffsets) -> Self {
        tracing::info!(endpoint = %transport.describe(), ?mode, "Sample source ready");
        Self {
            transport,
            mode,
            converter: OrientationConverter::new(offsets),
            sample_count: 0,
            fallback_count: 0,
        }
    }

    pub fn mode(&self) -> SampleMode {
        self.mode
    }

    /// Block for the next sample and return the angles to render.
    pub fn next_orientation(&mut self) -> Result<OrientationReading, TransportError> {
        let line = self.transport.read_line()?;
        tracing::trace!(%line, "Sample line");

        let sample = protocol::parse_sample(&line, self.mode);
        let angles = self.converter.convert(&sample);

        self.sample_count += 1;
        if sample.is_fallback() {
            self.fallback_count += 1;
        }
        tracing::debug!(
            yaw = angles.yaw,
            pitch = angles.pitch,
            roll = angles.roll,
            fallback = sample.is_fallback(),
            "Orientation"
        );

        Ok(OrientationReading {
            angles,
            fallback: sample.is_fallback(),
        })
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn fallback_count(&self) -> u64 {
        self.fallback_count
    }

    /// Release the transport.
    pub fn close(self) {
        tracing::info!(
            endpoint = %self.transport.describe(),
            samples = self.sample_count,
            fallbacks = self.fallback_count,
            "Closing sample source"
        );
    }
}

/// In-memory transports for tests in this and dependent crates.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use crate::transport::{Transport, TransportError};
    use std::collections::VecDeque;
    use std::io;

    /// Replays fixed lines, then fails like a dropped link.
    pub struct ScriptedTransport {
        pub lines: VecDeque<String>,
    }

    impl ScriptedTransport {
        pub fn new(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|l| l.to_string()).collect(),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn read_line(&mut self) -> Result<String, TransportError> {
            self.lines.pop_front().ok_or_else(|| {
                TransportError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "script exhausted"))
            })
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testing::ScriptedTransport;
    use types::EulerAngles;

    fn source(lines: &[&str], mode: SampleMode) -> SampleSource {
        SampleSource::new(
            Box::new(ScriptedTransport::new(lines)),
            mode,
            CalibrationOffsets::default(),
        )
    }

    #[test]
    fn quaternion_lines_are_converted_with_offsets() {
        let mut source = source(&["w1.0a0.0b0.0c0.0"], SampleMode::Quaternion);
        let reading = source.next_orientation().unwrap();
        assert!(!reading.fallback);
        assert!((reading.angles.yaw + 40.2381).abs() < 1e-3);
        assert!((reading.angles.pitch - 7.4261).abs() < 1e-3);
        assert!((reading.angles.roll - 0.6765).abs() < 1e-3);
    }

    #[test]
    fn euler_lines_pass_through() {
        let mut source = source(&["y1.5p2.5r3.5"], SampleMode::Euler);
        let reading = source.next_orientation().unwrap();
        assert_eq!(reading.angles, EulerAngles::new(3.5, 2.5, 1.5));
    }

    #[test]
    fn bad_lines_are_counted_not_fatal() {
        let mut source = source(&["garbage", "", "y1p2r3"], SampleMode::Euler);
        assert!(source.next_orientation().unwrap().fallback);
        assert!(source.next_orientation().unwrap().fallback);
        assert!(!source.next_orientation().unwrap().fallback);
        assert_eq!(source.sample_count(), 3);
        assert_eq!(source.fallback_count(), 2);
    }

    #[test]
    fn transport_failure_is_an_error() {
        let mut source = source(&[], SampleMode::Quaternion);
        assert!(matches!(
            source.next_orientation(),
            Err(TransportError::Io(_))
        ));
    }
}
