use serialport::{ClearBuffer, SerialPort};
use std::io::{self, BufRead, BufReader};
use std::net::{SocketAddr, UdpSocket};
use std::string::FromUtf8Error;
use std::time::Duration;
use teapot_config::{SerialConfig, TransportConfig, UdpConfig};
use thiserror::Error;

/// Largest datagram accepted from the UDP sender.
const DATAGRAM_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to open serial port {port}: {source}")]
    Serial {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Udp {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("transport is disabled in the configuration")]
    Disabled,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
    #[error("serial driver error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("record is not valid UTF-8: {0}")]
    Decode(#[from] FromUtf8Error),
}

/// A source of newline-free text records.
pub trait Transport: Send {
    /// Block until one record is available and return it without its line ending.
    fn read_line(&mut self) -> Result<String, TransportError>;

    /// Human-readable endpoint, for logs.
    fn describe(&self) -> String;
}

/// Open the transport named by `config`.
pub fn open(config: &TransportConfig) -> Result<Box<dyn Transport>, ConnectionError> {
    Ok(match config {
        TransportConfig::Serial(serial) => Box::new(SerialTransport::open(serial)?),
        TransportConfig::Udp(udp) => Box::new(UdpTransport::bind(udp)?),
        TransportConfig::Disabled => return Err(ConnectionError::Disabled),
    })
}

/// Serial device streaming one record per line.
///
/// The device has no framing beyond `\n`, so every read first drops whatever
/// is queued plus one (likely partial) line, then returns the next full one.
pub struct SerialTransport {
    port_name: String,
    reader: BufReader<Box<dyn SerialPort>>,
}

impl SerialTransport {
    pub fn open(config: &SerialConfig) -> Result<Self, ConnectionError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(Duration::from_millis(config.timeout_ms))
            .open()
            .map_err(|source| ConnectionError::Serial {
                port: config.port.clone(),
                source,
            })?;
        tracing::info!(port = %config.port, baud = config.baud_rate, "Serial port opened");

        Ok(Self {
            port_name: config.port.clone(),
            reader: BufReader::new(port),
        })
    }

    fn clear_input(&mut self) -> Result<(), TransportError> {
        let buffered = self.reader.buffer().len();
        self.reader.consume(buffered);
        self.reader.get_ref().clear(ClearBuffer::Input)?;
        Ok(())
    }
}

impl Transport for SerialTransport {
    fn read_line(&mut self) -> Result<String, TransportError> {
        self.clear_input()?;
        read_after_discard(&mut self.reader)
    }

    fn describe(&self) -> String {
        format!("serial:{}", self.port_name)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        tracing::info!(port = %self.port_name, "Serial port closed");
    }
}

/// UDP socket receiving one record per datagram.
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    buf: [u8; DATAGRAM_LEN],
}

impl UdpTransport {
    pub fn bind(config: &UdpConfig) -> Result<Self, ConnectionError> {
        let addr = format!("{}:{}", config.bind_addr, config.port);
        let to_err = |source: io::Error| ConnectionError::Udp {
            addr: addr.clone(),
            source,
        };

        let socket = UdpSocket::bind(addr.as_str()).map_err(to_err)?;
        socket
            .set_read_timeout(config.read_timeout_ms.map(Duration::from_millis))
            .map_err(to_err)?;
        let local_addr = socket.local_addr().map_err(to_err)?;
        tracing::info!(%local_addr, "UDP socket bound");

        Ok(Self {
            socket,
            local_addr,
            buf: [0; DATAGRAM_LEN],
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Transport for UdpTransport {
    fn read_line(&mut self) -> Result<String, TransportError> {
        let len = match self.socket.recv_from(&mut self.buf) {
            Ok((len, peer)) => {
                tracing::trace!(%peer, len, "Datagram received");
                len
            }
            Err(e) if is_timeout(&e) => 0,
            Err(e) => return Err(e.into()),
        };
        decode_record(self.buf[..len].to_vec())
    }

    fn describe(&self) -> String {
        format!("udp:{}", self.local_addr)
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        tracing::info!(local_addr = %self.local_addr, "UDP socket closed");
    }
}

/// Skip one record, then return the next.
///
/// The skipped record is usually the tail of a line that was mid-flight when
/// the input buffer was cleared; it may not even be valid UTF-8.
pub(crate) fn read_after_discard<R: BufRead>(reader: &mut R) -> Result<String, TransportError> {
    match read_record(reader) {
        Ok(skipped) => tracing::trace!(%skipped, "Discarded leading record"),
        Err(TransportError::Decode(_)) => {}
        Err(e) => return Err(e),
    }
    read_record(reader)
}

/// Read up to and including `\n`. A timeout returns whatever arrived so far.
pub(crate) fn read_record<R: BufRead>(reader: &mut R) -> Result<String, TransportError> {
    let mut bytes = Vec::new();
    match reader.read_until(b'\n', &mut bytes) {
        Ok(_) => {}
        Err(e) if is_timeout(&e) => {
            tracing::trace!(partial = bytes.len(), "Read timed out");
        }
        Err(e) => return Err(e.into()),
    }
    decode_record(bytes)
}

fn decode_record(bytes: Vec<u8>) -> Result<String, TransportError> {
    let mut line = String::from_utf8(bytes)?;
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn loopback(read_timeout_ms: Option<u64>) -> UdpTransport {
        UdpTransport::bind(&UdpConfig {
            bind_addr: "127.0.0.1".to_string(),
            port: 0,
            read_timeout_ms,
        })
        .unwrap()
    }

    #[test]
    fn record_strips_line_ending() {
        let mut reader = Cursor::new(b"w1a0b0c0\r\nnext\n".to_vec());
        assert_eq!(read_record(&mut reader).unwrap(), "w1a0b0c0");
        assert_eq!(read_record(&mut reader).unwrap(), "next");
        assert_eq!(read_record(&mut reader).unwrap(), "");
    }

    #[test]
    fn record_without_newline_is_returned_whole() {
        let mut reader = Cursor::new(b"y1p2r3".to_vec());
        assert_eq!(read_record(&mut reader).unwrap(), "y1p2r3");
    }

    #[test]
    fn discard_skips_partial_line() {
        let mut reader = Cursor::new(b"0.25c0.1\nw1a0b0c0\nw0a1b0c0\n".to_vec());
        assert_eq!(read_after_discard(&mut reader).unwrap(), "w1a0b0c0");
    }

    #[test]
    fn discard_tolerates_invalid_utf8() {
        let mut reader = Cursor::new(b"\xff\xfe\nw1a0b0c0\n".to_vec());
        assert_eq!(read_after_discard(&mut reader).unwrap(), "w1a0b0c0");
    }

    #[test]
    fn invalid_utf8_record_is_a_decode_error() {
        let mut reader = Cursor::new(b"skip\n\xff\xfe\n".to_vec());
        assert!(matches!(
            read_after_discard(&mut reader),
            Err(TransportError::Decode(_))
        ));
    }

    struct TimesOut {
        data: Cursor<Vec<u8>>,
    }

    impl Read for TimesOut {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn timeout_returns_partial_line() {
        let mut reader = BufReader::new(TimesOut {
            data: Cursor::new(b"w0.5a0.5".to_vec()),
        });
        assert_eq!(read_record(&mut reader).unwrap(), "w0.5a0.5");
    }

    #[test]
    fn udp_reads_one_datagram_per_record() {
        let mut transport = loopback(Some(2000));
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender
            .send_to(b"w1.0a0.0b0.0c0.0\n", transport.local_addr())
            .unwrap();
        sender.send_to(b"y1p2r3", transport.local_addr()).unwrap();

        assert_eq!(transport.read_line().unwrap(), "w1.0a0.0b0.0c0.0");
        assert_eq!(transport.read_line().unwrap(), "y1p2r3");
    }

    #[test]
    fn udp_timeout_yields_empty_record() {
        let mut transport = loopback(Some(20));
        assert_eq!(transport.read_line().unwrap(), "");
    }

    #[test]
    fn udp_port_in_use_is_a_connection_error() {
        let first = loopback(None);
        let second = UdpTransport::bind(&UdpConfig {
            bind_addr: "127.0.0.1".to_string(),
            port: first.local_addr().port(),
            read_timeout_ms: None,
        });
        assert!(matches!(second, Err(ConnectionError::Udp { .. })));
    }

    #[test]
    fn missing_serial_device_is_a_connection_error() {
        let result = open(&TransportConfig::Serial(SerialConfig {
            port: "/dev/teapot-no-such-device".to_string(),
            ..SerialConfig::default()
        }));
        assert!(matches!(result, Err(ConnectionError::Serial { .. })));
    }

    #[test]
    fn disabled_transport_does_not_open() {
        assert!(matches!(
            open(&TransportConfig::Disabled),
            Err(ConnectionError::Disabled)
        ));
    }
}
