//! TCP transmitter for APRS-IS.
//!
//! One call to [`Transmit::send`] is one complete session: resolve, connect to
//! the first address that accepts, write both lines, close. Connecting across
//! all addresses and writing are each bounded by [`SEND_TIMEOUT_SECS`].

use super::config::AprsIsServer;
use crate::aprs::BeaconPacket;
use log::{debug, error, info};
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Connect and write timeout in seconds.
pub const SEND_TIMEOUT_SECS: u64 = 10;

/// Something that can deliver a beacon packet.
///
/// The scheduler only talks to this trait, so tests can swap in a recording
/// or failing transmitter.
pub trait Transmit: Send + Sync {
    /// Deliver one packet. Errors are reported, never retried.
    fn send(&self, packet: &BeaconPacket) -> Result<(), TransmitError>;
}

/// Sends beacons to an APRS-IS server over plain TCP.
#[derive(Debug, Clone)]
pub struct AprsIsTransmitter {
    server: AprsIsServer,
    timeout: Duration,
}

impl AprsIsTransmitter {
    /// Create a transmitter for `server` with the default timeout.
    pub fn new(server: AprsIsServer) -> Self {
        Self {
            server,
            timeout: Duration::from_secs(SEND_TIMEOUT_SECS),
        }
    }

    /// Override the connect/write timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured server.
    pub fn server(&self) -> &AprsIsServer {
        &self.server
    }

    fn open(&self) -> Result<TcpStream, TransmitError> {
        let addrs: Vec<SocketAddr> = self
            .server
            .address()
            .to_socket_addrs()
            .map_err(TransmitError::DnsResolution)?
            .collect();
        if addrs.is_empty() {
            return Err(TransmitError::NoAddresses);
        }

        debug!("Resolved {} to {:?}", self.server.host, addrs);

        let stream = connect_any(&addrs, self.timeout).map_err(TransmitError::Connection)?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(TransmitError::Io)?;
        Ok(stream)
    }

    fn deliver(&self, packet: &BeaconPacket) -> Result<(), TransmitError> {
        let mut stream = self.open()?;

        stream
            .write_all(packet.to_wire().as_bytes())
            .and_then(|_| stream.flush())
            .map_err(TransmitError::Io)?;

        // Close regardless of how the peer behaves; the stream drops after this.
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            debug!("Shutdown after send failed: {}", e);
        }
        Ok(())
    }
}

/// Try each address in turn until one accepts, all within `timeout`.
fn connect_any(addrs: &[SocketAddr], timeout: Duration) -> io::Result<TcpStream> {
    let deadline = Instant::now() + timeout;
    let mut last_err = None;

    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match TcpStream::connect_timeout(addr, remaining) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "connect timed out")))
}

impl Transmit for AprsIsTransmitter {
    fn send(&self, packet: &BeaconPacket) -> Result<(), TransmitError> {
        match self.deliver(packet) {
            Ok(()) => {
                info!("Beacon sent: {}", packet.report);
                Ok(())
            }
            Err(e) => {
                error!("Send error: {}", e);
                Err(e)
            }
        }
    }
}

/// Transmit errors.
#[derive(Debug)]
pub enum TransmitError {
    /// DNS resolution failed.
    DnsResolution(io::Error),
    /// No addresses found for hostname.
    NoAddresses,
    /// TCP connection failed or timed out.
    Connection(io::Error),
    /// I/O error while writing.
    Io(io::Error),
}

impl std::fmt::Display for TransmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DnsResolution(e) => write!(f, "DNS resolution failed: {}", e),
            Self::NoAddresses => write!(f, "no addresses found for hostname"),
            Self::Connection(e) => write!(f, "connection failed: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for TransmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DnsResolution(e) | Self::Connection(e) | Self::Io(e) => Some(e),
            Self::NoAddresses => None,
        }
    }
}
