//! APRS-IS uplink.
//!
//! Each beacon opens a fresh TCP session, writes the login line and the
//! position report, and closes. Nothing is read back from the server.
//!
//! # Example
//!
//! ```no_run
//! use aprs_beacon::aprs::{compute_passcode, BeaconPacket};
//! use aprs_beacon::aprsis::{AprsIsServer, AprsIsTransmitter, Transmit};
//! use aprs_beacon::config::BeaconConfig;
//!
//! let config = BeaconConfig::new("N0CALL", compute_passcode("N0CALL").to_string(), 41.0, 27.0);
//! let transmitter = AprsIsTransmitter::new(AprsIsServer::rotate());
//! transmitter.send(&BeaconPacket::build(&config))?;
//! # Ok::<(), aprs_beacon::aprsis::TransmitError>(())
//! ```

mod config;
mod transport;

pub use config::{AprsIsServer, DEFAULT_HOST, DEFAULT_PORT};
pub use transport::{AprsIsTransmitter, Transmit, TransmitError, SEND_TIMEOUT_SECS};
