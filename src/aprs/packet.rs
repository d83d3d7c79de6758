//! APRS-IS login line and position report.
//!
//! Each beacon session writes exactly two lines:
//!
//! ```text
//! user N0CALL-9 pass 13023 vers aprs-beacon 0.1.0
//! N0CALL-9>APRS,TCPIP*,qAC,CWOP-6:@181230z4107.40N/02730.00Wr APRS Beacon
//! ```
//!
//! The report is a timestamped uncompressed position (`@DDHHMMz`) in UTC.

use crate::aprs::position::{encode_latitude, encode_longitude};
use crate::config::BeaconConfig;
use chrono::{DateTime, Utc};

/// Digipeater path and q-construct attached to every report.
pub const PACKET_PATH: &str = "APRS,TCPIP*,qAC,CWOP-6";

/// Software name announced in the login line.
pub const CLIENT_ID: &str = env!("CARGO_PKG_NAME");

/// Software version announced in the login line.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Marker some receivers expect in front of the comment text.
pub const COMMENT_MARKER: char = '#';

/// Report dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PacketFormat {
    /// Comment appended verbatim after the symbol code.
    #[default]
    Canonical,
    /// Comment prefixed with [`COMMENT_MARKER`].
    CommentMarker,
}

/// Build the `user ... pass ... vers ...` login line (without terminator).
pub fn login_line(callsign: &str, passcode: &str) -> String {
    format!(
        "user {} pass {} vers {} {}",
        callsign, passcode, CLIENT_ID, CLIENT_VERSION
    )
}

/// Format the `DDHHMMz` report timestamp.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%d%H%Mz").to_string()
}

/// Build the position report for `config` stamped with `at` (without terminator).
pub fn position_packet(config: &BeaconConfig, at: DateTime<Utc>) -> String {
    let marker = match config.format {
        PacketFormat::Canonical => String::new(),
        PacketFormat::CommentMarker => COMMENT_MARKER.to_string(),
    };

    format!(
        "{}>{}:@{}{}{}{}{}{}{}",
        config.callsign,
        PACKET_PATH,
        timestamp(at),
        encode_latitude(config.latitude),
        config.symbol_table.as_char(),
        encode_longitude(config.longitude),
        config.symbol_code,
        marker,
        config.comment
    )
}

/// The two lines sent in one beacon session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconPacket {
    /// Login line.
    pub login: String,
    /// Position report.
    pub report: String,
}

impl BeaconPacket {
    /// Build a packet stamped with the current UTC time.
    pub fn build(config: &BeaconConfig) -> Self {
        Self::build_at(config, Utc::now())
    }

    /// Build a packet stamped with `at`.
    pub fn build_at(config: &BeaconConfig, at: DateTime<Utc>) -> Self {
        Self {
            login: login_line(&config.callsign, &config.passcode),
            report: position_packet(config, at),
        }
    }

    /// Bytes written to the socket: both lines, newline terminated.
    pub fn to_wire(&self) -> String {
        format!("{}\n{}\n", self.login, self.report)
    }
}
