//! APRS encoding primitives.
//!
//! Pure, host-testable building blocks for talking to APRS-IS:
//!
//! - [`passcode`] - login passcode derivation and verification
//! - [`position`] - decimal degrees to fixed-width APRS position fields
//! - [`packet`] - login line and position report assembly
//!
//! # Example
//!
//! ```
//! use aprs_beacon::aprs::{compute_passcode, encode, verify_passcode};
//!
//! let code = compute_passcode("N0CALL-9");
//! assert!(verify_passcode("N0CALL", &code.to_string()));
//! assert_eq!(encode(-27.5, false), "02730.00W");
//! ```

pub mod packet;
pub mod passcode;
pub mod position;

pub use packet::{
    login_line, position_packet, BeaconPacket, PacketFormat, CLIENT_ID, CLIENT_VERSION,
    COMMENT_MARKER, PACKET_PATH,
};
pub use passcode::{base_callsign, compute_passcode, verify_passcode, PASSCODE_SEED};
pub use position::{
    decode, encode, encode_latitude, encode_longitude, PositionError, LATITUDE_WIDTH,
    LONGITUDE_WIDTH,
};
