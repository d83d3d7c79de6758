//! APRS-IS position beacon library.
//!
//! This library contains the beacon core (passcode, position encoding,
//! packet assembly, TCP uplink and scheduler) plus the host-side operator
//! surfaces used by the `aprs-beacon` binary.

pub mod aprs;
pub mod aprsis;
pub mod config;
pub mod console;
pub mod scheduler;
pub mod settings_store;
pub mod status;

// Re-export commonly used items
pub use aprs::{compute_passcode, decode, encode, verify_passcode, BeaconPacket, PacketFormat};
pub use aprsis::{AprsIsServer, AprsIsTransmitter, Transmit, TransmitError};
pub use config::{BeaconConfig, BeaconSettings, ConfigError, IntervalPolicy, SymbolTable};
pub use console::{Console, ConsoleCommand, ConsoleOutcome};
pub use scheduler::{Scheduler, SchedulerState};
pub use status::{BeaconStats, StatusServer, StatusSnapshot, DEFAULT_STATUS_PORT};
