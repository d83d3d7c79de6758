//! Beacon configuration.
//!
//! # Components
//!
//! - [`beacon`] - validated [`BeaconConfig`] and the interval policy
//! - [`settings`] - raw [`BeaconSettings`] record as persisted and edited
//!
//! Persistence of [`BeaconSettings`] lives in [`crate::settings_store`].

mod beacon;
mod settings;

pub use beacon::{
    BeaconConfig, ConfigError, IntervalPolicy, SymbolTable, CONSERVATIVE_MIN_INTERVAL_SECS,
    DEFAULT_INTERVAL_SECS, DEFAULT_SYMBOL_CODE, STANDARD_MIN_INTERVAL_SECS,
};
pub use settings::{BeaconSettings, SETTING_KEYS};
