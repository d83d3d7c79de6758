//! Validated beacon configuration.
//!
//! A [`BeaconConfig`] is what the scheduler runs with. It is built either
//! directly or from the raw [`BeaconSettings`](super::BeaconSettings) record,
//! and must pass [`BeaconConfig::validate`] before it is handed to the
//! scheduler.
//!
//! # Example
//!
//! ```
//! use aprs_beacon::aprs::compute_passcode;
//! use aprs_beacon::config::{BeaconConfig, IntervalPolicy, SymbolTable};
//!
//! let passcode = compute_passcode("N0CALL").to_string();
//! let config = BeaconConfig::new("N0CALL-9", passcode, 41.0, 27.0)
//!     .with_symbol(SymbolTable::Primary, '>')
//!     .with_interval(600);
//! assert!(config.validate(IntervalPolicy::Standard).is_ok());
//! assert!(config.validate(IntervalPolicy::Conservative).is_err());
//! ```

use crate::aprs::{verify_passcode, PacketFormat};
use std::fmt;
use std::time::Duration;
use zeroize::Zeroize;

/// Minimum interval of the standard deployment profile (5 minutes).
pub const STANDARD_MIN_INTERVAL_SECS: u64 = 300;

/// Minimum interval of the conservative deployment profile (20 minutes).
pub const CONSERVATIVE_MIN_INTERVAL_SECS: u64 = 1200;

/// Interval used when none is given.
pub const DEFAULT_INTERVAL_SECS: u64 = 1200;

/// Symbol used when none is given (car).
pub const DEFAULT_SYMBOL_CODE: char = 'r';

/// APRS symbol table selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SymbolTable {
    /// Primary table, `/`.
    #[default]
    Primary,
    /// Alternate table, `\`.
    Alternate,
}

impl SymbolTable {
    /// The table character as it appears in a packet.
    pub fn as_char(&self) -> char {
        match self {
            Self::Primary => '/',
            Self::Alternate => '\\',
        }
    }
}

impl TryFrom<char> for SymbolTable {
    type Error = ConfigError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '/' => Ok(Self::Primary),
            '\\' => Ok(Self::Alternate),
            _ => Err(ConfigError::InvalidSymbolTable(c.to_string())),
        }
    }
}

impl std::str::FromStr for SymbolTable {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(Self::Primary),
            (Some(c), None) => Self::try_from(c),
            _ => Err(ConfigError::InvalidSymbolTable(s.to_string())),
        }
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Minimum beacon interval enforced before starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalPolicy {
    /// 300 second minimum.
    Standard,
    /// 1200 second minimum.
    Conservative,
    /// Caller-chosen minimum (never below one second).
    Custom(u64),
}

impl IntervalPolicy {
    /// Smallest accepted interval in seconds.
    pub fn min_secs(&self) -> u64 {
        match self {
            Self::Standard => STANDARD_MIN_INTERVAL_SECS,
            Self::Conservative => CONSERVATIVE_MIN_INTERVAL_SECS,
            Self::Custom(secs) => (*secs).max(1),
        }
    }
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self::Standard
    }
}

/// Everything needed to run one beacon.
///
/// The passcode text is zeroed when the config is dropped.
#[derive(Clone, PartialEq)]
pub struct BeaconConfig {
    /// Callsign as sent, possibly with `-SSID`.
    pub callsign: String,
    /// Numeric APRS-IS passcode.
    pub passcode: String,
    /// Latitude in signed decimal degrees.
    pub latitude: f64,
    /// Longitude in signed decimal degrees.
    pub longitude: f64,
    /// Symbol table.
    pub symbol_table: SymbolTable,
    /// Symbol code within the table.
    pub symbol_code: char,
    /// Free text appended to the report.
    pub comment: String,
    /// Seconds between beacons.
    pub interval_secs: u64,
    /// Report dialect.
    pub format: PacketFormat,
}

impl BeaconConfig {
    /// Create a config with default symbol, empty comment and default interval.
    pub fn new(
        callsign: impl Into<String>,
        passcode: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            callsign: callsign.into(),
            passcode: passcode.into(),
            latitude,
            longitude,
            symbol_table: SymbolTable::Primary,
            symbol_code: DEFAULT_SYMBOL_CODE,
            comment: String::new(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            format: PacketFormat::Canonical,
        }
    }

    /// Set the symbol table and code.
    pub fn with_symbol(mut self, table: SymbolTable, code: char) -> Self {
        self.symbol_table = table;
        self.symbol_code = code;
        self
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the interval in seconds.
    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }

    /// Set the report dialect.
    pub fn with_format(mut self, format: PacketFormat) -> Self {
        self.format = format;
        self
    }

    /// Interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate against a minimum-interval policy.
    ///
    /// Checks run in the order an operator would fix them: callsign,
    /// passcode, interval, symbol, then position.
    pub fn validate(&self, policy: IntervalPolicy) -> Result<(), ConfigError> {
        if self.callsign.trim().is_empty() {
            return Err(ConfigError::EmptyCallsign);
        }
        if !verify_passcode(&self.callsign, &self.passcode) {
            return Err(ConfigError::InvalidPasscode);
        }

        let min = policy.min_secs();
        if self.interval_secs < min {
            return Err(ConfigError::IntervalTooShort {
                secs: self.interval_secs,
                min,
            });
        }

        if self.symbol_code.is_control() {
            return Err(ConfigError::InvalidSymbol(self.symbol_code.to_string()));
        }

        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ConfigError::InvalidLatitude(self.latitude.to_string()));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::InvalidLongitude(self.longitude.to_string()));
        }

        Ok(())
    }
}

impl fmt::Debug for BeaconConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeaconConfig")
            .field("callsign", &self.callsign)
            .field("passcode", &"<redacted>")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("symbol_table", &self.symbol_table)
            .field("symbol_code", &self.symbol_code)
            .field("comment", &self.comment)
            .field("interval_secs", &self.interval_secs)
            .field("format", &self.format)
            .finish()
    }
}

impl Drop for BeaconConfig {
    fn drop(&mut self) {
        self.passcode.zeroize();
    }
}

/// Errors that can occur while building or validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Callsign is empty.
    EmptyCallsign,
    /// Passcode does not match the callsign.
    InvalidPasscode,
    /// Latitude is not a number in [-90, 90].
    InvalidLatitude(String),
    /// Longitude is not a number in [-180, 180].
    InvalidLongitude(String),
    /// Symbol table is not `/` or `\`.
    InvalidSymbolTable(String),
    /// Symbol code is not exactly one printable character.
    InvalidSymbol(String),
    /// Interval is not a number.
    InvalidInterval(String),
    /// Interval is below the policy minimum.
    IntervalTooShort { secs: u64, min: u64 },
    /// Settings key does not exist.
    UnknownSetting(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCallsign => write!(f, "callsign cannot be empty"),
            Self::InvalidPasscode => write!(f, "passcode is invalid for the given callsign"),
            Self::InvalidLatitude(s) => write!(f, "invalid latitude: {}", s),
            Self::InvalidLongitude(s) => write!(f, "invalid longitude: {}", s),
            Self::InvalidSymbolTable(s) => {
                write!(f, "invalid symbol table: {:?} (expected / or \\)", s)
            }
            Self::InvalidSymbol(s) => {
                write!(f, "symbol must be a single character, got {:?}", s)
            }
            Self::InvalidInterval(s) => write!(f, "interval must be a number, got {:?}", s),
            Self::IntervalTooShort { secs, min } => {
                write!(f, "interval too short: {}s (min {}s)", secs, min)
            }
            Self::UnknownSetting(key) => write!(f, "unknown setting: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}
