//! Raw settings record.
//!
//! [`BeaconSettings`] mirrors what the operator typed: every field is kept as
//! text so a half-edited record can be stored and shown back without loss.
//! Parsing and validation happen in [`BeaconSettings::to_config`].

use super::beacon::{BeaconConfig, ConfigError, IntervalPolicy, SymbolTable};
use crate::aprs::PacketFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Settings keys in display order.
pub const SETTING_KEYS: &[&str] = &[
    "CALLSIGN", "PASSCODE", "LAT", "LON", "TABLE", "SYMBOL", "COMMENT", "INTERVAL",
];

fn default_table() -> String {
    "/".to_string()
}

/// Key/value settings as persisted by the settings store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct BeaconSettings {
    pub callsign: String,
    pub passcode: String,
    pub lat: String,
    pub lon: String,
    #[serde(default = "default_table")]
    pub table: String,
    pub symbol: String,
    pub comment: String,
    pub interval: String,
}

impl Default for BeaconSettings {
    fn default() -> Self {
        Self {
            callsign: "NOCALL".to_string(),
            passcode: "00000".to_string(),
            lat: "41.00000".to_string(),
            lon: "27.00000".to_string(),
            table: default_table(),
            symbol: "r".to_string(),
            comment: "APRS Beacon".to_string(),
            interval: "1200".to_string(),
        }
    }
}

impl BeaconSettings {
    /// Snapshot a validated config back into a settings record.
    pub fn from_config(config: &BeaconConfig) -> Self {
        Self {
            callsign: config.callsign.clone(),
            passcode: config.passcode.clone(),
            lat: config.latitude.to_string(),
            lon: config.longitude.to_string(),
            table: config.symbol_table.to_string(),
            symbol: config.symbol_code.to_string(),
            comment: config.comment.clone(),
            interval: config.interval_secs.to_string(),
        }
    }

    /// Look up a field by key (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key.trim().to_uppercase().as_str() {
            "CALLSIGN" => &self.callsign,
            "PASSCODE" => &self.passcode,
            "LAT" => &self.lat,
            "LON" => &self.lon,
            "TABLE" => &self.table,
            "SYMBOL" => &self.symbol,
            "COMMENT" => &self.comment,
            "INTERVAL" => &self.interval,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Replace a field by key (case-insensitive).
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), ConfigError> {
        let slot = match key.trim().to_uppercase().as_str() {
            "CALLSIGN" => &mut self.callsign,
            "PASSCODE" => &mut self.passcode,
            "LAT" => &mut self.lat,
            "LON" => &mut self.lon,
            "TABLE" => &mut self.table,
            "SYMBOL" => &mut self.symbol,
            "COMMENT" => &mut self.comment,
            "INTERVAL" => &mut self.interval,
            _ => return Err(ConfigError::UnknownSetting(key.to_string())),
        };
        slot.zeroize();
        *slot = value.into();
        Ok(())
    }

    /// Parse and validate into a [`BeaconConfig`].
    ///
    /// Fields are trimmed before parsing. The passcode is checked first so an
    /// operator fixing a bad passcode is not told about other fields.
    pub fn to_config(
        &self,
        policy: IntervalPolicy,
        format: PacketFormat,
    ) -> Result<BeaconConfig, ConfigError> {
        let callsign = self.callsign.trim();
        let passcode = self.passcode.trim();
        if callsign.is_empty() {
            return Err(ConfigError::EmptyCallsign);
        }
        if !crate::aprs::verify_passcode(callsign, passcode) {
            return Err(ConfigError::InvalidPasscode);
        }

        let interval_text = self.interval.trim();
        let interval_secs: u64 = interval_text
            .parse()
            .map_err(|_| ConfigError::InvalidInterval(interval_text.to_string()))?;

        let symbol_text = self.symbol.trim();
        let mut symbol_chars = symbol_text.chars();
        let symbol_code = match (symbol_chars.next(), symbol_chars.next()) {
            (Some(c), None) => c,
            _ => return Err(ConfigError::InvalidSymbol(symbol_text.to_string())),
        };
        let symbol_table: SymbolTable = self.table.parse()?;

        let lat_text = self.lat.trim();
        let latitude: f64 = lat_text
            .parse()
            .map_err(|_| ConfigError::InvalidLatitude(lat_text.to_string()))?;
        let lon_text = self.lon.trim();
        let longitude: f64 = lon_text
            .parse()
            .map_err(|_| ConfigError::InvalidLongitude(lon_text.to_string()))?;

        let config = BeaconConfig::new(callsign, passcode, latitude, longitude)
            .with_symbol(symbol_table, symbol_code)
            .with_comment(self.comment.trim())
            .with_interval(interval_secs)
            .with_format(format);
        config.validate(policy)?;
        Ok(config)
    }
}

impl fmt::Debug for BeaconSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeaconSettings")
            .field("callsign", &self.callsign)
            .field("passcode", &"<redacted>")
            .field("lat", &self.lat)
            .field("lon", &self.lon)
            .field("table", &self.table)
            .field("symbol", &self.symbol)
            .field("comment", &self.comment)
            .field("interval", &self.interval)
            .finish()
    }
}

impl fmt::Display for BeaconSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in SETTING_KEYS {
            let value = match *key {
                "PASSCODE" => "*****",
                _ => self.get(key).unwrap_or(""),
            };
            writeln!(f, "  {:<9} {}", key, value)?;
        }
        Ok(())
    }
}
