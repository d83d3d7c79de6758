//! Settings persistence for host builds.
//!
//! Stores the operator's [`BeaconSettings`] as JSON so they persist across
//! runs. Uses `~/.aprs-beacon/settings.json` by default.
//!
//! # Usage
//!
//! ```ignore
//! use aprs_beacon::settings_store;
//!
//! let settings = settings_store::load_or_create_settings()?;
//! log::info!("Callsign: {}", settings.callsign);
//! ```

use crate::config::BeaconSettings;
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory under `$HOME` holding the settings file.
const SETTINGS_DIR: &str = ".aprs-beacon";

/// Settings file name.
const SETTINGS_FILE: &str = "settings.json";

/// Get the default settings file path.
///
/// Returns `~/.aprs-beacon/settings.json`
pub fn default_settings_path() -> io::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "HOME not set"))?;
    Ok(PathBuf::from(home).join(SETTINGS_DIR).join(SETTINGS_FILE))
}

/// Read settings from a specific path.
///
/// `Ok(None)` means no file exists. An unreadable or unparsable file is an
/// error (`InvalidData` for bad JSON).
pub fn read_settings(path: &Path) -> io::Result<Option<BeaconSettings>> {
    let json = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("No settings file found at {:?}", path);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Load settings from a specific path.
///
/// Returns `None` if no settings file exists or if the data is corrupted.
pub fn load_settings_from(path: &Path) -> Option<BeaconSettings> {
    match read_settings(path) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load stored settings: {}", e);
            None
        }
    }
}

/// Save settings to a specific path.
pub fn save_settings_to(settings: &BeaconSettings, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, &json)?;

    // Verify write by reading back
    let read_back = fs::read_to_string(path)?;
    if read_back != json {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Settings verification failed: wrote {} bytes, read {} bytes",
                json.len(),
                read_back.len()
            ),
        ));
    }

    info!("Settings saved to {:?}", path);
    Ok(())
}

/// Save settings to the default path.
pub fn save_settings(settings: &BeaconSettings) -> io::Result<()> {
    let path = default_settings_path()?;
    save_settings_to(settings, &path)
}

/// Load settings from path, or write and return the defaults.
///
/// Defaults are written only when no file exists. A corrupted file is left
/// in place and reported as an `InvalidData` error.
pub fn load_or_create_settings_at(path: &Path) -> io::Result<BeaconSettings> {
    if let Some(settings) = read_settings(path)? {
        info!("Loaded settings from {:?}", path);
        return Ok(settings);
    }

    info!("Creating default settings");
    let settings = BeaconSettings::default();
    save_settings_to(&settings, path)?;
    Ok(settings)
}

/// Load settings or create defaults using the default path.
pub fn load_or_create_settings() -> io::Result<BeaconSettings> {
    let path = default_settings_path()?;
    load_or_create_settings_at(&path)
}
