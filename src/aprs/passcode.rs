//! APRS-IS login passcode.
//!
//! APRS-IS servers only accept packets from a client whose login line carries
//! the passcode matching its callsign. The passcode is a 15-bit hash of the
//! base callsign (SSID removed, uppercased), so `N0CALL`, `n0call` and
//! `N0CALL-9` all share one passcode.
//!
//! # Example
//!
//! ```
//! use aprs_beacon::aprs::passcode::{compute_passcode, verify_passcode};
//!
//! let code = compute_passcode("N0CALL");
//! assert_eq!(code, compute_passcode("n0call-9"));
//! assert!(verify_passcode("N0CALL-9", &code.to_string()));
//! assert!(!verify_passcode("N0CALL", "not-a-number"));
//! ```

/// Initial accumulator value of the passcode hash.
pub const PASSCODE_SEED: u32 = 0x73E2;

/// Mask keeping the low 15 bits of the accumulator.
const PASSCODE_MASK: u32 = 0x7FFF;

/// Strip the `-SSID` suffix and uppercase what remains.
///
/// Returns an empty string for empty input.
pub fn base_callsign(callsign: &str) -> String {
    callsign
        .split('-')
        .next()
        .unwrap_or("")
        .trim()
        .to_uppercase()
}

/// Compute the APRS-IS passcode for a callsign.
///
/// Characters at even positions are XORed into the high byte of the
/// accumulator, characters at odd positions into the low byte. The result is
/// always in `0..=32767`.
pub fn compute_passcode(callsign: &str) -> u16 {
    let base = base_callsign(callsign);
    let mut hash = PASSCODE_SEED;

    for (i, ch) in base.chars().enumerate() {
        let code = ch as u32;
        if i % 2 == 0 {
            hash ^= code << 8;
        } else {
            hash ^= code;
        }
    }

    (hash & PASSCODE_MASK) as u16
}

/// Check a passcode typed by the operator against a callsign.
///
/// Returns `false` when `passcode` is not an integer.
pub fn verify_passcode(callsign: &str, passcode: &str) -> bool {
    match passcode.trim().parse::<i64>() {
        Ok(parsed) => parsed == i64::from(compute_passcode(callsign)),
        Err(_) => false,
    }
}
