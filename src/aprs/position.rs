//! APRS uncompressed position fields.
//!
//! Latitude is encoded as `DDMM.mmH` (8 characters) and longitude as
//! `DDDMM.mmH` (9 characters), where `H` is the hemisphere letter. Minutes
//! are rounded to two decimals.
//!
//! # Example
//!
//! ```
//! use aprs_beacon::aprs::position::{decode, encode};
//!
//! assert_eq!(encode(41.1234, true), "4107.40N");
//! assert_eq!(encode(-27.5, false), "02730.00W");
//!
//! let lat = decode("4107.40N", true).unwrap();
//! assert!((lat - 41.1234).abs() < 0.001);
//! ```

use std::fmt;

/// Length of an encoded latitude field.
pub const LATITUDE_WIDTH: usize = 8;

/// Length of an encoded longitude field.
pub const LONGITUDE_WIDTH: usize = 9;

/// Width of the `MM.mm` minutes part.
const MINUTES_WIDTH: usize = 5;

/// Encode signed decimal degrees as an APRS position field.
///
/// Zero is treated as north/east. Callers are expected to pass values inside
/// `[-90, 90]` for latitude and `[-180, 180]` for longitude; larger values
/// widen the degrees field.
pub fn encode(value: f64, is_latitude: bool) -> String {
    let direction = match (is_latitude, value >= 0.0) {
        (true, true) => 'N',
        (true, false) => 'S',
        (false, true) => 'E',
        (false, false) => 'W',
    };

    let abs_val = value.abs();
    let mut degrees = abs_val.floor() as u32;
    let minutes = (abs_val - f64::from(degrees)) * 60.0;

    let mut minutes_text = format!("{:05.2}", minutes);
    // 59.995 and up round to "60.00"; carry into degrees instead.
    if minutes_text == "60.00" {
        degrees += 1;
        minutes_text = "00.00".to_string();
    }

    if is_latitude {
        format!("{:02}{}{}", degrees, minutes_text, direction)
    } else {
        format!("{:03}{}{}", degrees, minutes_text, direction)
    }
}

/// Encode a latitude field.
pub fn encode_latitude(value: f64) -> String {
    encode(value, true)
}

/// Encode a longitude field.
pub fn encode_longitude(value: f64) -> String {
    encode(value, false)
}

/// Decode an APRS position field back into signed decimal degrees.
pub fn decode(field: &str, is_latitude: bool) -> Result<f64, PositionError> {
    let expected = if is_latitude {
        LATITUDE_WIDTH
    } else {
        LONGITUDE_WIDTH
    };
    if !field.is_ascii() || field.len() != expected {
        return Err(PositionError::InvalidLength {
            len: field.len(),
            expected,
        });
    }

    let degree_digits = expected - MINUTES_WIDTH - 1;
    let (degrees_text, rest) = field.split_at(degree_digits);
    let (minutes_text, direction_text) = rest.split_at(MINUTES_WIDTH);

    if !degrees_text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PositionError::InvalidDegrees(degrees_text.to_string()));
    }
    let degrees: f64 = degrees_text
        .parse::<u32>()
        .map_err(|_| PositionError::InvalidDegrees(degrees_text.to_string()))?
        .into();

    let minutes_ok = minutes_text
        .bytes()
        .enumerate()
        .all(|(i, b)| if i == 2 { b == b'.' } else { b.is_ascii_digit() });
    if !minutes_ok {
        return Err(PositionError::InvalidMinutes(minutes_text.to_string()));
    }
    let minutes: f64 = minutes_text
        .parse()
        .map_err(|_| PositionError::InvalidMinutes(minutes_text.to_string()))?;
    if minutes >= 60.0 {
        return Err(PositionError::InvalidMinutes(minutes_text.to_string()));
    }

    let sign = match (is_latitude, direction_text) {
        (true, "N") | (false, "E") => 1.0,
        (true, "S") | (false, "W") => -1.0,
        _ => {
            return Err(PositionError::InvalidDirection(
                direction_text.chars().next().unwrap_or('?'),
            ))
        }
    };

    Ok(sign * (degrees + minutes / 60.0))
}

/// Errors from decoding a position field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// Field is not the expected width.
    InvalidLength { len: usize, expected: usize },
    /// Degrees part is not numeric.
    InvalidDegrees(String),
    /// Minutes part is not `MM.mm` below 60.
    InvalidMinutes(String),
    /// Hemisphere letter does not belong to the axis.
    InvalidDirection(char),
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { len, expected } => {
                write!(f, "invalid field length: {} (expected {})", len, expected)
            }
            Self::InvalidDegrees(s) => write!(f, "invalid degrees: {}", s),
            Self::InvalidMinutes(s) => write!(f, "invalid minutes: {}", s),
            Self::InvalidDirection(c) => write!(f, "invalid direction: {}", c),
        }
    }
}

impl std::error::Error for PositionError {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Half a hundredth of a minute of arc, the encoder's rounding step.
    const TOLERANCE_DEG: f64 = 0.008;

    // ==================== Encoding ====================

    #[test]
    fn test_encode_zero_is_north_east() {
        assert_eq!(encode(0.0, true), "0000.00N");
        assert_eq!(encode(0.0, false), "00000.00E");
    }

    #[test]
    fn test_encode_latitude() {
        assert_eq!(encode(41.1234, true), "4107.40N");
        assert_eq!(encode(41.0, true), "4100.00N");
        assert_eq!(encode(-33.8688, true), "3352.13S");
    }

    #[test]
    fn test_encode_longitude() {
        assert_eq!(encode(-27.5, false), "02730.00W");
        assert_eq!(encode(2.3522, false), "00221.13E");
        assert_eq!(encode(151.2093, false), "15112.56E");
    }

    #[test]
    fn test_encode_boundaries() {
        assert_eq!(encode(90.0, true), "9000.00N");
        assert_eq!(encode(-90.0, true), "9000.00S");
        assert_eq!(encode(180.0, false), "18000.00E");
        assert_eq!(encode(-180.0, false), "18000.00W");
    }

    #[test]
    fn test_encode_minutes_carry() {
        assert_eq!(encode(12.99999, true), "1300.00N");
        assert_eq!(encode(-0.99999, false), "00100.00W");
    }

    #[test]
    fn test_encode_fixed_width() {
        for value in [-90.0, -45.25, -0.001, 0.0, 12.5, 89.9999, 90.0] {
            assert_eq!(encode_latitude(value).len(), LATITUDE_WIDTH, "{}", value);
        }
        for value in [-180.0, -99.5, 0.0, 7.25, 179.9999, 180.0] {
            assert_eq!(encode_longitude(value).len(), LONGITUDE_WIDTH, "{}", value);
        }
    }

    // ==================== Decoding ====================

    #[test]
    fn test_decode_examples() {
        assert_eq!(decode("02730.00W", false).unwrap(), -27.5);
        assert_eq!(decode("0000.00N", true).unwrap(), 0.0);
        assert_eq!(decode("9000.00S", true).unwrap(), -90.0);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let mut value = -90.0;
        while value <= 90.0 {
            let decoded = decode(&encode(value, true), true).unwrap();
            assert!((decoded - value).abs() < TOLERANCE_DEG, "lat {}", value);
            value += 7.3217;
        }

        let mut value = -180.0;
        while value <= 180.0 {
            let decoded = decode(&encode(value, false), false).unwrap();
            assert!((decoded - value).abs() < TOLERANCE_DEG, "lon {}", value);
            value += 13.0071;
        }
    }

    #[test]
    fn test_decode_rejects_wrong_width() {
        assert!(matches!(
            decode("4107.40N", false),
            Err(PositionError::InvalidLength { len: 8, expected: 9 })
        ));
        assert!(matches!(
            decode("", true),
            Err(PositionError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_axis_direction() {
        assert_eq!(
            decode("4107.40E", true),
            Err(PositionError::InvalidDirection('E'))
        );
        assert_eq!(
            decode("02730.00N", false),
            Err(PositionError::InvalidDirection('N'))
        );
    }

    #[test]
    fn test_decode_rejects_bad_digits() {
        assert!(matches!(
            decode("4x07.40N", true),
            Err(PositionError::InvalidDegrees(_))
        ));
        assert!(matches!(
            decode("4107,40N", true),
            Err(PositionError::InvalidMinutes(_))
        ));
        assert!(matches!(
            decode("4175.00N", true),
            Err(PositionError::InvalidMinutes(_))
        ));
    }
}
