//! Byte sizes written the way people write them in config files.
//!
//! Units are binary (`1KB` is 1024 bytes). Only whole numbers are accepted so
//! that a value written by [`format_size`] parses back to the same count.

use thiserror::Error;

const KB: u64 = 1 << 10;
const MB: u64 = 1 << 20;
const GB: u64 = 1 << 30;

/// Recognised suffixes, longest first so `MB` wins over `M`.
const UNITS: [(&str, u64); 6] = [
    ("GB", GB),
    ("MB", MB),
    ("KB", KB),
    ("G", GB),
    ("M", MB),
    ("K", KB),
];

/// A size string that is not a whole number with an optional unit.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' (expected a whole number with an optional KB, MB or GB unit)")]
pub struct SizeParseError {
    input: String,
}

/// Parse `"512MB"`, `"2 gb"`, `"64k"` or a bare byte count.
///
/// ```
/// use tileloader::config::parse_size;
///
/// assert_eq!(parse_size("64k").unwrap(), 65_536);
/// assert_eq!(parse_size("2 GB").unwrap(), 2 << 30);
/// ```
pub fn parse_size(input: &str) -> Result<u64, SizeParseError> {
    let invalid = || SizeParseError {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();
    let (digits, unit) = UNITS
        .iter()
        .find_map(|(suffix, unit)| upper.strip_suffix(suffix).map(|rest| (rest, *unit)))
        .unwrap_or((upper.as_str(), 1));

    let digits = digits.trim_end();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    digits
        .parse::<u64>()
        .ok()
        .and_then(|count| count.checked_mul(unit))
        .ok_or_else(invalid)
}

/// Largest exact unit for `bytes`, as read back by [`parse_size`].
pub fn format_size(bytes: u64) -> String {
    for (suffix, unit) in &UNITS[..3] {
        if bytes >= *unit && bytes % unit == 0 {
            return format!("{}{}", bytes / unit, suffix);
        }
    }
    bytes.to_string()
}

/// Rounded size for reports, e.g. `1.50 MB`.
pub fn display_size(bytes: u64) -> String {
    match UNITS[..3].iter().find(|(_, unit)| bytes >= *unit) {
        Some((suffix, unit)) => format!("{:.2} {}", bytes as f64 / *unit as f64, suffix),
        None => format!("{} B", bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_are_binary_and_case_insensitive() {
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("3k").unwrap(), 3 * 1024);
        assert_eq!(parse_size("3KB").unwrap(), 3 * 1024);
        assert_eq!(parse_size("128mb").unwrap(), 128 << 20);
        assert_eq!(parse_size(" 10 G ").unwrap(), 10 << 30);
    }

    #[test]
    fn test_rejects_malformed_sizes() {
        for input in ["", "MB", "ten", "1.5GB", "-2MB", "4TB", "1 2MB", "99999999999GB"] {
            assert!(parse_size(input).is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_format_picks_largest_exact_unit() {
        assert_eq!(format_size(0), "0");
        assert_eq!(format_size(1536), "1536");
        assert_eq!(format_size(2048), "2KB");
        assert_eq!(format_size(3 << 20), "3MB");
        assert_eq!(format_size(1 << 30), "1GB");
    }

    #[test]
    fn test_formatted_sizes_parse_back() {
        for bytes in [1, 1023, 4 << 10, 512 << 20, 8 << 30] {
            assert_eq!(parse_size(&format_size(bytes)).unwrap(), bytes);
        }
    }

    #[test]
    fn test_display_rounds_to_two_decimals() {
        assert_eq!(display_size(900), "900 B");
        assert_eq!(display_size(1536), "1.50 KB");
        assert_eq!(display_size(5 << 20), "5.00 MB");
        assert_eq!(display_size(3 << 30), "3.00 GB");
    }
}
