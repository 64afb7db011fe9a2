//! Time representations exchanged between edit fields, duration labels and
//! the submission API.
//!
//! Three formats live here and must not be mixed up:
//!
//! - `mm:ss.d`: the edit-field codec ([`format`] / [`parse`]). Minutes keep
//!   accumulating past 59, there is no hour component.
//! - `hh:mm:ss`: user-facing duration labels ([`format_duration`]).
//! - `HH:MM:SS.mmm`: clip boundaries sent to the backend ([`format_for_api`]).

mod error;

use std::sync::LazyLock;

use regex::Regex;

pub use error::*;

static EDIT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d+)(?:\.(\d{1,3}))?$").unwrap());

static API_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{2}):(\d{2})\.(\d{3})$").unwrap());

// Absorbs binary representation error so that e.g. 2.3 is not truncated to 2.2.
const TRUNCATE_EPSILON: f64 = 1e-6;

fn non_negative(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// Format seconds as `mm:ss.d`, truncating to one decimal.
pub fn format(seconds: f64) -> String {
    let tenths = (non_negative(seconds) * 10.0 + TRUNCATE_EPSILON).floor() as u64;
    let minutes = tenths / 600;
    let secs = (tenths % 600) / 10;
    let tenth = tenths % 10;
    format!("{minutes:02}:{secs:02}.{tenth}")
}

/// Format seconds as `hh:mm:ss` for duration labels.
pub fn format_duration(seconds: f64) -> String {
    let total = (non_negative(seconds) + TRUNCATE_EPSILON).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Format seconds as `HH:MM:SS.mmm` for the submission API.
pub fn format_for_api(seconds: f64) -> String {
    let total_ms = (non_negative(seconds) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}

/// Parse an edit-field value (`mm:ss`, `mm:ss.d`, `mm:ss.dd` or `mm:ss.ddd`)
/// into seconds.
///
/// One fractional digit is tenths, two are hundredths, three are
/// milliseconds.
pub fn parse(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let invalid = || Error::InvalidTimeFormat(text.to_string());

    let caps = EDIT_FIELD.captures(trimmed).ok_or_else(invalid)?;
    let minutes: u64 = caps[1].parse().map_err(|_| invalid())?;
    let seconds: u64 = caps[2].parse().map_err(|_| invalid())?;
    if seconds >= 60 {
        return Err(Error::InvalidSeconds(seconds));
    }

    let millis = match caps.get(3) {
        Some(fraction) => fraction_to_millis(fraction.as_str()).ok_or_else(invalid)?,
        None => 0,
    };

    Ok(minutes as f64 * 60.0 + seconds as f64 + millis as f64 / 1000.0)
}

fn fraction_to_millis(digits: &str) -> Option<u64> {
    let value: u64 = digits.parse().ok()?;
    match digits.len() {
        1 => Some(value * 100),
        2 => Some(value * 10),
        3 => Some(value),
        _ => None,
    }
}

/// Inverse of [`format_for_api`], used when reloading persisted submissions.
pub fn parse_api(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let invalid = || Error::InvalidTimeFormat(text.to_string());

    let caps = API_TIME.captures(trimmed).ok_or_else(invalid)?;
    let hours: u64 = caps[1].parse().map_err(|_| invalid())?;
    let minutes: u64 = caps[2].parse().map_err(|_| invalid())?;
    let seconds: u64 = caps[3].parse().map_err(|_| invalid())?;
    let millis: u64 = caps[4].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    if seconds >= 60 {
        return Err(Error::InvalidSeconds(seconds));
    }

    Ok((hours * 3600 + minutes * 60 + seconds) as f64 + millis as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_edit_field() {
        insta::assert_snapshot!(format(0.0), @"00:00.0");
        insta::assert_snapshot!(format(75.25), @"01:15.2");
        insta::assert_snapshot!(format(2.3), @"00:02.3");
        insta::assert_snapshot!(format(59.99), @"00:59.9");
        insta::assert_snapshot!(format(3725.5), @"62:05.5");
    }

    #[test]
    fn format_clamps_negative_and_nan() {
        assert_eq!(format(-3.0), "00:00.0");
        assert_eq!(format(f64::NAN), "00:00.0");
    }

    #[test]
    fn format_duration_is_hour_aware() {
        insta::assert_snapshot!(format_duration(59.9), @"00:00:59");
        insta::assert_snapshot!(format_duration(3725.5), @"01:02:05");
        insta::assert_snapshot!(format_duration(86_399.0), @"23:59:59");
    }

    #[test]
    fn format_for_api_has_millis() {
        insta::assert_snapshot!(format_for_api(0.0), @"00:00:00.000");
        insta::assert_snapshot!(format_for_api(1.5), @"00:00:01.500");
        insta::assert_snapshot!(format_for_api(3725.042), @"01:02:05.042");
    }

    #[test]
    fn parse_fraction_digits() {
        assert_eq!(parse("01:15").unwrap(), 75.0);
        assert_eq!(parse("01:15.2").unwrap(), 75.2);
        assert_eq!(parse("01:15.25").unwrap(), 75.25);
        assert_eq!(parse("01:15.250").unwrap(), 75.25);
        assert_eq!(parse("1:05.007").unwrap(), 65.007);
        assert_eq!(parse(" 00:03.4 ").unwrap(), 3.4);
    }

    #[test]
    fn parse_minutes_past_an_hour() {
        assert_eq!(parse("62:05.5").unwrap(), 3725.5);
    }

    #[test]
    fn parse_rejects_seconds_overflow() {
        assert_eq!(parse("1:75"), Err(Error::InvalidSeconds(75)));
        assert_eq!(parse("00:60.0"), Err(Error::InvalidSeconds(60)));
    }

    #[test]
    fn parse_rejects_malformed() {
        for input in ["abc", "", "12", "1:2:3", "01:15.", "01:15.1234", "-1:00", "01:1a"] {
            assert!(
                matches!(parse(input), Err(Error::InvalidTimeFormat(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_api_inverts_format_for_api() {
        assert_eq!(parse_api("01:02:05.042").unwrap(), 3725.042);
        assert!(matches!(parse_api("01:75:05.042"), Err(Error::InvalidTimeFormat(_))));
        assert_eq!(parse_api("00:00:61.000"), Err(Error::InvalidSeconds(61)));
    }

    #[quickcheck_macros::quickcheck]
    fn prop_edit_field_round_trip(tenths: u32) -> bool {
        let seconds = (tenths % 1_000_000) as f64 / 10.0;
        let parsed = parse(&format(seconds)).unwrap();
        (parsed - seconds).abs() < 0.1
    }

    #[quickcheck_macros::quickcheck]
    fn prop_api_round_trip(millis: u32) -> bool {
        let seconds = millis as f64 / 1000.0;
        let parsed = parse_api(&format_for_api(seconds)).unwrap();
        (parsed - seconds).abs() < 0.0005
    }
}
