use chrono::{DateTime, Datelike, TimeZone, Timelike};
use thiserror::Error;

/// Largest magnitude a millisecond timestamp may have (±100,000,000 days).
pub const MAX_EPOCH_MILLIS: i64 = 8_640_000_000_000_000;

const NANOS_PER_MILLI_DIGITS: usize = 6;

/// Why a single `time` cell could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EpochError {
    #[error("value {0:?} is not a valid integer")]
    InvalidInteger(String),
    #[error("value {0:?} does not map to a valid date")]
    OutOfRange(String),
}

/// Nanosecond epoch string → milliseconds, truncating toward zero.
///
/// Accepts an optional sign followed by ASCII digits of any length. The
/// division by 1,000,000 is done on the decimal digits themselves, so very
/// large inputs never pass through a lossy numeric type.
pub fn parse_nanos_to_millis(s: &str) -> Result<i64, EpochError> {
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EpochError::InvalidInteger(s.to_string()));
    }

    let significant = digits.trim_start_matches('0');
    let whole_millis = &significant[..significant.len().saturating_sub(NANOS_PER_MILLI_DIGITS)];
    let magnitude: i64 = if whole_millis.is_empty() {
        0
    } else {
        whole_millis
            .parse()
            .map_err(|_| EpochError::OutOfRange(s.to_string()))?
    };
    if magnitude > MAX_EPOCH_MILLIS {
        return Err(EpochError::OutOfRange(s.to_string()));
    }

    Ok(if negative { -magnitude } else { magnitude })
}

/// Millis since the epoch → date-time in `tz`, if the calendar can hold it.
pub fn millis_to_datetime<Tz: TimeZone>(millis: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    if !(-MAX_EPOCH_MILLIS..=MAX_EPOCH_MILLIS).contains(&millis) {
        return None;
    }
    tz.timestamp_millis_opt(millis).single()
}

/// `YYYY-MM-DD HH:mm:ss.sss`, 24-hour clock.
pub fn format_timestamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    let year = dt.year();
    let year = if year < 0 {
        format!("-{:04}", year.unsigned_abs())
    } else {
        format!("{:04}", year)
    };
    format!(
        "{}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}",
        year,
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.timestamp_subsec_millis() % 1000
    )
}

/// Full cell conversion: nanosecond epoch string → formatted timestamp in `tz`.
pub fn nanos_to_timestamp<Tz: TimeZone>(s: &str, tz: &Tz) -> Result<String, EpochError> {
    let millis = parse_nanos_to_millis(s)?;
    let dt = millis_to_datetime(millis, tz)
        .ok_or_else(|| EpochError::OutOfRange(s.trim().to_string()))?;
    Ok(format_timestamp(&dt))
}
