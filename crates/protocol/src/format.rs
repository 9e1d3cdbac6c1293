//! Locale-independent value and timestamp rendering

use chrono::{DateTime, FixedOffset};

use crate::VALUE_PRECISION;

/// `T` line timestamp format (`yyyyMMdd HHmmss`)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d %H%M%S";

/// `T` line timestamp format with a trailing zone offset
pub const TIMESTAMP_FORMAT_WITH_OFFSET: &str = "%Y%m%d %H%M%S %z";

/// Render a sample value for a `D` line
///
/// At most [`VALUE_PRECISION`] fractional digits, trailing zeros trimmed,
/// `.` as decimal separator and no grouping. Non-finite values render as
/// `NaN`, `Inf` and `-Inf`.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }

    let mut s = format!("{:.*}", VALUE_PRECISION, value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s.remove(0);
    }
    s
}

/// Render the sampling time of a category batch for a `T` line
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>, with_offset: bool) -> String {
    let format = if with_offset {
        TIMESTAMP_FORMAT_WITH_OFFSET
    } else {
        TIMESTAMP_FORMAT
    };
    timestamp.format(format).to_string()
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
