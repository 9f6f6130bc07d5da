//! Numeric formatting for report fields
//!
//! Durations arrive in seconds. The `_as_millis` variants scale by 1000 first.

/// Format seconds with four decimals (`1.2345`)
pub fn format_seconds(secs: f64) -> String {
    format!("{:4.4}", secs)
}

/// Format seconds as whole milliseconds, right-aligned to a width of 4
///
/// Halves round away from zero, so `1.2345` becomes `1235`.
pub fn format_seconds_as_millis(secs: f64) -> String {
    format!("{:4.0}", (secs * 1000.0).round())
}

/// Format an integer without separators
pub fn format_int(value: i64) -> String {
    value.to_string()
}

/// Scale an integer by 1000 and format it without separators
///
/// Only meaningful for integers that hold whole seconds.
pub fn format_int_as_millis(value: i64) -> String {
    value.saturating_mul(1000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(1.2345), "1.2345");
        assert_eq!(format_seconds(0.5), "0.5000");
        assert_eq!(format_seconds(12.3456789), "12.3457");
        assert_eq!(format_seconds(0.0), "0.0000");
    }

    #[test]
    fn test_format_seconds_as_millis_rounding() {
        assert_eq!(format_seconds_as_millis(1.2344), "1234");
        assert_eq!(format_seconds_as_millis(1.2345), "1235");
        assert_eq!(format_seconds_as_millis(0.0125), "  13");
    }

    #[test]
    fn test_format_seconds_as_millis_padding() {
        assert_eq!(format_seconds_as_millis(0.005), "   5");
        assert_eq!(format_seconds_as_millis(0.0), "   0");
        assert_eq!(format_seconds_as_millis(12.5), "12500");
    }

    #[test]
    fn test_format_int() {
        assert_eq!(format_int(200), "200");
        assert_eq!(format_int(-7), "-7");
        assert_eq!(format_int(1234567), "1234567");
    }

    #[test]
    fn test_format_int_as_millis() {
        assert_eq!(format_int_as_millis(3), "3000");
        assert_eq!(format_int_as_millis(0), "0");
        assert_eq!(format_int_as_millis(i64::MAX), i64::MAX.to_string());
    }
}
