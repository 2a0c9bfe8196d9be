//! Human-readable round times.

use std::time::Duration;

/// Placeholder shown when there is no time to display.
pub const NO_TIME: &str = "—";

/// Render as whole seconds and truncated centiseconds, e.g. `42.50`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    format!("{}.{:02}", millis / 1000, (millis % 1000) / 10)
}

/// [`format_elapsed`] with a placeholder for missing times.
pub fn format_optional(elapsed: Option<Duration>) -> String {
    elapsed.map(format_elapsed).unwrap_or_else(|| NO_TIME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_seconds_and_centiseconds() {
        assert_eq!(format_elapsed(Duration::from_millis(42_500)), "42.50");
        assert_eq!(format_elapsed(Duration::from_millis(3_079)), "3.07");
        assert_eq!(format_elapsed(Duration::ZERO), "0.00");
        assert_eq!(format_elapsed(Duration::from_millis(125_009)), "125.00");
    }

    #[test]
    fn missing_time_uses_placeholder() {
        assert_eq!(format_optional(None), NO_TIME);
        assert_eq!(format_optional(Some(Duration::from_secs(30))), "30.00");
    }
}
