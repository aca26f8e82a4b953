//! Foundational low-level utilities shared across slack-github-issues crates.
//!
//! Provides clock helpers, Slack timestamp parsing and error-text truncation
//! used by the API clients, the middleware and the events gateway.

pub mod text_utils;
pub mod time_utils;

pub use text_utils::truncate_for_error;
pub use time_utils::{
    current_unix_timestamp, current_unix_timestamp_ms, format_rfc1123_utc,
    parse_slack_timestamp_seconds,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_time_utils_round_trip_bounds() {
        let now_s = current_unix_timestamp();
        let now_ms = current_unix_timestamp_ms();
        let now_ms_s = now_ms / 1_000;
        assert!(now_ms_s >= now_s);
        assert!(now_ms_s <= now_s.saturating_add(1));
    }

    #[test]
    fn unit_parse_slack_timestamp_seconds_drops_fractional_part() {
        assert_eq!(parse_slack_timestamp_seconds("100.1").expect("parse"), 100);
        assert_eq!(
            parse_slack_timestamp_seconds("1360782804.083113").expect("parse"),
            1_360_782_804
        );
        assert_eq!(parse_slack_timestamp_seconds(" 42 ").expect("parse"), 42);
    }

    #[test]
    fn regression_parse_slack_timestamp_seconds_rejects_garbage() {
        assert!(parse_slack_timestamp_seconds("").is_err());
        assert!(parse_slack_timestamp_seconds("abc.123").is_err());
        assert!(parse_slack_timestamp_seconds(".5").is_err());
    }

    #[test]
    fn unit_format_rfc1123_utc_matches_http_date_layout() {
        assert_eq!(
            format_rfc1123_utc(100).expect("format"),
            "Thu, 01 Jan 1970 00:01:40 GMT"
        );
        assert_eq!(
            format_rfc1123_utc(1_360_782_804).expect("format"),
            "Wed, 13 Feb 2013 19:13:24 GMT"
        );
    }

    #[test]
    fn regression_truncate_for_error_preserves_unicode_boundaries() {
        let value = "sgi🌲issue";
        assert_eq!(truncate_for_error(value, 20), value);
        assert_eq!(truncate_for_error(value, 4), "sgi🌲...");
        assert_eq!(truncate_for_error(value, 0), "...");
    }
}
