use anyhow::{anyhow, bail, Context, Result};
use chrono::DateTime;

/// Returns the current Unix timestamp in milliseconds.
pub fn current_unix_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Returns the current Unix timestamp in seconds.
pub fn current_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Parses a Slack message timestamp (`"<seconds>.<micros>"`) into whole seconds.
pub fn parse_slack_timestamp_seconds(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    let seconds = trimmed.split('.').next().unwrap_or_default();
    if seconds.is_empty() {
        bail!("slack timestamp '{}' has no seconds component", raw);
    }
    seconds
        .parse::<i64>()
        .with_context(|| format!("invalid slack timestamp '{}'", raw))
}

/// Formats Unix seconds as an RFC 1123 date in UTC, e.g. `Thu, 01 Jan 1970 00:01:40 GMT`.
pub fn format_rfc1123_utc(unix_seconds: i64) -> Result<String> {
    let date = DateTime::from_timestamp(unix_seconds, 0)
        .ok_or_else(|| anyhow!("timestamp {} is out of range", unix_seconds))?;
    Ok(date.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
}
