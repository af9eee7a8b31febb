//! `HH:MM:SS` uptime strings.
//!
//! Hours are not wrapped at 24 so a long-running session keeps a
//! monotonically increasing uptime (`25:00:00` rather than `01:00:00`).

use std::time::Duration;

/// Render an elapsed duration as `HH:MM:SS` (sub-second part truncated).
pub fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Parse an `H+:MM:SS` uptime string back into a duration.
///
/// Returns `None` unless there are exactly three numeric fields with minutes
/// and seconds below 60, or if the total does not fit in `u64` seconds.
pub fn parse_uptime(s: &str) -> Option<Duration> {
    let mut parts = s.trim().split(':');
    let hours = parse_field(parts.next()?)?;
    let minutes = parse_field(parts.next()?)?;
    let seconds = parse_field(parts.next()?)?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    let total = hours.checked_mul(3600)?.checked_add(minutes * 60 + seconds)?;
    Some(Duration::from_secs(total))
}

fn parse_field(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
