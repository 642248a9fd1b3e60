use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

/// Parse a fixed UTC offset such as `+03:30`, `-05:00`, `+0330` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| anyhow!("Invalid UTC offset: {}", raw));
    }

    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        _ => return Err(anyhow!("UTC offset must start with '+' or '-': '{}'", raw)),
    };

    if !rest.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return Err(anyhow!("UTC offset must be digits after the sign: '{}'", raw));
    }

    let (hours_str, minutes_str) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };

    let hours: i32 = hours_str
        .parse()
        .map_err(|_| anyhow!("Invalid hours in UTC offset: '{}'", raw))?;
    let minutes: i32 = minutes_str
        .parse()
        .map_err(|_| anyhow!("Invalid minutes in UTC offset: '{}'", raw))?;

    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(anyhow!("UTC offset out of range: '{}'", raw));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| anyhow!("UTC offset out of range: '{}'", raw))
}

/// Format an offset as `+HH:MM`.
pub fn format_utc_offset(offset: &FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.abs();
    format!("{}{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60)
}

/// Convert a UTC instant into the channel's local time.
pub fn to_local(ts: DateTime<Utc>, offset: &FixedOffset) -> DateTime<FixedOffset> {
    offset.from_utc_datetime(&ts.naive_utc())
}

/// Minute-precision local timestamp, as shown in reports.
pub fn format_local(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Minute-precision UTC timestamp.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M UTC").to_string()
}
