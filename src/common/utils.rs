//! Utility functions for hellopi

use chrono::{Local, NaiveDateTime, Timelike};

/// Longest accepted submission, in characters, after trimming
pub const MAX_TEXT_LEN: usize = 1000;

/// Storage format for timestamps (second precision, local time)
pub const STORAGE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display format for the listing page
pub const DISPLAY_TIME_FORMAT: &str = "%m/%d/%Y %H:%M";

/// Parse duration string (e.g., "30s", "5m", "1h", "7d")
pub fn parse_duration(s: &str) -> crate::Result<std::time::Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(crate::Error::InvalidConfig("empty duration".into()));
    }

    let (num_str, unit) = if let Some(num) = s.strip_suffix("ms") {
        (num, "ms")
    } else {
        let split = s.len() - s.chars().last().map(char::len_utf8).unwrap_or(0);
        (&s[..split], &s[split..])
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| crate::Error::InvalidConfig(format!("invalid duration: {}", s)))?;

    let secs_per_unit = match unit {
        "ms" => return Ok(std::time::Duration::from_millis(num)),
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => {
            return Err(crate::Error::InvalidConfig(format!(
                "unknown duration unit: {}",
                unit
            )))
        }
    };

    num.checked_mul(secs_per_unit)
        .map(std::time::Duration::from_secs)
        .ok_or_else(|| crate::Error::InvalidConfig("duration out of range".into()))
}

/// Parse a duration string into whole milliseconds
pub fn parse_millis(s: &str) -> crate::Result<u64> {
    let duration = parse_duration(s)?;
    u64::try_from(duration.as_millis())
        .map_err(|_| crate::Error::InvalidConfig("duration out of range".into()))
}

/// Current local time, truncated to whole seconds
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Render a stored timestamp the way the listing shows it
pub fn format_display_time(ts: &NaiveDateTime) -> String {
    ts.format(DISPLAY_TIME_FORMAT).to_string()
}

/// Validate a submission, returning it trimmed.
///
/// Emptiness is checked before length.
pub fn validate_text(text: &str) -> crate::Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(crate::Error::EmptyText);
    }

    if text.chars().count() > MAX_TEXT_LEN {
        return Err(crate::Error::TextTooLong { max: MAX_TEXT_LEN });
    }

    Ok(text)
}

/// Escape text for interpolation into HTML element content or attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
