//! Human-readable durations ("15s", "500ms", "2m", "1h").
//!
//! Used both by the TOML schema (`serde(with = "...")`) and by the CLI
//! `--timeout` flag, so the two accept the same spellings.

use std::time::Duration;

/// Parse a duration string. A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let invalid = || format!("invalid duration: {:?}", s);

    // "ms" must be checked before the single-letter suffixes.
    let (digits, unit_ms) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, 1)
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 1_000)
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 60_000)
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 3_600_000)
    } else {
        (s, 1_000)
    };

    let n: u64 = digits.trim().parse().map_err(|_| invalid())?;
    let millis = n.checked_mul(unit_ms).ok_or_else(invalid)?;
    Ok(Duration::from_millis(millis))
}

/// Render a duration in the shortest exact unit `parse_duration` accepts.
pub fn format_duration(duration: &Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1_000 != 0 {
        format!("{}ms", millis)
    } else {
        format!("{}s", millis / 1_000)
    }
}

pub mod serde_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_duration(duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
