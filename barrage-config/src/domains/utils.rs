//! Durations in settings files
//!
//! A duration is written either as a bare integer in the field's base unit or
//! as an integer with a unit suffix: `250ms`, `30s`, `2m`. Whole values are
//! written back as bare integers, anything finer as `<n>ms`.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Number(u64),
    Text(String),
}

/// Parse `text`, reading a bare number with `bare`
pub fn parse_duration(text: &str, bare: fn(u64) -> Duration) -> Result<Duration, String> {
    let text = text.trim();
    let digits_end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, unit) = text.split_at(digits_end);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("'{}' is not a duration", text))?;

    match unit.trim() {
        "" => Ok(bare(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("'{}' is too long", text)),
        other => Err(format!("unknown unit '{}' in '{}'", other, text)),
    }
}

fn deserialize_with<'de, D>(deserializer: D, bare: fn(u64) -> Duration) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match RawDuration::deserialize(deserializer)? {
        RawDuration::Number(value) => Ok(bare(value)),
        RawDuration::Text(text) => parse_duration(&text, bare).map_err(serde::de::Error::custom),
    }
}

/// Base unit: seconds
pub mod serde_duration {
    use super::*;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if duration.subsec_millis() == 0 {
            serializer.serialize_u64(duration.as_secs())
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        deserialize_with(deserializer, Duration::from_secs)
    }
}

/// Base unit: milliseconds
pub mod serde_duration_millis {
    use super::*;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        deserialize_with(deserializer, Duration::from_millis)
    }
}
