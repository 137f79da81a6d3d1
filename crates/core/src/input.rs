//! Lenient field parsing for request payloads.
//!
//! Bodies may be JSON or URL-encoded forms, so numbers can arrive either as
//! JSON numbers or as strings. Blank strings count as absent.

use std::num::ParseFloatError;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// Parse a timestamp written as RFC 3339, `YYYY-MM-DDTHH:MM:SS[.f]` (UTC) or
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse an optional number from a query-string value.
pub fn parse_number(raw: Option<&str>) -> Option<Result<f64, ParseFloatError>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    Some(raw.parse::<f64>())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(f64),
    Text(String),
}

fn blank_to_none(scalar: Option<Scalar>) -> Option<Scalar> {
    match scalar {
        Some(Scalar::Text(s)) if s.trim().is_empty() => None,
        other => other,
    }
}

/// Deserialize an optional string, accepting a bare number as its decimal text.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Number(n) => n.to_string(),
        Scalar::Text(s) => s,
    }))
}

/// Deserialize an optional `f64` from a number or a numeric string.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_to_none(Option::<Scalar>::deserialize(deserializer)?) {
        None => Ok(None),
        Some(Scalar::Number(n)) => Ok(Some(n)),
        Some(Scalar::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid number `{s}`"))),
    }
}

/// Deserialize an optional `i32` from an integral number or numeric string.
pub fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(n) = lenient_f64(deserializer)? else {
        return Ok(None);
    };
    if n.fract() != 0.0 || n < f64::from(i32::MIN) || n > f64::from(i32::MAX) {
        return Err(de::Error::custom(format!("invalid integer `{n}`")));
    }
    Ok(Some(n as i32))
}

/// Deserialize an optional timestamp from a date string or epoch milliseconds.
pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_to_none(Option::<Scalar>::deserialize(deserializer)?) {
        None => Ok(None),
        Some(Scalar::Number(ms)) => DateTime::from_timestamp_millis(ms as i64)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp `{ms}`"))),
        Some(Scalar::Text(s)) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date `{s}`"))),
    }
}
