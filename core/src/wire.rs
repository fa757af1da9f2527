//! POEditor response envelope and lenient field decoders.
//!
//! Every reply carries a `response` object with `status`, `code` and
//! `message`; successful replies add a `result` object. Field encodings are
//! loose on the platform side: ids and counts arrive as numbers or strings,
//! flags as booleans, `0`/`1` or `"0"`/`"1"`, and absent timestamps as
//! empty strings.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{ApiError, Result};

pub(crate) const SUCCESS: &str = "success";

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub response: Option<Status>,
    #[serde(default)]
    pub result: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Status {
    /// Absent on some successful replies; only a present, non-success
    /// value marks a failure.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl Envelope {
    /// Decode `result.<key>` into `T`.
    pub fn take<T: DeserializeOwned>(&mut self, key: &str) -> Result<T> {
        let value = self
            .result
            .as_mut()
            .and_then(|result| result.get_mut(key))
            .map(Value::take)
            .ok_or_else(|| ApiError::Deserialization(format!("\"result.{key}\" is missing")))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Like `take`, but a missing or null key yields `T::default()`.
    pub fn take_or_default<T: DeserializeOwned + Default>(&mut self, key: &str) -> Result<T> {
        match self.result.as_mut().and_then(|result| result.get_mut(key)) {
            Some(Value::Null) | None => Ok(T::default()),
            Some(value) => Ok(serde_json::from_value(value.take())?),
        }
    }
}

/// Accept a string or a number, keeping its textual form.
pub(crate) fn text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected string or number, got {other}"))),
    }
}

pub(crate) fn u64_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("expected unsigned integer, got {n}"))),
        Value::String(s) if s.is_empty() => Ok(0),
        Value::String(s) => s.parse().map_err(de::Error::custom),
        Value::Null => Ok(0),
        other => Err(de::Error::custom(format!("expected unsigned integer, got {other}"))),
    }
}

pub(crate) fn f64_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom(format!("expected number, got {n}"))),
        Value::String(s) if s.is_empty() => Ok(0.0),
        Value::String(s) => s.parse().map_err(de::Error::custom),
        Value::Null => Ok(0.0),
        other => Err(de::Error::custom(format!("expected number, got {other}"))),
    }
}

pub(crate) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        Value::String(s) => Ok(!(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))),
        Value::Null => Ok(false),
        other => Err(de::Error::custom(format!("expected flag, got {other}"))),
    }
}

/// Flags go out as `0`/`1`, the platform's own encoding.
pub(crate) fn flag_as_int<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

pub(crate) fn empty_as_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

pub(crate) fn timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<FixedOffset>>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s).map(Some).map_err(de::Error::custom),
    }
}

/// Parse `2013-06-10T11:08:54+0000`, RFC 3339, or the older naive
/// `2013-06-10 11:08:54` form (taken as UTC).
pub fn parse_timestamp(s: &str) -> std::result::Result<DateTime<FixedOffset>, String> {
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|_| format!("unrecognized timestamp {s:?}"))
}

/// JSON-encode a list parameter. Lists of terms, tags and filters all travel
/// as JSON strings inside the form.
pub(crate) fn json_param<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}
