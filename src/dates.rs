//! ISO-8601 date revival for JSON payloads.
//!
//! AppDb stores timestamps as plain strings (`"2019-03-04T16:59:25.184+0000"`).
//! This module recognizes those strings inside parsed JSON and turns them into
//! native `chrono` values, either as a [`Revived`] value tree or by rewriting
//! them in place ([`normalize_dates`]) so caller types with `DateTime` fields
//! decode cleanly.
//!
//! Only whole-string matches count: `"2024 report"` stays a string.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat,
};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Format AppDb uses for document and collection timestamps.
pub const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

fn iso8601_regex() -> &'static Regex {
    static ISO8601: OnceLock<Regex> = OnceLock::new();
    ISO8601.get_or_init(|| {
        Regex::new(
            r"^(?P<date>\d{4}-(?:0[1-9]|1[0-2])-(?:[12]\d|0[1-9]|3[01]))(?:[T\s](?P<hm>(?:[01]\d|2[0-3]):[0-5]\d|24:00)(?::(?P<sec>[0-5]\d)(?:[.,](?P<frac>\d+))?)?(?P<tz>[zZ]|[+-](?:[01]\d|2[0-3]):?(?:[0-5]\d)?)?)?$",
        )
        .expect("ISO-8601 pattern is valid")
    })
}

/// Parse a string that is entirely an ISO-8601 date or date-time.
///
/// Date-only values and date-times without a zone designator are taken as UTC.
/// Returns `None` for anything the pattern rejects or for impossible calendar
/// dates such as `2023-02-30`.
pub fn parse_iso8601(s: &str) -> Option<DateTime<FixedOffset>> {
    let caps = iso8601_regex().captures(s)?;

    let date = NaiveDate::parse_from_str(&caps["date"], "%Y-%m-%d").ok()?;

    let Some(hm) = caps.name("hm") else {
        let utc = FixedOffset::east_opt(0)?;
        return date.and_time(NaiveTime::MIN).and_local_timezone(utc).single();
    };

    let (hours, minutes) = hm.as_str().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = match caps.name("sec") {
        Some(sec) => sec.as_str().parse().ok()?,
        None => 0,
    };
    let nanos = caps.name("frac").map(|f| fraction_to_nanos(f.as_str())).unwrap_or(0);

    // 24:00 is midnight at the end of the day; 24:00:01 does not exist
    let naive = if hours == 24 {
        if seconds != 0 || nanos != 0 {
            return None;
        }
        NaiveDateTime::new(date, NaiveTime::MIN) + Duration::days(1)
    } else {
        NaiveDateTime::new(
            date,
            NaiveTime::from_hms_nano_opt(hours, minutes, seconds, nanos)?,
        )
    };

    let offset = match caps.name("tz") {
        Some(tz) => parse_offset(tz.as_str())?,
        None => FixedOffset::east_opt(0)?,
    };

    naive.and_local_timezone(offset).single()
}

fn fraction_to_nanos(frac: &str) -> u32 {
    let digits: String = frac.chars().take(9).collect();
    let padded = format!("{:0<9}", digits);
    padded.parse().unwrap_or(0)
}

fn parse_offset(tz: &str) -> Option<FixedOffset> {
    if tz.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let sign = if tz.starts_with('-') { -1 } else { 1 };
    let digits: String = tz[1..].chars().filter(|c| c.is_ascii_digit()).collect();
    let hours: i32 = digits.get(0..2)?.parse().ok()?;
    let minutes: i32 = match digits.get(2..4) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// A JSON value in which ISO-8601 strings have been revived into dates.
#[derive(Debug, Clone, PartialEq)]
pub enum Revived {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Date(DateTime<FixedOffset>),
    Array(Vec<Revived>),
    Object(BTreeMap<String, Revived>),
}

impl Revived {
    pub fn as_date(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Revived::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Revived::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a field when this value is an object.
    pub fn get(&self, key: &str) -> Option<&Revived> {
        match self {
            Revived::Object(map) => map.get(key),
            _ => None,
        }
    }
}

/// Convert a parsed JSON tree, reviving every ISO-8601 string it contains.
pub fn revive(value: Value) -> Revived {
    match value {
        Value::Null => Revived::Null,
        Value::Bool(b) => Revived::Bool(b),
        Value::Number(n) => Revived::Number(n),
        Value::String(s) => match parse_iso8601(&s) {
            Some(date) => Revived::Date(date),
            None => Revived::String(s),
        },
        Value::Array(items) => Revived::Array(items.into_iter().map(revive).collect()),
        Value::Object(map) => {
            Revived::Object(map.into_iter().map(|(k, v)| (k, revive(v))).collect())
        }
    }
}

/// Parse JSON text with date revival.
pub fn parse_revived(text: &str) -> Result<Revived, serde_json::Error> {
    serde_json::from_str::<Value>(text).map(revive)
}

impl<'de> Deserialize<'de> for Revived {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(revive)
    }
}

impl Serialize for Revived {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Revived::Null => serializer.serialize_unit(),
            Revived::Bool(b) => serializer.serialize_bool(*b),
            Revived::Number(n) => n.serialize(serializer),
            Revived::String(s) => serializer.serialize_str(s),
            Revived::Date(d) => {
                serializer.serialize_str(&d.format(STORE_TIMESTAMP_FORMAT).to_string())
            }
            Revived::Array(items) => items.serialize(serializer),
            Revived::Object(map) => map.serialize(serializer),
        }
    }
}

/// Rewrite ISO-8601 date-time strings in place as RFC 3339.
///
/// After this pass `chrono::DateTime` fields deserialize from values such as
/// `"2024-03-04T18:47:12.327+0000"` that chrono would otherwise reject.
/// Date-only strings are left untouched so `NaiveDate` fields keep working.
pub fn normalize_dates(value: &mut Value) {
    match value {
        Value::String(s) => {
            if !is_date_only(s) {
                if let Some(date) = parse_iso8601(s) {
                    *s = date.to_rfc3339_opts(SecondsFormat::AutoSi, false);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_dates),
        Value::Object(map) => map.values_mut().for_each(normalize_dates),
        _ => {}
    }
}

fn is_date_only(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Serde adapter for optional AppDb timestamps (`createdOn`, `lastSync`, ...).
pub mod optional_timestamp {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<FixedOffset>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_str(&d.format(STORE_TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) => parse_iso8601(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s))),
            None => Ok(None),
        }
    }
}
