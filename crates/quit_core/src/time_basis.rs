use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

const OFFSET_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Quit timestamp as it arrives from a profile source: either text or epoch millis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    pub fn parse(&self) -> EngineResult<DateTime<Utc>> {
        match self {
            RawTimestamp::Millis(millis) => from_epoch_millis(*millis)
                .ok_or_else(|| EngineError::invalid_timestamp(self.to_string())),
            RawTimestamp::Text(text) => parse_timestamp(text),
        }
    }
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTimestamp::Millis(millis) => write!(f, "{millis}"),
            RawTimestamp::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for RawTimestamp {
    fn from(value: &str) -> Self {
        RawTimestamp::Text(value.to_string())
    }
}

impl From<i64> for RawTimestamp {
    fn from(value: i64) -> Self {
        RawTimestamp::Millis(value)
    }
}

/// Where a resolved quit instant came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InstantOrigin {
    Provided,
    /// No quit date configured; "now" was used.
    Missing,
    /// The configured value could not be parsed; "now" was used.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedInstant {
    pub instant: DateTime<Utc>,
    pub origin: InstantOrigin,
}

impl ResolvedInstant {
    pub fn fell_back(&self) -> bool {
        self.origin != InstantOrigin::Provided
    }
}

/// Whole days, hours and minutes elapsed since the quit instant.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElapsedBreakdown {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
}

/// Source of "now". Production code uses [`SystemClock`]; tests pin time with [`FixedClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Resolves the quit instant. An absent value means "quit now".
pub fn resolve_quit_instant(
    raw: Option<&RawTimestamp>,
    now: DateTime<Utc>,
) -> EngineResult<DateTime<Utc>> {
    match raw {
        None => Ok(now),
        Some(raw) => raw.parse(),
    }
}

/// Like [`resolve_quit_instant`] but never fails: unparseable input degrades to `now`
/// and is logged.
pub fn resolve_quit_instant_or_now(
    raw: Option<&RawTimestamp>,
    now: DateTime<Utc>,
) -> ResolvedInstant {
    match raw {
        None => ResolvedInstant {
            instant: now,
            origin: InstantOrigin::Missing,
        },
        Some(value) => match value.parse() {
            Ok(instant) => ResolvedInstant {
                instant,
                origin: InstantOrigin::Provided,
            },
            Err(err) => {
                tracing::warn!(raw = %value, %err, "quit timestamp unusable, falling back to now");
                ResolvedInstant {
                    instant: now,
                    origin: InstantOrigin::Invalid,
                }
            }
        },
    }
}

/// Parses ISO-8601 text (with or without offset, seconds optional, or date only)
/// and falls back to integer epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> EngineResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::invalid_timestamp(raw));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let zoned = match trimmed.strip_suffix(['Z', 'z']) {
        Some(stem) => format!("{stem}+00:00"),
        None => trimmed.to_string(),
    };
    for format in OFFSET_DATE_TIME_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(&zoned, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }
    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }
    trimmed
        .parse::<i64>()
        .ok()
        .and_then(from_epoch_millis)
        .ok_or_else(|| EngineError::invalid_timestamp(raw))
}

pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// `max(0, floor((now - instant) / 1 day))`.
pub fn days_since(instant: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let days = (now - instant).num_days();
    if days <= 0 {
        0
    } else {
        u32::try_from(days).unwrap_or(u32::MAX)
    }
}

pub fn elapsed_breakdown(instant: DateTime<Utc>, now: DateTime<Utc>) -> ElapsedBreakdown {
    let total_minutes = (now - instant).num_minutes();
    if total_minutes <= 0 {
        return ElapsedBreakdown::default();
    }
    let days = total_minutes / (24 * 60);
    let remainder = total_minutes % (24 * 60);
    ElapsedBreakdown {
        days: u32::try_from(days).unwrap_or(u32::MAX),
        hours: (remainder / 60) as u32,
        minutes: (remainder % 60) as u32,
    }
}

/// Calendar date of `instant` as seen at the given UTC offset.
pub fn local_date(instant: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    instant.with_timezone(offset).date_naive()
}
