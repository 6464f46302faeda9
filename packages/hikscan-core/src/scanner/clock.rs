//! Clock drift evaluation.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::fmt;
use thiserror::Error;

/// Largest drift, in whole seconds, still reported as synchronized
pub const SYNC_TOLERANCE_SECS: i64 = 60;

/// Synchronization state of a device clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStatus {
    Synchronized,
    /// Absolute drift in whole seconds, truncated
    Drift(i64),
    DateFormatError,
}

impl fmt::Display for ClockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockStatus::Synchronized => write!(f, "Synchronized"),
            ClockStatus::Drift(secs) => write!(f, "Drift of {}s", secs),
            ClockStatus::DateFormatError => write!(f, "Date Format Error"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("invalid timestamp '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("timestamp '{0}' does not exist in the local timezone")]
    NonexistentLocal(String),
}

/// Classify a device-reported local time against `now`.
///
/// Returns `None` when the device reported no timestamp.
pub fn evaluate(local_time: Option<&str>, now: DateTime<Utc>) -> Option<ClockStatus> {
    let local_time = local_time.map(str::trim).filter(|s| !s.is_empty())?;

    let device_time = match parse_device_time(local_time) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to parse device time: {}", e);
            return Some(ClockStatus::DateFormatError);
        }
    };

    let drift = device_time.signed_duration_since(now).num_seconds().abs();
    if drift <= SYNC_TOLERANCE_SECS {
        Some(ClockStatus::Synchronized)
    } else {
        Some(ClockStatus::Drift(drift))
    }
}

/// Parse an ISO 8601 timestamp into UTC.
///
/// Timestamps without an offset are taken to be in the caller's local timezone.
pub fn parse_device_time(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    let rfc3339_err = match DateTime::parse_from_rfc3339(input) {
        Ok(t) => return Ok(t.with_timezone(&Utc)),
        Err(e) => e,
    };

    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f").map_err(|_| {
        TimestampError::Invalid {
            input: input.to_string(),
            source: rfc3339_err,
        }
    })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| TimestampError::NonexistentLocal(input.to_string()))
}
