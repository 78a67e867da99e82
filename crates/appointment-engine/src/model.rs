//! Value types shared by the normalizer, policy, conflict checker and edit session.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// An absolute point in time, unambiguous across zones.
pub type Instant = DateTime<Utc>;

/// Identifier of a persisted appointment.
pub type AppointmentId = i64;

// ── WallClock ───────────────────────────────────────────────────────────────

/// A calendar date and time-of-day with no zone attached.
///
/// This is what a user sees in a date picker and a time selector. It only
/// becomes an [`Instant`] once paired with a zone via
/// [`crate::normalizer::to_instant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WallClock {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl WallClock {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    pub fn from_naive(naive: NaiveDateTime) -> Self {
        Self {
            date: naive.date(),
            time: naive.time(),
        }
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Parse `YYYY-MM-DDTHH:MM` (seconds optional, `T` or a space as separator).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDatetime`] when no accepted format matches.
    pub fn parse(s: &str) -> Result<Self> {
        const FORMATS: [&str; 4] = [
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%Y-%m-%d %H:%M:%S",
        ];
        let trimmed = s.trim();
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            .map(Self::from_naive)
            .ok_or_else(|| EngineError::InvalidDatetime(format!("'{s}'")))
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.naive().format("%Y-%m-%d %H:%M"))
    }
}

// ── Interval ────────────────────────────────────────────────────────────────

/// Half-open interval `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: Instant,
    end: Instant,
}

#[derive(Deserialize)]
struct RawInterval {
    start: Instant,
    end: Instant,
}

impl TryFrom<RawInterval> for Interval {
    type Error = EngineError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Interval::new(raw.start, raw.end)
    }
}

impl Interval {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInterval`] unless `start < end`.
    pub fn new(start: Instant, end: Instant) -> Result<Self> {
        if start >= end {
            return Err(EngineError::InvalidInterval(format!(
                "start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn end(&self) -> Instant {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Two intervals overlap iff `a.start < b.end && a.end > b.start`.
    ///
    /// Adjacent intervals (one ends exactly when the other starts) do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

// ── Appointments ────────────────────────────────────────────────────────────

/// Identifying details of an existing appointment, enough to explain a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRef {
    pub id: AppointmentId,
    pub interval: Interval,
    pub label: String,
}

/// A persisted appointment as the store keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(flatten)]
    pub interval: Interval,
    #[serde(default)]
    pub customer_id: i64,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub contact_id: i64,
}

impl Appointment {
    pub fn to_ref(&self) -> AppointmentRef {
        AppointmentRef {
            id: self.id,
            interval: self.interval,
            label: self.title.clone(),
        }
    }
}
