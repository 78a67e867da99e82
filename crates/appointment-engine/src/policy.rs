//! Business rules for a candidate appointment interval.
//!
//! Rules are checked in a fixed order and the first failure wins:
//!
//! 1. **Business hours**: both endpoints, read on the business-zone clock,
//!    fall within `[open, close]` (inclusive at both ends).
//! 2. **Future-dated**: both endpoints are at or after the supplied "now".
//! 3. **Duration**: the business-zone wall-clock gap is at most the maximum.
//!    Only the interactive edit session asks for this rule
//!    ([`IntervalPolicy::check_duration`]); [`IntervalPolicy::validate`] never
//!    reports it because the session has already repaired the interval.
//!
//! The policy holds no mutable state; calling it twice on the same input
//! yields the same answer.

use std::fmt;

use chrono::{Duration, NaiveTime};
use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::{Instant, Interval, WallClock};
use crate::normalizer::TimeNormalizer;

/// Outcome of a policy check. Every variant except `Ok` is a rejection the
/// user can fix by changing their input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValidationResult {
    Ok,
    OutsideBusinessHours,
    NotInFuture,
    DurationExceeded,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationResult::Ok)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ValidationResult::Ok => "ok",
            ValidationResult::OutsideBusinessHours => "appointment is outside business hours",
            ValidationResult::NotInFuture => "appointment must be in the future",
            ValidationResult::DurationExceeded => "appointment is longer than the maximum duration",
        };
        f.write_str(msg)
    }
}

/// Lengths used when an end time is derived from a start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditRules {
    pub default_duration: Duration,
    /// Starts after this business-zone time get `late_duration` instead.
    pub late_start: NaiveTime,
    pub late_duration: Duration,
}

impl EditRules {
    /// Expects a config that passed [`EngineConfig::validate`].
    fn from_config(config: &EngineConfig) -> Self {
        Self {
            default_duration: Duration::minutes(config.default_duration_minutes),
            late_start: config.late_start,
            late_duration: Duration::minutes(config.late_duration_minutes),
        }
    }
}

impl Default for EditRules {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    normalizer: TimeNormalizer,
    open: NaiveTime,
    close: NaiveTime,
    max_duration: Duration,
    edit_rules: EditRules,
}

impl IntervalPolicy {
    /// Policy with the stock limits: 08:00–22:00 business time, 120 minutes.
    pub fn new(normalizer: TimeNormalizer) -> Self {
        let defaults = EngineConfig::default();
        Self {
            normalizer,
            open: defaults.open,
            close: defaults.close,
            max_duration: Duration::minutes(defaults.max_duration_minutes),
            edit_rules: EditRules::default(),
        }
    }

    /// # Errors
    ///
    /// Returns [`crate::EngineError::InvalidTimezone`] if the configured zones
    /// are unknown, or [`crate::EngineError::Config`] for out-of-range values.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            normalizer: config.normalizer()?,
            open: config.open,
            close: config.close,
            max_duration: Duration::minutes(config.max_duration_minutes),
            edit_rules: EditRules::from_config(config),
        })
    }

    pub fn normalizer(&self) -> &TimeNormalizer {
        &self.normalizer
    }

    pub fn open(&self) -> NaiveTime {
        self.open
    }

    pub fn close(&self) -> NaiveTime {
        self.close
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Lengths an edit session uses for derived end times.
    pub fn edit_rules(&self) -> EditRules {
        self.edit_rules
    }

    /// Whether `instant`, read on the business-zone clock, is within opening hours.
    pub fn within_business_hours(&self, instant: Instant) -> bool {
        let time = self.normalizer.business_wall(instant).time;
        time >= self.open && time <= self.close
    }

    /// Check a submitted interval against the business-hours and future-dated rules.
    pub fn validate(&self, candidate: &Interval, now: Instant) -> ValidationResult {
        let result = if !self.within_business_hours(candidate.start())
            || !self.within_business_hours(candidate.end())
        {
            ValidationResult::OutsideBusinessHours
        } else if candidate.start() < now || candidate.end() < now {
            ValidationResult::NotInFuture
        } else {
            ValidationResult::Ok
        };
        debug!(%candidate, ?result, "interval validated");
        result
    }

    /// Check the length of an interval given as two business-zone wall-clock values.
    pub fn check_duration(&self, start: WallClock, end: WallClock) -> ValidationResult {
        if wall_clock_minutes(start, end) > self.max_duration.num_minutes() {
            ValidationResult::DurationExceeded
        } else {
            ValidationResult::Ok
        }
    }
}

/// Whole minutes from `start` to `end` on a zone-less clock, truncated toward zero.
pub fn wall_clock_minutes(start: WallClock, end: WallClock) -> i64 {
    (end.naive() - start.naive()).num_minutes()
}
