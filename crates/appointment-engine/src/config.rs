//! Engine configuration: zones and business-hour constants.
//!
//! The operator zone is read once at start-up and then treated as constant.
//! Nothing in the engine consults the environment after [`EngineConfig`] has
//! been built.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::normalizer::{parse_timezone, TimeNormalizer, DEFAULT_BUSINESS_ZONE};

/// Overrides the business zone.
pub const BUSINESS_TZ_VAR: &str = "APPT_BUSINESS_TZ";
/// Overrides the operator zone.
pub const OPERATOR_TZ_VAR: &str = "APPT_OPERATOR_TZ";
/// Conventional host zone variable, consulted when [`OPERATOR_TZ_VAR`] is unset.
pub const HOST_TZ_VAR: &str = "TZ";

/// Upper bound for every minute-valued setting: one day.
pub const MAX_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA name of the zone whose clock defines business hours.
    pub business_zone: String,
    /// IANA name of the zone the operator types wall-clock values in.
    pub operator_zone: String,
    /// Earliest business-zone time-of-day an appointment may touch.
    pub open: NaiveTime,
    /// Latest business-zone time-of-day an appointment may touch (inclusive).
    pub close: NaiveTime,
    /// Longest appointment the interactive session accepts.
    pub max_duration_minutes: i64,
    /// Length of the end time derived from a newly picked start time.
    pub default_duration_minutes: i64,
    /// Starts after this business-zone time get the short derived length.
    pub late_start: NaiveTime,
    pub late_duration_minutes: i64,
    /// Spacing of offered start times.
    pub slot_minutes: i64,
    /// How far around "now" an appointment counts as upcoming.
    pub upcoming_window_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            business_zone: DEFAULT_BUSINESS_ZONE.to_string(),
            operator_zone: DEFAULT_BUSINESS_ZONE.to_string(),
            open: hm(8, 0),
            close: hm(22, 0),
            max_duration_minutes: 120,
            default_duration_minutes: 60,
            late_start: hm(21, 0),
            late_duration_minutes: 15,
            slot_minutes: 15,
            upcoming_window_minutes: 15,
        }
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

impl EngineConfig {
    /// Defaults, with zones taken from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimezone`] if an `APPT_*` zone variable
    /// names an unknown zone. An unusable `TZ` only logs a warning.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`EngineConfig::from_env`] but reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup(BUSINESS_TZ_VAR) {
            parse_timezone(&name)?;
            config.business_zone = name.trim().to_string();
        }

        config.operator_zone = match lookup(OPERATOR_TZ_VAR) {
            Some(name) => {
                parse_timezone(&name)?;
                name.trim().to_string()
            }
            None => match lookup(HOST_TZ_VAR) {
                // glibc allows a leading ':' in TZ
                Some(name) => {
                    let name = name.trim().trim_start_matches(':').to_string();
                    if parse_timezone(&name).is_ok() {
                        name
                    } else {
                        warn!(tz = %name, "TZ is not an IANA zone name, using business zone");
                        config.business_zone.clone()
                    }
                }
                None => config.business_zone.clone(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for malformed JSON or inconsistent values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimezone`] or [`EngineError::Config`].
    pub fn validate(&self) -> Result<()> {
        parse_timezone(&self.business_zone)?;
        parse_timezone(&self.operator_zone)?;
        if self.open >= self.close {
            return Err(EngineError::Config(format!(
                "opening time {} must be before closing time {}",
                self.open, self.close
            )));
        }
        for (name, minutes) in [
            ("max_duration_minutes", self.max_duration_minutes),
            ("default_duration_minutes", self.default_duration_minutes),
            ("late_duration_minutes", self.late_duration_minutes),
            ("slot_minutes", self.slot_minutes),
            ("upcoming_window_minutes", self.upcoming_window_minutes),
        ] {
            if !(1..=MAX_MINUTES).contains(&minutes) {
                return Err(EngineError::Config(format!(
                    "{name} must be between 1 and {MAX_MINUTES}, got {minutes}"
                )));
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimezone`] if either zone name is unknown.
    pub fn normalizer(&self) -> Result<TimeNormalizer> {
        TimeNormalizer::from_names(&self.business_zone, &self.operator_zone)
    }
}
