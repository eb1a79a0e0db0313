//! Week boundary settings.

use std::str::FromStr;

use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{TIMEZONE_ENV, WEEK_START_ENV};
use crate::errors::{Error, Result};

/// First day of the tracking week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

impl FromStr for WeekStart {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            other => Err(Error::InvalidConfigValue(format!(
                "{}: unsupported week start '{}'",
                WEEK_START_ENV, other
            ))),
        }
    }
}

/// How "this week" is bounded: which day it starts on and in which timezone
/// calendar days are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekSettings {
    pub week_start: WeekStart,
    pub timezone: Tz,
}

impl Default for WeekSettings {
    fn default() -> Self {
        Self {
            week_start: WeekStart::default(),
            timezone: chrono_tz::UTC,
        }
    }
}

impl WeekSettings {
    pub fn new(week_start: WeekStart, timezone: Tz) -> Self {
        Self {
            week_start,
            timezone,
        }
    }

    /// Reads `HABITUAL_WEEK_START` and `HABITUAL_TIMEZONE`, falling back to
    /// the defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup(WEEK_START_ENV).filter(|v| !v.trim().is_empty()) {
            settings.week_start = raw.parse()?;
        }

        if let Some(raw) = lookup(TIMEZONE_ENV).filter(|v| !v.trim().is_empty()) {
            settings.timezone = raw.trim().parse::<Tz>().map_err(|e| {
                Error::InvalidConfigValue(format!("{}: '{}' ({})", TIMEZONE_ENV, raw, e))
            })?;
        }

        log::debug!(
            "Week settings: start={:?}, timezone={}",
            settings.week_start,
            settings.timezone
        );
        Ok(settings)
    }
}
