//! Rate-limit windows for execution-limit conditions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Millis;

const MINUTE_MS: Millis = 60_000;
const HOUR_MS: Millis = 60 * MINUTE_MS;
const DAY_MS: Millis = 24 * HOUR_MS;

/// The window over which an execution limit is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionInterval {
    /// Trailing 60 seconds.
    PerMinute,
    /// Trailing hour.
    PerHour,
    /// Trailing 24 hours.
    PerDay,
    /// Trailing 7 days.
    PerWeek,
    /// Trailing 30 days.
    PerMonth,
    /// Since the tracker was opened (server start).
    PerSession,
    /// Forever; the count never resets.
    Lifetime,
}

impl ExecutionInterval {
    /// Every interval, shortest first.
    pub const ALL: [Self; 7] = [
        Self::PerMinute,
        Self::PerHour,
        Self::PerDay,
        Self::PerWeek,
        Self::PerMonth,
        Self::PerSession,
        Self::Lifetime,
    ];

    /// Length of a fixed trailing window, or `None` for session and lifetime.
    #[must_use]
    pub fn window_millis(self) -> Option<Millis> {
        match self {
            Self::PerMinute => Some(MINUTE_MS),
            Self::PerHour => Some(HOUR_MS),
            Self::PerDay => Some(DAY_MS),
            Self::PerWeek => Some(7 * DAY_MS),
            Self::PerMonth => Some(30 * DAY_MS),
            Self::PerSession | Self::Lifetime => None,
        }
    }

    /// Canonical keyword, as stored in a condition's `text` field.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::PerMinute => "PER_MINUTE",
            Self::PerHour => "PER_HOUR",
            Self::PerDay => "PER_DAY",
            Self::PerWeek => "PER_WEEK",
            Self::PerMonth => "PER_MONTH",
            Self::PerSession => "PER_SESSION",
            Self::Lifetime => "LIFETIME",
        }
    }

    /// Parse a keyword, falling back to `fallback` for anything unrecognised.
    #[must_use]
    pub fn parse_or(text: &str, fallback: Self) -> Self {
        text.parse().unwrap_or(fallback)
    }
}

impl FromStr for ExecutionInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "PER_MINUTE" | "MINUTE" | "MINUTELY" => Ok(Self::PerMinute),
            "PER_HOUR" | "HOUR" | "HOURLY" => Ok(Self::PerHour),
            "PER_DAY" | "DAY" | "DAILY" => Ok(Self::PerDay),
            "PER_WEEK" | "WEEK" | "WEEKLY" => Ok(Self::PerWeek),
            "PER_MONTH" | "MONTH" | "MONTHLY" => Ok(Self::PerMonth),
            "PER_SESSION" | "SESSION" => Ok(Self::PerSession),
            "LIFETIME" | "ONCE" | "FOREVER" => Ok(Self::Lifetime),
            _ => Err(format!("unknown execution interval '{s}'")),
        }
    }
}

impl fmt::Display for ExecutionInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
