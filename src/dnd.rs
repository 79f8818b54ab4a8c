//! Do-not-disturb windows.

use crate::error::{NotificationError, Result};
use chrono::{DateTime, Duration, DurationRound, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DoNotDisturbType {
    #[default]
    #[serde(rename = "TYPE_NONE")]
    None,
    #[serde(rename = "TYPE_ONCE")]
    Once,
    #[serde(rename = "TYPE_DAILY")]
    Daily,
    #[serde(rename = "TYPE_CLEARLY")]
    Clearly,
}

impl DoNotDisturbType {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Once => 1,
            Self::Daily => 2,
            Self::Clearly => 3,
        }
    }
}

/// A do-not-disturb window. `begin` and `end` travel as epoch milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoNotDisturbDate {
    #[serde(rename = "type")]
    pub dnd_type: DoNotDisturbType,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub begin: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
}

impl Default for DoNotDisturbDate {
    fn default() -> Self {
        Self::none()
    }
}

impl DoNotDisturbDate {
    pub fn new(dnd_type: DoNotDisturbType, begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            dnd_type,
            begin,
            end,
        }
    }

    /// No window; begin and end sit at the epoch.
    pub fn none() -> Self {
        Self::new(
            DoNotDisturbType::None,
            DateTime::<Utc>::UNIX_EPOCH,
            DateTime::<Utc>::UNIX_EPOCH,
        )
    }

    /// Returns the value the service stores for this date.
    ///
    /// `TYPE_NONE` resets both ends to the epoch. Other types truncate to the
    /// minute; once and clearly windows must then end after they begin.
    pub fn normalize(&self) -> Result<Self> {
        if self.dnd_type == DoNotDisturbType::None {
            return Ok(Self::none());
        }

        let minute = Duration::minutes(1);
        let truncate = |t: DateTime<Utc>| {
            t.duration_trunc(minute)
                .map_err(|e| NotificationError::InvalidParam(format!("invalid dnd time: {}", e)))
        };
        let normalized = Self::new(self.dnd_type, truncate(self.begin)?, truncate(self.end)?);

        match normalized.dnd_type {
            DoNotDisturbType::Once | DoNotDisturbType::Clearly
                if normalized.end <= normalized.begin =>
            {
                Err(NotificationError::InvalidParam(
                    "dnd end must be later than begin".to_string(),
                ))
            }
            _ => Ok(normalized),
        }
    }

    /// Whether notifications published at `now` fall inside the window.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.dnd_type {
            DoNotDisturbType::None => false,
            DoNotDisturbType::Once | DoNotDisturbType::Clearly => {
                self.begin <= now && now < self.end
            }
            DoNotDisturbType::Daily => {
                let begin = self.begin.time();
                let end = self.end.time();
                let at = now.time();
                daily_window_contains(begin, end, at)
            }
        }
    }
}

/// Time-of-day containment for a daily window that may wrap past midnight.
/// An empty window (`begin == end`) contains nothing.
fn daily_window_contains(begin: NaiveTime, end: NaiveTime, at: NaiveTime) -> bool {
    if begin <= end {
        begin <= at && at < end
    } else {
        at >= begin || at < end
    }
}
