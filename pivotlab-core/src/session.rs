//! Trading-session calendar.
//!
//! Every day boundary and time-of-day filter goes through a [`SessionClock`],
//! so the same candles give the same trading dates regardless of the offset
//! their timestamps were recorded with.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("unknown session timezone '{name}': {reason}")]
    UnknownTimezone { name: String, reason: String },
}

/// Maps timestamps onto the exchange's local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    tz: Tz,
}

impl SessionClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build a clock from an IANA timezone name such as `Asia/Kolkata`.
    pub fn from_name(name: &str) -> Result<Self, SessionError> {
        let tz = name
            .parse::<Tz>()
            .map_err(|e| SessionError::UnknownTimezone {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { tz })
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn local(&self, ts: &DateTime<FixedOffset>) -> DateTime<Tz> {
        ts.with_timezone(&self.tz)
    }

    /// Calendar date of `ts` in session-local time.
    pub fn trading_date(&self, ts: &DateTime<FixedOffset>) -> NaiveDate {
        self.local(ts).date_naive()
    }

    /// Session-local wall time truncated to the minute.
    pub fn time_of_day(&self, ts: &DateTime<FixedOffset>) -> NaiveTime {
        let t = self.local(ts).time();
        NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
    }

    /// Resolve a session-local date and time to a fixed-offset timestamp.
    ///
    /// Returns `None` for wall times that do not exist in the session zone.
    pub fn at(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<FixedOffset>> {
        self.tz
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|dt| dt.fixed_offset())
    }
}

impl Default for SessionClock {
    /// NSE session calendar (`Asia/Kolkata`).
    fn default() -> Self {
        Self {
            tz: chrono_tz::Asia::Kolkata,
        }
    }
}
