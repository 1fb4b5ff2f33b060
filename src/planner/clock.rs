//! Wall clock abstraction.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Error, Result};

/// Source of the current local date and time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Current time as "HH:MM".
    fn hhmm(&self) -> String {
        self.now().format("%H:%M").to_string()
    }
}

/// The system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Parse a pinned instant.
    ///
    /// Accepts `YYYY-MM-DDTHH:MM[:SS]`, `YYYY-MM-DD HH:MM[:SS]`,
    /// `YYYY-MM-DD` (midnight) or `HH:MM` (today).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the input matches none of these.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(at) = NaiveDateTime::parse_from_str(input, format) {
                return Ok(Self(at));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            return Ok(Self(date.and_time(NaiveTime::MIN)));
        }
        if let Ok(time) = NaiveTime::parse_from_str(input, "%H:%M") {
            return Ok(Self(Local::now().date_naive().and_time(time)));
        }
        Err(Error::InvalidArgument(format!(
            "Invalid time '{input}': expected YYYY-MM-DDTHH:MM, YYYY-MM-DD or HH:MM"
        )))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        let at = FixedClock::parse("2024-05-20T09:30").unwrap();
        assert_eq!(at.today().to_string(), "2024-05-20");
        assert_eq!(at.hhmm(), "09:30");

        let spaced = FixedClock::parse("2024-05-20 09:30:15").unwrap();
        assert_eq!(spaced.hhmm(), "09:30");

        let midnight = FixedClock::parse("2024-05-20").unwrap();
        assert_eq!(midnight.hhmm(), "00:00");

        let time_only = FixedClock::parse("14:05").unwrap();
        assert_eq!(time_only.hhmm(), "14:05");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(FixedClock::parse("yesterday"), Err(Error::InvalidArgument(_))));
    }
}
