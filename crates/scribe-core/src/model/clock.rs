use chrono::{DateTime, FixedOffset, TimeZone};

use crate::error::CoreError;

/// Strictly increasing session clock used for commit dates.
///
/// Commits made during one run would otherwise share a wall-clock second,
/// and `git log --graph --all` orders such commits differently from run to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalClock {
    now: i64,
    step: i64,
    offset: FixedOffset,
}

impl LogicalClock {
    pub fn new(start: i64, step: i64, utc_offset_minutes: i32) -> Result<Self, CoreError> {
        if step <= 0 {
            return Err(CoreError::Config(format!(
                "Clock step must be positive, got {step}"
            )));
        }
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).ok_or_else(|| {
            CoreError::Config(format!("Invalid UTC offset: {utc_offset_minutes} minutes"))
        })?;
        Ok(Self {
            now: start,
            step,
            offset,
        })
    }

    /// Advance by one step and return the new time in seconds since the epoch.
    pub fn tick(&mut self) -> i64 {
        self.now += self.step;
        self.now
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        self.offset.timestamp_opt(self.now, 0).single()
    }

    /// Current time in git's internal date format, e.g. `1622133507 +0200`.
    pub fn git_date(&self) -> String {
        match self.as_datetime() {
            Some(dt) => dt.format("%s %z").to_string(),
            None => format!("{} +0000", self.now),
        }
    }

    /// Current time as a libgit2 signature time.
    pub fn git_time(&self) -> git2::Time {
        git2::Time::new(self.now, self.offset_minutes())
    }
}
