//! Point-in-time and identifier lookups over a [`CalendarPartition`].
//!
//! All lookups are synchronous reads; anything outside the partition bounds
//! (or a search that finds nothing) is `None`.

use crate::codec::{self, END_YEAR_MONTH_DAY, MIN_YEAR_MONTH_DAY};
use crate::{CalendarPartition, Day, Session};

impl CalendarPartition {
    /// Day whose range contains `time`.
    pub fn day_by_time(&self, time: i64) -> Option<&Day> {
        let days = self.window_for_time(time)?;
        let idx = days.partition_point(|d| d.end() <= time);
        days.get(idx).filter(|d| d.contains_time(time))
    }

    /// Day with the given day id (days since 1970-01-01).
    pub fn day_by_id(&self, day_id: i32) -> Option<&Day> {
        let ymd = codec::year_month_day_of(day_id)?;
        let days = self.window_for_year(ymd / 10_000);
        days.binary_search_by_key(&day_id, Day::day_id)
            .ok()
            .map(|idx| &days[idx])
    }

    /// Day with the given YearMonthDay or, when that date has no day in this
    /// schedule, the day with the lowest YearMonthDay greater than it.
    ///
    /// Values that are not real dates (e.g. `20230231`) roll forward the same
    /// way.
    pub fn day_by_year_month_day(&self, year_month_day: i32) -> Option<&Day> {
        if !(MIN_YEAR_MONTH_DAY..END_YEAR_MONTH_DAY).contains(&year_month_day) {
            return None;
        }
        let mut year = year_month_day / 10_000;
        loop {
            let days = self.window_for_year(year);
            let idx = days.partition_point(|d| d.year_month_day() < year_month_day);
            if let Some(day) = days.get(idx) {
                return Some(day);
            }
            year = self.following_year(year)?;
        }
    }

    /// Session containing `time`.
    pub fn session_by_time(&self, time: i64) -> Option<&Session> {
        self.day_by_time(time)?.session_by_time(time)
    }

    /// Day immediately after `day`.
    pub fn next_day(&self, day: &Day) -> Option<&Day> {
        self.day_by_time(day.end())
    }

    /// Day immediately before `day`.
    pub fn prev_day(&self, day: &Day) -> Option<&Day> {
        self.day_by_time(day.start().checked_sub(1)?)
    }
}
