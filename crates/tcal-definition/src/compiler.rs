//! Definition compiler: turns a rule set into a lazily generated
//! [`CalendarPartition`].
//!
//! Day layout for one local date `[midnight, next midnight)`:
//! - holiday: a single `HOLIDAY` session;
//! - non-trading weekday: a single `NO_TRADING` session;
//! - otherwise the configured windows, with `NO_TRADING` before the first
//!   and after the last and `CLOSED` in gaps between windows.
//!
//! Local dates whose midnight coincides with the next date's midnight
//! (dates skipped entirely by a zone transition) produce no day.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;
use tcal_core::codec::{self, END_YEAR_MONTH_DAY, MIN_YEAR_MONTH_DAY};
use tcal_core::{
    CalendarPartition, Day, DayGenerator, PartitionInfo, ScheduleError, Session, SessionKind,
    TimeRange,
};

use crate::defaults::DefaultsData;
use crate::rules::{RuleSet, Window};

/// Produces a partition from a definition string and the active defaults.
pub trait ScheduleCompiler: Send + Sync {
    /// `generation` is recorded on the partition when the definition
    /// consulted `defaults`.
    fn compile(
        &self,
        definition: &str,
        defaults: &DefaultsData,
        generation: u64,
    ) -> Result<CalendarPartition, ScheduleError>;
}

/// Compiler for the `key=value` rule grammar (see [`crate::rules`]).
#[derive(Clone, Copy, Debug, Default)]
pub struct RuleCompiler;

impl ScheduleCompiler for RuleCompiler {
    fn compile(
        &self,
        definition: &str,
        defaults: &DefaultsData,
        generation: u64,
    ) -> Result<CalendarPartition, ScheduleError> {
        let resolved = defaults.resolve(definition)?;
        let rules = resolved.rules;
        let tz = codec::parse_time_zone(&rules.time_zone)?;

        let info = PartitionInfo {
            name: rules.name.clone().unwrap_or(resolved.fallback_name),
            time_zone_id: tz.name().to_string(),
            time_zone_display_name: display_name(&tz),
            defaults_generation: resolved.uses_defaults.then_some(generation),
        };
        let generator = RuleDays {
            holidays: defaults.holiday_dates(&rules.holiday_lists)?,
            short_days: defaults.short_day_dates(&rules.short_day_lists)?,
            time_zone_id: Arc::from(tz.name()),
            tz,
            rules,
        };
        tracing::debug!(
            schedule = %info.name,
            tz = %info.time_zone_id,
            generation = ?info.defaults_generation,
            "compiled schedule definition"
        );
        CalendarPartition::generated(info, Box::new(generator))
    }
}

/// `"America/New_York (UTC-05:00)"`, using the offset in force on 2000-01-01.
fn display_name(tz: &Tz) -> String {
    let offset = chrono::DateTime::from_timestamp(946_684_800, 0)
        .map(|utc| tz.offset_from_utc_datetime(&utc.naive_utc()).fix())
        .unwrap_or(chrono::Utc.fix());
    format!("{} (UTC{offset})", tz.name())
}

struct RuleDays {
    rules: RuleSet,
    tz: Tz,
    time_zone_id: Arc<str>,
    holidays: BTreeSet<i32>,
    short_days: BTreeSet<i32>,
}

impl DayGenerator for RuleDays {
    fn days_of_year(&self, year: i32) -> Vec<Day> {
        match self.build_year(year) {
            Ok(days) => days,
            Err(err) => {
                tracing::error!(year, error = %err, "failed to generate schedule year");
                Vec::new()
            }
        }
    }
}

impl RuleDays {
    fn build_year(&self, year: i32) -> Result<Vec<Day>, ScheduleError> {
        let out_of_range = || ScheduleError::OutOfRange {
            what: "year",
            value: i64::from(year),
        };
        let first = codec::naive_date_of((year * 10_000 + 1_01).max(MIN_YEAR_MONTH_DAY))
            .ok_or_else(out_of_range)?;
        let last = codec::naive_date_of((year * 10_000 + 12_31).min(END_YEAR_MONTH_DAY - 1))
            .ok_or_else(out_of_range)?;

        let mut days = Vec::with_capacity(366);
        let mut date = first;
        let mut start = self.midnight(date);
        while date <= last {
            let next = date.succ_opt().ok_or_else(out_of_range)?;
            let end = self.midnight(next);
            if end > start {
                days.push(self.build_day(date, TimeRange::new(start, end))?);
                start = end;
            }
            date = next;
        }
        Ok(days)
    }

    fn midnight(&self, date: NaiveDate) -> i64 {
        codec::local_to_epoch_millis(&self.tz, date.and_time(NaiveTime::MIN))
    }

    fn build_day(&self, date: NaiveDate, range: TimeRange) -> Result<Day, ScheduleError> {
        let ymd = codec::pack_year_month_day(date.year(), date.month() as i32, date.day() as i32);
        let day_id = codec::day_id_of(ymd).ok_or(ScheduleError::OutOfRange {
            what: "year-month-day",
            value: i64::from(ymd),
        })?;
        let weekday = date.weekday().num_days_from_monday() as usize;

        let sessions = if self.holidays.contains(&ymd) {
            vec![Session::new(SessionKind::Holiday, range)]
        } else if !self.rules.weekdays[weekday] {
            vec![Session::new(SessionKind::NoTrading, range)]
        } else if self.short_days.contains(&ymd) {
            self.tile(date, range, &self.rules.short_day_windows())
        } else {
            self.tile(date, range, &self.rules.windows())
        };
        Day::new(day_id, ymd, range, sessions, Arc::clone(&self.time_zone_id))
    }

    /// Lay `windows` over `range`, filling the remainder with `NO_TRADING`
    /// at the edges and `CLOSED` between windows.
    fn tile(
        &self,
        date: NaiveDate,
        range: TimeRange,
        windows: &[(SessionKind, Window)],
    ) -> Vec<Session> {
        let mut sessions = Vec::with_capacity(windows.len() * 2 + 1);
        let mut cursor = range.start();
        for &(kind, window) in windows {
            let start = self.instant(date, window.start_min, range).max(cursor);
            let end = self.instant(date, window.end_min, range);
            if end <= start {
                continue;
            }
            if start > cursor {
                let gap = if sessions.is_empty() {
                    SessionKind::NoTrading
                } else {
                    SessionKind::Closed
                };
                sessions.push(Session::new(gap, TimeRange::new(cursor, start)));
            }
            sessions.push(Session::new(kind, TimeRange::new(start, end)));
            cursor = end;
        }
        if cursor < range.end() {
            let tail = TimeRange::new(cursor, range.end());
            sessions.push(Session::new(SessionKind::NoTrading, tail));
        }
        sessions
    }

    /// Local minute-of-day on `date`, clipped to the day's range.
    fn instant(&self, date: NaiveDate, minute: u16, range: TimeRange) -> i64 {
        let local = date.and_time(NaiveTime::MIN) + TimeDelta::minutes(i64::from(minute));
        codec::local_to_epoch_millis(&self.tz, local).clamp(range.start(), range.end())
    }
}
