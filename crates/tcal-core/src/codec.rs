//! YearMonthDay / day-id codec.
//!
//! Deterministic integer arithmetic over the proleptic Gregorian calendar
//! (Howard Hinnant's civil calendar algorithms), plus the time-zone aware
//! conversions between epoch millis and YearMonthDay values.
//!
//! Packing: `YearMonthDay = year * 10000 + month * 100 + day`, so
//! September 28, 1977 is `19770928`. A day id is the number of days between
//! 1970-01-01 and the (local) calendar date.
//!
//! Supported range: 0001-01-02 inclusive to 9999-12-30 exclusive. Anything
//! outside is reported as out of range, never clamped.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;

use crate::ScheduleError;

pub const MS_PER_DAY: i64 = 86_400_000;

/// First supported YearMonthDay (inclusive): 0001-01-02.
pub const MIN_YEAR_MONTH_DAY: i32 = 1_01_02;
/// Upper supported YearMonthDay (exclusive): 9999-12-30.
pub const END_YEAR_MONTH_DAY: i32 = 9999_12_30;

/// Day id of 0001-01-02 (inclusive).
pub const MIN_DAY_ID: i32 = days_from_civil(1, 1, 2) as i32;
/// Day id of 9999-12-30 (exclusive).
pub const END_DAY_ID: i32 = days_from_civil(9999, 12, 30) as i32;

/// One calendar year expressed as a YearMonthDay delta.
pub const YEAR_STEP: i32 = 10_000;

// ---------------------------------------------------------------------------
// Civil calendar arithmetic
// ---------------------------------------------------------------------------

/// Days since 1970-01-01 for a proleptic Gregorian (year, month, day).
pub const fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`days_from_civil`]: (year, month, day) for a day count since 1970-01-01.
pub const fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    let d = doy - (153 * mp + 2) / 5 + 1;
    (y, m, d)
}

pub const fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub const fn days_in_month(year: i64, month: i64) -> i64 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub const fn pack_year_month_day(year: i32, month: i32, day: i32) -> i32 {
    year * 10_000 + month * 100 + day
}

pub const fn unpack_year_month_day(ymd: i32) -> (i32, i32, i32) {
    (ymd / 10_000, (ymd / 100) % 100, ymd % 100)
}

/// True when `ymd` decodes to a real calendar date inside the supported range.
pub fn is_supported_year_month_day(ymd: i32) -> bool {
    if !(MIN_YEAR_MONTH_DAY..END_YEAR_MONTH_DAY).contains(&ymd) {
        return false;
    }
    let (y, m, d) = unpack_year_month_day(ymd);
    (1..=12).contains(&m) && d >= 1 && i64::from(d) <= days_in_month(i64::from(y), i64::from(m))
}

pub fn is_supported_day_id(day_id: i32) -> bool {
    (MIN_DAY_ID..END_DAY_ID).contains(&day_id)
}

/// Day id for a supported YearMonthDay; `None` for invalid or out-of-range values.
pub fn day_id_of(ymd: i32) -> Option<i32> {
    if !is_supported_year_month_day(ymd) {
        return None;
    }
    let (y, m, d) = unpack_year_month_day(ymd);
    Some(days_from_civil(i64::from(y), i64::from(m), i64::from(d)) as i32)
}

/// YearMonthDay for a supported day id; `None` outside the supported range.
pub fn year_month_day_of(day_id: i32) -> Option<i32> {
    if !is_supported_day_id(day_id) {
        return None;
    }
    let (y, m, d) = civil_from_days(i64::from(day_id));
    Some(pack_year_month_day(y as i32, m as i32, d as i32))
}

/// Calendar year of the UTC date containing `epoch_millis`.
pub fn utc_year_of_millis(epoch_millis: i64) -> i64 {
    civil_from_days(epoch_millis.div_euclid(MS_PER_DAY)).0
}

// ---------------------------------------------------------------------------
// Time-zone aware conversions
// ---------------------------------------------------------------------------

pub fn parse_time_zone(id: &str) -> Result<Tz, ScheduleError> {
    id.trim()
        .parse::<Tz>()
        .map_err(|_| ScheduleError::parse("time zone", format!("unknown time zone id '{id}'")))
}

/// Epoch millis of a local wall-clock time.
///
/// Ambiguous times (backward transitions) resolve to the earlier instant.
/// Non-existent times (forward transitions) are interpreted with the offset
/// in force before the transition, which lands them after the gap.
pub fn local_to_epoch_millis(tz: &Tz, local: NaiveDateTime) -> i64 {
    match tz.from_local_datetime(&local) {
        chrono::LocalResult::Single(dt) => dt.timestamp_millis(),
        chrono::LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        chrono::LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(local - TimeDelta::days(1)))
                .fix()
                .local_minus_utc();
            (local - TimeDelta::seconds(i64::from(before)))
                .and_utc()
                .timestamp_millis()
        }
    }
}

/// Local calendar date of `epoch_millis` in `tz`, packed as YearMonthDay.
pub fn year_month_day_in(tz: &Tz, epoch_millis: i64) -> Result<i32, ScheduleError> {
    let out_of_range = ScheduleError::OutOfRange {
        what: "time",
        value: epoch_millis,
    };
    let utc = DateTime::from_timestamp_millis(epoch_millis).ok_or_else(|| out_of_range.clone())?;
    let date = utc.with_timezone(tz).date_naive();
    if date.year() < 1 || date.year() > 9999 {
        return Err(out_of_range);
    }
    let ymd = pack_year_month_day(date.year(), date.month() as i32, date.day() as i32);
    if !(MIN_YEAR_MONTH_DAY..END_YEAR_MONTH_DAY).contains(&ymd) {
        return Err(out_of_range);
    }
    Ok(ymd)
}

/// Epoch millis of local midnight starting `ymd` in `tz`.
pub fn start_of_year_month_day_in(tz: &Tz, ymd: i32) -> Result<i64, ScheduleError> {
    let date = naive_date_of(ymd).ok_or(ScheduleError::OutOfRange {
        what: "year-month-day",
        value: i64::from(ymd),
    })?;
    Ok(local_to_epoch_millis(tz, date.and_time(NaiveTime::MIN)))
}

/// [`year_month_day_in`] keyed by a time zone id.
pub fn to_year_month_day(epoch_millis: i64, time_zone_id: &str) -> Result<i32, ScheduleError> {
    year_month_day_in(&parse_time_zone(time_zone_id)?, epoch_millis)
}

/// [`start_of_year_month_day_in`] keyed by a time zone id.
pub fn from_year_month_day(ymd: i32, time_zone_id: &str) -> Result<i64, ScheduleError> {
    start_of_year_month_day_in(&parse_time_zone(time_zone_id)?, ymd)
}

/// `NaiveDate` for a supported YearMonthDay.
pub fn naive_date_of(ymd: i32) -> Option<NaiveDate> {
    if !is_supported_year_month_day(ymd) {
        return None;
    }
    let (y, m, d) = unpack_year_month_day(ymd);
    NaiveDate::from_ymd_opt(y, m as u32, d as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_match_known_day_ids() {
        assert_eq!(MIN_DAY_ID, -719_161);
        assert_eq!(END_DAY_ID, 2_932_895);
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(days_from_civil(2024, 1, 8), 19_730);
    }

    #[test]
    fn civil_round_trip_over_full_range() {
        let mut id = MIN_DAY_ID;
        while id < END_DAY_ID {
            let ymd = year_month_day_of(id).unwrap();
            assert_eq!(day_id_of(ymd), Some(id), "ymd {ymd}");
            id += 97;
        }
        assert_eq!(year_month_day_of(END_DAY_ID - 1), Some(9999_12_29));
    }

    #[test]
    fn invalid_and_unsupported_dates_rejected() {
        assert!(!is_supported_year_month_day(1_01_01));
        assert!(is_supported_year_month_day(1_01_02));
        assert!(is_supported_year_month_day(9999_12_29));
        assert!(!is_supported_year_month_day(9999_12_30));
        assert!(!is_supported_year_month_day(2023_02_29));
        assert!(is_supported_year_month_day(2024_02_29));
        assert!(!is_supported_year_month_day(2024_13_01));
        assert_eq!(year_month_day_of(END_DAY_ID), None);
        assert_eq!(year_month_day_of(MIN_DAY_ID - 1), None);
    }

    #[test]
    fn utc_conversion_round_trips() {
        for ymd in [1_01_02, 1970_01_01, 2000_02_29, 2024_01_08, 9999_12_29] {
            let start = from_year_month_day(ymd, "UTC").unwrap();
            assert_eq!(to_year_month_day(start, "UTC").unwrap(), ymd);
            assert_eq!(to_year_month_day(start + MS_PER_DAY - 1, "UTC").unwrap(), ymd);
        }
    }

    #[test]
    fn zoned_conversion_round_trips() {
        let tz = parse_time_zone("America/New_York").unwrap();
        let mut id = MIN_DAY_ID;
        while id < END_DAY_ID {
            let ymd = year_month_day_of(id).unwrap();
            let start = start_of_year_month_day_in(&tz, ymd).unwrap();
            assert_eq!(year_month_day_in(&tz, start).unwrap(), ymd);
            id += 1_009;
        }
    }

    #[test]
    fn new_york_midnight_is_utc_minus_five_in_january() {
        // 2024-01-08T05:00:00Z
        assert_eq!(
            from_year_month_day(2024_01_08, "America/New_York").unwrap(),
            1_704_690_000_000
        );
    }

    #[test]
    fn out_of_range_times_are_reported_not_clamped() {
        let below = from_year_month_day(1_01_02, "UTC").unwrap() - 1;
        let at_end = days_from_civil(9999, 12, 30) * MS_PER_DAY;
        assert!(matches!(
            to_year_month_day(below, "UTC"),
            Err(ScheduleError::OutOfRange { .. })
        ));
        assert!(matches!(
            to_year_month_day(at_end, "UTC"),
            Err(ScheduleError::OutOfRange { .. })
        ));
        assert!(to_year_month_day(i64::MAX, "UTC").is_err());
    }

    #[test]
    fn unknown_zone_is_a_parse_failure() {
        assert!(matches!(
            parse_time_zone("Mars/Olympus"),
            Err(ScheduleError::ParseFailure { .. })
        ));
    }
}
