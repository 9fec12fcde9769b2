use std::sync::Arc;

use crate::codec;
use crate::{ScheduleError, Session, SessionKind, SessionPredicate, TimeRange};

/// One calendar day of a schedule: a contiguous run of [`Session`]s that
/// tiles exactly [`Day::range`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Day {
    day_id: i32,
    year_month_day: i32,
    range: TimeRange,
    sessions: Vec<Session>,
    time_zone_id: Arc<str>,
}

impl Day {
    /// Build a day, checking that:
    /// - `year_month_day` is a supported date whose day id is `day_id`;
    /// - `range` is non-empty;
    /// - `sessions` are non-empty, abut one another and cover `range` exactly.
    pub fn new(
        day_id: i32,
        year_month_day: i32,
        range: TimeRange,
        sessions: Vec<Session>,
        time_zone_id: Arc<str>,
    ) -> Result<Self, ScheduleError> {
        if codec::day_id_of(year_month_day) != Some(day_id) {
            return Err(ScheduleError::InvalidPartition(format!(
                "day id {day_id} does not match year-month-day {year_month_day}"
            )));
        }
        if range.is_empty() {
            return Err(ScheduleError::InvalidPartition(format!(
                "day {year_month_day} has empty range {range}"
            )));
        }
        let (Some(first), Some(last)) = (sessions.first(), sessions.last()) else {
            return Err(ScheduleError::InvalidPartition(format!(
                "day {year_month_day} has no sessions"
            )));
        };
        if first.start() != range.start() || last.end() != range.end() {
            return Err(ScheduleError::InvalidPartition(format!(
                "sessions of day {year_month_day} do not cover {range}"
            )));
        }
        for s in &sessions {
            if s.range().is_empty() {
                return Err(ScheduleError::InvalidPartition(format!(
                    "day {year_month_day} has an empty {} session",
                    s.kind()
                )));
            }
        }
        for pair in sessions.windows(2) {
            if !pair[0].range().abuts(&pair[1].range()) {
                return Err(ScheduleError::InvalidPartition(format!(
                    "sessions of day {year_month_day} leave a gap or overlap at {}",
                    pair[0].end()
                )));
            }
        }
        Ok(Self {
            day_id,
            year_month_day,
            range,
            sessions,
            time_zone_id,
        })
    }

    /// Days since 1970-01-01 of this day's local calendar date.
    pub fn day_id(&self) -> i32 {
        self.day_id
    }

    pub fn year_month_day(&self) -> i32 {
        self.year_month_day
    }

    pub fn year(&self) -> i32 {
        self.year_month_day / 10_000
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn start(&self) -> i64 {
        self.range.start()
    }

    pub fn end(&self) -> i64 {
        self.range.end()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn time_zone_id(&self) -> &str {
        &self.time_zone_id
    }

    pub fn contains_time(&self, time: i64) -> bool {
        self.range.contains(time)
    }

    /// True if any session of the day trades.
    pub fn is_trading(&self) -> bool {
        self.sessions.iter().any(Session::is_trading)
    }

    pub fn is_holiday(&self) -> bool {
        self.sessions.iter().any(|s| s.kind() == SessionKind::Holiday)
    }

    pub fn is_short_day(&self) -> bool {
        self.sessions.iter().any(|s| s.kind() == SessionKind::ShortDay)
    }

    /// Session containing `time`, if `time` falls inside this day.
    pub fn session_by_time(&self, time: i64) -> Option<&Session> {
        if !self.contains_time(time) {
            return None;
        }
        let idx = self.sessions.partition_point(|s| s.end() <= time);
        self.sessions.get(idx)
    }

    pub fn first_session<P: SessionPredicate + ?Sized>(&self, filter: &P) -> Option<&Session> {
        self.sessions.iter().find(|s| filter.accept(s))
    }

    pub fn last_session<P: SessionPredicate + ?Sized>(&self, filter: &P) -> Option<&Session> {
        self.sessions.iter().rev().find(|s| filter.accept(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionFilter;

    const DAY_ID: i32 = 19_730; // 2024-01-08
    const YMD: i32 = 2024_01_08;

    fn tz() -> Arc<str> {
        Arc::from("UTC")
    }

    fn sessions(bounds: &[(i64, i64, SessionKind)]) -> Vec<Session> {
        bounds
            .iter()
            .map(|&(s, e, k)| Session::new(k, TimeRange::new(s, e)))
            .collect()
    }

    #[test]
    fn builds_tiled_day() {
        let day = Day::new(
            DAY_ID,
            YMD,
            TimeRange::new(0, 100),
            sessions(&[
                (0, 30, SessionKind::NoTrading),
                (30, 70, SessionKind::Regular),
                (70, 100, SessionKind::NoTrading),
            ]),
            tz(),
        )
        .unwrap();
        assert!(day.is_trading());
        assert!(!day.is_holiday());
        assert_eq!(day.session_by_time(30).unwrap().kind(), SessionKind::Regular);
        assert_eq!(day.session_by_time(69).unwrap().kind(), SessionKind::Regular);
        assert_eq!(day.session_by_time(70).unwrap().kind(), SessionKind::NoTrading);
        assert!(day.session_by_time(100).is_none());
        assert_eq!(
            day.last_session(&SessionFilter::NON_TRADING).unwrap().start(),
            70
        );
    }

    #[test]
    fn rejects_gap_between_sessions() {
        let err = Day::new(
            DAY_ID,
            YMD,
            TimeRange::new(0, 100),
            sessions(&[(0, 30, SessionKind::NoTrading), (40, 100, SessionKind::Regular)]),
            tz(),
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidPartition(_)));
    }

    #[test]
    fn rejects_partial_cover_and_mismatched_id() {
        assert!(Day::new(
            DAY_ID,
            YMD,
            TimeRange::new(0, 100),
            sessions(&[(0, 90, SessionKind::NoTrading)]),
            tz(),
        )
        .is_err());
        assert!(Day::new(
            DAY_ID + 1,
            YMD,
            TimeRange::new(0, 100),
            sessions(&[(0, 100, SessionKind::NoTrading)]),
            tz(),
        )
        .is_err());
    }
}
