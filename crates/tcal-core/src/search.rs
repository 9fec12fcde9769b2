//! Nearest-session search.
//!
//! Both searches start from the day containing `time` and walk outward one
//! day at a time. The walk stops once it reaches a day more than one
//! calendar year (YearMonthDay +/- 10000) away from the starting day.
//!
//! - [`nearest_session`] looks both ways. A matching session that contains
//!   `time` wins outright; otherwise the closest matching session before and
//!   after `time` are compared, and on equal distance the earlier one wins.
//! - [`find_nearest_session`] looks forward only and never returns a session
//!   that starts before `time`.

use crate::codec::YEAR_STEP;
use crate::{CalendarPartition, Day, Session, SessionPredicate};

/// Nearest session to `time` accepted by `filter`, searching both directions.
pub fn nearest_session<'a, P>(
    partition: &'a CalendarPartition,
    time: i64,
    filter: &P,
) -> Option<&'a Session>
where
    P: SessionPredicate + ?Sized,
{
    let day = partition.day_by_time(time)?;
    let sessions = day.sessions();
    let idx = sessions.partition_point(|s| s.end() <= time);
    let current = sessions.get(idx)?;
    if filter.accept(current) {
        return Some(current);
    }
    let origin = day.year_month_day();
    let before = scan_backward(partition, day, idx, filter, origin - YEAR_STEP);
    let after = scan_forward(partition, day, idx + 1, filter, origin + YEAR_STEP);
    pick_nearest(time, before, after)
}

/// First session accepted by `filter` that starts at or after `time`.
pub fn find_nearest_session<'a, P>(
    partition: &'a CalendarPartition,
    time: i64,
    filter: &P,
) -> Option<&'a Session>
where
    P: SessionPredicate + ?Sized,
{
    let day = partition.day_by_time(time)?;
    let from = day.sessions().partition_point(|s| s.start() < time);
    scan_forward(partition, day, from, filter, day.year_month_day() + YEAR_STEP)
}

/// Tie-break between the closest candidate before and after `time`.
///
/// Distance to `before` is measured from its (exclusive) end, distance to
/// `after` from its start. Equal distances pick `before`.
pub fn pick_nearest<'a>(
    time: i64,
    before: Option<&'a Session>,
    after: Option<&'a Session>,
) -> Option<&'a Session> {
    match (before, after) {
        (Some(b), Some(a)) => {
            let back = time.saturating_sub(b.end());
            let ahead = a.start().saturating_sub(time);
            if back <= ahead {
                Some(b)
            } else {
                Some(a)
            }
        }
        (b, a) => b.or(a),
    }
}

/// Scan sessions `day.sessions()[from..]`, then following days up to and
/// including the day with YearMonthDay `last_ymd`.
fn scan_forward<'a, P>(
    partition: &'a CalendarPartition,
    mut day: &'a Day,
    mut from: usize,
    filter: &P,
    last_ymd: i32,
) -> Option<&'a Session>
where
    P: SessionPredicate + ?Sized,
{
    loop {
        let tail = day.sessions().get(from..).unwrap_or_default();
        if let Some(found) = tail.iter().find(|s| filter.accept(s)) {
            return Some(found);
        }
        day = partition.next_day(day)?;
        if day.year_month_day() > last_ymd {
            return None;
        }
        from = 0;
    }
}

/// Scan sessions `day.sessions()[..upto]` backwards, then preceding days down
/// to and including the day with YearMonthDay `first_ymd`.
fn scan_backward<'a, P>(
    partition: &'a CalendarPartition,
    mut day: &'a Day,
    mut upto: usize,
    filter: &P,
    first_ymd: i32,
) -> Option<&'a Session>
where
    P: SessionPredicate + ?Sized,
{
    loop {
        let head = day.sessions().get(..upto).unwrap_or_default();
        if let Some(found) = head.iter().rev().find(|s| filter.accept(s)) {
            return Some(found);
        }
        day = partition.prev_day(day)?;
        if day.year_month_day() < first_ymd {
            return None;
        }
        upto = day.sessions().len();
    }
}

impl CalendarPartition {
    /// See [`nearest_session`].
    pub fn nearest_session_by_time<P>(&self, time: i64, filter: &P) -> Option<&Session>
    where
        P: SessionPredicate + ?Sized,
    {
        nearest_session(self, time, filter)
    }

    /// See [`find_nearest_session`].
    pub fn find_nearest_session_by_time<P>(&self, time: i64, filter: &P) -> Option<&Session>
    where
        P: SessionPredicate + ?Sized,
    {
        find_nearest_session(self, time, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SessionKind, TimeRange};

    fn session(start: i64, end: i64) -> Session {
        Session::new(SessionKind::Regular, TimeRange::new(start, end))
    }

    #[test]
    fn equal_distance_prefers_earlier() {
        let before = session(0, 100);
        let after = session(300, 400);
        let got = pick_nearest(200, Some(&before), Some(&after)).unwrap();
        assert_eq!(got, &before);
    }

    #[test]
    fn strictly_closer_side_wins() {
        let before = session(0, 100);
        let after = session(250, 400);
        assert_eq!(pick_nearest(200, Some(&before), Some(&after)).unwrap(), &after);
        let after = session(350, 400);
        assert_eq!(pick_nearest(200, Some(&before), Some(&after)).unwrap(), &before);
    }

    #[test]
    fn one_sided_candidates() {
        let only = session(0, 100);
        assert_eq!(pick_nearest(500, Some(&only), None).unwrap(), &only);
        assert_eq!(pick_nearest(-50, None, Some(&only)).unwrap(), &only);
        assert!(pick_nearest(0, None, None).is_none());
    }
}
