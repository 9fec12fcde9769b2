//! Compiled calendars for real zones, using the built-in defaults payload.
//!
//! Reference instants:
//!   2024-01-08 09:30 ET (EST, UTC-5)  = 1_704_724_200_000
//!   2024-07-08 09:30 ET (EDT, UTC-4)  = 2024-07-08T13:30Z
//!   2024-03-10 is the US spring-forward Sunday (23h local day)
//!   Pacific/Apia skipped 2011-12-30 entirely (UTC-10 -> UTC+14)

use tcal_core::codec::{self, MS_PER_DAY};
use tcal_core::{CalendarPartition, SessionFilter, SessionKind};
use tcal_definition::{DefaultsData, RuleCompiler, ScheduleCompiler};

const HOUR: i64 = 3_600_000;

fn utc_midnight(ymd: i32) -> i64 {
    i64::from(codec::day_id_of(ymd).unwrap()) * MS_PER_DAY
}

fn compile(definition: &str, generation: u64) -> CalendarPartition {
    let defaults = DefaultsData::builtin().unwrap();
    RuleCompiler.compile(definition, &defaults, generation).unwrap()
}

#[test]
fn nyse_regular_session_follows_dst() {
    let p = compile("NYSE", 0);
    assert_eq!(p.name(), "NYSE");
    assert_eq!(p.time_zone_id(), "America/New_York");

    let winter = p.day_by_year_month_day(2024_01_08).unwrap();
    let open = winter.first_session(&SessionFilter::REGULAR).unwrap();
    assert_eq!(open.start(), 1_704_724_200_000);
    assert_eq!(open.end(), 1_704_724_200_000 + 6 * HOUR + HOUR / 2);
    assert_eq!(winter.start(), utc_midnight(2024_01_08) + 5 * HOUR);

    let summer = p.day_by_year_month_day(2024_07_08).unwrap();
    let open = summer.first_session(&SessionFilter::REGULAR).unwrap();
    assert_eq!(open.start(), utc_midnight(2024_07_08) + 13 * HOUR + HOUR / 2);
}

#[test]
fn spring_forward_day_is_23_hours() {
    let p = compile("NYSE", 0);
    let day = p.day_by_year_month_day(2024_03_10).unwrap();
    assert_eq!(day.range().len_millis(), 23 * HOUR);
    assert!(!day.is_trading());
}

#[test]
fn holidays_and_short_days_from_defaults() {
    let p = compile("NYSE", 0);

    let christmas = p.day_by_year_month_day(2024_12_25).unwrap();
    assert!(christmas.is_holiday());
    assert_eq!(christmas.sessions().len(), 1);
    assert_eq!(christmas.sessions()[0].kind(), SessionKind::Holiday);

    let black_friday = p.day_by_year_month_day(2024_11_29).unwrap();
    assert!(black_friday.is_short_day());
    let short = black_friday.first_session(&SessionFilter::TRADING).unwrap();
    assert_eq!(short.kind(), SessionKind::ShortDay);
    assert_eq!(short.end(), utc_midnight(2024_11_29) + 18 * HOUR);
    assert_eq!(
        black_friday.last_session(&SessionFilter::ANY).unwrap().kind(),
        SessionKind::NoTrading
    );
}

#[test]
fn venue_variant_adds_extended_hours() {
    let p = compile("NYSE@XNAS", 0);
    assert_eq!(p.name(), "NYSE@XNAS");

    let day = p.day_by_year_month_day(2024_01_08).unwrap();
    let kinds: Vec<_> = day.sessions().iter().map(|s| s.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            SessionKind::NoTrading,
            SessionKind::PreMarket,
            SessionKind::Regular,
            SessionKind::AfterMarket,
            SessionKind::NoTrading,
        ]
    );

    let short = p.day_by_year_month_day(2024_11_29).unwrap();
    let kinds: Vec<_> = short.sessions().iter().map(|s| s.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            SessionKind::NoTrading,
            SessionKind::PreMarket,
            SessionKind::ShortDay,
            SessionKind::Closed,
            SessionKind::AfterMarket,
            SessionKind::NoTrading,
        ]
    );
}

#[test]
fn nearest_regular_session_skips_weekend_and_holiday() {
    let p = compile("NYSE", 0);
    let sat_noon_utc = utc_midnight(2024_01_13) + 12 * HOUR;

    // Mon 2024-01-15 is MLK day; the next regular session is Tuesday.
    let next = p
        .find_nearest_session_by_time(sat_noon_utc, &SessionFilter::REGULAR)
        .unwrap();
    assert_eq!(next.start(), utc_midnight(2024_01_16) + 14 * HOUR + HOUR / 2);

    // Friday close (21:00Z) is 15h back; Tuesday open is 74.5h ahead.
    let nearest = p
        .nearest_session_by_time(sat_noon_utc, &SessionFilter::REGULAR)
        .unwrap();
    assert_eq!(nearest.end(), utc_midnight(2024_01_12) + 21 * HOUR);
}

#[test]
fn regular_filter_matches_short_day_session() {
    let p = compile("NYSE", 0);
    // Black Friday 2024: regular hours 09:30-13:00 ET = 14:30Z-18:00Z.
    let mid_session = utc_midnight(2024_11_29) + 16 * HOUR;

    let nearest = p
        .nearest_session_by_time(mid_session, &SessionFilter::REGULAR)
        .unwrap();
    assert_eq!(nearest.kind(), SessionKind::ShortDay);
    assert_eq!(nearest.start(), 1_732_890_600_000);

    let containing = p.session_by_time(mid_session).unwrap();
    assert_eq!(
        p.day_by_year_month_day(2024_11_29)
            .unwrap()
            .first_session(&SessionFilter::REGULAR),
        Some(containing)
    );

    // From Thanksgiving, the next regular session is the short day.
    let thanksgiving_noon = utc_midnight(2024_11_28) + 17 * HOUR;
    let next = p
        .find_nearest_session_by_time(thanksgiving_noon, &SessionFilter::REGULAR)
        .unwrap();
    assert_eq!(next.start(), 1_732_890_600_000);
}

#[test]
fn no_trading_filter_matches_holiday_session() {
    let p = compile("NYSE", 0);
    let christmas_noon = utc_midnight(2024_12_25) + 17 * HOUR;
    let found = p
        .nearest_session_by_time(christmas_noon, &SessionFilter::NO_TRADING)
        .unwrap();
    assert_eq!(found.kind(), SessionKind::Holiday);
    assert!(found.contains_time(christmas_noon));
}

#[test]
fn day_by_time_agrees_with_zone_codec() {
    let p = compile("NYSE", 0);
    let base = utc_midnight(2024_01_01);
    for i in 0..2_000 {
        let t = base + i * 4 * HOUR + i * 37;
        let day = p.day_by_time(t).unwrap();
        assert!(day.contains_time(t));
        assert_eq!(
            day.year_month_day(),
            codec::to_year_month_day(t, "America/New_York").unwrap()
        );
    }
}

#[test]
fn skipped_local_date_rolls_forward() {
    let p = compile("name=APIA;tz=Pacific/Apia;days=1234567;r=0900-1700", 0);

    assert!(p.day_by_id(codec::day_id_of(2011_12_30).unwrap()).is_none());
    let rolled = p.day_by_year_month_day(2011_12_30).unwrap();
    assert_eq!(rolled.year_month_day(), 2011_12_31);

    let before = p.day_by_year_month_day(2011_12_29).unwrap();
    assert_eq!(before.end(), rolled.start());
    assert_eq!(p.next_day(before).unwrap().year_month_day(), 2011_12_31);
}

#[test]
fn compilation_is_deterministic_and_tags_generation() {
    let a = compile("NYSE", 3);
    let b = compile("NYSE", 3);
    assert_eq!(a.defaults_generation(), Some(3));

    for ymd in [1_01_02, 1999_12_31, 2024_02_29, 2026_07_03, 9999_12_29] {
        assert_eq!(a.day_by_year_month_day(ymd), b.day_by_year_month_day(ymd));
    }
    assert_eq!(a.bounds(), b.bounds());
}

#[test]
fn bounds_follow_local_midnights() {
    let p = compile("NYSE", 0);
    let first = p.day_by_time(p.bounds().start()).unwrap();
    assert_eq!(first.year_month_day(), 1_01_02);
    let last = p.day_by_time(p.bounds().end() - 1).unwrap();
    assert_eq!(last.year_month_day(), 9999_12_29);
    assert!(p.day_by_time(p.bounds().end()).is_none());
    assert_eq!(
        p.bounds().end(),
        codec::from_year_month_day(9999_12_30, "America/New_York").unwrap()
    );
}
