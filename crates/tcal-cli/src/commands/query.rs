use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tcal_core::{SessionFilter, SessionPredicate, SharedPartition};
use tcal_registry::InstrumentProfile;

use super::{parse_time, print_json, DayView, Engine, SessionView};

#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    /// Schedule name (`NYSE`), reference (`NYSE@XNAS`) or inline rules.
    #[arg(long)]
    pub schedule: String,

    /// Instrument symbol the schedule belongs to (informational).
    #[arg(long)]
    pub symbol: Option<String>,

    /// Venue variant of the schedule.
    #[arg(long)]
    pub venue: Option<String>,
}

impl ScheduleArgs {
    fn profile(&self) -> InstrumentProfile {
        let symbol = self.symbol.as_deref().unwrap_or(&self.schedule);
        InstrumentProfile::new(symbol, self.schedule.as_str())
    }

    fn partition(&self, engine: &Engine) -> Result<SharedPartition> {
        engine
            .registry
            .get_instance(&self.profile(), self.venue.as_deref())
            .with_context(|| format!("schedule '{}' unavailable", self.schedule))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SessionMode {
    /// Session containing the time.
    Containing,
    /// Nearest matching session in either direction.
    Nearest,
    /// First matching session starting at or after the time.
    Next,
}

pub fn day(
    engine: &Engine,
    target: &ScheduleArgs,
    time: Option<&str>,
    ymd: Option<i32>,
    id: Option<i32>,
    json: bool,
) -> Result<()> {
    let partition = target.partition(engine)?;
    let day = match (time, ymd, id) {
        (Some(t), _, _) => {
            let ms = parse_time(t)?;
            partition
                .day_by_time(ms)
                .with_context(|| format!("no day contains time {ms}"))?
        }
        (None, Some(ymd), _) => partition
            .day_by_year_month_day(ymd)
            .with_context(|| format!("no day at or after {ymd}"))?,
        (None, None, Some(id)) => partition
            .day_by_id(id)
            .with_context(|| format!("no day with id {id}"))?,
        (None, None, None) => anyhow::bail!("must provide one of --time, --ymd or --id"),
    };

    let view = DayView::from(day);
    if json {
        return print_json(&view);
    }
    println!("schedule={}", partition.name());
    println!("time_zone_display={}", partition.time_zone_display_name());
    view.print_kv();
    Ok(())
}

pub fn session(
    engine: &Engine,
    target: &ScheduleArgs,
    time: &str,
    filter: &str,
    mode: SessionMode,
    json: bool,
) -> Result<()> {
    let partition = target.partition(engine)?;
    let ms = parse_time(time)?;
    let filter = SessionFilter::from_name(filter).with_context(|| {
        format!(
            "invalid --filter '{filter}'. expected one of: any | trading | non-trading | \
             no-trading | pre-market | regular | after-market"
        )
    })?;

    let found = match mode {
        SessionMode::Containing => partition.session_by_time(ms).filter(|s| filter.accept(s)),
        SessionMode::Nearest => partition.nearest_session_by_time(ms, &filter),
        SessionMode::Next => partition.find_nearest_session_by_time(ms, &filter),
    };
    let session = found.with_context(|| format!("no matching session for time {ms}"))?;

    let view = SessionView::from(session);
    if json {
        return print_json(&view);
    }
    println!("schedule={}", partition.name());
    view.print_kv("");
    Ok(())
}

pub fn venues(engine: &Engine, target: &ScheduleArgs) -> Result<()> {
    let venues = engine
        .registry
        .get_trading_venues(&target.profile())
        .with_context(|| format!("schedule '{}' unavailable", target.schedule))?;
    println!("schedule={}", target.schedule);
    println!("venue_count={}", venues.len());
    for venue in venues {
        println!("venue={venue}");
    }
    Ok(())
}
