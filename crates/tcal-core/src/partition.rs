//! Calendar partition: the ordered, contiguous sequence of [`Day`]s of one
//! schedule.
//!
//! Two backings share the same contract:
//!
//! - **Generated**: a [`DayGenerator`] produces days one calendar year at a
//!   time. Each year is materialized on first touch and cached in a
//!   `OnceLock`, so construction cost is proportional to the days actually
//!   visited, not to the 9999-year span. Supported bounds are exactly
//!   0001-01-02 (inclusive) to 9999-12-30 (exclusive) in the schedule's zone.
//! - **Table**: an explicit, fully materialized day list. Its bounds are the
//!   table's own first start and last end.
//!
//! A partition is immutable once built. Refreshing defaults builds a new
//! partition; holders of the old `Arc` keep a consistent snapshot.

use std::sync::{Arc, OnceLock};

use crate::codec::{self, END_YEAR_MONTH_DAY, MIN_YEAR_MONTH_DAY};
use crate::{Day, ScheduleError, TimeRange};

const FIRST_YEAR: i32 = 1;
const LAST_YEAR: i32 = 9999;

/// Source of days for a generated partition.
///
/// Contract for `days_of_year(year)`:
/// - days are time-ordered, contiguous and carry strictly increasing ids;
/// - every returned day has `year_month_day / 10000 == year`;
/// - the first day of `year + 1` starts where the last day of `year` ends;
/// - year 1 starts with 0001-01-02 and year 9999 stops before 9999-12-30;
/// - the output is a pure function of `year` (same input, same days).
pub trait DayGenerator: Send + Sync {
    fn days_of_year(&self, year: i32) -> Vec<Day>;
}

/// Descriptive metadata of a partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionInfo {
    pub name: String,
    pub time_zone_id: String,
    pub time_zone_display_name: String,
    /// Defaults generation the partition was built from; `None` when its
    /// definition did not consult defaults data.
    pub defaults_generation: Option<u64>,
}

enum Backing {
    Table(Vec<Day>),
    Generated {
        generator: Box<dyn DayGenerator>,
        years: Box<[OnceLock<Vec<Day>>]>,
    },
}

pub struct CalendarPartition {
    info: PartitionInfo,
    bounds: TimeRange,
    backing: Backing,
}

impl std::fmt::Debug for CalendarPartition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backing = match &self.backing {
            Backing::Table(days) => format!("table({} days)", days.len()),
            Backing::Generated { years, .. } => format!(
                "generated({} years cached)",
                years.iter().filter(|y| y.get().is_some()).count()
            ),
        };
        f.debug_struct("CalendarPartition")
            .field("info", &self.info)
            .field("bounds", &self.bounds)
            .field("backing", &backing)
            .finish()
    }
}

impl CalendarPartition {
    /// Partition over an explicit day table.
    pub fn from_days(info: PartitionInfo, days: Vec<Day>) -> Result<Self, ScheduleError> {
        let (Some(first), Some(last)) = (days.first(), days.last()) else {
            return Err(ScheduleError::InvalidPartition(format!(
                "partition '{}' has no days",
                info.name
            )));
        };
        let bounds = TimeRange::new(first.start(), last.end());
        check_contiguous(&info.name, &days)?;
        Ok(Self {
            info,
            bounds,
            backing: Backing::Table(days),
        })
    }

    /// Partition whose days are produced lazily by `generator`.
    ///
    /// The first and last supported years are materialized eagerly to fix
    /// the partition bounds.
    pub fn generated(
        info: PartitionInfo,
        generator: Box<dyn DayGenerator>,
    ) -> Result<Self, ScheduleError> {
        let years: Box<[OnceLock<Vec<Day>>]> =
            (FIRST_YEAR..=LAST_YEAR).map(|_| OnceLock::new()).collect();

        let head = generator.days_of_year(FIRST_YEAR);
        let tail = generator.days_of_year(LAST_YEAR);
        check_year(&info.name, FIRST_YEAR, &head)?;
        check_year(&info.name, LAST_YEAR, &tail)?;

        let (Some(first), Some(last)) = (head.first(), tail.last()) else {
            return Err(ScheduleError::InvalidPartition(format!(
                "partition '{}' generated no boundary days",
                info.name
            )));
        };
        if first.year_month_day() != MIN_YEAR_MONTH_DAY {
            return Err(ScheduleError::InvalidPartition(format!(
                "partition '{}' starts at {} instead of {MIN_YEAR_MONTH_DAY:08}",
                info.name,
                first.year_month_day()
            )));
        }
        let bounds = TimeRange::new(first.start(), last.end());

        let _ = years[0].set(head);
        let _ = years[years.len() - 1].set(tail);

        Ok(Self {
            info,
            bounds,
            backing: Backing::Generated { generator, years },
        })
    }

    pub fn info(&self) -> &PartitionInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn time_zone_id(&self) -> &str {
        &self.info.time_zone_id
    }

    pub fn time_zone_display_name(&self) -> &str {
        &self.info.time_zone_display_name
    }

    pub fn defaults_generation(&self) -> Option<u64> {
        self.info.defaults_generation
    }

    /// Supported time range: `[first day start, last day end)`.
    pub fn bounds(&self) -> TimeRange {
        self.bounds
    }

    pub fn is_generated(&self) -> bool {
        matches!(self.backing, Backing::Generated { .. })
    }

    // -----------------------------------------------------------------------
    // Windows used by the query layer
    // -----------------------------------------------------------------------

    /// Ordered days of `year`, or the whole table for table partitions.
    pub(crate) fn window_for_year(&self, year: i32) -> &[Day] {
        match &self.backing {
            Backing::Table(days) => days,
            Backing::Generated { generator, years } => {
                if !(FIRST_YEAR..=LAST_YEAR).contains(&year) {
                    return &[];
                }
                let slot = &years[(year - FIRST_YEAR) as usize];
                slot.get_or_init(|| load_year(&self.info.name, generator.as_ref(), year))
            }
        }
    }

    /// Year following `year` whose window should be consulted next, if any.
    pub(crate) fn following_year(&self, year: i32) -> Option<i32> {
        match self.backing {
            Backing::Table(_) => None,
            Backing::Generated { .. } if year < LAST_YEAR => Some(year + 1),
            Backing::Generated { .. } => None,
        }
    }

    /// Window holding the day that contains `time`.
    pub(crate) fn window_for_time(&self, time: i64) -> Option<&[Day]> {
        if !self.bounds.contains(time) {
            return None;
        }
        if let Backing::Table(days) = &self.backing {
            return Some(days);
        }
        // The UTC year is at most one off the local year of the containing day.
        let mut year = codec::utc_year_of_millis(time)
            .clamp(i64::from(FIRST_YEAR), i64::from(LAST_YEAR)) as i32;
        for _ in 0..3 {
            let days = self.window_for_year(year);
            let (first, last) = (days.first()?, days.last()?);
            if time < first.start() {
                year -= 1;
            } else if time >= last.end() {
                year += 1;
            } else {
                return Some(days);
            }
        }
        None
    }

    /// Number of generated years currently materialized.
    pub fn cached_years(&self) -> usize {
        match &self.backing {
            Backing::Table(_) => 0,
            Backing::Generated { years, .. } => years.iter().filter(|y| y.get().is_some()).count(),
        }
    }
}

fn load_year(name: &str, generator: &dyn DayGenerator, year: i32) -> Vec<Day> {
    let days = generator.days_of_year(year);
    match check_year(name, year, &days) {
        Ok(()) => days,
        Err(err) => {
            tracing::error!(partition = name, year, error = %err, "generated year rejected");
            Vec::new()
        }
    }
}

fn check_year(name: &str, year: i32, days: &[Day]) -> Result<(), ScheduleError> {
    if days.is_empty() {
        return Err(ScheduleError::InvalidPartition(format!(
            "partition '{name}' generated no days for year {year}"
        )));
    }
    if let Some(stray) = days.iter().find(|d| d.year() != year) {
        return Err(ScheduleError::InvalidPartition(format!(
            "partition '{name}' generated day {} inside year {year}",
            stray.year_month_day()
        )));
    }
    if let Some(last) = days.last() {
        if last.year_month_day() >= END_YEAR_MONTH_DAY {
            return Err(ScheduleError::InvalidPartition(format!(
                "partition '{name}' generated day {} beyond the supported range",
                last.year_month_day()
            )));
        }
    }
    check_contiguous(name, days)
}

fn check_contiguous(name: &str, days: &[Day]) -> Result<(), ScheduleError> {
    for pair in days.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if !a.range().abuts(&b.range()) {
            return Err(ScheduleError::InvalidPartition(format!(
                "partition '{name}': day {} ends at {} but day {} starts at {}",
                a.year_month_day(),
                a.end(),
                b.year_month_day(),
                b.start()
            )));
        }
        if a.day_id() >= b.day_id() {
            return Err(ScheduleError::InvalidPartition(format!(
                "partition '{name}': day ids not increasing at {}",
                b.year_month_day()
            )));
        }
    }
    Ok(())
}

/// Shared handle type used by caches and callers.
pub type SharedPartition = Arc<CalendarPartition>;
