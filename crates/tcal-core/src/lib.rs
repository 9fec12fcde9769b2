//! tcal-core
//!
//! Trading calendar data model and queries.
//!
//! - [`TimeRange`] closed-open millisecond intervals and the YearMonthDay codec ([`codec`]).
//! - [`Session`] / [`Day`] / [`CalendarPartition`]: immutable, contiguous day/session tiling
//!   of the supported range 0001-01-02..9999-12-30.
//! - Lookups by time, day id and YearMonthDay, plus nearest-session search ([`search`]).
//!
//! Pure deterministic logic. No IO, no wall-clock. Partitions are shared behind `Arc` and
//! never mutated; a refreshed schedule is a new partition.

pub mod codec;
mod day;
mod error;
mod partition;
mod query;
mod range;
pub mod search;
mod session;

pub use day::Day;
pub use error::ScheduleError;
pub use partition::{CalendarPartition, DayGenerator, PartitionInfo, SharedPartition};
pub use range::TimeRange;
pub use session::{Session, SessionFilter, SessionKind, SessionPredicate};
