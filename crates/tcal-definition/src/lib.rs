//! tcal-definition
//!
//! Schedule definitions and the defaults data they draw on.
//!
//! - [`DefaultsData`]: named holiday/short-day lists and named schedules with
//!   venue variants, decoded from JSON and validated before use.
//! - [`RuleSet`]: the `key=value;...` definition grammar.
//! - [`ScheduleCompiler`] / [`RuleCompiler`]: definition + defaults ->
//!   lazily generated [`tcal_core::CalendarPartition`].

mod compiler;
mod defaults;
pub mod rules;

pub use compiler::{RuleCompiler, ScheduleCompiler};
pub use defaults::{DefaultsData, ResolvedDefinition, ScheduleEntry, BUILTIN_DEFAULTS};
pub use rules::{RuleSet, ScheduleRef, Window};
