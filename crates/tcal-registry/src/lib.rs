//! tcal-registry
//!
//! [`ScheduleRegistry`] hands out shared [`tcal_core::CalendarPartition`]s for
//! instrument profiles and definition strings, rebuilding them when the
//! defaults generation they were built from is replaced.

mod profile;
mod registry;

pub use profile::{DefaultsProfileSource, InstrumentProfile, ProfileSource};
pub use registry::{RegistryOptions, ScheduleRegistry};
