//! Defaults payload: named holiday and short-day lists plus named schedules
//! with optional per-venue variants.
//!
//! ```json
//! {
//!   "holidays":   { "US": [20240101, 20240115] },
//!   "short_days": { "US": [20241129] },
//!   "schedules":  {
//!     "NYSE": {
//!       "definition": "name=NYSE;tz=America/New_York;hd=US;r=0930-1600",
//!       "venues": { "XNAS": "name=NYSE@XNAS;tz=America/New_York;hd=US;p=0400-0930;r=0930-1600" }
//!     }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tcal_core::{codec, ScheduleError};

use crate::rules::{RuleSet, ScheduleRef};

/// Payload compiled into the crate; installed as generation 0.
pub const BUILTIN_DEFAULTS: &[u8] = include_bytes!("../data/defaults.json");

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub definition: String,
    #[serde(default)]
    pub venues: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsData {
    #[serde(default)]
    pub holidays: BTreeMap<String, BTreeSet<i32>>,
    #[serde(default)]
    pub short_days: BTreeMap<String, BTreeSet<i32>>,
    #[serde(default)]
    pub schedules: BTreeMap<String, ScheduleEntry>,
}

/// A definition after reference resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedDefinition {
    /// Name used when the rule text carries no `name=`.
    pub fallback_name: String,
    pub rules: RuleSet,
    /// True when resolution or compilation consults defaults data.
    pub uses_defaults: bool,
}

impl DefaultsData {
    /// Decode and validate a raw payload.
    pub fn parse(bytes: &[u8]) -> Result<Self, ScheduleError> {
        let data: DefaultsData = serde_json::from_slice(bytes)
            .map_err(|e| ScheduleError::parse("defaults payload", e.to_string()))?;
        data.validate()?;
        Ok(data)
    }

    /// The payload shipped with the crate.
    pub fn builtin() -> Result<Self, ScheduleError> {
        Self::parse(BUILTIN_DEFAULTS)
    }

    /// Every list date decodes and every schedule (and venue variant) is a
    /// well-formed rule set whose list references exist.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        for (kind, lists) in [("holidays", &self.holidays), ("short_days", &self.short_days)] {
            for (name, dates) in lists {
                if let Some(bad) = dates.iter().find(|d| codec::naive_date_of(**d).is_none()) {
                    return Err(ScheduleError::parse(
                        "defaults payload",
                        format!("{kind} list '{name}' contains invalid date {bad}"),
                    ));
                }
            }
        }
        for (name, entry) in &self.schedules {
            self.check_rules(name, &entry.definition)?;
            for (venue, definition) in &entry.venues {
                self.check_rules(&format!("{name}@{venue}"), definition)?;
            }
        }
        Ok(())
    }

    fn check_rules(&self, label: &str, definition: &str) -> Result<(), ScheduleError> {
        let context = format!("schedule '{label}'");
        if ScheduleRef::parse(definition).is_some() {
            return Err(ScheduleError::parse(
                context,
                "defaults schedules must spell out rules, not reference other schedules",
            ));
        }
        let rules = RuleSet::parse(definition)
            .map_err(|e| ScheduleError::parse(context.clone(), e.to_string()))?;
        codec::parse_time_zone(&rules.time_zone)
            .map_err(|e| ScheduleError::parse(context.clone(), e.to_string()))?;
        self.holiday_dates(&rules.holiday_lists)
            .and_then(|_| self.short_day_dates(&rules.short_day_lists))
            .map_err(|e| ScheduleError::parse(context, e.to_string()))?;
        Ok(())
    }

    /// Ordered venues declared for `schedule`; `None` if the schedule is unknown.
    pub fn venues_of(&self, schedule: &str) -> Option<Vec<String>> {
        self.schedules
            .get(schedule)
            .map(|entry| entry.venues.keys().cloned().collect())
    }

    /// Rule text for a schedule, or for one of its venues.
    pub fn definition_of(
        &self,
        schedule: &str,
        venue: Option<&str>,
    ) -> Result<&str, ScheduleError> {
        let entry = self
            .schedules
            .get(schedule)
            .ok_or_else(|| ScheduleError::UnknownSchedule {
                name: schedule.to_string(),
            })?;
        match venue {
            None => Ok(&entry.definition),
            Some(venue) => entry
                .venues
                .get(venue)
                .map(String::as_str)
                .ok_or_else(|| ScheduleError::UnknownVenue {
                    schedule: schedule.to_string(),
                    venue: venue.to_string(),
                }),
        }
    }

    /// Resolve a definition that is either a rule set or a reference.
    pub fn resolve(&self, definition: &str) -> Result<ResolvedDefinition, ScheduleError> {
        match ScheduleRef::parse(definition) {
            Some(reference) => {
                let text = self.definition_of(reference.schedule, reference.venue)?;
                Ok(ResolvedDefinition {
                    fallback_name: definition.trim().to_string(),
                    rules: RuleSet::parse(text)?,
                    uses_defaults: true,
                })
            }
            None => {
                let rules = RuleSet::parse(definition)?;
                Ok(ResolvedDefinition {
                    fallback_name: definition.trim().to_string(),
                    uses_defaults: rules.uses_defaults(),
                    rules,
                })
            }
        }
    }

    /// Union of the named holiday lists.
    pub fn holiday_dates(&self, names: &[String]) -> Result<BTreeSet<i32>, ScheduleError> {
        union_of("holiday", &self.holidays, names)
    }

    /// Union of the named short-day lists.
    pub fn short_day_dates(&self, names: &[String]) -> Result<BTreeSet<i32>, ScheduleError> {
        union_of("short-day", &self.short_days, names)
    }
}

fn union_of(
    kind: &str,
    lists: &BTreeMap<String, BTreeSet<i32>>,
    names: &[String],
) -> Result<BTreeSet<i32>, ScheduleError> {
    let mut out = BTreeSet::new();
    for name in names {
        let list = lists.get(name).ok_or_else(|| {
            ScheduleError::parse("definition", format!("unknown {kind} list '{name}'"))
        })?;
        out.extend(list.iter().copied());
    }
    Ok(out)
}
