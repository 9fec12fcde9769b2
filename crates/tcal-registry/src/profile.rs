//! Instrument profiles and how they map to schedule definitions.

use serde::{Deserialize, Serialize};
use tcal_core::ScheduleError;
use tcal_definition::{DefaultsData, ScheduleRef};

/// The part of an instrument profile the calendar cares about.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentProfile {
    pub symbol: String,
    /// Schedule definition: rule text, or a reference such as `NYSE`.
    pub trading_hours: String,
}

impl InstrumentProfile {
    pub fn new(symbol: impl Into<String>, trading_hours: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            trading_hours: trading_hours.into(),
        }
    }
}

/// Resolves profiles to definition strings and venue sets.
pub trait ProfileSource: Send + Sync {
    fn resolve_definition(
        &self,
        profile: &InstrumentProfile,
        venue: Option<&str>,
        defaults: &DefaultsData,
    ) -> Result<String, ScheduleError>;

    /// Ordered venues the profile's schedule declares.
    fn venues_of(
        &self,
        profile: &InstrumentProfile,
        defaults: &DefaultsData,
    ) -> Result<Vec<String>, ScheduleError>;
}

/// Reads venues from the defaults schedule a profile references.
///
/// Profiles with inline rule text have no venues.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultsProfileSource;

impl ProfileSource for DefaultsProfileSource {
    fn resolve_definition(
        &self,
        profile: &InstrumentProfile,
        venue: Option<&str>,
        defaults: &DefaultsData,
    ) -> Result<String, ScheduleError> {
        let Some(venue) = venue else {
            return Ok(profile.trading_hours.clone());
        };
        match ScheduleRef::parse(&profile.trading_hours) {
            Some(ScheduleRef { schedule, venue: None }) => {
                defaults.definition_of(schedule, Some(venue))?;
                Ok(format!("{schedule}@{venue}"))
            }
            Some(ScheduleRef { schedule, venue: Some(pinned) }) if pinned == venue => {
                Ok(format!("{schedule}@{venue}"))
            }
            _ => Err(ScheduleError::UnknownVenue {
                schedule: profile.trading_hours.clone(),
                venue: venue.to_string(),
            }),
        }
    }

    fn venues_of(
        &self,
        profile: &InstrumentProfile,
        defaults: &DefaultsData,
    ) -> Result<Vec<String>, ScheduleError> {
        match ScheduleRef::parse(&profile.trading_hours) {
            Some(reference) => defaults.venues_of(reference.schedule).ok_or_else(|| {
                ScheduleError::UnknownSchedule {
                    name: reference.schedule.to_string(),
                }
            }),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_scoping_for_references_only() {
        let defaults = DefaultsData::builtin().unwrap();
        let src = DefaultsProfileSource;

        let aapl = InstrumentProfile::new("AAPL", "NYSE");
        assert_eq!(src.resolve_definition(&aapl, None, &defaults).unwrap(), "NYSE");
        assert_eq!(
            src.resolve_definition(&aapl, Some("XNAS"), &defaults).unwrap(),
            "NYSE@XNAS"
        );
        assert!(src.resolve_definition(&aapl, Some("BATS"), &defaults).is_err());

        let inline = InstrumentProfile::new("X", "tz=UTC;r=0000-2400");
        assert!(src.venues_of(&inline, &defaults).unwrap().is_empty());
        assert!(matches!(
            src.resolve_definition(&inline, Some("XNAS"), &defaults),
            Err(ScheduleError::UnknownVenue { .. })
        ));

        let pinned = InstrumentProfile::new("Q", "NYSE@XNAS");
        assert_eq!(
            src.resolve_definition(&pinned, Some("XNAS"), &defaults).unwrap(),
            "NYSE@XNAS"
        );
        assert!(src.resolve_definition(&pinned, Some("XNYS"), &defaults).is_err());
    }
}
