use thiserror::Error;

/// Errors surfaced by schedule construction, defaults handling and resolution.
///
/// Query operations never return this type: a time, day id or YearMonthDay
/// that falls outside the supported range, or a search that exhausts its
/// bound, yields `None` instead. The `OutOfRange` and `NotFound` variants
/// exist for callers (CLI, services) that want to turn such a `None` into a
/// reportable error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{what} {value} is outside the supported range 0001-01-02..9999-12-30")]
    OutOfRange { what: &'static str, value: i64 },

    #[error("no {what} found within the search bound")]
    NotFound { what: &'static str },

    #[error("failed to parse {context}: {message}")]
    ParseFailure { context: String, message: String },

    #[error("fetch from '{url}' failed: {message}")]
    FetchFailure { url: String, message: String },

    #[error("invalid download config '{value}': {reason}")]
    ConfigInvalid { value: String, reason: String },

    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    #[error("unknown schedule '{name}'")]
    UnknownSchedule { name: String },

    #[error("venue '{venue}' is not declared for schedule '{schedule}'")]
    UnknownVenue { schedule: String, venue: String },
}

impl ScheduleError {
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseFailure {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchFailure {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn config(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            value: value.into(),
            reason: reason.into(),
        }
    }
}
