//! Command handler modules for tcal.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod defaults;
pub mod query;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tcal_config::EngineConfig;
use tcal_core::{Day, Session};
use tcal_defaults::{DefaultsManager, DownloadConfig, UrlFetcher};
use tcal_registry::ScheduleRegistry;

// ---------------------------------------------------------------------------
// Engine wiring
// ---------------------------------------------------------------------------

/// Defaults manager plus registry, built from config.
pub struct Engine {
    pub registry: ScheduleRegistry,
}

impl Engine {
    /// Build the engine and bring defaults up to date before any query.
    ///
    /// A local `defaults_file` is installed first. A configured download URL
    /// is then fetched once; failure keeps whatever is installed.
    pub async fn start(config: &EngineConfig, defaults_file: Option<&str>) -> Result<Self> {
        let fetcher = UrlFetcher::new(config.fetch_timeout()).context("http client init failed")?;
        let manager = DefaultsManager::new(
            Arc::new(fetcher),
            tokio::runtime::Handle::current(),
            config.manager_options(),
        )
        .context("builtin defaults rejected")?;

        if let Some(path) = defaults_file {
            let bytes =
                std::fs::read(path).with_context(|| format!("read defaults-file failed: {path}"))?;
            let generation = manager
                .try_set_defaults(&bytes)
                .with_context(|| format!("defaults-file rejected: {path}"))?;
            tracing::info!(path, generation, "defaults file installed");
        }

        let download = DownloadConfig::parse(&config.defaults.download)
            .context("defaults.download is invalid")?;
        let url = match &download {
            DownloadConfig::Auto => config.defaults.auto_url.clone(),
            other => other.url().map(str::to_string),
        };
        if let Some(url) = url {
            if let Err(err) = manager.refresh_now(&url).await {
                tracing::warn!(
                    url = %url,
                    error = %err,
                    "defaults refresh failed; using installed data"
                );
            }
        }

        Ok(Self {
            registry: ScheduleRegistry::new(manager, config.registry_options()),
        })
    }

    pub fn defaults(&self) -> &DefaultsManager {
        self.registry.defaults()
    }

    pub fn shutdown(&self) {
        self.defaults().shutdown();
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Parse a CLI time as epoch millis or an RFC3339 timestamp.
pub fn parse_time(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms);
    }
    let dt = DateTime::parse_from_rfc3339(raw).with_context(|| {
        format!("invalid time '{raw}'. expected epoch millis or RFC3339 (2024-01-08T14:30:00Z)")
    })?;
    Ok(dt.timestamp_millis())
}

fn utc_text(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

// ---------------------------------------------------------------------------
// Output views
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub kind: &'static str,
    pub trading: bool,
    pub start: i64,
    pub end: i64,
    pub start_utc: String,
    pub end_utc: String,
}

impl From<&Session> for SessionView {
    fn from(s: &Session) -> Self {
        Self {
            kind: s.kind().as_str(),
            trading: s.is_trading(),
            start: s.start(),
            end: s.end(),
            start_utc: utc_text(s.start()),
            end_utc: utc_text(s.end()),
        }
    }
}

impl SessionView {
    pub fn print_kv(&self, prefix: &str) {
        println!(
            "{prefix}kind={} trading={} start={} end={}",
            self.kind, self.trading, self.start_utc, self.end_utc
        );
    }
}

#[derive(Debug, Serialize)]
pub struct DayView {
    pub day_id: i32,
    pub year_month_day: i32,
    pub time_zone: String,
    pub trading: bool,
    pub holiday: bool,
    pub short_day: bool,
    pub start: i64,
    pub end: i64,
    pub sessions: Vec<SessionView>,
}

impl From<&Day> for DayView {
    fn from(d: &Day) -> Self {
        Self {
            day_id: d.day_id(),
            year_month_day: d.year_month_day(),
            time_zone: d.time_zone_id().to_string(),
            trading: d.is_trading(),
            holiday: d.is_holiday(),
            short_day: d.is_short_day(),
            start: d.start(),
            end: d.end(),
            sessions: d.sessions().iter().map(SessionView::from).collect(),
        }
    }
}

impl DayView {
    pub fn print_kv(&self) {
        println!("day_id={}", self.day_id);
        println!("year_month_day={}", self.year_month_day);
        println!("time_zone={}", self.time_zone);
        println!("trading={}", self.trading);
        println!("holiday={}", self.holiday);
        println!("short_day={}", self.short_day);
        println!("start={}", utc_text(self.start));
        println!("end={}", utc_text(self.end));
        for (i, s) in self.sessions.iter().enumerate() {
            s.print_kv(&format!("session[{i}] "));
        }
    }
}

/// Pretty JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_millis_and_rfc3339() {
        assert_eq!(parse_time("1704724200000").unwrap(), 1_704_724_200_000);
        assert_eq!(
            parse_time("2024-01-08T09:30:00-05:00").unwrap(),
            1_704_724_200_000
        );
        assert!(parse_time("monday").is_err());
    }

    #[test]
    fn utc_text_uses_millis_and_z() {
        assert_eq!(utc_text(1_704_724_200_000), "2024-01-08T14:30:00.000Z");
    }
}
