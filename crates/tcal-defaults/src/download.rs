//! Download configuration strings.
//!
//! | text              | meaning                                         |
//! |-------------------|-------------------------------------------------|
//! | `""`              | no periodic refresh                             |
//! | `URL`             | fetch once                                      |
//! | `URL,PERIOD`      | fetch now and then every `PERIOD`               |
//! | `auto`            | refresh from the built-in location              |
//!
//! `URL` is `http://`, `https://` or `file:`. `PERIOD` is a positive integer
//! with an optional unit: `ms`, `s` (default), `m`, `h` or `d`.

use std::fmt;
use std::time::Duration;

use tcal_core::ScheduleError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadConfig {
    Disabled,
    Once { url: String },
    Periodic { url: String, period: Duration },
    Auto,
}

impl DownloadConfig {
    pub fn parse(text: &str) -> Result<Self, ScheduleError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::Disabled);
        }
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        match trimmed.split_once(',') {
            None => Ok(Self::Once {
                url: parse_url(text, trimmed)?,
            }),
            Some((url, period)) => Ok(Self::Periodic {
                url: parse_url(text, url.trim())?,
                period: parse_period(text, period.trim())?,
            }),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Once { url } | Self::Periodic { url, .. } => Some(url),
            Self::Disabled | Self::Auto => None,
        }
    }
}

impl fmt::Display for DownloadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => Ok(()),
            Self::Once { url } => write!(f, "{url}"),
            Self::Periodic { url, period } => write!(f, "{url},{}ms", period.as_millis()),
            Self::Auto => write!(f, "auto"),
        }
    }
}

fn parse_url(config: &str, url: &str) -> Result<String, ScheduleError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ScheduleError::config(config, format!("bad url '{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" | "file" => Ok(url.to_string()),
        other => Err(ScheduleError::config(
            config,
            format!("unsupported url scheme '{other}'"),
        )),
    }
}

fn parse_period(config: &str, period: &str) -> Result<Duration, ScheduleError> {
    let split = period
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(period.len());
    let (digits, unit) = period.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| ScheduleError::config(config, format!("bad period '{period}'")))?;
    if value == 0 {
        return Err(ScheduleError::config(config, "period must be positive"));
    }
    let millis = match unit.trim() {
        "ms" => Some(value),
        "" | "s" => value.checked_mul(1_000),
        "m" => value.checked_mul(60_000),
        "h" => value.checked_mul(3_600_000),
        "d" => value.checked_mul(86_400_000),
        other => {
            return Err(ScheduleError::config(
                config,
                format!("unknown period unit '{other}'"),
            ))
        }
    };
    millis
        .map(Duration::from_millis)
        .ok_or_else(|| ScheduleError::config(config, "period overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_forms() {
        assert_eq!(DownloadConfig::parse("").unwrap(), DownloadConfig::Disabled);
        assert_eq!(DownloadConfig::parse("  ").unwrap(), DownloadConfig::Disabled);
        assert_eq!(DownloadConfig::parse("AUTO").unwrap(), DownloadConfig::Auto);
        assert_eq!(
            DownloadConfig::parse("https://example.com/d.json").unwrap(),
            DownloadConfig::Once {
                url: "https://example.com/d.json".to_string()
            }
        );
        assert_eq!(
            DownloadConfig::parse("https://example.com/d.json, 6h").unwrap(),
            DownloadConfig::Periodic {
                url: "https://example.com/d.json".to_string(),
                period: Duration::from_secs(6 * 3600),
            }
        );
        assert_eq!(
            DownloadConfig::parse("file:///tmp/d.json,90").unwrap(),
            DownloadConfig::Periodic {
                url: "file:///tmp/d.json".to_string(),
                period: Duration::from_secs(90),
            }
        );
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "not a url",
            "ftp://example.com/d.json",
            "https://example.com/d.json,",
            "https://example.com/d.json,0",
            "https://example.com/d.json,5w",
            "https://example.com/d.json,-5s",
        ] {
            let err = DownloadConfig::parse(bad).unwrap_err();
            assert!(
                matches!(err, ScheduleError::ConfigInvalid { .. }),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn display_reparses() {
        for text in ["", "auto", "https://x.test/a", "https://x.test/a,2m"] {
            let cfg = DownloadConfig::parse(text).unwrap();
            assert_eq!(DownloadConfig::parse(&cfg.to_string()).unwrap(), cfg);
        }
    }
}
