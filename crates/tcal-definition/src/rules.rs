//! Rule-set definitions.
//!
//! A definition is a `;`-separated list of `key=value` pairs:
//!
//! | key    | value                                   | default  |
//! |--------|-----------------------------------------|----------|
//! | `name` | display name of the schedule            | (text)   |
//! | `tz`   | IANA time zone id                       | `UTC`    |
//! | `hd`   | comma list of holiday list names        | none     |
//! | `sd`   | comma list of short-day list names      | none     |
//! | `days` | ISO weekdays that trade, e.g. `12345`   | `12345`  |
//! | `p`    | pre-market window `HHMM-HHMM`           | none     |
//! | `r`    | regular window                          | none     |
//! | `a`    | after-market window                     | none     |
//! | `rs`   | regular window on short days            | `r`      |
//!
//! Window ends may be `2400` (local end of day). Windows must not overlap
//! and must appear in `p`, `r`, `a` order.
//!
//! A definition without any `=` is a reference to a schedule declared in the
//! defaults payload, optionally scoped to a venue: `NYSE` or `NYSE@XNAS`.

use tcal_core::ScheduleError;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Local wall-clock window in minutes after midnight, `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start_min: u16,
    pub end_min: u16,
}

impl Window {
    pub fn parse(text: &str) -> Result<Self, ScheduleError> {
        let (from, to) = text
            .split_once('-')
            .ok_or_else(|| ScheduleError::parse("window", format!("'{text}' is not HHMM-HHMM")))?;
        let start_min = parse_hhmm(from.trim())?;
        let end_min = parse_hhmm(to.trim())?;
        if start_min >= end_min {
            return Err(ScheduleError::parse(
                "window",
                format!("'{text}' ends before it starts"),
            ));
        }
        Ok(Self { start_min, end_min })
    }
}

fn parse_hhmm(text: &str) -> Result<u16, ScheduleError> {
    let bad = || ScheduleError::parse("window", format!("'{text}' is not a HHMM time"));
    if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let hh: u16 = text[..2].parse().map_err(|_| bad())?;
    let mm: u16 = text[2..].parse().map_err(|_| bad())?;
    if mm >= 60 || hh * 60 + mm > MINUTES_PER_DAY {
        return Err(bad());
    }
    Ok(hh * 60 + mm)
}

/// A definition that names a defaults schedule instead of spelling out rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleRef<'a> {
    pub schedule: &'a str,
    pub venue: Option<&'a str>,
}

impl<'a> ScheduleRef<'a> {
    /// `Some` when `definition` is a reference rather than a rule set.
    pub fn parse(definition: &'a str) -> Option<Self> {
        let text = definition.trim();
        if text.is_empty() || text.contains('=') {
            return None;
        }
        match text.split_once('@') {
            Some((schedule, venue)) => Some(Self {
                schedule: schedule.trim(),
                venue: Some(venue.trim()),
            }),
            None => Some(Self {
                schedule: text,
                venue: None,
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleSet {
    pub name: Option<String>,
    pub time_zone: String,
    pub holiday_lists: Vec<String>,
    pub short_day_lists: Vec<String>,
    /// Indexed by ISO weekday - 1 (Monday = 0).
    pub weekdays: [bool; 7],
    pub pre: Option<Window>,
    pub regular: Option<Window>,
    pub after: Option<Window>,
    pub short_regular: Option<Window>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            name: None,
            time_zone: "UTC".to_string(),
            holiday_lists: Vec::new(),
            short_day_lists: Vec::new(),
            weekdays: [true, true, true, true, true, false, false],
            pre: None,
            regular: None,
            after: None,
            short_regular: None,
        }
    }
}

impl RuleSet {
    pub fn parse(definition: &str) -> Result<Self, ScheduleError> {
        let mut rules = RuleSet::default();
        let mut seen: Vec<&str> = Vec::new();

        for pair in definition.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                ScheduleError::parse("definition", format!("'{pair}' is not key=value"))
            })?;
            let (key, value) = (key.trim(), value.trim());
            if seen.contains(&key) {
                return Err(ScheduleError::parse(
                    "definition",
                    format!("duplicate key '{key}'"),
                ));
            }
            seen.push(key);

            match key {
                "name" => rules.name = Some(value.to_string()),
                "tz" => rules.time_zone = value.to_string(),
                "hd" => rules.holiday_lists = split_list(value),
                "sd" => rules.short_day_lists = split_list(value),
                "days" => rules.weekdays = parse_weekdays(value)?,
                "p" => rules.pre = Some(Window::parse(value)?),
                "r" => rules.regular = Some(Window::parse(value)?),
                "a" => rules.after = Some(Window::parse(value)?),
                "rs" => rules.short_regular = Some(Window::parse(value)?),
                other => {
                    return Err(ScheduleError::parse(
                        "definition",
                        format!("unknown key '{other}'"),
                    ))
                }
            }
        }

        if seen.is_empty() {
            return Err(ScheduleError::parse("definition", "definition is empty"));
        }
        rules.check_order()?;
        Ok(rules)
    }

    /// True when compiling these rules consults defaults lists.
    pub fn uses_defaults(&self) -> bool {
        !self.holiday_lists.is_empty() || !self.short_day_lists.is_empty()
    }

    /// Windows of a normal trading day in time order.
    pub fn windows(&self) -> Vec<(tcal_core::SessionKind, Window)> {
        use tcal_core::SessionKind::*;
        [(PreMarket, self.pre), (Regular, self.regular), (AfterMarket, self.after)]
            .into_iter()
            .filter_map(|(kind, w)| w.map(|w| (kind, w)))
            .collect()
    }

    /// Windows of a short trading day: the regular window becomes a
    /// `ShortDay` session using `rs` when given.
    pub fn short_day_windows(&self) -> Vec<(tcal_core::SessionKind, Window)> {
        use tcal_core::SessionKind::*;
        let short = self.short_regular.or(self.regular);
        [(PreMarket, self.pre), (ShortDay, short), (AfterMarket, self.after)]
            .into_iter()
            .filter_map(|(kind, w)| w.map(|w| (kind, w)))
            .collect()
    }

    fn check_order(&self) -> Result<(), ScheduleError> {
        for windows in [self.windows(), self.short_day_windows()] {
            for pair in windows.windows(2) {
                let ((ka, a), (kb, b)) = (pair[0], pair[1]);
                if a.end_min > b.start_min {
                    return Err(ScheduleError::parse(
                        "definition",
                        format!("{ka} window overlaps {kb} window"),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_weekdays(value: &str) -> Result<[bool; 7], ScheduleError> {
    let mut days = [false; 7];
    for c in value.chars().filter(|c| *c != ',') {
        match c.to_digit(10) {
            Some(d @ 1..=7) => days[d as usize - 1] = true,
            _ => {
                return Err(ScheduleError::parse(
                    "definition",
                    format!("'{value}' is not a list of ISO weekdays 1..7"),
                ))
            }
        }
    }
    Ok(days)
}
