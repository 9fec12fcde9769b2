use crate::TimeRange;

// ---------------------------------------------------------------------------
// SessionKind
// ---------------------------------------------------------------------------

/// Classification of a session inside a trading day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionKind {
    /// Outside any trading window (overnight, weekends).
    NoTrading,
    PreMarket,
    Regular,
    AfterMarket,
    /// A gap between two trading windows of the same day.
    Closed,
    /// Whole-day closure for an exchange holiday.
    Holiday,
    /// Regular trading on a shortened day.
    ShortDay,
}

impl SessionKind {
    pub fn is_trading(self) -> bool {
        matches!(
            self,
            SessionKind::PreMarket
                | SessionKind::Regular
                | SessionKind::AfterMarket
                | SessionKind::ShortDay
        )
    }

    pub fn is_regular(self) -> bool {
        matches!(self, SessionKind::Regular | SessionKind::ShortDay)
    }

    /// The broader kind this one narrows, if any.
    fn base(self) -> SessionKind {
        match self {
            SessionKind::ShortDay => SessionKind::Regular,
            SessionKind::Holiday | SessionKind::Closed => SessionKind::NoTrading,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::NoTrading => "NO_TRADING",
            SessionKind::PreMarket => "PRE_MARKET",
            SessionKind::Regular => "REGULAR",
            SessionKind::AfterMarket => "AFTER_MARKET",
            SessionKind::Closed => "CLOSED",
            SessionKind::Holiday => "HOLIDAY",
            SessionKind::ShortDay => "SHORT_DAY",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Immutable leaf interval of a [`Day`](crate::Day).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    range: TimeRange,
    kind: SessionKind,
    is_trading: bool,
    is_regular: bool,
}

impl Session {
    pub fn new(kind: SessionKind, range: TimeRange) -> Self {
        Self {
            range,
            kind,
            is_trading: kind.is_trading(),
            is_regular: kind.is_regular(),
        }
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn start(&self) -> i64 {
        self.range.start()
    }

    pub fn end(&self) -> i64 {
        self.range.end()
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn is_trading(&self) -> bool {
        self.is_trading
    }

    pub fn is_regular(&self) -> bool {
        self.is_regular
    }

    pub fn contains_time(&self, time: i64) -> bool {
        self.range.contains(time)
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Predicate over session attributes used by nearest-session search.
///
/// Implemented for [`SessionFilter`] and for any `Fn(&Session) -> bool`, so
/// custom combinations can be passed as closures.
pub trait SessionPredicate {
    fn accept(&self, session: &Session) -> bool;
}

impl<F> SessionPredicate for F
where
    F: Fn(&Session) -> bool,
{
    fn accept(&self, session: &Session) -> bool {
        self(session)
    }
}

/// Attribute filter: `None` fields match anything.
///
/// `kind` matches a session of that kind or one that narrows it: `ShortDay`
/// is a `Regular` session on a shortened day, while `Holiday` and `Closed`
/// are `NoTrading` time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionFilter {
    pub kind: Option<SessionKind>,
    pub trading: Option<bool>,
    pub regular: Option<bool>,
}

impl SessionFilter {
    pub const ANY: SessionFilter = SessionFilter::new(None, None, None);
    pub const TRADING: SessionFilter = SessionFilter::new(None, Some(true), None);
    pub const NON_TRADING: SessionFilter = SessionFilter::new(None, Some(false), None);
    pub const NO_TRADING: SessionFilter =
        SessionFilter::new(Some(SessionKind::NoTrading), None, None);
    pub const PRE_MARKET: SessionFilter =
        SessionFilter::new(Some(SessionKind::PreMarket), None, None);
    pub const REGULAR: SessionFilter = SessionFilter::new(None, None, Some(true));
    pub const AFTER_MARKET: SessionFilter =
        SessionFilter::new(Some(SessionKind::AfterMarket), None, None);

    pub const fn new(
        kind: Option<SessionKind>,
        trading: Option<bool>,
        regular: Option<bool>,
    ) -> Self {
        Self {
            kind,
            trading,
            regular,
        }
    }

    /// Parse a filter name as used on the command line (`trading`, `regular`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "any" => Some(Self::ANY),
            "trading" => Some(Self::TRADING),
            "non-trading" | "non_trading" => Some(Self::NON_TRADING),
            "no-trading" | "no_trading" => Some(Self::NO_TRADING),
            "pre" | "pre-market" | "pre_market" => Some(Self::PRE_MARKET),
            "regular" => Some(Self::REGULAR),
            "after" | "after-market" | "after_market" => Some(Self::AFTER_MARKET),
            _ => None,
        }
    }
}

impl SessionPredicate for SessionFilter {
    fn accept(&self, session: &Session) -> bool {
        self.kind
            .map_or(true, |k| k == session.kind() || k == session.kind().base())
            && self.trading.map_or(true, |t| t == session.is_trading())
            && self.regular.map_or(true, |r| r == session.is_regular())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(kind: SessionKind) -> Session {
        Session::new(kind, TimeRange::new(0, 10))
    }

    #[test]
    fn flags_follow_kind() {
        assert!(s(SessionKind::Regular).is_trading());
        assert!(s(SessionKind::Regular).is_regular());
        assert!(s(SessionKind::PreMarket).is_trading());
        assert!(!s(SessionKind::PreMarket).is_regular());
        assert!(s(SessionKind::ShortDay).is_regular());
        assert!(!s(SessionKind::Holiday).is_trading());
        assert!(!s(SessionKind::Closed).is_trading());
    }

    #[test]
    fn standard_filters() {
        assert!(SessionFilter::TRADING.accept(&s(SessionKind::AfterMarket)));
        assert!(!SessionFilter::TRADING.accept(&s(SessionKind::NoTrading)));
        assert!(SessionFilter::NON_TRADING.accept(&s(SessionKind::Holiday)));
        assert!(SessionFilter::REGULAR.accept(&s(SessionKind::Regular)));
        assert!(SessionFilter::ANY.accept(&s(SessionKind::Closed)));
    }

    #[test]
    fn regular_covers_short_day_and_no_trading_covers_closures() {
        assert!(SessionFilter::REGULAR.accept(&s(SessionKind::ShortDay)));
        assert!(!SessionFilter::REGULAR.accept(&s(SessionKind::PreMarket)));
        assert!(!SessionFilter::REGULAR.accept(&s(SessionKind::AfterMarket)));

        assert!(SessionFilter::NO_TRADING.accept(&s(SessionKind::NoTrading)));
        assert!(SessionFilter::NO_TRADING.accept(&s(SessionKind::Holiday)));
        assert!(SessionFilter::NO_TRADING.accept(&s(SessionKind::Closed)));
        assert!(!SessionFilter::NO_TRADING.accept(&s(SessionKind::Regular)));

        // An explicit narrow kind does not widen.
        let closed = SessionFilter::new(Some(SessionKind::Closed), None, None);
        assert!(!closed.accept(&s(SessionKind::Holiday)));
        assert!(!closed.accept(&s(SessionKind::NoTrading)));
    }

    #[test]
    fn closures_are_predicates() {
        let regular_like = |x: &Session| x.is_regular();
        assert!(regular_like.accept(&s(SessionKind::ShortDay)));
        assert!(!regular_like.accept(&s(SessionKind::PreMarket)));
    }

    #[test]
    fn filter_names() {
        assert_eq!(SessionFilter::from_name("Trading"), Some(SessionFilter::TRADING));
        assert_eq!(SessionFilter::from_name("after"), Some(SessionFilter::AFTER_MARKET));
        assert_eq!(SessionFilter::from_name("weekly"), None);
    }
}
