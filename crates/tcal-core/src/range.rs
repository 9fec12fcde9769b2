/// Closed-open interval `[start, end)` on the epoch-millisecond timeline.
///
/// Field order drives the derived ordering: by `start`, then by `end`.
/// A zero-length range is a valid value meaning "no such interval"; it
/// contains nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    pub fn new(start: i64, end: i64) -> Self {
        debug_assert!(start <= end, "TimeRange start {start} > end {end}");
        Self { start, end }
    }

    pub fn empty() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Inclusive start, epoch millis.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Exclusive end, epoch millis.
    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len_millis(&self) -> i64 {
        self.end.saturating_sub(self.start).max(0)
    }

    pub fn contains(&self, time: i64) -> bool {
        self.start <= time && time < self.end
    }

    /// True when `other` lies entirely inside this range.
    pub fn covers(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersects(&self, other: &TimeRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    /// True when `next` starts exactly where this range ends.
    pub fn abuts(&self, next: &TimeRange) -> bool {
        self.end == next.start
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_closed_open() {
        let r = TimeRange::new(100, 200);
        assert!(!r.contains(99));
        assert!(r.contains(100));
        assert!(r.contains(199));
        assert!(!r.contains(200));
    }

    #[test]
    fn zero_length_contains_nothing() {
        let r = TimeRange::new(500, 500);
        assert!(r.is_empty());
        assert!(!r.contains(500));
        assert!(!r.intersects(&TimeRange::new(0, 1_000)));
        assert!(TimeRange::empty().is_empty());
    }

    #[test]
    fn ordering_is_start_then_end() {
        let a = TimeRange::new(10, 20);
        let b = TimeRange::new(10, 30);
        let c = TimeRange::new(15, 16);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn abuts_and_covers() {
        let a = TimeRange::new(0, 10);
        let b = TimeRange::new(10, 20);
        assert!(a.abuts(&b));
        assert!(!b.abuts(&a));
        assert!(TimeRange::new(0, 20).covers(&b));
        assert!(!a.covers(&b));
    }
}
