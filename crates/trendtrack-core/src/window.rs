//! Closed time ranges used to scope search queries.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};

/// A `[start, end]` range of UTC timestamps. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Returns `None` when `start` is after `end`.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    #[must_use]
    pub fn midpoint(&self) -> DateTime<Utc> {
        self.start + self.duration() / 2
    }

    /// Splits at the midpoint into `[start, mid]` and `[mid, end]`.
    ///
    /// The halves share the boundary instant, so an item published exactly at
    /// `mid` can come back from both; callers de-duplicate by id.
    #[must_use]
    pub fn bisect(&self) -> (Self, Self) {
        let mid = self.midpoint();
        (
            Self {
                start: self.start,
                end: mid,
            },
            Self {
                start: mid,
                end: self.end,
            },
        )
    }

    /// `start` in the `YYYY-MM-DDTHH:MM:SSZ` form the search API expects.
    #[must_use]
    pub fn start_param(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// `end` in the `YYYY-MM-DDTHH:MM:SSZ` form the search API expects.
    #[must_use]
    pub fn end_param(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start_param(), self.end_param())
    }
}

/// The UTC day `[00:00:00, 23:59:59]` for `date`.
#[must_use]
pub fn day_window(date: NaiveDate) -> TimeWindow {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1) - Duration::seconds(1);
    TimeWindow { start, end }
}
