//! Date-range planning and quota estimates for a collection run.

use chrono::{Days, NaiveDate};

use crate::session::{CollectorSettings, SEARCH_QUOTA_COST, STATS_QUOTA_COST};

/// Every date in `[start, end]`, newest first unless `oldest_first`.
/// Empty when `start > end`.
#[must_use]
pub fn days_in_range(start: NaiveDate, end: NaiveDate, oldest_first: bool) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = start
        .iter_days()
        .take_while(|day| *day <= end)
        .collect();
    if !oldest_first {
        days.reverse();
    }
    days
}

/// The `days` dates ending yesterday relative to `today`, as `(start, end)`.
/// `None` when `days` is zero.
#[must_use]
pub fn lookback_range(today: NaiveDate, days: u32) -> Option<(NaiveDate, NaiveDate)> {
    if days == 0 {
        return None;
    }
    let end = today.checked_sub_days(Days::new(1))?;
    let start = today.checked_sub_days(Days::new(u64::from(days)))?;
    Some((start, end))
}

/// The span `[since, yesterday]`, or `None` when `since` is not before today.
#[must_use]
pub fn since_range(since: NaiveDate, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let end = today.checked_sub_days(Days::new(1))?;
    (since <= end).then_some((since, end))
}

/// Quota cost bounds for collecting `days` days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaEstimate {
    /// One empty search page per day.
    pub min_units: u64,
    /// Every window truncated down to the split limit, every page full.
    pub max_units: u64,
}

#[must_use]
pub fn estimate_quota(days: usize, settings: &CollectorSettings) -> QuotaEstimate {
    let days = days as u64;
    let depth = settings.max_split_depth.min(16);
    let pages = u64::from(settings.max_pages.max(1));

    // Full binary tree down to `depth`: 2^(depth+1) - 1 windows, 2^depth leaves.
    let windows = (1u64 << (depth + 1)) - 1;
    let leaves = 1u64 << depth;
    let searches_per_day = windows * pages;
    let items_per_day = leaves * pages * u64::from(settings.page_size);
    let batch = settings.stats_batch_size.max(1) as u64;
    let stats_per_day = items_per_day.div_ceil(batch);

    QuotaEstimate {
        min_units: days * SEARCH_QUOTA_COST,
        max_units: days
            * (searches_per_day * SEARCH_QUOTA_COST + stats_per_day * STATS_QUOTA_COST),
    }
}
