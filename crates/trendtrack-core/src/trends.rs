//! Daily trend aggregates and the arithmetic between successive snapshots.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Totals for all items observed (published) on `observed_date`, as measured
/// on `collected_date`.
///
/// Identity is `(keyword, observed_date, collected_date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyAggregate {
    pub keyword: String,
    pub observed_date: NaiveDate,
    pub collected_date: NaiveDate,
    pub item_count: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub views_growth: i64,
    pub likes_growth: i64,
    pub comments_growth: i64,
    pub views_growth_rate: Decimal,
    pub likes_growth_rate: Decimal,
    pub comments_growth_rate: Decimal,
}

impl DailyAggregate {
    /// An empty aggregate with zero totals and zero growth.
    #[must_use]
    pub fn new(keyword: &str, observed_date: NaiveDate, collected_date: NaiveDate) -> Self {
        Self {
            keyword: keyword.to_string(),
            observed_date,
            collected_date,
            item_count: 0,
            total_views: 0,
            total_likes: 0,
            total_comments: 0,
            views_growth: 0,
            likes_growth: 0,
            comments_growth: 0,
            views_growth_rate: Decimal::ZERO,
            likes_growth_rate: Decimal::ZERO,
            comments_growth_rate: Decimal::ZERO,
        }
    }

    /// Adds one item's counters to the totals.
    pub fn add_item(&mut self, views: i64, likes: i64, comments: i64) {
        self.item_count += 1;
        self.total_views = self.total_views.saturating_add(views);
        self.total_likes = self.total_likes.saturating_add(likes);
        self.total_comments = self.total_comments.saturating_add(comments);
    }
}

/// Percentage change of `growth` relative to `previous`, rounded to two
/// decimal places. Zero when `previous` is not positive.
#[must_use]
pub fn growth_rate(growth: i64, previous: i64) -> Decimal {
    if previous <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(growth) * Decimal::ONE_HUNDRED / Decimal::from(previous)).round_dp(2)
}

/// Fills the growth fields of `current` against `previous`.
///
/// With no previous snapshot every growth field is zero.
#[must_use]
pub fn apply_growth(
    mut current: DailyAggregate,
    previous: Option<&DailyAggregate>,
) -> DailyAggregate {
    let Some(prev) = previous else {
        current.views_growth = 0;
        current.likes_growth = 0;
        current.comments_growth = 0;
        current.views_growth_rate = Decimal::ZERO;
        current.likes_growth_rate = Decimal::ZERO;
        current.comments_growth_rate = Decimal::ZERO;
        return current;
    };

    current.views_growth = current.total_views - prev.total_views;
    current.likes_growth = current.total_likes - prev.total_likes;
    current.comments_growth = current.total_comments - prev.total_comments;
    current.views_growth_rate = growth_rate(current.views_growth, prev.total_views);
    current.likes_growth_rate = growth_rate(current.likes_growth, prev.total_likes);
    current.comments_growth_rate = growth_rate(current.comments_growth, prev.total_comments);
    current
}

/// Totals across every observed date for one collection date, with the
/// change against the preceding collection date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub collected_date: NaiveDate,
    pub observed_days: usize,
    pub item_count: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    /// `None` for the first collection date.
    pub views_delta: Option<i64>,
    pub likes_delta: Option<i64>,
    pub comments_delta: Option<i64>,
    pub views_delta_rate: Option<Decimal>,
}

/// Rolls snapshot rows up per `collected_date`, oldest first.
#[must_use]
pub fn summarize_by_collection(rows: &[DailyAggregate]) -> Vec<CollectionSummary> {
    let mut by_date: BTreeMap<NaiveDate, CollectionSummary> = BTreeMap::new();

    for row in rows {
        let entry = by_date
            .entry(row.collected_date)
            .or_insert_with(|| CollectionSummary {
                collected_date: row.collected_date,
                observed_days: 0,
                item_count: 0,
                total_views: 0,
                total_likes: 0,
                total_comments: 0,
                views_delta: None,
                likes_delta: None,
                comments_delta: None,
                views_delta_rate: None,
            });
        entry.observed_days += 1;
        entry.item_count += row.item_count;
        entry.total_views += row.total_views;
        entry.total_likes += row.total_likes;
        entry.total_comments += row.total_comments;
    }

    let mut summaries: Vec<CollectionSummary> = by_date.into_values().collect();
    for i in 1..summaries.len() {
        let (prev_views, prev_likes, prev_comments) = {
            let prev = &summaries[i - 1];
            (prev.total_views, prev.total_likes, prev.total_comments)
        };
        let current = &mut summaries[i];
        let views_delta = current.total_views - prev_views;
        current.views_delta = Some(views_delta);
        current.likes_delta = Some(current.total_likes - prev_likes);
        current.comments_delta = Some(current.total_comments - prev_comments);
        current.views_delta_rate = Some(growth_rate(views_delta, prev_views));
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn aggregate(collected: u32, views: i64, likes: i64, comments: i64) -> DailyAggregate {
        let mut agg = DailyAggregate::new("X", date(19), date(collected));
        agg.item_count = 10;
        agg.total_views = views;
        agg.total_likes = likes;
        agg.total_comments = comments;
        agg
    }

    #[test]
    fn no_previous_means_zero_growth() {
        let current = aggregate(20, 150, 10, 4);
        let result = apply_growth(current, None);
        assert_eq!(result.views_growth, 0);
        assert_eq!(result.likes_growth, 0);
        assert_eq!(result.comments_growth, 0);
        assert_eq!(result.views_growth_rate, Decimal::ZERO);
        assert_eq!(result.likes_growth_rate, Decimal::ZERO);
        assert_eq!(result.comments_growth_rate, Decimal::ZERO);
        assert_eq!(result.total_views, 150, "totals must be left alone");
    }

    #[test]
    fn growth_against_previous_snapshot() {
        let previous = aggregate(20, 100, 8, 4);
        let result = apply_growth(aggregate(21, 150, 10, 3), Some(&previous));
        assert_eq!(result.views_growth, 50);
        assert_eq!(result.views_growth_rate, Decimal::new(500, 1));
        assert_eq!(result.likes_growth, 2);
        assert_eq!(result.likes_growth_rate, Decimal::new(25, 0));
        assert_eq!(result.comments_growth, -1);
        assert_eq!(result.comments_growth_rate, Decimal::new(-25, 0));
    }

    #[test]
    fn zero_previous_metric_gives_zero_rate() {
        let previous = aggregate(20, 0, 0, 0);
        let result = apply_growth(aggregate(21, 150, 5, 1), Some(&previous));
        assert_eq!(result.views_growth, 150);
        assert_eq!(result.views_growth_rate, Decimal::ZERO);
        assert_eq!(result.likes_growth_rate, Decimal::ZERO);
    }

    #[test]
    fn growth_rate_rounds_to_two_places() {
        assert_eq!(growth_rate(1, 3), Decimal::new(3333, 2));
        assert_eq!(growth_rate(2, 3), Decimal::new(6667, 2));
    }

    #[test]
    fn add_item_accumulates() {
        let mut agg = DailyAggregate::new("X", date(19), date(20));
        agg.add_item(100, 5, 1);
        agg.add_item(50, 0, 2);
        assert_eq!(agg.item_count, 2);
        assert_eq!(agg.total_views, 150);
        assert_eq!(agg.total_likes, 5);
        assert_eq!(agg.total_comments, 3);
    }

    #[test]
    fn summaries_roll_up_per_collection_date() {
        let mut other_day = aggregate(20, 50, 1, 1);
        other_day.observed_date = date(18);

        let rows = vec![
            aggregate(21, 300, 20, 10),
            aggregate(20, 100, 10, 5),
            other_day,
        ];
        let summaries = summarize_by_collection(&rows);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].collected_date, date(20));
        assert_eq!(summaries[0].observed_days, 2);
        assert_eq!(summaries[0].total_views, 150);
        assert!(summaries[0].views_delta.is_none());

        assert_eq!(summaries[1].collected_date, date(21));
        assert_eq!(summaries[1].views_delta, Some(150));
        assert_eq!(summaries[1].likes_delta, Some(9));
        assert_eq!(summaries[1].views_delta_rate, Some(Decimal::new(100, 0)));
    }
}
