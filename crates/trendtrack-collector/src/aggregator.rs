use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use trendtrack_core::{DailyAggregate, StatsPolicy};
use trendtrack_youtube::{MetricsApi, SearchHit};

use crate::error::CollectError;
use crate::session::{ApiSession, CollectorSettings};

#[derive(Debug, Clone, Default)]
pub struct AggregationOutcome {
    /// One aggregate per observed date, oldest first. Growth fields are zero.
    pub aggregates: Vec<DailyAggregate>,
    pub requested: usize,
    pub resolved: usize,
    /// Batches dropped under [`StatsPolicy::BestEffort`].
    pub failed_batches: usize,
}

impl AggregationOutcome {
    #[must_use]
    pub fn missing(&self) -> usize {
        self.requested - self.resolved
    }
}

/// Fetches statistics for `hits` in batches and sums them per observed date
/// (the UTC date of each item's own publish time).
///
/// Ids the API does not resolve are left out. Under
/// [`StatsPolicy::BestEffort`] a batch failing with a non-halting API error is
/// logged and skipped; under [`StatsPolicy::Strict`] either condition fails
/// the call.
///
/// # Errors
///
/// - [`CollectError::QuotaExhausted`] / [`CollectError::RetriesExhausted`]
///   regardless of policy.
/// - [`CollectError::Api`] or [`CollectError::IncompleteStats`] under
///   [`StatsPolicy::Strict`].
pub async fn aggregate_stats<A: MetricsApi>(
    session: &mut ApiSession<'_, A>,
    keyword: &str,
    hits: &[SearchHit],
    collected_date: NaiveDate,
    settings: &CollectorSettings,
) -> Result<AggregationOutcome, CollectError> {
    let mut observed_by_id: HashMap<&str, NaiveDate> = HashMap::new();
    let mut ids: Vec<String> = Vec::new();
    for hit in hits {
        if observed_by_id
            .insert(hit.video_id.as_str(), hit.published_at.date_naive())
            .is_none()
        {
            ids.push(hit.video_id.clone());
        }
    }

    let mut by_date: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();
    let mut resolved: HashSet<String> = HashSet::new();
    let mut failed_batches = 0usize;
    let batch_size = settings.stats_batch_size.max(1);

    for (index, batch) in ids.chunks(batch_size).enumerate() {
        if index > 0 && !settings.page_delay.is_zero() {
            tokio::time::sleep(settings.page_delay).await;
        }

        let stats = match session.video_stats(batch).await {
            Ok(stats) => stats,
            Err(err) if !err.halts_run() && settings.stats_policy == StatsPolicy::BestEffort => {
                failed_batches += 1;
                tracing::warn!(
                    keyword,
                    batch = index,
                    ids = batch.len(),
                    error = %err,
                    "statistics batch failed, skipping"
                );
                continue;
            }
            Err(err) => return Err(err),
        };

        for item in stats {
            let Some(observed) = observed_by_id.get(item.video_id.as_str()).copied() else {
                continue;
            };
            if !resolved.insert(item.video_id) {
                continue;
            }
            by_date
                .entry(observed)
                .or_insert_with(|| DailyAggregate::new(keyword, observed, collected_date))
                .add_item(item.views, item.likes, item.comments);
        }
    }

    let outcome = AggregationOutcome {
        aggregates: by_date.into_values().collect(),
        requested: ids.len(),
        resolved: resolved.len(),
        failed_batches,
    };

    if outcome.missing() > 0 {
        if settings.stats_policy == StatsPolicy::Strict {
            return Err(CollectError::IncompleteStats {
                missing: outcome.missing(),
                requested: outcome.requested,
            });
        }
        tracing::warn!(
            keyword,
            missing = outcome.missing(),
            requested = outcome.requested,
            "some items returned no statistics"
        );
    }

    Ok(outcome)
}
