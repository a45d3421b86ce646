//! Recursive time-window bisection around the per-query result cap.
//!
//! A truncated window is split at its midpoint and both halves are queried
//! again, down to `max_split_depth`. A window still truncated at the depth
//! limit is kept as-is and the day is flagged as a possible undercount.

use std::collections::HashSet;

use chrono::Duration;
use trendtrack_core::TimeWindow;
use trendtrack_youtube::{MetricsApi, SearchHit};

use crate::error::CollectError;
use crate::executor::run_paged_query;
use crate::session::{ApiSession, CollectorSettings};

/// Windows shorter than this are not split further; the search API only
/// resolves whole seconds.
const MIN_SPLIT_SPAN_SECS: i64 = 2;

#[derive(Debug, Clone, Default)]
pub struct PartitionOutcome {
    /// Unique hits in window order, first occurrence kept.
    pub hits: Vec<SearchHit>,
    /// Leaf windows that were still truncated when splitting stopped.
    pub truncated_leaves: usize,
    /// Windows whose results were kept (not split further).
    pub leaf_windows: usize,
    pub queries: usize,
}

impl PartitionOutcome {
    /// `true` when at least one leaf hit the result cap, so the hit list is a
    /// lower bound.
    #[must_use]
    pub fn undercount(&self) -> bool {
        self.truncated_leaves > 0
    }
}

/// Collects every hit for `keyword` in `window`, bisecting truncated windows.
///
/// Every leaf is resolved before this returns. Halves share their boundary
/// instant, so results are de-duplicated by video id.
///
/// # Errors
///
/// Propagates the first [`CollectError`] from the underlying queries.
pub async fn partition_window<A: MetricsApi>(
    session: &mut ApiSession<'_, A>,
    keyword: &str,
    window: TimeWindow,
    settings: &CollectorSettings,
) -> Result<PartitionOutcome, CollectError> {
    let mut outcome = PartitionOutcome::default();
    let mut seen: HashSet<String> = HashSet::new();

    // Depth-first with the earlier half on top keeps hits in window order.
    let mut pending: Vec<(TimeWindow, u32)> = vec![(window, 0)];

    while let Some((current, depth)) = pending.pop() {
        let result = run_paged_query(session, keyword, current, settings).await?;
        outcome.queries += 1;

        let splittable = depth < settings.max_split_depth
            && current.duration() >= Duration::seconds(MIN_SPLIT_SPAN_SECS);

        if result.truncated && splittable {
            let (earlier, later) = current.bisect();
            tracing::info!(
                keyword,
                window = %current,
                depth,
                "window truncated, splitting"
            );
            pending.push((later, depth + 1));
            pending.push((earlier, depth + 1));
            continue;
        }

        if result.truncated {
            outcome.truncated_leaves += 1;
            tracing::warn!(
                keyword,
                window = %current,
                depth,
                hits = result.hits.len(),
                "window still truncated at split limit, possible undercount"
            );
        }

        outcome.leaf_windows += 1;
        for hit in result.hits {
            if seen.insert(hit.video_id.clone()) {
                outcome.hits.push(hit);
            }
        }
    }

    Ok(outcome)
}
