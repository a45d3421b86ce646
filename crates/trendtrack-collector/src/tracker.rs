//! Day-by-day orchestration of a collection run.
//!
//! For each requested day: query the UTC day window (bisecting as needed),
//! aggregate statistics per observed date, compute growth against the latest
//! earlier snapshot and write through the guarded upsert. Quota or retry
//! exhaustion halts the run and reports the days left to resume.

use chrono::NaiveDate;
use trendtrack_core::{apply_growth, day_window};
use trendtrack_db::{SnapshotStore, UpsertOutcome};
use trendtrack_youtube::MetricsApi;

use crate::aggregator::aggregate_stats;
use crate::credentials::CredentialPool;
use crate::error::CollectError;
use crate::partitioner::partition_window;
use crate::session::{ApiCallCounts, ApiSession, CollectorSettings};

/// Terminal state of one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOutcome {
    /// At least one aggregate was written.
    Saved {
        rows: usize,
        items: i64,
        /// Some window hit the result cap at the split limit; `items` is a
        /// lower bound.
        undercount: bool,
    },
    /// Every aggregate was refused because stored rows hold more items.
    Skipped { items: i64, stored_items: i64 },
    /// The search returned nothing, or no item resolved to statistics.
    NoData,
    /// A non-halting error; the run moved on to the next day.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReport {
    pub date: NaiveDate,
    pub outcome: DayOutcome,
}

/// Summary of one keyword run.
#[derive(Debug, Clone)]
pub struct TrackReport {
    pub keyword: String,
    pub collected_date: NaiveDate,
    pub days_requested: usize,
    pub days: Vec<DayReport>,
    /// Set when quota or retry exhaustion stopped the run early.
    pub halted: Option<String>,
    /// Days not finished because of the halt, in processing order.
    pub remaining: Vec<NaiveDate>,
    pub calls: ApiCallCounts,
}

impl TrackReport {
    fn new(keyword: &str, collected_date: NaiveDate, days_requested: usize) -> Self {
        Self {
            keyword: keyword.to_owned(),
            collected_date,
            days_requested,
            days: Vec::new(),
            halted: None,
            remaining: Vec::new(),
            calls: ApiCallCounts::default(),
        }
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    #[must_use]
    pub fn days_completed(&self) -> usize {
        self.days.len()
    }

    fn count(&self, pred: impl Fn(&DayOutcome) -> bool) -> usize {
        self.days.iter().filter(|d| pred(&d.outcome)).count()
    }

    #[must_use]
    pub fn saved_days(&self) -> usize {
        self.count(|o| matches!(o, DayOutcome::Saved { .. }))
    }

    #[must_use]
    pub fn skipped_days(&self) -> usize {
        self.count(|o| matches!(o, DayOutcome::Skipped { .. }))
    }

    #[must_use]
    pub fn no_data_days(&self) -> usize {
        self.count(|o| matches!(o, DayOutcome::NoData))
    }

    #[must_use]
    pub fn failed_days(&self) -> usize {
        self.count(|o| matches!(o, DayOutcome::Failed { .. }))
    }

    /// Days saved from at least one window still truncated at the split
    /// limit.
    #[must_use]
    pub fn undercount_days(&self) -> Vec<NaiveDate> {
        self.days
            .iter()
            .filter(|d| {
                matches!(
                    d.outcome,
                    DayOutcome::Saved {
                        undercount: true,
                        ..
                    }
                )
            })
            .map(|d| d.date)
            .collect()
    }

    #[must_use]
    pub fn rows_saved(&self) -> usize {
        self.days
            .iter()
            .map(|d| match d.outcome {
                DayOutcome::Saved { rows, .. } => rows,
                _ => 0,
            })
            .sum()
    }

    /// Earliest and latest unfinished day, for resuming with
    /// `--start`/`--end`.
    #[must_use]
    pub fn resume_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.remaining.iter().min()?;
        let last = self.remaining.iter().max()?;
        Some((*first, *last))
    }
}

/// Runs collections against one API, credential pool and snapshot store.
pub struct Tracker<'a, A, S> {
    session: ApiSession<'a, A>,
    store: &'a S,
    settings: CollectorSettings,
}

impl<'a, A: MetricsApi, S: SnapshotStore> Tracker<'a, A, S> {
    #[must_use]
    pub fn new(
        api: &'a A,
        credentials: CredentialPool,
        store: &'a S,
        settings: CollectorSettings,
    ) -> Self {
        Self {
            session: ApiSession::new(api, credentials),
            store,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialPool {
        self.session.credentials()
    }

    /// Makes every credential usable again. Exhaustion otherwise persists
    /// across [`Tracker::run`] calls, since quota refills only once a day.
    pub fn reset_credentials(&mut self) {
        self.session.reset_credentials();
    }

    /// Collects `days` in the given order for `keyword`, stamping rows with
    /// `collected_date`.
    ///
    /// Call counters start from zero; credentials already exhausted by an
    /// earlier run stay exhausted. Non-halting per-day errors are recorded as
    /// [`DayOutcome::Failed`]; quota or retry exhaustion ends the run with
    /// [`TrackReport::halted`] set.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::StoreFailed`] with the number of finished days
    /// when the snapshot store fails; the run cannot continue without it.
    pub async fn run(
        &mut self,
        keyword: &str,
        days: &[NaiveDate],
        collected_date: NaiveDate,
    ) -> Result<TrackReport, CollectError> {
        self.session.reset_calls();
        let mut report = TrackReport::new(keyword, collected_date, days.len());
        let total = days.len();

        tracing::info!(
            keyword,
            %collected_date,
            days = total,
            credentials = self.session.credentials().len(),
            "starting collection run"
        );

        for (index, day) in days.iter().copied().enumerate() {
            if index > 0 && !self.settings.day_delay.is_zero() {
                tokio::time::sleep(self.settings.day_delay).await;
            }

            tracing::info!(keyword, date = %day, "[{}/{}] collecting", index + 1, total);

            match self.collect_day(keyword, day, collected_date).await {
                Ok(outcome) => {
                    log_outcome(keyword, day, &outcome);
                    report.days.push(DayReport { date: day, outcome });
                }
                Err(err) if err.halts_run() => {
                    tracing::error!(
                        keyword,
                        date = %day,
                        completed = index,
                        total,
                        error = %err,
                        "halting collection run"
                    );
                    report.halted = Some(err.to_string());
                    report.remaining = days[index..].to_vec();
                    break;
                }
                Err(CollectError::Store(err)) => {
                    tracing::error!(
                        keyword,
                        date = %day,
                        completed = report.days_completed(),
                        total,
                        error = %err,
                        "snapshot store failed, aborting collection run"
                    );
                    return Err(CollectError::StoreFailed {
                        days_completed: report.days_completed(),
                        days_requested: total,
                        source: err,
                    });
                }
                Err(err) => {
                    tracing::error!(keyword, date = %day, error = %err, "day failed");
                    report.days.push(DayReport {
                        date: day,
                        outcome: DayOutcome::Failed {
                            reason: err.to_string(),
                        },
                    });
                }
            }
        }

        report.calls = self.session.calls();
        Ok(report)
    }

    async fn collect_day(
        &mut self,
        keyword: &str,
        day: NaiveDate,
        collected_date: NaiveDate,
    ) -> Result<DayOutcome, CollectError> {
        let partition =
            partition_window(&mut self.session, keyword, day_window(day), &self.settings).await?;
        if partition.hits.is_empty() {
            return Ok(DayOutcome::NoData);
        }

        let aggregation = aggregate_stats(
            &mut self.session,
            keyword,
            &partition.hits,
            collected_date,
            &self.settings,
        )
        .await?;
        if aggregation.aggregates.is_empty() {
            return Ok(DayOutcome::NoData);
        }

        let mut rows = 0usize;
        let mut items = 0i64;
        let mut stored_items = 0i64;

        for aggregate in aggregation.aggregates {
            let previous = self
                .store
                .get_previous(keyword, aggregate.observed_date, collected_date)
                .await?;
            let row = apply_growth(aggregate, previous.as_ref());
            items += row.item_count;

            match self.store.upsert(&row).await? {
                UpsertOutcome::Saved => rows += 1,
                UpsertOutcome::Skipped => {
                    let existing = self
                        .store
                        .get_existing(keyword, row.observed_date, collected_date)
                        .await?;
                    let existing_items = existing.map_or(0, |e| e.item_count);
                    stored_items += existing_items;
                    tracing::info!(
                        keyword,
                        observed_date = %row.observed_date,
                        %collected_date,
                        new_items = row.item_count,
                        existing_items,
                        "stored snapshot has more items, keeping it"
                    );
                }
            }
        }

        if rows == 0 {
            return Ok(DayOutcome::Skipped {
                items,
                stored_items,
            });
        }

        Ok(DayOutcome::Saved {
            rows,
            items,
            undercount: partition.undercount(),
        })
    }
}

fn log_outcome(keyword: &str, day: NaiveDate, outcome: &DayOutcome) {
    match outcome {
        DayOutcome::Saved {
            rows,
            items,
            undercount,
        } => {
            if *undercount {
                tracing::warn!(keyword, date = %day, rows, items, "saved lower-bound estimate");
            } else {
                tracing::info!(keyword, date = %day, rows, items, "saved");
            }
        }
        DayOutcome::Skipped {
            items,
            stored_items,
        } => tracing::info!(keyword, date = %day, items, stored_items, "skipped"),
        DayOutcome::NoData => tracing::info!(keyword, date = %day, "no data"),
        DayOutcome::Failed { .. } => {}
    }
}
