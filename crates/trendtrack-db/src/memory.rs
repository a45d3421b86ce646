//! In-process [`SnapshotStore`] for dry runs and tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;
use trendtrack_core::DailyAggregate;

use crate::snapshots::{SnapshotStore, UpsertOutcome};
use crate::DbError;

type SnapshotKey = (String, NaiveDate, NaiveDate);

/// Applies the same non-regression guard as the Postgres store.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    rows: Mutex<BTreeMap<SnapshotKey, DailyAggregate>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with rows, bypassing the guard.
    #[must_use]
    pub fn with_rows(rows: impl IntoIterator<Item = DailyAggregate>) -> Self {
        let store = Self::default();
        {
            let mut map = store.lock();
            for row in rows {
                map.insert(key_of(&row), row);
            }
        }
        store
    }

    /// All rows ordered by `(keyword, observed_date, collected_date)`.
    #[must_use]
    pub fn rows(&self) -> Vec<DailyAggregate> {
        self.lock().values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<SnapshotKey, DailyAggregate>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn key_of(aggregate: &DailyAggregate) -> SnapshotKey {
    (
        aggregate.keyword.clone(),
        aggregate.observed_date,
        aggregate.collected_date,
    )
}

impl SnapshotStore for MemorySnapshotStore {
    async fn get_previous(
        &self,
        keyword: &str,
        observed_date: NaiveDate,
        before: NaiveDate,
    ) -> Result<Option<DailyAggregate>, DbError> {
        let rows = self.lock();
        Ok(rows
            .values()
            .filter(|row| {
                row.keyword == keyword
                    && row.observed_date == observed_date
                    && row.collected_date < before
            })
            .max_by_key(|row| row.collected_date)
            .cloned())
    }

    async fn get_existing(
        &self,
        keyword: &str,
        observed_date: NaiveDate,
        collected_date: NaiveDate,
    ) -> Result<Option<DailyAggregate>, DbError> {
        let key = (keyword.to_owned(), observed_date, collected_date);
        Ok(self.lock().get(&key).cloned())
    }

    async fn upsert(&self, aggregate: &DailyAggregate) -> Result<UpsertOutcome, DbError> {
        let mut rows = self.lock();
        let key = key_of(aggregate);
        if rows
            .get(&key)
            .is_some_and(|stored| stored.item_count > aggregate.item_count)
        {
            return Ok(UpsertOutcome::Skipped);
        }
        rows.insert(key, aggregate.clone());
        Ok(UpsertOutcome::Saved)
    }
}
