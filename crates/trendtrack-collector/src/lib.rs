//! Quota-aware collection of daily trend snapshots.
//!
//! The [`Tracker`] walks a date range one UTC day at a time. Each day's
//! search is bisected by the partitioner while results stay truncated, the
//! hits are reduced to per-day sums by the aggregator and stored through the
//! non-regressing upsert of a [`trendtrack_db::SnapshotStore`]. All API calls
//! share one [`CredentialPool`] that rotates keys on quota exhaustion.

pub mod aggregator;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod partitioner;
pub mod plan;
pub mod session;
pub mod tracker;

pub use aggregator::{aggregate_stats, AggregationOutcome};
pub use credentials::{Credential, CredentialPool};
pub use error::CollectError;
pub use executor::{run_paged_query, PageQueryResult};
pub use partitioner::{partition_window, PartitionOutcome};
pub use plan::{days_in_range, estimate_quota, lookback_range, since_range, QuotaEstimate};
pub use session::{ApiCallCounts, ApiSession, CollectorSettings};
pub use tracker::{DayOutcome, DayReport, TrackReport, Tracker};
