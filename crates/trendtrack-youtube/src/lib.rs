//! Client for the `YouTube` Data API v3 `search` and `videos` endpoints.
//!
//! Exposes the [`MetricsApi`] seam used by the collector, with
//! [`YoutubeClient`] as the HTTP implementation. Quota exhaustion is reported
//! as its own error variant so callers can rotate credentials; transient
//! failures are retried inside the client.

pub mod api;
pub mod client;
pub mod error;
pub mod types;

mod retry;

pub use api::MetricsApi;
pub use client::YoutubeClient;
pub use error::YoutubeError;
pub use types::{SearchHit, SearchPage, SearchQuery, VideoStats};
