//! Scripted in-process `MetricsApi` used by the collector tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use trendtrack_collector::{CollectorSettings, CredentialPool};
use trendtrack_youtube::{
    MetricsApi, SearchHit, SearchPage, SearchQuery, VideoStats, YoutubeError,
};

#[derive(Debug, Clone)]
pub struct Video {
    pub id: String,
    pub published_at: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

/// Behaves like the search/videos endpoints over a fixed catalogue: results
/// are filtered on the whole-second window parameters, newest first, and
/// paged with numeric offset tokens.
#[derive(Default)]
pub struct FakeYoutube {
    videos: Mutex<Vec<Video>>,
    /// Remaining successful calls per key. Keys not listed are unlimited.
    quota: Mutex<HashMap<String, u32>>,
    hidden_stats: Mutex<HashSet<String>>,
    search_failure: Mutex<Option<u16>>,
    stats_failure: Mutex<Option<u16>>,
    calls: Mutex<Vec<(String, &'static str)>>,
}

impl FakeYoutube {
    pub fn with_videos(videos: Vec<Video>) -> Self {
        let fake = Self::default();
        fake.set_videos(videos);
        fake
    }

    pub fn set_videos(&self, videos: Vec<Video>) {
        *self.videos.lock().unwrap() = videos;
    }

    pub fn set_quota(&self, key: &str, remaining: u32) {
        self.quota.lock().unwrap().insert(key.to_owned(), remaining);
    }

    pub fn hide_stats(&self, id: &str) {
        self.hidden_stats.lock().unwrap().insert(id.to_owned());
    }

    pub fn fail_search_with(&self, status: u16) {
        *self.search_failure.lock().unwrap() = Some(status);
    }

    pub fn fail_stats_with(&self, status: u16) {
        *self.stats_failure.lock().unwrap() = Some(status);
    }

    /// `(api_key, endpoint)` for every call received, in order.
    pub fn calls(&self) -> Vec<(String, &'static str)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> usize {
        self.calls().iter().filter(|(_, e)| *e == "search").count()
    }

    fn charge(&self, api_key: &str, endpoint: &'static str) -> Result<(), YoutubeError> {
        self.calls
            .lock()
            .unwrap()
            .push((api_key.to_owned(), endpoint));
        let mut quota = self.quota.lock().unwrap();
        if let Some(remaining) = quota.get_mut(api_key) {
            if *remaining == 0 {
                return Err(YoutubeError::QuotaExceeded {
                    reason: "quotaExceeded".to_owned(),
                });
            }
            *remaining -= 1;
        }
        Ok(())
    }

    fn failure(status: u16) -> YoutubeError {
        YoutubeError::Api {
            status,
            reason: None,
            message: format!("scripted {status}"),
        }
    }
}

fn wire_instant(param: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(param)
        .unwrap()
        .with_timezone(&Utc)
}

impl MetricsApi for FakeYoutube {
    async fn search(&self, api_key: &str, query: &SearchQuery) -> Result<SearchPage, YoutubeError> {
        self.charge(api_key, "search")?;
        if let Some(status) = *self.search_failure.lock().unwrap() {
            return Err(Self::failure(status));
        }

        let start = wire_instant(&query.window.start_param());
        let end = wire_instant(&query.window.end_param());
        let mut matching: Vec<Video> = self
            .videos
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.published_at >= start && v.published_at <= end)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let offset: usize = query
            .page_token
            .as_deref()
            .map_or(0, |t| t.parse().unwrap());
        let size = query.page_size as usize;
        let items = matching
            .iter()
            .skip(offset)
            .take(size)
            .map(|v| SearchHit {
                video_id: v.id.clone(),
                published_at: v.published_at,
            })
            .collect();
        let next = offset + size;
        let next_page_token = (next < matching.len()).then(|| next.to_string());

        Ok(SearchPage {
            items,
            next_page_token,
        })
    }

    async fn video_stats(
        &self,
        api_key: &str,
        ids: &[String],
    ) -> Result<Vec<VideoStats>, YoutubeError> {
        self.charge(api_key, "videos")?;
        if let Some(status) = *self.stats_failure.lock().unwrap() {
            return Err(Self::failure(status));
        }

        let videos = self.videos.lock().unwrap();
        let hidden = self.hidden_stats.lock().unwrap();
        Ok(ids
            .iter()
            .filter(|id| !hidden.contains(*id))
            .filter_map(|id| videos.iter().find(|v| &v.id == id))
            .map(|v| VideoStats {
                video_id: v.id.clone(),
                views: v.views,
                likes: v.likes,
                comments: v.comments,
            })
            .collect())
    }
}

pub fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, d).unwrap()
}

pub fn at(d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, d, h, min, s).unwrap()
}

/// `count` videos published on 2026-01-`day`, spread one minute apart from
/// 01:00, each with the given counters.
pub fn videos_on(day: u32, prefix: &str, count: usize, views: i64) -> Vec<Video> {
    (0..count)
        .map(|i| {
            let minute = u32::try_from(i).unwrap();
            Video {
                id: format!("{prefix}-{i:03}"),
                published_at: at(day, 1 + minute / 60, minute % 60, 0),
                views,
                likes: 1,
                comments: 0,
            }
        })
        .collect()
}

pub fn pool(keys: &[&str]) -> CredentialPool {
    CredentialPool::new(keys.iter().map(|k| (*k).to_owned()).collect()).unwrap()
}

/// No politeness delays, otherwise defaults.
pub fn settings() -> CollectorSettings {
    CollectorSettings {
        page_delay: std::time::Duration::ZERO,
        day_delay: std::time::Duration::ZERO,
        ..CollectorSettings::default()
    }
}
