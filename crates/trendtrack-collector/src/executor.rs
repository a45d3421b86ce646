use trendtrack_core::TimeWindow;
use trendtrack_youtube::{MetricsApi, SearchHit, SearchQuery};

use crate::error::CollectError;
use crate::session::{ApiSession, CollectorSettings};

/// Everything one windowed query returned.
#[derive(Debug, Clone, Default)]
pub struct PageQueryResult {
    pub hits: Vec<SearchHit>,
    /// `true` when the page ceiling was hit while the API still offered a
    /// next page, so the window may hold more items than were returned.
    pub truncated: bool,
    pub pages: u32,
}

/// Runs one keyword search over `window`, following page tokens until the
/// API stops returning one or `max_pages` is reached.
///
/// Successive page requests are separated by the configured page delay.
///
/// # Errors
///
/// Propagates [`CollectError`] from the session; quota exhaustion surfaces as
/// [`CollectError::QuotaExhausted`] only after every credential was tried.
pub async fn run_paged_query<A: MetricsApi>(
    session: &mut ApiSession<'_, A>,
    keyword: &str,
    window: TimeWindow,
    settings: &CollectorSettings,
) -> Result<PageQueryResult, CollectError> {
    let max_pages = settings.max_pages.max(1);
    let mut query = SearchQuery::first_page(keyword, window, settings.page_size);
    let mut result = PageQueryResult::default();

    loop {
        let page = session.search(&query).await?;
        result.pages += 1;
        result.hits.extend(page.items);

        let Some(token) = page.next_page_token else {
            break;
        };
        if result.pages >= max_pages {
            result.truncated = true;
            break;
        }

        if !settings.page_delay.is_zero() {
            tokio::time::sleep(settings.page_delay).await;
        }
        query = query.with_page_token(token);
    }

    tracing::debug!(
        keyword,
        window = %window,
        pages = result.pages,
        hits = result.hits.len(),
        truncated = result.truncated,
        "windowed query finished"
    );

    Ok(result)
}
