use super::FetchError;
use crate::domain::news::NewsItem;
use crate::domain::ticker::Ticker;
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_RECENCY_DAYS: i64 = 3;
/// Longest accepted recency window, about ten years.
pub const MAX_RECENCY_DAYS: i64 = 3650;
pub const DEFAULT_NEWS_QUERY_HINT: &str = "stock";

#[async_trait::async_trait]
pub trait NewsFeedProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Every entry the feed returns for `query`, in feed order.
    async fn search(&self, query: &str) -> Result<Vec<NewsItem>, FetchError>;
}

/// Search phrase for a ticker, e.g. `SPY stock`.
pub fn news_query(ticker: &Ticker, hint: &str) -> String {
    let hint = hint.trim();
    if hint.is_empty() {
        ticker.to_string()
    } else {
        format!("{ticker} {hint}")
    }
}

/// Keeps items published at or after `now - window`, preserving order. A
/// window reaching past the representable range keeps everything.
pub fn filter_recent(items: Vec<NewsItem>, window: Duration, now: DateTime<Utc>) -> Vec<NewsItem> {
    let Some(cutoff) = now.checked_sub_signed(window) else {
        return items;
    };
    items
        .into_iter()
        .filter(|item| item.published_at >= cutoff)
        .collect()
}

pub async fn try_fetch_recent_news(
    provider: &dyn NewsFeedProvider,
    query: &str,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<NewsItem>, FetchError> {
    if query.trim().is_empty() {
        tracing::warn!("empty news query; returning no items");
        return Ok(Vec::new());
    }

    let items = provider.search(query).await?;
    let total = items.len();
    let recent = filter_recent(items, window, now);

    tracing::debug!(
        provider = provider.provider_name(),
        query,
        total,
        recent = recent.len(),
        window_hours = window.num_hours(),
        "news feed fetched"
    );
    Ok(recent)
}

/// Recent headlines for `query`. Feed failures are logged and reported as
/// no news.
pub async fn fetch_recent_news(
    provider: &dyn NewsFeedProvider,
    query: &str,
    window: Duration,
    now: DateTime<Utc>,
) -> Vec<NewsItem> {
    match try_fetch_recent_news(provider, query, window, now).await {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(
                provider = provider.provider_name(),
                query,
                error = %err,
                "news feed unavailable"
            );
            Vec::new()
        }
    }
}
