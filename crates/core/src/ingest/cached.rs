use super::market::MarketDataProvider;
use super::news::NewsFeedProvider;
use super::FetchError;
use crate::cache::TtlCache;
use crate::domain::market::{Interval, MarketBar};
use crate::domain::news::NewsItem;
use crate::domain::ticker::Ticker;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MarketKey {
    ticker: Ticker,
    lookback_days: u32,
    interval: Interval,
}

/// Memoizes successful market-data responses per (ticker, lookback, interval).
/// Errors pass through uncached so the next call retries the provider.
pub struct CachedMarketData {
    inner: Arc<dyn MarketDataProvider>,
    cache: TtlCache<MarketKey, Vec<MarketBar>>,
}

impl CachedMarketData {
    pub fn new(inner: Arc<dyn MarketDataProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for CachedMarketData {
    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    async fn fetch_bars(
        &self,
        ticker: &Ticker,
        lookback_days: u32,
        interval: Interval,
    ) -> Result<Vec<MarketBar>, FetchError> {
        let key = MarketKey {
            ticker: ticker.clone(),
            lookback_days,
            interval,
        };
        if let Some(bars) = self.cache.get(&key) {
            tracing::debug!(%ticker, lookback_days, %interval, "market cache hit");
            return Ok(bars);
        }

        let bars = self.inner.fetch_bars(ticker, lookback_days, interval).await?;
        self.cache.insert(key, bars.clone());
        Ok(bars)
    }
}

/// Memoizes the unfiltered feed per query. Recency filtering happens after
/// the cache, so a cached feed never leaks entries older than the window.
pub struct CachedNewsFeed {
    inner: Arc<dyn NewsFeedProvider>,
    cache: TtlCache<String, Vec<NewsItem>>,
}

impl CachedNewsFeed {
    pub fn new(inner: Arc<dyn NewsFeedProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait::async_trait]
impl NewsFeedProvider for CachedNewsFeed {
    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    async fn search(&self, query: &str) -> Result<Vec<NewsItem>, FetchError> {
        let key = query.to_string();
        if let Some(items) = self.cache.get(&key) {
            tracing::debug!(query, "news cache hit");
            return Ok(items);
        }

        let items = self.inner.search(query).await?;
        self.cache.insert(key, items.clone());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingFeed {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl NewsFeedProvider for CountingFeed {
        fn provider_name(&self) -> &'static str {
            "counting"
        }

        async fn search(&self, query: &str) -> Result<Vec<NewsItem>, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if query == "broken" {
                return Err(FetchError::Status {
                    provider: "counting",
                    status: 502,
                    body: String::new(),
                });
            }
            Ok(vec![NewsItem {
                title: format!("{query} #{n}"),
                link: "https://news.example.com/a".to_string(),
                published_at: Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap(),
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_queries_hit_the_cache_until_expiry() {
        let inner = Arc::new(CountingFeed::default());
        let cached = CachedNewsFeed::new(inner.clone(), Duration::from_secs(1800));

        let first = cached.search("SPY stock").await.unwrap();
        let second = cached.search("SPY stock").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        cached.search("QQQ stock").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cached_entries(), 2);

        tokio::time::advance(Duration::from_secs(1801)).await;
        let third = cached.search("SPY stock").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(third[0].title, "SPY stock #2");
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let inner = Arc::new(CountingFeed::default());
        let cached = CachedNewsFeed::new(inner.clone(), Duration::from_secs(1800));

        assert!(cached.search("broken").await.is_err());
        assert!(cached.search("broken").await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cached_entries(), 0);
    }
}
