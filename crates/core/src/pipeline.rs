use crate::aggregate::aggregate;
use crate::config::Settings;
use crate::domain::market::{Interval, MarketBar};
use crate::domain::news::NewsItem;
use crate::domain::ticker::Ticker;
use crate::ingest::market::DEFAULT_LOOKBACK_DAYS;
use crate::ingest::news::{news_query, DEFAULT_NEWS_QUERY_HINT, DEFAULT_RECENCY_DAYS};
use crate::ingest::{
    fetch_market_snapshot, fetch_recent_news, CachedMarketData, CachedNewsFeed, GoogleNewsRss,
    MarketDataProvider, NewsFeedProvider, YahooChartProvider,
};
use crate::report::PipelineReport;
use crate::sentiment::{PolarityAnalyzer, SentimentScorer, VaderAnalyzer};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub lookback_days: u32,
    pub interval: Interval,
    pub recency_window: chrono::Duration,
    pub news_query_hint: String,
    pub market_cache_ttl: Duration,
    pub news_cache_ttl: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            interval: Interval::Day,
            recency_window: chrono::Duration::days(DEFAULT_RECENCY_DAYS),
            news_query_hint: DEFAULT_NEWS_QUERY_HINT.to_string(),
            market_cache_ttl: Duration::from_secs(60 * 60),
            news_cache_ttl: Duration::from_secs(30 * 60),
        }
    }
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            lookback_days: settings.lookback_days,
            interval: settings.interval,
            recency_window: chrono::Duration::days(settings.recency_days),
            news_query_hint: settings.news_query_hint.clone(),
            market_cache_ttl: Duration::from_secs(settings.market_cache_ttl_secs),
            news_cache_ttl: Duration::from_secs(settings.news_cache_ttl_secs),
        }
    }
}

/// fetch -> filter -> score -> aggregate for one ticker at a time.
///
/// Providers sit behind TTL caches owned by the pipeline, so one `Pipeline`
/// should be shared (e.g. behind an `Arc`) by everything that serves reports.
pub struct Pipeline {
    market: CachedMarketData,
    news: CachedNewsFeed,
    analyzer: Arc<dyn PolarityAnalyzer>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        news: Arc<dyn NewsFeedProvider>,
        analyzer: Arc<dyn PolarityAnalyzer>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            market: CachedMarketData::new(market, options.market_cache_ttl),
            news: CachedNewsFeed::new(news, options.news_cache_ttl),
            analyzer,
            options,
        }
    }

    /// Production wiring: Yahoo chart data, Google News RSS and VADER.
    pub fn from_settings(settings: &Settings, options: PipelineOptions) -> anyhow::Result<Self> {
        let market = YahooChartProvider::from_settings(settings)?;
        let news = GoogleNewsRss::from_settings(settings)?;
        Ok(Self::new(
            Arc::new(market),
            Arc::new(news),
            Arc::new(VaderAnalyzer::new()),
            options,
        ))
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub async fn market_snapshot(&self, ticker: &Ticker) -> Vec<MarketBar> {
        fetch_market_snapshot(
            &self.market,
            ticker,
            self.options.lookback_days,
            self.options.interval,
        )
        .await
    }

    pub async fn recent_news(&self, ticker: &Ticker, now: DateTime<Utc>) -> Vec<NewsItem> {
        let query = news_query(ticker, &self.options.news_query_hint);
        fetch_recent_news(&self.news, &query, self.options.recency_window, now).await
    }

    pub fn scorer(&self) -> SentimentScorer<'_> {
        SentimentScorer::new(self.analyzer.as_ref())
    }

    pub async fn run(&self, ticker: &Ticker) -> PipelineReport {
        self.run_at(ticker, Utc::now()).await
    }

    /// Same as [`Pipeline::run`] with an explicit clock for the recency window.
    pub async fn run_at(&self, ticker: &Ticker, now: DateTime<Utc>) -> PipelineReport {
        let run_id = Uuid::new_v4();

        let (bars, news) = tokio::join!(self.market_snapshot(ticker), self.recent_news(ticker, now));
        let news = self.scorer().score_all(news);
        let recommendation = aggregate(&news);

        tracing::info!(
            %run_id,
            %ticker,
            bars = bars.len(),
            news = news.len(),
            signal = recommendation.signal().map(|s| s.as_str()).unwrap_or("unavailable"),
            mean_sentiment = ?recommendation.mean_sentiment(),
            "pipeline run complete"
        );

        PipelineReport {
            run_id,
            ticker: ticker.clone(),
            generated_at: now,
            bars,
            news,
            recommendation,
        }
    }
}
