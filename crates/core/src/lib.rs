pub mod aggregate;
pub mod cache;
pub mod domain;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod sentiment;

pub use aggregate::aggregate;
pub use pipeline::{Pipeline, PipelineOptions};
pub use report::PipelineReport;

pub mod config {
    use crate::domain::market::Interval;
    use crate::domain::ticker::Ticker;
    use crate::ingest::market::DEFAULT_LOOKBACK_DAYS;
    use crate::ingest::news::{DEFAULT_NEWS_QUERY_HINT, DEFAULT_RECENCY_DAYS, MAX_RECENCY_DAYS};
    use anyhow::Context;
    use std::str::FromStr;

    const DEFAULT_MARKET_DATA_BASE_URL: &str = "https://query1.finance.yahoo.com";
    const DEFAULT_NEWS_FEED_BASE_URL: &str = "https://news.google.com";
    const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_HTTP_RETRIES: u32 = 2;
    const DEFAULT_MARKET_CACHE_TTL_SECS: u64 = 3600;
    const DEFAULT_NEWS_CACHE_TTL_SECS: u64 = 1800;
    const DEFAULT_TICKERS: &str = "SPY,QQQ";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub market_data_base_url: String,
        pub news_feed_base_url: String,
        pub news_locale: NewsLocale,
        pub news_query_hint: String,
        pub http_timeout_secs: u64,
        pub http_retries: u32,
        pub lookback_days: u32,
        pub interval: Interval,
        pub recency_days: i64,
        pub market_cache_ttl_secs: u64,
        pub news_cache_ttl_secs: u64,
        pub tickers: Vec<Ticker>,
    }

    /// Locale parameters sent with every news search (`hl`, `gl`, `ceid`).
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct NewsLocale {
        pub hl: String,
        pub gl: String,
        pub ceid: String,
    }

    impl Default for NewsLocale {
        fn default() -> Self {
            Self {
                hl: "en-US".to_string(),
                gl: "US".to_string(),
                ceid: "US:en".to_string(),
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
        where
            F: Fn(&str) -> Option<String>,
        {
            let value = |key: &str| {
                lookup(key)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            };
            let text = |key: &str, default: &str| value(key).unwrap_or_else(|| default.to_string());

            let locale_default = NewsLocale::default();
            let news_locale = NewsLocale {
                hl: text("NEWS_HL", &locale_default.hl),
                gl: text("NEWS_GL", &locale_default.gl),
                ceid: text("NEWS_CEID", &locale_default.ceid),
            };

            let tickers = text("ETF_TICKERS", DEFAULT_TICKERS)
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Ticker::parse(s).with_context(|| format!("invalid ETF_TICKERS entry: {s}")))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let settings = Self {
                sentry_dsn: value("SENTRY_DSN"),
                market_data_base_url: text("MARKET_DATA_BASE_URL", DEFAULT_MARKET_DATA_BASE_URL),
                news_feed_base_url: text("NEWS_FEED_BASE_URL", DEFAULT_NEWS_FEED_BASE_URL),
                news_locale,
                news_query_hint: text("NEWS_QUERY_HINT", DEFAULT_NEWS_QUERY_HINT),
                http_timeout_secs: parsed(value("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
                http_retries: parsed(value("HTTP_RETRIES"), "HTTP_RETRIES", DEFAULT_HTTP_RETRIES)?,
                lookback_days: parsed(value("LOOKBACK_DAYS"), "LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS)?,
                interval: parsed(value("MARKET_INTERVAL"), "MARKET_INTERVAL", Interval::Day)?,
                recency_days: parsed(value("NEWS_RECENCY_DAYS"), "NEWS_RECENCY_DAYS", DEFAULT_RECENCY_DAYS)?,
                market_cache_ttl_secs: parsed(
                    value("MARKET_CACHE_TTL_SECS"),
                    "MARKET_CACHE_TTL_SECS",
                    DEFAULT_MARKET_CACHE_TTL_SECS,
                )?,
                news_cache_ttl_secs: parsed(
                    value("NEWS_CACHE_TTL_SECS"),
                    "NEWS_CACHE_TTL_SECS",
                    DEFAULT_NEWS_CACHE_TTL_SECS,
                )?,
                tickers,
            };

            anyhow::ensure!(settings.http_timeout_secs >= 1, "HTTP_TIMEOUT_SECS must be >= 1");
            anyhow::ensure!(settings.http_retries >= 1, "HTTP_RETRIES must be >= 1");
            anyhow::ensure!(settings.lookback_days >= 1, "LOOKBACK_DAYS must be >= 1");
            anyhow::ensure!(
                (1..=MAX_RECENCY_DAYS).contains(&settings.recency_days),
                "NEWS_RECENCY_DAYS must be between 1 and {MAX_RECENCY_DAYS}"
            );
            anyhow::ensure!(!settings.tickers.is_empty(), "ETF_TICKERS must list at least one ticker");

            Ok(settings)
        }

        pub fn default_ticker(&self) -> anyhow::Result<&Ticker> {
            self.tickers.first().context("ETF_TICKERS is empty")
        }
    }

    fn parsed<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match raw {
            None => Ok(default),
            Some(raw) => raw
                .parse::<T>()
                .with_context(|| format!("invalid {key} value: {raw}")),
        }
    }

}
