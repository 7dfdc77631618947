use super::news::NewsFeedProvider;
use super::retry::with_retries;
use super::FetchError;
use crate::config::{NewsLocale, Settings};
use crate::domain::news::NewsItem;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::time::Duration;

const PROVIDER: &str = "google_news_rss";
const USER_AGENT: &str = concat!("etfpulse/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct GoogleNewsRss {
    http: reqwest::Client,
    base_url: String,
    locale: NewsLocale,
    retries: u32,
}

impl GoogleNewsRss {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build news feed http client")?;

        Ok(Self::new(
            http,
            settings.news_feed_base_url.clone(),
            settings.news_locale.clone(),
            settings.http_retries,
        ))
    }

    pub fn new(http: reqwest::Client, base_url: impl Into<String>, locale: NewsLocale, retries: u32) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            locale,
            retries,
        }
    }

    async fn request_feed(&self, query: &str) -> Result<Vec<u8>, FetchError> {
        let url = search_url(&self.base_url, query, &self.locale)?;
        let resp = self.http.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::status(PROVIDER, status, &body));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

/// `{base}/rss/search?q=..&hl=..&gl=..&ceid=..`, form-encoded.
pub fn search_url(base_url: &str, query: &str, locale: &NewsLocale) -> Result<reqwest::Url, FetchError> {
    reqwest::Url::parse_with_params(
        &format!("{}/rss/search", base_url.trim_end_matches('/')),
        &[
            ("q", query),
            ("hl", locale.hl.as_str()),
            ("gl", locale.gl.as_str()),
            ("ceid", locale.ceid.as_str()),
        ],
    )
    .map_err(|e| FetchError::parse(PROVIDER, format!("bad feed url: {e}")))
}

#[async_trait::async_trait]
impl NewsFeedProvider for GoogleNewsRss {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(&self, query: &str) -> Result<Vec<NewsItem>, FetchError> {
        let label = format!("{PROVIDER}:{query}");
        let body = with_retries(&label, self.retries, || self.request_feed(query)).await?;
        parse_feed(&body)
    }
}

/// Parses an RSS 2.0 document into news items, in document order. Entries
/// without a title, a link or a readable `pubDate` are skipped.
pub fn parse_feed(xml: &[u8]) -> Result<Vec<NewsItem>, FetchError> {
    let channel = rss::Channel::read_from(xml).map_err(|e| FetchError::parse(PROVIDER, e))?;

    let total = channel.items().len();
    let items: Vec<NewsItem> = channel
        .items()
        .iter()
        .filter_map(|entry| {
            let title = entry.title().map(str::trim).filter(|t| !t.is_empty())?;
            let link = entry.link().map(str::trim).filter(|l| !l.is_empty())?;
            let published_at = entry.pub_date().and_then(parse_pub_date)?;
            Some(NewsItem {
                title: title.to_string(),
                link: link.to_string(),
                published_at,
            })
        })
        .collect();

    let skipped = total - items.len();
    if skipped > 0 {
        tracing::debug!(provider = PROVIDER, total, skipped, "skipped incomplete feed entries");
    }
    Ok(items)
}

/// RFC 2822 dates as used by RSS `pubDate`, normalized to UTC.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
