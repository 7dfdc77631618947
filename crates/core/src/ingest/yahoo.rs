use super::market::MarketDataProvider;
use super::retry::with_retries;
use super::FetchError;
use crate::config::Settings;
use crate::domain::market::{Interval, MarketBar};
use crate::domain::ticker::Ticker;
use anyhow::Context;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "yahoo_chart";
const USER_AGENT: &str = concat!("etfpulse/", env!("CARGO_PKG_VERSION"));

/// Daily/weekly OHLCV from the public chart endpoint (`/v8/finance/chart`).
#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self::new(
            http,
            settings.market_data_base_url.clone(),
            settings.http_retries,
        ))
    }

    pub fn new(http: reqwest::Client, base_url: impl Into<String>, retries: u32) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retries,
        }
    }

    async fn request_chart(
        &self,
        ticker: &Ticker,
        lookback_days: u32,
        interval: Interval,
    ) -> Result<ChartResponse, FetchError> {
        let url = chart_url(&self.base_url, ticker, lookback_days, interval)?;
        let resp = self.http.get(url).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            // Unknown symbols come back as 404 with a chart error payload.
            if let Ok(ChartResponse {
                chart: Chart { error: Some(err), .. },
            }) = serde_json::from_str::<ChartResponse>(&body)
            {
                return Err(err.into_fetch_error());
            }
            return Err(FetchError::status(PROVIDER, status, &body));
        }

        serde_json::from_str(&body).map_err(|e| FetchError::parse(PROVIDER, e))
    }
}

/// `{base}/v8/finance/chart/{ticker}?range={N}d&interval={1d|1wk}`
pub fn chart_url(
    base_url: &str,
    ticker: &Ticker,
    lookback_days: u32,
    interval: Interval,
) -> Result<reqwest::Url, FetchError> {
    let range = format!("{lookback_days}d");
    reqwest::Url::parse_with_params(
        &format!("{}/v8/finance/chart/{}", base_url.trim_end_matches('/'), ticker),
        &[("range", range.as_str()), ("interval", interval.as_provider_str())],
    )
    .map_err(|e| FetchError::parse(PROVIDER, format!("bad chart url: {e}")))
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_bars(
        &self,
        ticker: &Ticker,
        lookback_days: u32,
        interval: Interval,
    ) -> Result<Vec<MarketBar>, FetchError> {
        let label = format!("{PROVIDER}:{ticker}");
        let chart = with_retries(&label, self.retries, || {
            self.request_chart(ticker, lookback_days, interval)
        })
        .await?;
        bars_from_chart(chart)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

impl ChartError {
    fn into_fetch_error(self) -> FetchError {
        let message = match self.description {
            Some(desc) if !desc.is_empty() => format!("{}: {}", self.code, desc),
            _ => self.code,
        };
        FetchError::Provider {
            provider: PROVIDER,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Converts a chart payload into bars in provider order. Rows with any
/// missing field (halted sessions, the still-open bar) are dropped.
pub fn bars_from_chart(resp: ChartResponse) -> Result<Vec<MarketBar>, FetchError> {
    if let Some(err) = resp.chart.error {
        return Err(err.into_fetch_error());
    }

    let Some(result) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let offset: FixedOffset = result
        .meta
        .and_then(|m| m.gmtoffset)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());

    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut bars = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;
    for (i, ts) in result.timestamp.iter().enumerate() {
        let row = (
            DateTime::<Utc>::from_timestamp(*ts, 0),
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
            at(&quote.volume, i).filter(|v| *v >= 0.0),
        );
        match row {
            (Some(ts), Some(open), Some(high), Some(low), Some(close), Some(volume)) => {
                bars.push(MarketBar {
                    date: ts.with_timezone(&offset).date_naive(),
                    open,
                    high,
                    low,
                    close,
                    volume: volume.round() as u64,
                });
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(provider = PROVIDER, skipped, "dropped incomplete chart rows");
    }
    Ok(bars)
}

fn at(col: &[Option<f64>], i: usize) -> Option<f64> {
    col.get(i).copied().flatten().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    // 2026-10-14 and 2026-10-15 13:30 UTC (09:30 New York).
    const TWO_SESSIONS: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "SPY", "currency": "USD", "gmtoffset": -14400},
                "timestamp": [1791984600, 1792071000],
                "indicators": {"quote": [{
                    "open":   [580.1, 582.0],
                    "high":   [583.4, 584.9],
                    "low":    [579.0, 581.2],
                    "close":  [582.7, 584.1],
                    "volume": [61234567.0, 55432100.4]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn chart_url_carries_range_and_interval() {
        let spy = Ticker::parse("SPY").unwrap();
        let url = chart_url("https://query1.finance.yahoo.com/", &spy, 7, Interval::Day).unwrap();
        assert_eq!(
            url.as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/SPY?range=7d&interval=1d"
        );

        let url = chart_url("http://127.0.0.1:9000", &spy, 30, Interval::Week).unwrap();
        assert_eq!(url.path(), "/v8/finance/chart/SPY");
        assert_eq!(url.query(), Some("range=30d&interval=1wk"));
    }

    #[test]
    fn parses_bars_in_exchange_calendar() {
        let bars = bars_from_chart(parse(TWO_SESSIONS)).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2026, 10, 14).unwrap());
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
        assert_eq!(bars[0].close, 582.7);
        assert_eq!(bars[1].volume, 55_432_100);
    }

    #[test]
    fn incomplete_rows_are_dropped() {
        let json = r#"{"chart": {"result": [{
            "timestamp": [1791984600, 1792071000, 1792157400],
            "indicators": {"quote": [{
                "open":   [1.0, null, 3.0],
                "high":   [1.5, 2.5, 3.5],
                "low":    [0.5, 1.5, 2.5],
                "close":  [1.2, 2.2, 3.2],
                "volume": [100.0, 200.0, -5.0]
            }]}
        }], "error": null}}"#;
        let bars = bars_from_chart(parse(json)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 1.2);
    }

    #[test]
    fn chart_error_is_a_provider_error() {
        let json = r#"{"chart": {"result": null, "error": {
            "code": "Not Found",
            "description": "No data found, symbol may be delisted"
        }}}"#;
        let err = bars_from_chart(parse(json)).unwrap_err();
        assert!(matches!(err, FetchError::Provider { .. }));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("symbol may be delisted"));
    }

    #[test]
    fn empty_result_is_no_bars() {
        let json = r#"{"chart": {"result": [{"meta": {}, "indicators": {"quote": [{}]}}], "error": null}}"#;
        assert!(bars_from_chart(parse(json)).unwrap().is_empty());
    }
}
