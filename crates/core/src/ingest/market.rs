use super::FetchError;
use crate::domain::market::{Interval, MarketBar};
use crate::domain::ticker::Ticker;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Raw bars covering the last `lookback_days` calendar days. Order and
    /// duplicates are whatever the provider returns.
    async fn fetch_bars(
        &self,
        ticker: &Ticker,
        lookback_days: u32,
        interval: Interval,
    ) -> Result<Vec<MarketBar>, FetchError>;
}

pub async fn try_fetch_market_snapshot(
    provider: &dyn MarketDataProvider,
    ticker: &Ticker,
    lookback_days: u32,
    interval: Interval,
) -> Result<Vec<MarketBar>, FetchError> {
    if lookback_days == 0 {
        tracing::warn!(%ticker, "lookback_days must be >= 1; returning no bars");
        return Ok(Vec::new());
    }

    let raw = provider.fetch_bars(ticker, lookback_days, interval).await?;
    let raw_len = raw.len();
    let bars = normalize_bars(raw, lookback_days, interval);

    tracing::debug!(
        provider = provider.provider_name(),
        %ticker,
        lookback_days,
        %interval,
        raw_len,
        bars_len = bars.len(),
        "market snapshot fetched"
    );
    Ok(bars)
}

/// Bars for `ticker`, oldest first. Provider failures are logged and
/// reported as an empty snapshot.
pub async fn fetch_market_snapshot(
    provider: &dyn MarketDataProvider,
    ticker: &Ticker,
    lookback_days: u32,
    interval: Interval,
) -> Vec<MarketBar> {
    match try_fetch_market_snapshot(provider, ticker, lookback_days, interval).await {
        Ok(bars) => bars,
        Err(err) => {
            tracing::warn!(
                provider = provider.provider_name(),
                %ticker,
                error = %err,
                "market data unavailable"
            );
            Vec::new()
        }
    }
}

/// Sorts by date, keeps the last row the provider sent for any repeated
/// date, and at daily interval trims to the newest `lookback_days` bars.
pub fn normalize_bars(mut bars: Vec<MarketBar>, lookback_days: u32, interval: Interval) -> Vec<MarketBar> {
    bars.sort_by_key(|bar| bar.date);

    let mut out: Vec<MarketBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }

    if interval == Interval::Day {
        let excess = out.len().saturating_sub(lookback_days as usize);
        out.drain(..excess);
    }
    out
}
