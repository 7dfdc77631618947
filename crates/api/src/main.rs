use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use etfpulse_core::domain::{MarketBar, Recommendation, ScoredNewsItem, Ticker};
use etfpulse_core::report::{Notice, PipelineReport};
use etfpulse_core::{Pipeline, PipelineOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = etfpulse_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pipeline = match Pipeline::from_settings(&settings, PipelineOptions::from_settings(&settings)) {
        Ok(p) => p,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "failed to build pipeline");
            return Err(e);
        }
    };

    let options = pipeline.options();
    tracing::info!(
        lookback_days = options.lookback_days,
        interval = %options.interval,
        recency_hours = options.recency_window.num_hours(),
        "pipeline configured"
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        tickers: Arc::new(settings.tickers.clone()),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, tickers = ?settings.tickers, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/tickers", get(list_tickers))
        .route("/report/:ticker", get(get_report))
        .route("/report/:ticker/markdown", get(get_report_markdown))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    tickers: Arc<Vec<Ticker>>,
}

impl AppState {
    /// 400 for something that is not a symbol, 404 for a symbol outside the
    /// configured universe.
    fn selectable(&self, raw: &str) -> Result<Ticker, StatusCode> {
        let ticker = Ticker::parse(raw).map_err(|e| {
            tracing::debug!(raw, error = %e, "rejected ticker");
            StatusCode::BAD_REQUEST
        })?;
        if self.tickers.contains(&ticker) {
            Ok(ticker)
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiReport {
    run_id: String,
    ticker: Ticker,
    generated_at: DateTime<Utc>,
    market: Vec<MarketBar>,
    news: Vec<ScoredNewsItem>,
    news_notice: Option<Notice>,
    recommendation: Recommendation,
    message: Notice,
}

impl From<PipelineReport> for ApiReport {
    fn from(report: PipelineReport) -> Self {
        let market = report.market_tail().to_vec();
        let news_notice = report.news_notice();
        let message = report.recommendation_notice();
        Self {
            run_id: report.run_id.to_string(),
            ticker: report.ticker,
            generated_at: report.generated_at,
            market,
            news: report.news,
            news_notice,
            recommendation: report.recommendation,
            message,
        }
    }
}

async fn list_tickers(State(state): State<AppState>) -> Json<Vec<Ticker>> {
    Json(state.tickers.as_ref().clone())
}

async fn get_report(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ApiReport>, StatusCode> {
    let ticker = state.selectable(&ticker)?;
    let report = state.pipeline.run(&ticker).await;
    Ok(Json(report.into()))
}

async fn get_report_markdown(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let ticker = state.selectable(&ticker)?;
    let report = state.pipeline.run(&ticker).await;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        report.to_markdown(),
    ))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

fn init_sentry(settings: &etfpulse_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use etfpulse_core::domain::{Interval, NewsItem, Signal};
    use etfpulse_core::ingest::{FetchError, MarketDataProvider, NewsFeedProvider};
    use etfpulse_core::sentiment::PolarityAnalyzer;

    struct NoBars;

    #[async_trait::async_trait]
    impl MarketDataProvider for NoBars {
        fn provider_name(&self) -> &'static str {
            "no_bars"
        }

        async fn fetch_bars(
            &self,
            _ticker: &Ticker,
            _lookback_days: u32,
            _interval: Interval,
        ) -> Result<Vec<MarketBar>, FetchError> {
            Ok(Vec::new())
        }
    }

    struct OneHeadline(Option<String>);

    #[async_trait::async_trait]
    impl NewsFeedProvider for OneHeadline {
        fn provider_name(&self) -> &'static str {
            "one_headline"
        }

        async fn search(&self, query: &str) -> Result<Vec<NewsItem>, FetchError> {
            Ok(self
                .0
                .iter()
                .map(|title| NewsItem {
                    title: format!("{title} ({query})"),
                    link: "https://news.example.com/1".to_string(),
                    published_at: Utc::now() - Duration::hours(1),
                })
                .collect())
        }
    }

    struct AlwaysPositive;

    impl PolarityAnalyzer for AlwaysPositive {
        fn compound(&self, _text: &str) -> f64 {
            0.8
        }
    }

    fn state(headline: Option<&str>) -> AppState {
        let pipeline = Pipeline::new(
            Arc::new(NoBars),
            Arc::new(OneHeadline(headline.map(str::to_string))),
            Arc::new(AlwaysPositive),
            PipelineOptions::default(),
        );
        AppState {
            pipeline: Arc::new(pipeline),
            tickers: Arc::new(vec![
                Ticker::parse("SPY").unwrap(),
                Ticker::parse("QQQ").unwrap(),
            ]),
        }
    }

    #[tokio::test]
    async fn report_for_configured_ticker() {
        let Json(report) = get_report(State(state(Some("ETF climbs"))), Path("spy".to_string()))
            .await
            .unwrap();
        assert_eq!(report.ticker.as_str(), "SPY");
        assert_eq!(report.news.len(), 1);
        assert_eq!(report.news[0].title(), "ETF climbs (SPY stock)");
        assert_eq!(report.recommendation.signal(), Some(Signal::Buy));
        assert_eq!(report.message.text, "Recommendation of the day: Buy");
        assert!(report.news_notice.is_none());
        assert!(report.market.is_empty());
    }

    #[tokio::test]
    async fn report_without_news_is_unavailable() {
        let Json(report) = get_report(State(state(None)), Path("QQQ".to_string()))
            .await
            .unwrap();
        assert_eq!(report.recommendation, Recommendation::Unavailable);
        assert_eq!(report.news_notice.unwrap().text, "No recent news found.");

        let json = serde_json::to_value(&report.message).unwrap();
        assert_eq!(json["tone"], "info");
    }

    #[tokio::test]
    async fn unknown_and_malformed_tickers_are_rejected() {
        let err = get_report(State(state(None)), Path("IWM".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);

        let err = get_report(State(state(None)), Path("S P Y".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn markdown_route_sets_content_type() {
        let resp = get_report_markdown(State(state(Some("ETF climbs"))), Path("SPY".to_string()))
            .await
            .unwrap()
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/markdown; charset=utf-8"
        );

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("# SPY news sentiment"));
        assert!(text.contains("Recommendation of the day: Buy"));
    }

    #[tokio::test]
    async fn tickers_lists_universe() {
        let Json(tickers) = list_tickers(State(state(None))).await;
        let names: Vec<&str> = tickers.iter().map(Ticker::as_str).collect();
        assert_eq!(names, vec!["SPY", "QQQ"]);
    }
}
