use anyhow::Context;
use clap::Parser;
use etfpulse_core::config::Settings;
use etfpulse_core::domain::{Interval, Ticker};
use etfpulse_core::ingest::news::MAX_RECENCY_DAYS;
use etfpulse_core::{Pipeline, PipelineOptions};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "etfpulse", about = "News-sentiment signal for an ETF ticker")]
struct Args {
    /// Ticker to analyse. Defaults to the first entry of ETF_TICKERS.
    #[arg(long)]
    ticker: Option<String>,

    /// Calendar days of market data to request (overrides LOOKBACK_DAYS).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    lookback_days: Option<u32>,

    /// Only keep headlines newer than this many days (overrides NEWS_RECENCY_DAYS).
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=MAX_RECENCY_DAYS))]
    recency_days: Option<i64>,

    /// Bar width, `1d` or `1wk` (overrides MARKET_INTERVAL).
    #[arg(long)]
    interval: Option<Interval>,

    /// Print the report as JSON instead of markdown.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    // stdout carries the report; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(args, settings).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "etfpulse run failed");
    }
    result
}

async fn run(args: Args, mut settings: Settings) -> anyhow::Result<()> {
    if let Some(days) = args.lookback_days {
        settings.lookback_days = days;
    }
    if let Some(days) = args.recency_days {
        settings.recency_days = days;
    }
    if let Some(interval) = args.interval {
        settings.interval = interval;
    }

    let ticker = resolve_ticker(args.ticker.as_deref(), &settings)?;

    let pipeline = Pipeline::from_settings(&settings, PipelineOptions::from_settings(&settings))?;
    let report = pipeline.run(&ticker).await;

    if args.json {
        let out = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{out}");
    } else {
        print!("{}", report.to_markdown());
    }

    let options = pipeline.options();
    tracing::info!(
        run_id = %report.run_id,
        %ticker,
        lookback_days = options.lookback_days,
        interval = %options.interval,
        "report written"
    );
    Ok(())
}

fn resolve_ticker(arg: Option<&str>, settings: &Settings) -> anyhow::Result<Ticker> {
    match arg {
        Some(raw) => Ticker::parse(raw).with_context(|| format!("invalid --ticker value: {raw}")),
        None => Ok(settings.default_ticker()?.clone()),
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
