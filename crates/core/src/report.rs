//! Presentation model for one pipeline run: the market table tail, the
//! annotated headlines and the recommendation message, plus a markdown
//! rendering of all three.

use crate::domain::market::MarketBar;
use crate::domain::news::ScoredNewsItem;
use crate::domain::signal::{Recommendation, Signal};
use crate::domain::ticker::Ticker;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;
use uuid::Uuid;

/// Bars shown in the market table.
pub const MARKET_TABLE_ROWS: usize = 5;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub ticker: Ticker,
    pub generated_at: DateTime<Utc>,
    pub bars: Vec<MarketBar>,
    pub news: Vec<ScoredNewsItem>,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Error,
    Info,
    Warning,
}

impl Tone {
    pub fn icon(&self) -> &'static str {
        match self {
            Tone::Success => "✅",
            Tone::Error => "🚫",
            Tone::Info => "📌",
            Tone::Warning => "⚠️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub tone: Tone,
    pub text: String,
}

pub fn notice_for(recommendation: &Recommendation) -> Notice {
    match recommendation.signal() {
        Some(signal) => Notice {
            tone: match signal {
                Signal::Buy => Tone::Success,
                Signal::Sell => Tone::Error,
                Signal::Neutral => Tone::Info,
            },
            text: format!("Recommendation of the day: {signal}"),
        },
        None => Notice {
            tone: Tone::Info,
            text: "Recommendation unavailable (not enough news)".to_string(),
        },
    }
}

pub fn format_published(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

impl PipelineReport {
    /// The newest bars, still oldest first.
    pub fn market_tail(&self) -> &[MarketBar] {
        let start = self.bars.len().saturating_sub(MARKET_TABLE_ROWS);
        &self.bars[start..]
    }

    pub fn recommendation_notice(&self) -> Notice {
        notice_for(&self.recommendation)
    }

    /// Shown in place of the news list when nothing recent was found.
    pub fn news_notice(&self) -> Option<Notice> {
        self.news.is_empty().then(|| Notice {
            tone: Tone::Warning,
            text: "No recent news found.".to_string(),
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_markdown(&mut out);
        out
    }

    fn write_markdown(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "# {} news sentiment", self.ticker)?;
        writeln!(out)?;
        writeln!(
            out,
            "_Generated {} UTC, run `{}`_",
            format_published(&self.generated_at),
            self.run_id
        )?;
        writeln!(out)?;

        writeln!(out, "## Latest news")?;
        writeln!(out)?;
        match self.news_notice() {
            Some(notice) => writeln!(out, "> {} {}", notice.tone.icon(), notice.text)?,
            None => {
                for scored in &self.news {
                    writeln!(
                        out,
                        "- [{}]({}) *{}* {} {} ({:+.2})",
                        escape_link_text(scored.title()),
                        scored.item.link,
                        format_published(&scored.item.published_at),
                        scored.label.marker(),
                        scored.label,
                        scored.sentiment
                    )?;
                }
            }
        }
        writeln!(out)?;

        writeln!(out, "## Market data")?;
        writeln!(out)?;
        let tail = self.market_tail();
        if tail.is_empty() {
            writeln!(out, "_No market data available._")?;
        } else {
            writeln!(out, "| Date | Open | High | Low | Close | Volume |")?;
            writeln!(out, "|---|---:|---:|---:|---:|---:|")?;
            for bar in tail {
                writeln!(
                    out,
                    "| {} | {:.2} | {:.2} | {:.2} | {:.2} | {} |",
                    bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
                )?;
            }
        }
        writeln!(out)?;

        writeln!(out, "## Recommendation")?;
        writeln!(out)?;
        let notice = self.recommendation_notice();
        write!(out, "{} **{}**", notice.tone.icon(), notice.text)?;
        if let Recommendation::Available {
            mean_sentiment,
            sample_size,
            ..
        } = &self.recommendation
        {
            write!(
                out,
                " (mean sentiment {mean_sentiment:+.3} over {sample_size} headlines)"
            )?;
        }
        writeln!(out)
    }
}

fn escape_link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
