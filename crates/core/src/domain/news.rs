use crate::domain::signal::Signal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
}

/// A headline annotated with its polarity. Build it through [`ScoredNewsItem::new`]
/// so the label always agrees with the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredNewsItem {
    #[serde(flatten)]
    pub item: NewsItem,
    pub sentiment: f64,
    pub label: Signal,
}

impl ScoredNewsItem {
    pub fn new(item: NewsItem, sentiment: f64) -> Self {
        let sentiment = bounded_score(sentiment);
        Self {
            item,
            sentiment,
            label: Signal::classify(sentiment),
        }
    }

    pub fn title(&self) -> &str {
        &self.item.title
    }
}

/// Maps any analyzer output into [-1, 1]; non-finite values count as neutral.
pub fn bounded_score(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
