mod vader;

pub use vader::VaderAnalyzer;

use crate::domain::news::{bounded_score, NewsItem, ScoredNewsItem};
use crate::domain::signal::Signal;

/// A lexicon/rule-based polarity model. Implementations hold only read-only
/// data, so one instance is shared by every pipeline run.
pub trait PolarityAnalyzer: Send + Sync {
    /// Compound polarity of `text`, nominally in [-1, 1].
    fn compound(&self, text: &str) -> f64;
}

/// Scores headlines against a borrowed analyzer.
#[derive(Clone, Copy)]
pub struct SentimentScorer<'a> {
    analyzer: &'a dyn PolarityAnalyzer,
}

impl<'a> SentimentScorer<'a> {
    pub fn new(analyzer: &'a dyn PolarityAnalyzer) -> Self {
        Self { analyzer }
    }

    pub fn score_headline(&self, title: &str) -> (f64, Signal) {
        let sentiment = if title.trim().is_empty() {
            0.0
        } else {
            bounded_score(self.analyzer.compound(title))
        };
        (sentiment, Signal::classify(sentiment))
    }

    /// One output per input, in input order.
    pub fn score_all(&self, items: Vec<NewsItem>) -> Vec<ScoredNewsItem> {
        items
            .into_iter()
            .map(|item| {
                let (sentiment, _) = self.score_headline(&item.title);
                ScoredNewsItem::new(item, sentiment)
            })
            .collect()
    }
}
