use super::PolarityAnalyzer;
use vader_sentiment::SentimentIntensityAnalyzer;

/// VADER compound score. The lexicon is static data inside the crate, so
/// construction is cheap after the first instance.
pub struct VaderAnalyzer {
    inner: SentimentIntensityAnalyzer<'static>,
}

impl VaderAnalyzer {
    pub fn new() -> Self {
        Self {
            inner: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VaderAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaderAnalyzer")
    }
}

impl PolarityAnalyzer for VaderAnalyzer {
    fn compound(&self, text: &str) -> f64 {
        let scores = self.inner.polarity_scores(text);
        let score = |key: &str| scores.get(key).copied().unwrap_or(0.0);

        // The crate applies `!`/`?` emphasis even when no lexicon word
        // matched, which turns bare punctuation into a negative score.
        if score("pos") == 0.0 && score("neg") == 0.0 {
            return 0.0;
        }
        score("compound")
    }
}
