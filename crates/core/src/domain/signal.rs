use serde::{Deserialize, Serialize};
use std::fmt;

pub const BUY_THRESHOLD: f64 = 0.2;
pub const SELL_THRESHOLD: f64 = -0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
}

impl Signal {
    /// Strict thresholds: exactly 0.2 or -0.2 is Neutral. NaN is Neutral too.
    pub fn classify(score: f64) -> Self {
        if score > BUY_THRESHOLD {
            Signal::Buy
        } else if score < SELL_THRESHOLD {
            Signal::Sell
        } else {
            Signal::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "Buy",
            Signal::Sell => "Sell",
            Signal::Neutral => "Neutral",
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Signal::Buy => "🟢",
            Signal::Sell => "🔴",
            Signal::Neutral => "⚪",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily verdict over a batch of headlines. `Unavailable` means there was
/// nothing to average, which is not the same thing as a Neutral mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Recommendation {
    Available {
        signal: Signal,
        mean_sentiment: f64,
        sample_size: usize,
    },
    Unavailable,
}

impl Recommendation {
    pub fn signal(&self) -> Option<Signal> {
        match self {
            Recommendation::Available { signal, .. } => Some(*signal),
            Recommendation::Unavailable => None,
        }
    }

    pub fn mean_sentiment(&self) -> Option<f64> {
        match self {
            Recommendation::Available { mean_sentiment, .. } => Some(*mean_sentiment),
            Recommendation::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Recommendation::Available { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(Signal::classify(0.2), Signal::Neutral);
        assert_eq!(Signal::classify(-0.2), Signal::Neutral);
        assert_eq!(Signal::classify(0.2000001), Signal::Buy);
        assert_eq!(Signal::classify(-0.2000001), Signal::Sell);
        assert_eq!(Signal::classify(0.0), Signal::Neutral);
        assert_eq!(Signal::classify(f64::NAN), Signal::Neutral);
    }

    #[test]
    fn unavailable_serializes_distinctly_from_neutral() {
        let unavailable = serde_json::to_value(Recommendation::Unavailable).unwrap();
        assert_eq!(unavailable["status"], "unavailable");
        assert!(unavailable.get("signal").is_none());

        let neutral = serde_json::to_value(Recommendation::Available {
            signal: Signal::Neutral,
            mean_sentiment: 0.0,
            sample_size: 3,
        })
        .unwrap();
        assert_eq!(neutral["status"], "available");
        assert_eq!(neutral["signal"], "neutral");
    }

    #[test]
    fn accessors_reflect_availability() {
        assert_eq!(Recommendation::Unavailable.signal(), None);
        assert_eq!(Recommendation::Unavailable.mean_sentiment(), None);
        let rec = Recommendation::Available {
            signal: Signal::Sell,
            mean_sentiment: -0.3,
            sample_size: 1,
        };
        assert!(rec.is_available());
        assert_eq!(rec.signal(), Some(Signal::Sell));
    }
}
