use crate::domain::news::{bounded_score, ScoredNewsItem};
use crate::domain::signal::{Recommendation, Signal};

/// Reduces scored headlines to one daily signal using the same thresholds as
/// per-headline labels. An empty batch is `Unavailable`, never Neutral.
pub fn aggregate(items: &[ScoredNewsItem]) -> Recommendation {
    if items.is_empty() {
        return Recommendation::Unavailable;
    }

    let sum: f64 = items.iter().map(|i| i.sentiment).sum();
    let mean_sentiment = bounded_score(sum / items.len() as f64);

    Recommendation::Available {
        signal: Signal::classify(mean_sentiment),
        mean_sentiment,
        sample_size: items.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::news::NewsItem;
    use chrono::{TimeZone, Utc};

    fn scored(title: &str, sentiment: f64) -> ScoredNewsItem {
        ScoredNewsItem::new(
            NewsItem {
                title: title.to_string(),
                link: format!("https://news.example.com/{}", title.len()),
                published_at: Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
            },
            sentiment,
        )
    }

    fn assert_available(rec: &Recommendation, signal: Signal, mean: f64) {
        assert_eq!(rec.signal(), Some(signal));
        let got = rec.mean_sentiment().unwrap();
        assert!((got - mean).abs() < 1e-9, "mean {got} != {mean}");
    }

    #[test]
    fn empty_batch_is_unavailable() {
        let rec = aggregate(&[]);
        assert_eq!(rec, Recommendation::Unavailable);
        assert_eq!(rec.mean_sentiment(), None);
    }

    #[test]
    fn mixed_headlines_cancel_to_neutral() {
        let items = vec![
            scored("Company beats earnings expectations", 0.6),
            scored("Market crashes amid fears", -0.7),
        ];
        assert_available(&aggregate(&items), Signal::Neutral, -0.05);
    }

    #[test]
    fn single_positive_headline_is_buy() {
        assert_available(&aggregate(&[scored("up", 0.5)]), Signal::Buy, 0.5);
    }

    #[test]
    fn single_negative_headline_is_sell() {
        assert_available(&aggregate(&[scored("down", -0.3)]), Signal::Sell, -0.3);
    }

    #[test]
    fn mean_on_threshold_stays_neutral() {
        let items = vec![scored("a", 0.0), scored("b", 0.4)];
        let rec = aggregate(&items);
        assert_eq!(rec.signal(), Some(Signal::Neutral));
    }

    #[test]
    fn order_does_not_matter() {
        let mut items = vec![scored("a", 0.9), scored("b", -0.1), scored("c", 0.25)];
        let forward = aggregate(&items);
        items.reverse();
        let backward = aggregate(&items);
        assert_eq!(forward.signal(), backward.signal());
        let diff = forward.mean_sentiment().unwrap() - backward.mean_sentiment().unwrap();
        assert!(diff.abs() < 1e-12);
        assert!(matches!(forward, Recommendation::Available { sample_size: 3, .. }));
    }
}
