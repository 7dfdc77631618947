pub mod market;
pub mod news;
pub mod signal;
pub mod ticker;

pub use market::{Interval, IntervalError, MarketBar};
pub use news::{NewsItem, ScoredNewsItem};
pub use signal::{Recommendation, Signal};
pub use ticker::{Ticker, TickerError};
