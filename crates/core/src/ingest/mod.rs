pub mod cached;
pub mod error;
pub mod google_news;
pub mod market;
pub mod news;
pub mod retry;
pub mod yahoo;

pub use cached::{CachedMarketData, CachedNewsFeed};
pub use error::FetchError;
pub use google_news::GoogleNewsRss;
pub use market::{fetch_market_snapshot, try_fetch_market_snapshot, MarketDataProvider};
pub use news::{fetch_recent_news, try_fetch_recent_news, NewsFeedProvider};
pub use yahoo::YahooChartProvider;
