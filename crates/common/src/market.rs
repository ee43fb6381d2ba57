use std::collections::HashMap;

use async_trait::async_trait;

use crate::Result;

/// Abstraction over the market-data venue.
///
/// `BinanceFeed` in `crates/feed` implements this against the public REST
/// endpoints. The analytics core never performs I/O itself; the entry loop
/// polls through this trait and forwards the results as plain values.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Latest price for every symbol the venue quotes.
    async fn latest_prices(&self) -> Result<HashMap<String, f64>>;

    /// Historical 1-minute closing prices for one symbol, oldest first.
    async fn close_history(&self, symbol: &str) -> Result<Vec<f64>>;
}
