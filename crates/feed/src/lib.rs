use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use common::{Error, MarketDataSource, Result};

const BASE_URL: &str = "https://api.binance.com";

/// Position of the closing price inside a kline array.
const KLINE_CLOSE_INDEX: usize = 4;

/// REST client for Binance spot market data.
///
/// Only public, unauthenticated endpoints are used; nothing here can place
/// an order. Prices arrive as strings on the wire and are parsed to `f64`.
pub struct BinanceFeed {
    http: Client,
    base_url: String,
}

impl BinanceFeed {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Feed(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

impl Default for BinanceFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for BinanceFeed {
    async fn latest_prices(&self) -> Result<HashMap<String, f64>> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let body = self.get_text(&url).await?;
        let prices = parse_price_list(&body)?;
        debug!(symbols = prices.len(), "ticker prices fetched");
        Ok(prices)
    }

    async fn close_history(&self, symbol: &str) -> Result<Vec<f64>> {
        let url = format!(
            "{}/api/v3/klines?symbol={symbol}&interval=1m",
            self.base_url
        );
        let body = self.get_text(&url).await?;
        let closes = parse_kline_closes(&body, symbol)?;
        debug!(symbol, closes = closes.len(), "close history fetched");
        Ok(closes)
    }
}

#[derive(Deserialize)]
struct PriceTicker {
    symbol: String,
    price: String,
}

/// Parse the `/ticker/price` body: a single long list of
/// `{"symbol": "...", "price": "0.0001"}` objects.
fn parse_price_list(body: &str) -> Result<HashMap<String, f64>> {
    let tickers: Vec<PriceTicker> = serde_json::from_str(body)?;
    let mut prices = HashMap::with_capacity(tickers.len());
    for ticker in tickers {
        if let Ok(price) = ticker.price.parse::<f64>() {
            prices.insert(ticker.symbol, price);
        }
    }
    Ok(prices)
}

/// Parse a `/klines` body into closing prices, oldest first. Kline arrays
/// mix numbers and strings, so each close is accepted in either form.
fn parse_kline_closes(body: &str, symbol: &str) -> Result<Vec<f64>> {
    let klines: Vec<Vec<Value>> = serde_json::from_str(body)?;
    let mut closes = Vec::with_capacity(klines.len());
    for kline in &klines {
        let close = kline
            .get(KLINE_CLOSE_INDEX)
            .and_then(value_as_f64)
            .ok_or_else(|| Error::Feed(format!("malformed kline for {symbol}")))?;
        closes.push(close);
    }
    Ok(closes)
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_list_parses_string_prices() {
        let body = r#"[
            {"symbol": "BTCUSDT", "price": "34050.5"},
            {"symbol": "ETHUSDT", "price": "1801.25"}
        ]"#;
        let prices = parse_price_list(body).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices["BTCUSDT"], 34050.5);
        assert_eq!(prices["ETHUSDT"], 1801.25);
    }

    #[test]
    fn kline_closes_accept_strings_and_numbers() {
        let body = r#"[
            [1625097600000, "34000.1", "34100.0", "33900.0", "34050.5", "12.3", 1625097659999, "42.0", 100, "6.1", "21.0", "0"],
            [1625097660000, 34050.5, 34200.0, 34000.0, 34150.0, 10.1, 1625097719999, 40.0, 90, 5.0, 20.0, 0]
        ]"#;
        let closes = parse_kline_closes(body, "BTCUSDT").unwrap();
        assert_eq!(closes, vec![34050.5, 34150.0]);
    }

    #[test]
    fn malformed_kline_is_an_error_not_a_panic() {
        let body = r#"[[1625097600000, "34000.1"]]"#;
        assert!(parse_kline_closes(body, "BTCUSDT").is_err());
    }
}
