use std::collections::BTreeMap;

use common::{decimal5, Row, TradeAction, TradeEvent, Transaction};

/// Plain-text rendering of snapshots and trade events for the terminal.
pub struct Renderer {
    currency: String,
}

impl Renderer {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    pub fn header(&self) -> String {
        [
            "Cryptocurrency watchlist trading simulator",
            "  Symbols follow the venue naming, e.g. BTCUSDT ETHUSDT SOLUSDT",
            "  (case insensitive, a pair slash like BTC/USDT is accepted)",
            "Add symbols to your watchlist:",
        ]
        .join("\n")
    }

    pub fn help(&self) -> String {
        [
            "Supported commands (case insensitive, without <>):",
            "  help                  print this help",
            "  deposit <value>       add cash to your account",
            "  withdraw              liquidate everything and end the session",
            "  assets                balances, cash currency included",
            "  transactions          recently executed transactions",
            "  market                current watchlist prices",
            "  indicators            latest indicator values per symbol",
            "  add <symbol>          track a symbol",
            "  remove <symbol>       stop tracking a symbol",
        ]
        .join("\n")
    }

    pub fn event(&self, event: &TradeEvent) -> String {
        match event {
            TradeEvent::Executed {
                transaction,
                forced: false,
            } => {
                let tag = match transaction.action {
                    TradeAction::Buy => "[BUY]",
                    TradeAction::Sell => "[SELL]",
                };
                format!(
                    "{tag} {} at {} {}",
                    transaction.symbol,
                    decimal5(transaction.price),
                    self.currency
                )
            }
            TradeEvent::Executed {
                transaction,
                forced: true,
            } => format!(
                "{} force-sold at {} {}",
                transaction.symbol,
                decimal5(transaction.price),
                self.currency
            ),
            TradeEvent::BuyRejected { symbol, price } => format!(
                "buy signal: {symbol} at {} {} skipped - deposit to increase funds",
                decimal5(*price),
                self.currency
            ),
            TradeEvent::SellRejected { symbol, price } => format!(
                "sell signal: {symbol} at {} {} skipped - nothing held",
                decimal5(*price),
                self.currency
            ),
            TradeEvent::DepositAccepted { credited, balance } => format!(
                "{} {} credited, balance: {} {}",
                decimal5(*credited),
                self.currency,
                decimal5(*balance),
                self.currency
            ),
            TradeEvent::DepositRejected { minimum, .. } => {
                format!("deposit at least {} {}", decimal5(*minimum), self.currency)
            }
            TradeEvent::WithdrawalSettled { total } => {
                format!("you end up with {} {}", decimal5(*total), self.currency)
            }
            TradeEvent::SymbolRemoved { symbol } => format!("{symbol} removed"),
            TradeEvent::UnknownSymbol { symbol } => format!("{symbol} is not tracked"),
            TradeEvent::LogSkipped => {
                "transaction could not be written to the log file".to_string()
            }
        }
    }

    pub fn assets(&self, assets: &BTreeMap<String, f64>, estimated_withdrawal: f64, withdrawal_fee: f64) -> String {
        let mut lines: Vec<String> = assets
            .iter()
            .map(|(symbol, amount)| format!("[{symbol}: {}]", decimal5(*amount)))
            .collect();
        lines.push(format!(
            "Estimated withdrawal: {} {} (after {}% fee)",
            decimal5(estimated_withdrawal),
            self.currency,
            decimal5(withdrawal_fee * 100.0)
        ));
        lines.join("\n")
    }

    pub fn indicators(&self, rows: &BTreeMap<String, Row>) -> String {
        if rows.is_empty() {
            return "Your watchlist is empty".to_string();
        }
        let mut lines = Vec::new();
        for (symbol, row) in rows {
            lines.push(symbol.clone());
            lines.push(format!("    price      : {}", decimal5(row.price)));
            lines.push(format!("    RSI        : {}", decimal5(row.rsi)));
            lines.push(format!("    lower band : {}", decimal5(row.lower_band)));
            lines.push(format!("    upper band : {}", decimal5(row.upper_band)));
        }
        lines.join("\n")
    }

    pub fn transactions(&self, transactions: &[Transaction]) -> String {
        if transactions.is_empty() {
            return "No transactions have been executed yet".to_string();
        }
        transactions
            .iter()
            .enumerate()
            .map(|(index, tx)| format!("{}. {tx}", index + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn market(&self, prices: &[(String, f64)]) -> String {
        if prices.is_empty() {
            return "Your watchlist is empty".to_string();
        }
        prices
            .iter()
            .map(|(symbol, price)| format!("[{symbol}: {} {}]", decimal5(*price), self.currency))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn added(&self, symbol: &str) -> String {
        format!("{symbol} added to the watchlist")
    }

    pub fn already_tracked(&self, symbol: &str) -> String {
        format!("{symbol} is already on the watchlist")
    }

    pub fn unavailable(&self, symbol: &str) -> String {
        format!("{symbol} is not available")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> Renderer {
        Renderer::new("USD")
    }

    #[test]
    fn executed_buy_and_forced_sell_render_differently() {
        let buy = TradeEvent::Executed {
            transaction: Transaction::new("BTCUSD", 0.5, 50.0, TradeAction::Buy),
            forced: false,
        };
        assert_eq!(renderer().event(&buy), "[BUY] BTCUSD at 50 USD");

        let forced = TradeEvent::Executed {
            transaction: Transaction::new("BTCUSD", 0.5, 50.0, TradeAction::Sell),
            forced: true,
        };
        assert_eq!(renderer().event(&forced), "BTCUSD force-sold at 50 USD");
    }

    #[test]
    fn assets_include_the_estimated_withdrawal() {
        let mut assets = BTreeMap::new();
        assets.insert("BTCUSD".to_string(), 0.5);
        assets.insert("USD".to_string(), 940.5);
        let text = renderer().assets(&assets, 1178.1, 0.01);
        assert!(text.contains("[BTCUSD: 0.5]"));
        assert!(text.contains("[USD: 940.5]"));
        assert!(text.contains("Estimated withdrawal: 1178.1 USD (after 1% fee)"));
    }

    #[test]
    fn empty_snapshots_have_friendly_messages() {
        assert_eq!(
            renderer().transactions(&[]),
            "No transactions have been executed yet"
        );
        assert_eq!(renderer().market(&[]), "Your watchlist is empty");
        assert_eq!(
            renderer().indicators(&BTreeMap::new()),
            "Your watchlist is empty"
        );
    }
}
