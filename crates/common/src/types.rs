use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point of a symbol's history: the closing price plus every indicator
/// value derived at that point. Rows are immutable once appended to a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub price: f64,
    /// 0 while the RSI window is still warming up.
    pub rsi: f64,
    /// 0 while the Bollinger window is still warming up.
    pub lower_band: f64,
    pub upper_band: f64,
}

/// Three-way verdict of a single indicator for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

/// Side of an executed simulated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// An executed simulated trade. Created atomically with the balance mutation
/// it documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    /// Quantity in units of the traded symbol.
    pub amount: f64,
    /// Exchange rate the trade settled at.
    pub price: f64,
    pub action: TradeAction,
}

impl Transaction {
    pub fn new(symbol: impl Into<String>, amount: f64, price: f64, action: TradeAction) -> Self {
        Self {
            timestamp: Utc::now(),
            symbol: symbol.into(),
            amount,
            price,
            action,
        }
    }

    /// Canonical line for the durable log: `timestamp,symbol,quantity,price,action`.
    pub fn csv_line(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.symbol,
            decimal5(self.amount),
            decimal5(self.price),
            self.action
        )
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:<10} {} {} @ {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.symbol,
            self.action,
            decimal5(self.amount),
            decimal5(self.price)
        )
    }
}

/// Caller-visible outcome of an analyzer operation. Rejections are ordinary
/// events here, not errors: the ledger stays untouched and the session
/// continues.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeEvent {
    /// A trade went through. `forced` marks liquidations that bypassed the
    /// debounce (symbol removal, full withdrawal).
    Executed {
        transaction: Transaction,
        forced: bool,
    },
    /// Buy signal confirmed but the cash balance is too low to invest.
    BuyRejected { symbol: String, price: f64 },
    /// Sell signal confirmed but nothing of the symbol is held.
    SellRejected { symbol: String, price: f64 },
    DepositAccepted { credited: f64, balance: f64 },
    DepositRejected { amount: f64, minimum: f64 },
    /// Total paid out by a full withdrawal, after the withdrawal fee.
    WithdrawalSettled { total: f64 },
    SymbolRemoved { symbol: String },
    UnknownSymbol { symbol: String },
    /// The durable log refused the append; the trade is kept in memory only.
    LogSkipped,
}

/// Format with at most five decimal places, trailing zeros trimmed.
pub fn decimal5(value: f64) -> String {
    let s = format!("{value:.5}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal5_trims_trailing_zeros() {
        assert_eq!(decimal5(49.5), "49.5");
        assert_eq!(decimal5(100.0), "100");
        assert_eq!(decimal5(0.123456), "0.12346");
        assert_eq!(decimal5(0.00001), "0.00001");
    }

    #[test]
    fn csv_line_has_five_fields_in_order() {
        let tx = Transaction::new("BTCUSD", 0.98901, 50.0, TradeAction::Buy);
        let line = tx.csv_line();
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[1], "BTCUSD");
        assert_eq!(fields[2], "0.98901");
        assert_eq!(fields[3], "50");
        assert_eq!(fields[4], "BUY");
    }
}
