use std::collections::BTreeMap;

use tracing::{info, warn};

use common::{Decision, Row, ServiceConfig, TradeAction, TradeEvent, Transaction};
use indicators::{BollingerBands, Indicator, RelativeStrengthIndex};

use crate::ledger::{TransactionLedger, TransactionLog, MAX_RECENT_TRANSACTIONS};
use crate::window::{SignalState, SymbolRecord};

/// Cash floor below which a confirmed buy is refused instead of executed.
/// Keeps the simulation from trading ever-smaller slices of nothing.
pub const MIN_TRADABLE_CASH: f64 = 1.0;

/// The analytics core: bounded per-symbol price windows, indicator rows,
/// the debounced trade decision and the asset ledger behind it.
///
/// Symbols are processed in ascending lexical order everywhere, so a given
/// input sequence always produces the same transaction sequence. Callers
/// serialize structural mutation (seed/remove) against tick processing by
/// owning the analyzer behind one lock.
pub struct Analyzer {
    service: ServiceConfig,
    indicators: [Indicator; 2],
    max_lookback: usize,
    records: BTreeMap<String, SymbolRecord>,
    assets: BTreeMap<String, f64>,
    ledger: TransactionLedger,
}

impl Analyzer {
    pub fn new(service: ServiceConfig, log: Box<dyn TransactionLog>) -> Self {
        let indicators = [
            Indicator::Bollinger(BollingerBands::new()),
            Indicator::Rsi(RelativeStrengthIndex::new()),
        ];
        let max_lookback = indicators
            .iter()
            .map(Indicator::lookback)
            .max()
            .unwrap_or(0);

        let mut assets = BTreeMap::new();
        assets.insert(service.currency.clone(), 0.0);

        Self {
            service,
            indicators,
            max_lookback,
            records: BTreeMap::new(),
            assets,
            ledger: TransactionLedger::new(MAX_RECENT_TRANSACTIONS, log),
        }
    }

    pub fn service(&self) -> &ServiceConfig {
        &self.service
    }

    pub fn max_lookback(&self) -> usize {
        self.max_lookback
    }

    pub fn is_tracked(&self, symbol: &str) -> bool {
        self.records.contains_key(symbol)
    }

    /// Tracked symbols in ascending order.
    pub fn symbols(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    /// Build a symbol's window from its close history, oldest first.
    ///
    /// Each row is filled against the window as it existed at that point, so
    /// the first `lookback` rows of every indicator carry placeholder zeros.
    /// The final row becomes the symbol's last known row.
    pub fn seed(&mut self, symbol: &str, history: &[f64]) {
        let mut record = SymbolRecord::default();
        for (iteration, &price) in history.iter().enumerate() {
            let mut row = Row::default();
            for indicator in &self.indicators {
                indicator.fill_row(&mut row, iteration, &record.window, price);
            }
            row.price = price;
            record.last_row = row;
            record.push_bounded(row, self.max_lookback);
        }
        info!(symbol, rows = record.window.len(), "symbol seeded");
        self.records.insert(symbol.to_string(), record);
        self.assets.entry(symbol.to_string()).or_insert(0.0);
    }

    /// Evaluate one batch of prices against the current windows.
    ///
    /// Every tracked symbol present in `prices` gets a fresh row and a signal
    /// decision; the window itself only advances when `roll_window` is set.
    /// Returns the trade outcomes of the batch in symbol order.
    pub fn process_tick(
        &mut self,
        prices: &BTreeMap<String, f64>,
        roll_window: bool,
    ) -> Vec<TradeEvent> {
        let mut events = Vec::new();
        for (symbol, &price) in prices {
            let Some(record) = self.records.get(symbol) else {
                continue;
            };
            let row = self.compute_row(record, price);

            if let Some(record) = self.records.get_mut(symbol) {
                record.last_row = row;
                if roll_window {
                    record.roll(row);
                }
            }
            self.decide_signal(symbol, &row, &mut events);
        }
        events
    }

    /// Stop tracking a symbol. A positive position is force-sold at the last
    /// known price first; window, asset entry and debounce state then go
    /// together.
    pub fn remove(&mut self, symbol: &str) -> Vec<TradeEvent> {
        let mut events = Vec::new();
        let Some(record) = self.records.get(symbol) else {
            warn!(symbol, "remove requested for an untracked symbol");
            events.push(TradeEvent::UnknownSymbol {
                symbol: symbol.to_string(),
            });
            return events;
        };
        let last_price = record.last_row.price;

        if self.assets.get(symbol).copied().unwrap_or(0.0) > 0.0 {
            self.execute_sell(symbol, last_price, true, &mut events);
        }
        self.records.remove(symbol);
        self.assets.remove(symbol);
        events.push(TradeEvent::SymbolRemoved {
            symbol: symbol.to_string(),
        });
        events
    }

    /// Credit the cash balance, minus the deposit fee. Deposits under the
    /// service minimum leave the ledger untouched.
    pub fn deposit(&mut self, amount: f64) -> TradeEvent {
        if amount < self.service.minimum_deposit {
            return TradeEvent::DepositRejected {
                amount,
                minimum: self.service.minimum_deposit,
            };
        }
        let credited = amount - amount * self.service.deposit_fee;
        let currency = self.service.currency.clone();
        let balance = {
            let balance = self.assets.entry(currency).or_insert(0.0);
            *balance += credited;
            *balance
        };
        info!(credited, balance, "deposit accepted");
        TradeEvent::DepositAccepted { credited, balance }
    }

    /// Liquidate everything: force-sell each positive position at its last
    /// known price, zero all balances and report the fee-adjusted total.
    /// Symbols stay tracked; only the ledger empties.
    pub fn withdraw(&mut self) -> Vec<TradeEvent> {
        let mut events = Vec::new();
        let total = self.estimated_withdrawal();

        let positions: Vec<(String, f64)> = self
            .records
            .iter()
            .filter(|(symbol, _)| self.assets.get(*symbol).copied().unwrap_or(0.0) > 0.0)
            .map(|(symbol, record)| (symbol.clone(), record.last_row.price))
            .collect();
        for (symbol, price) in positions {
            self.execute_sell(&symbol, price, true, &mut events);
        }

        for balance in self.assets.values_mut() {
            *balance = 0.0;
        }
        info!(total, "withdrawal settled");
        events.push(TradeEvent::WithdrawalSettled { total });
        events
    }

    /// What a full withdrawal would pay out right now: cash plus every
    /// position valued at its last known price, minus the withdrawal fee.
    pub fn estimated_withdrawal(&self) -> f64 {
        let currency = &self.service.currency;
        let mut total = self.assets.get(currency).copied().unwrap_or(0.0);
        for (symbol, &amount) in &self.assets {
            if symbol == currency {
                continue;
            }
            if let Some(record) = self.records.get(symbol) {
                total += amount * record.last_row.price;
            }
        }
        total - total * self.service.withdrawal_fee
    }

    /// Current balances, settlement currency included.
    pub fn snapshot_assets(&self) -> BTreeMap<String, f64> {
        self.assets.clone()
    }

    /// Latest indicator row per tracked symbol.
    pub fn snapshot_indicators(&self) -> BTreeMap<String, Row> {
        self.records
            .iter()
            .map(|(symbol, record)| (symbol.clone(), record.last_row))
            .collect()
    }

    /// The most recent transactions, oldest first.
    pub fn snapshot_transactions(&self) -> Vec<Transaction> {
        self.ledger.recent()
    }

    fn compute_row(&self, record: &SymbolRecord, price: f64) -> Row {
        let mut row = Row::default();
        for indicator in &self.indicators {
            indicator.compute(&mut row, &record.window, price);
        }
        row.price = price;
        row
    }

    fn decide_signal(&mut self, symbol: &str, row: &Row, events: &mut Vec<TradeEvent>) {
        let unanimous_buy = self
            .indicators
            .iter()
            .all(|i| i.decide(row) == Decision::Buy);
        let unanimous_sell = self
            .indicators
            .iter()
            .all(|i| i.decide(row) == Decision::Sell);

        if unanimous_buy {
            self.prepare_buy(symbol, row.price, events);
        } else if unanimous_sell {
            self.prepare_sell(symbol, row.price, events);
        } else {
            // no partial credit across non-confirming ticks
            self.reset_signal(symbol);
        }
    }

    fn prepare_buy(&mut self, symbol: &str, price: f64, events: &mut Vec<TradeEvent>) {
        let threshold = self.service.signal_threshold;
        let streak = {
            let Some(record) = self.records.get_mut(symbol) else {
                return;
            };
            let streak = match record.signal {
                SignalState::PreparingBuy(n) => n + 1,
                _ => 1,
            };
            record.signal = SignalState::PreparingBuy(streak);
            streak
        };
        if streak < threshold {
            return;
        }

        if self.currency_balance() > MIN_TRADABLE_CASH {
            self.execute_buy(symbol, price, events);
        } else {
            warn!(symbol, price, "buy signal confirmed without funds");
            self.reset_signal(symbol);
            events.push(TradeEvent::BuyRejected {
                symbol: symbol.to_string(),
                price,
            });
        }
    }

    fn prepare_sell(&mut self, symbol: &str, price: f64, events: &mut Vec<TradeEvent>) {
        let threshold = self.service.signal_threshold;
        let streak = {
            let Some(record) = self.records.get_mut(symbol) else {
                return;
            };
            let streak = match record.signal {
                SignalState::PreparingSell(n) => n + 1,
                _ => 1,
            };
            record.signal = SignalState::PreparingSell(streak);
            streak
        };
        if streak < threshold {
            return;
        }

        if self.assets.get(symbol).copied().unwrap_or(0.0) > 0.0 {
            self.execute_sell(symbol, price, false, events);
        } else {
            warn!(symbol, price, "sell signal confirmed without holdings");
            self.reset_signal(symbol);
            events.push(TradeEvent::SellRejected {
                symbol: symbol.to_string(),
                price,
            });
        }
    }

    fn execute_buy(&mut self, symbol: &str, price: f64, events: &mut Vec<TradeEvent>) {
        let invested = self.currency_balance() / self.service.investment_split;
        let after_fee = invested - invested * self.service.trading_fee;
        let amount = after_fee / price;

        let currency = self.service.currency.clone();
        *self.assets.entry(currency).or_insert(0.0) -= invested;
        *self.assets.entry(symbol.to_string()).or_insert(0.0) += amount;

        info!(symbol, price, amount, "buy executed");
        self.reset_signal(symbol);
        self.record_transaction(symbol, amount, price, TradeAction::Buy, false, events);
    }

    fn execute_sell(&mut self, symbol: &str, price: f64, forced: bool, events: &mut Vec<TradeEvent>) {
        let amount = self.assets.get(symbol).copied().unwrap_or(0.0);
        let proceeds = amount * price;
        let after_fee = proceeds - proceeds * self.service.trading_fee;

        self.assets.insert(symbol.to_string(), 0.0);
        let currency = self.service.currency.clone();
        *self.assets.entry(currency).or_insert(0.0) += after_fee;

        info!(symbol, price, amount, forced, "sell executed");
        self.reset_signal(symbol);
        self.record_transaction(symbol, amount, price, TradeAction::Sell, forced, events);
    }

    fn record_transaction(
        &mut self,
        symbol: &str,
        amount: f64,
        price: f64,
        action: TradeAction,
        forced: bool,
        events: &mut Vec<TradeEvent>,
    ) {
        let transaction = Transaction::new(symbol, amount, price, action);
        let logged = self.ledger.record(transaction.clone());
        events.push(TradeEvent::Executed { transaction, forced });
        if !logged {
            events.push(TradeEvent::LogSkipped);
        }
    }

    fn reset_signal(&mut self, symbol: &str) {
        if let Some(record) = self.records.get_mut(symbol) {
            record.signal = SignalState::Idle;
        }
    }

    fn currency_balance(&self) -> f64 {
        self.assets
            .get(&self.service.currency)
            .copied()
            .unwrap_or(0.0)
    }
}
