use std::collections::VecDeque;

use common::Row;

/// Debounce state for one symbol: how many consecutive ticks the combined
/// indicator decision has confirmed the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalState {
    #[default]
    Idle,
    PreparingBuy(u32),
    PreparingSell(u32),
}

/// Everything tracked for one watched symbol. Dropping the record drops the
/// window, the last known row and the debounce state together, which is what
/// keeps removal trivially consistent.
#[derive(Debug, Clone, Default)]
pub struct SymbolRecord {
    pub window: VecDeque<Row>,
    pub last_row: Row,
    pub signal: SignalState,
}

impl SymbolRecord {
    /// Append `row`, evicting the oldest entry once the window already holds
    /// `max_lookback` rows.
    pub fn push_bounded(&mut self, row: Row, max_lookback: usize) {
        if self.window.len() >= max_lookback {
            self.window.pop_front();
        }
        self.window.push_back(row);
    }

    /// Roll the window forward one tick: drop the oldest row, append the new
    /// one. A window that was seeded short keeps its length.
    pub fn roll(&mut self, row: Row) {
        self.window.pop_front();
        self.window.push_back(row);
    }
}
