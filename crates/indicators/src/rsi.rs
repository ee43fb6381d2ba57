use std::collections::VecDeque;

use common::{Decision, Row};

use crate::trailing_prices;

/// Relative Strength Index over the trailing price window.
///
/// Plain fixed-window averages over the zero-clamped up/down moves — the
/// clamped zeros stay in the denominator, so this is NOT Wilder's smoothed
/// variant. When no down moves exist the relative strength is taken as 0
/// instead of dividing by zero, which makes a strictly rising series read 0.
#[derive(Debug, Clone)]
pub struct RelativeStrengthIndex {
    pub lookback: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl RelativeStrengthIndex {
    pub fn new() -> Self {
        Self {
            lookback: 14,
            overbought: 70.0,
            oversold: 30.0,
        }
    }

    /// RSI of the trailing window plus `price`, in [0, 100].
    pub fn value(&self, window: &VecDeque<Row>, price: f64) -> f64 {
        let mut prices = trailing_prices(window, self.lookback);
        prices.push(price);

        let diffs: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
        let average_up = clamped_average(&diffs, true);
        let average_down = clamped_average(&diffs, false);

        let relative_strength = if average_down != 0.0 {
            average_up / average_down
        } else {
            0.0
        };
        100.0 - 100.0 / (1.0 + relative_strength)
    }

    pub fn decide(&self, row: &Row) -> Decision {
        if row.rsi > self.overbought {
            Decision::Sell
        } else if row.rsi < self.oversold {
            Decision::Buy
        } else {
            Decision::Hold
        }
    }
}

impl Default for RelativeStrengthIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Average of the moves in one direction, with opposite moves clamped to 0
/// but still counted in the denominator.
fn clamped_average(diffs: &[f64], upward: bool) -> f64 {
    if diffs.is_empty() {
        return 0.0;
    }
    let sum: f64 = diffs
        .iter()
        .map(|&d| if upward { d.max(0.0) } else { (-d).max(0.0) })
        .sum();
    sum / diffs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_of(prices: &[f64]) -> VecDeque<Row> {
        prices
            .iter()
            .map(|&price| Row {
                price,
                ..Row::default()
            })
            .collect()
    }

    #[test]
    fn strictly_rising_series_reads_zero_through_the_guard() {
        // no down moves -> relative strength is clamped to 0 -> 100 - 100/1
        let rsi = RelativeStrengthIndex::new();
        let prices: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        let value = rsi.value(&window_of(&prices), 120.0);
        assert!((value - 0.0).abs() < 1e-9, "expected 0, got {value}");
    }

    #[test]
    fn strictly_falling_series_also_reads_zero() {
        let rsi = RelativeStrengthIndex::new();
        let prices: Vec<f64> = (0..14).map(|i| 100.0 - i as f64).collect();
        let value = rsi.value(&window_of(&prices), 80.0);
        assert!((value - 0.0).abs() < 1e-9, "expected 0, got {value}");
    }

    #[test]
    fn balanced_alternation_reads_fifty() {
        let rsi = RelativeStrengthIndex::new();
        // +1/-1 alternating -> average up == average down -> RS 1 -> RSI 50
        let prices: Vec<f64> = (0..14)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let next = if prices.len() % 2 == 0 { 100.0 } else { 101.0 };
        let value = rsi.value(&window_of(&prices), next);
        assert!((value - 50.0).abs() < 1e-9, "expected 50, got {value}");
    }

    #[test]
    fn mostly_rising_series_reads_overbought() {
        let rsi = RelativeStrengthIndex::new();
        // twelve +2 moves, one -1 move, one +38 move
        let prices = vec![
            114.0, 116.0, 118.0, 120.0, 122.0, 124.0, 126.0, 128.0, 130.0, 132.0, 134.0, 136.0,
            138.0, 137.0,
        ];
        let value = rsi.value(&window_of(&prices), 175.0);
        assert!(value > 70.0, "expected overbought, got {value}");
    }

    #[test]
    fn value_stays_in_range() {
        let rsi = RelativeStrengthIndex::new();
        let prices = vec![5.0, 9.0, 2.0, 7.0, 1.0, 8.0, 3.0, 6.0, 4.0, 9.5, 2.5, 7.5, 1.5, 8.5];
        let value = rsi.value(&window_of(&prices), 5.0);
        assert!((0.0..=100.0).contains(&value), "RSI out of range: {value}");
    }

    #[test]
    fn decisions_at_the_thresholds_are_hold() {
        let rsi = RelativeStrengthIndex::new();
        let row = |value| Row {
            rsi: value,
            ..Row::default()
        };
        assert_eq!(rsi.decide(&row(70.0)), Decision::Hold);
        assert_eq!(rsi.decide(&row(70.1)), Decision::Sell);
        assert_eq!(rsi.decide(&row(30.0)), Decision::Hold);
        assert_eq!(rsi.decide(&row(29.9)), Decision::Buy);
    }
}
