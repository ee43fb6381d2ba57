pub mod bollinger;
pub mod rsi;

pub use bollinger::BollingerBands;
pub use rsi::RelativeStrengthIndex;

use std::collections::VecDeque;

use common::{Decision, Row};

/// The two indicators this engine derives. A closed enum on purpose: the
/// trade rule in `analytics` is defined over exactly this pair, so there is
/// nothing to gain from open-ended dispatch.
#[derive(Debug, Clone)]
pub enum Indicator {
    Bollinger(BollingerBands),
    Rsi(RelativeStrengthIndex),
}

impl Indicator {
    /// Minimum number of historical rows before the value is meaningful.
    pub fn lookback(&self) -> usize {
        match self {
            Indicator::Bollinger(bb) => bb.lookback,
            Indicator::Rsi(rsi) => rsi.lookback,
        }
    }

    /// Write this indicator's real cells into `row`, derived from the
    /// trailing window plus the candidate `price`.
    pub fn compute(&self, row: &mut Row, window: &VecDeque<Row>, price: f64) {
        match self {
            Indicator::Bollinger(bb) => {
                let (lower, upper) = bb.bands(window, price);
                row.lower_band = lower;
                row.upper_band = upper;
            }
            Indicator::Rsi(rsi) => {
                row.rsi = rsi.value(window, price);
            }
        }
    }

    /// Seeding variant of `compute`: while `iteration` has not yet passed the
    /// lookback the window is too thin for the value to be meaningful, and
    /// exact-zero placeholders are written instead.
    pub fn fill_row(&self, row: &mut Row, iteration: usize, window: &VecDeque<Row>, price: f64) {
        if iteration > self.lookback() {
            self.compute(row, window, price);
        } else {
            match self {
                Indicator::Bollinger(_) => {
                    row.lower_band = 0.0;
                    row.upper_band = 0.0;
                }
                Indicator::Rsi(_) => row.rsi = 0.0,
            }
        }
    }

    pub fn decide(&self, row: &Row) -> Decision {
        match self {
            Indicator::Bollinger(bb) => bb.decide(row),
            Indicator::Rsi(rsi) => rsi.decide(row),
        }
    }
}

/// Prices of the trailing `count` rows, oldest first.
pub(crate) fn trailing_prices(window: &VecDeque<Row>, count: usize) -> Vec<f64> {
    window
        .iter()
        .skip(window.len().saturating_sub(count))
        .map(|row| row.price)
        .collect()
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
    fn trailing_prices_takes_the_newest_rows() {
        let window = window_of(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(trailing_prices(&window, 2), vec![3.0, 4.0]);
        assert_eq!(trailing_prices(&window, 10), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn fill_row_writes_placeholders_until_past_lookback() {
        let rsi = Indicator::Rsi(RelativeStrengthIndex::new());
        let window = window_of(&[10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 15.0]);
        let mut row = Row::default();

        rsi.fill_row(&mut row, rsi.lookback(), &window, 16.0);
        assert_eq!(row.rsi, 0.0);

        rsi.fill_row(&mut row, rsi.lookback() + 1, &window, 16.0);
        assert!(row.rsi > 0.0);
    }

    #[test]
    fn fill_row_writes_band_placeholders_until_past_lookback() {
        let bb = Indicator::Bollinger(BollingerBands::new());
        let window = window_of(&[10.0, 12.0, 11.0, 13.0]);
        let mut row = Row::default();

        bb.fill_row(&mut row, bb.lookback(), &window, 12.0);
        assert_eq!(row.lower_band, 0.0);
        assert_eq!(row.upper_band, 0.0);

        bb.fill_row(&mut row, bb.lookback() + 1, &window, 12.0);
        assert!(row.lower_band > 0.0);
        assert!(row.upper_band > row.lower_band);
    }
}
