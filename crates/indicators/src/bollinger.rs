use std::collections::VecDeque;

use common::{Decision, Row};

use crate::trailing_prices;

/// Bollinger Bands over the trailing price window.
///
/// The bands sit two population standard deviations (variance divided by the
/// sample count, not count − 1) either side of the mean of the trailing
/// `lookback` closes plus the candidate price.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub lookback: usize,
}

impl BollingerBands {
    pub fn new() -> Self {
        Self { lookback: 21 }
    }

    /// `(lower, upper)` for the trailing window plus `price`.
    pub fn bands(&self, window: &VecDeque<Row>, price: f64) -> (f64, f64) {
        let mut prices = trailing_prices(window, self.lookback);
        prices.push(price);

        let mean = prices.iter().sum::<f64>() / prices.len() as f64;
        let variance = prices
            .iter()
            .map(|p| (p - mean) * (p - mean))
            .sum::<f64>()
            / prices.len() as f64;
        let sigma = variance.sqrt();

        (mean - 2.0 * sigma, mean + 2.0 * sigma)
    }

    /// Price above the upper band is overbought, below the lower oversold.
    pub fn decide(&self, row: &Row) -> Decision {
        if row.price > row.upper_band {
            Decision::Sell
        } else if row.price < row.lower_band {
            Decision::Buy
        } else {
            Decision::Hold
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
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
    fn flat_series_collapses_both_bands_onto_the_price() {
        let bb = BollingerBands::new();
        let window = window_of(&[100.0; 21]);
        let (lower, upper) = bb.bands(&window, 100.0);
        assert!((lower - 100.0).abs() < 1e-9);
        assert!((upper - 100.0).abs() < 1e-9);
    }

    #[test]
    fn decisions_around_collapsed_bands() {
        let bb = BollingerBands::new();
        let row = |price| Row {
            price,
            lower_band: 100.0,
            upper_band: 100.0,
            ..Row::default()
        };
        assert_eq!(bb.decide(&row(100.0)), Decision::Hold);
        assert_eq!(bb.decide(&row(100.5)), Decision::Sell);
        assert_eq!(bb.decide(&row(99.5)), Decision::Buy);
    }

    #[test]
    fn bands_use_population_deviation() {
        let bb = BollingerBands { lookback: 3 };
        // samples: 1, 2, 3, 4 -> mean 2.5, population variance 1.25
        let window = window_of(&[1.0, 2.0, 3.0]);
        let (lower, upper) = bb.bands(&window, 4.0);
        let sigma = 1.25f64.sqrt();
        assert!((lower - (2.5 - 2.0 * sigma)).abs() < 1e-9);
        assert!((upper - (2.5 + 2.0 * sigma)).abs() < 1e-9);
    }

    #[test]
    fn only_the_trailing_lookback_rows_contribute() {
        let bb = BollingerBands { lookback: 2 };
        // the 1000.0 row falls outside the trailing window
        let window = window_of(&[1000.0, 10.0, 10.0]);
        let (lower, upper) = bb.bands(&window, 10.0);
        assert!((lower - 10.0).abs() < 1e-9);
        assert!((upper - 10.0).abs() < 1e-9);
    }
}
