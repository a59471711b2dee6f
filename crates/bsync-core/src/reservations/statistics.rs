//! Rate statistics across active rows.

use serde::Serialize;

use crate::reservation::divide;

/// Point-in-time summary of normalized rates over active (non-idle) rows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RateStatistics {
    pub active_rows: usize,
    pub arithmetic_mean: f64,
    /// Population standard deviation.
    pub standard_deviation: f64,
}

impl RateStatistics {
    /// Summarize `rates`. An empty slice yields the zero snapshot.
    pub fn from_rates(rates: &[f64]) -> Self {
        let active_rows = rates.len();
        let count = active_rows as f64;
        let mean = divide(rates.iter().sum(), count);
        let squares: f64 = rates
            .iter()
            .map(|rate| {
                let difference = mean - rate;
                difference * difference
            })
            .sum();
        Self {
            active_rows,
            arithmetic_mean: mean,
            standard_deviation: divide(squares, count).sqrt(),
        }
    }
}
