//! Liquidity signal generation.
//!
//! DOLLAR_VOLUME[t] = CLOSE[t] * VOLUME[t]
//! AVG[t] = mean(DOLLAR_VOLUME[t-window+1..=t])
//! Warmup: first (window-1) dates of each instrument are undefined and
//! never eligible.

use crate::domain::config::{Eligibility, IndexConfig};
use crate::domain::error::IndexError;
use crate::domain::frame::Frame;
use crate::domain::panel::PricePanel;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalGenerator {
    window: usize,
    rule: Eligibility,
}

impl SignalGenerator {
    pub fn new(window: usize, rule: Eligibility) -> Self {
        Self { window, rule }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        Self::new(config.dollar_volume_window, config.eligibility())
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn rule(&self) -> Eligibility {
        self.rule
    }

    /// Produces the 0/1 signal matrix.
    pub fn generate(&self, panel: &PricePanel) -> Result<Frame, IndexError> {
        let averages = average_dollar_volumes(panel, self.window)?;
        let signals = match self.rule {
            Eligibility::TopPercent(pct) => {
                let cutoff = pct / 100.0;
                averages.map_rows(|row| {
                    percentile_ranks_desc(row)
                        .into_iter()
                        .map(|p| as_signal(p <= cutoff))
                        .collect()
                })
            }
            Eligibility::MinDollarVolume(min) => averages.map(|avg| as_signal(avg >= min)),
        };
        debug!(
            dates = signals.n_dates(),
            instruments = signals.n_instruments(),
            eligible_cells = signals.values().iter().filter(|v| **v > 0.0).count(),
            rule = ?self.rule,
            "generated signals"
        );
        Ok(signals)
    }
}

fn as_signal(eligible: bool) -> f64 {
    if eligible { 1.0 } else { 0.0 }
}

/// Rolling mean of Close × Volume over `window` dates.
pub fn average_dollar_volumes(panel: &PricePanel, window: usize) -> Result<Frame, IndexError> {
    Ok(panel.dollar_volumes()?.rolling_mean(window))
}

/// Descending percentile rank of each defined value in `row`.
///
/// The largest value gets rank 1; tied values share the average of the
/// ranks they span. Ranks are divided by the number of defined values so
/// the smallest lands on 1.0. NaN inputs stay NaN.
pub fn percentile_ranks_desc(row: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; row.len()];
    let mut order: Vec<usize> = (0..row.len()).filter(|&i| !row[i].is_nan()).collect();
    let count = order.len();
    if count == 0 {
        return out;
    }
    order.sort_by(|&a, &b| row[b].partial_cmp(&row[a]).unwrap_or(Ordering::Equal));

    let mut start = 0;
    while start < count {
        let mut end = start + 1;
        while end < count && row[order[end]] == row[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            out[i] = avg_rank / count as f64;
        }
        start = end;
    }
    out
}
