//! Weight allocation strategies.
//!
//! The pipeline is parameterized by a [`WeightAllocator`]; the two
//! benchmark variants differ only here.

use crate::domain::config::{IndexConfig, Weighting};
use crate::domain::error::IndexError;
use crate::domain::frame::Frame;
use crate::domain::panel::PricePanel;
use crate::domain::signal::average_dollar_volumes;
use tracing::debug;

/// Turns a 0/1 signal matrix into portfolio weights.
pub trait WeightAllocator: Send + Sync {
    fn name(&self) -> &'static str;

    fn allocate(&self, signals: &Frame, panel: &PricePanel) -> Result<Frame, IndexError>;
}

/// Each eligible instrument gets 1 / (eligible count). Dates with no
/// eligible instrument get 0 everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeight;

impl WeightAllocator for EqualWeight {
    fn name(&self) -> &'static str {
        "equal"
    }

    fn allocate(&self, signals: &Frame, _panel: &PricePanel) -> Result<Frame, IndexError> {
        let weights = signals.map_rows(|row| {
            let count: f64 = row.iter().filter(|v| !v.is_nan()).map(|v| v.abs()).sum();
            if count == 0.0 {
                return vec![0.0; row.len()];
            }
            row.iter()
                .map(|&s| if s.is_nan() { 0.0 } else { s / count })
                .collect()
        });
        debug!(dates = weights.n_dates(), "allocated equal weights");
        Ok(weights)
    }
}

/// Each eligible instrument gets its rolling average dollar volume divided
/// by the sum over eligible instruments. Ineligible cells, and every cell
/// on a date with nothing eligible, are NaN.
#[derive(Debug, Clone, Copy)]
pub struct DollarVolumeWeight {
    window: usize,
}

impl DollarVolumeWeight {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl WeightAllocator for DollarVolumeWeight {
    fn name(&self) -> &'static str {
        "dollar_volume"
    }

    fn allocate(&self, signals: &Frame, panel: &PricePanel) -> Result<Frame, IndexError> {
        let averages = average_dollar_volumes(panel, self.window)?;
        let masked = averages.zip_with(signals, |avg, s| if s > 0.0 { avg } else { f64::NAN })?;
        let weights = masked.map_rows(|row| {
            let total: f64 = row.iter().filter(|v| !v.is_nan()).sum();
            if total == 0.0 {
                return vec![f64::NAN; row.len()];
            }
            row.iter().map(|v| v / total).collect()
        });
        debug!(
            dates = weights.n_dates(),
            window = self.window,
            "allocated dollar-volume weights"
        );
        Ok(weights)
    }
}

/// Picks the allocator named by the config. The dollar-volume variant
/// reuses the signal window so both stages see the same averages.
pub fn allocator_for(config: &IndexConfig) -> Box<dyn WeightAllocator> {
    match config.weighting {
        Weighting::Equal => Box::new(EqualWeight),
        Weighting::DollarVolume => Box::new(DollarVolumeWeight::new(config.dollar_volume_window)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::panel::{CLOSE, VOLUME};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn dates(n: usize) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Duration::days(i as i64)
            })
            .collect()
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("S{i}")).collect()
    }

    fn frame(rows: &[Vec<f64>]) -> Frame {
        Frame::from_rows(dates(rows.len()), names(rows[0].len()), rows).unwrap()
    }

    fn panel(closes: &[Vec<f64>], volumes: &[Vec<f64>]) -> PricePanel {
        PricePanel::new(vec![
            (CLOSE.into(), frame(closes)),
            (VOLUME.into(), frame(volumes)),
        ])
        .unwrap()
    }

    #[test]
    fn equal_weight_splits_evenly() {
        let signals = frame(&[vec![1.0, 1.0, 0.0, 1.0], vec![1.0, 0.0, 0.0, 0.0]]);
        let p = panel(&[vec![1.0; 4], vec![1.0; 4]], &[vec![1.0; 4], vec![1.0; 4]]);
        let w = EqualWeight.allocate(&signals, &p).unwrap();

        let third = 1.0 / 3.0;
        assert_eq!(w.row(0), &[third, third, 0.0, third]);
        assert_eq!(w.row(1), &[1.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(w.row_sums()[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn equal_weight_no_eligible_is_zero() {
        let signals = frame(&[vec![0.0, 0.0]]);
        let p = panel(&[vec![1.0, 1.0]], &[vec![1.0, 1.0]]);
        let w = EqualWeight.allocate(&signals, &p).unwrap();
        assert_eq!(w.row(0), &[0.0, 0.0]);
    }

    #[test]
    fn dollar_volume_weight_proportional() {
        // window 1: averages are the raw dollar volumes 300, 100, 50
        let closes = vec![vec![3.0, 1.0, 5.0]];
        let volumes = vec![vec![100.0, 100.0, 10.0]];
        let signals = frame(&[vec![1.0, 1.0, 0.0]]);
        let w = DollarVolumeWeight::new(1)
            .allocate(&signals, &panel(&closes, &volumes))
            .unwrap();

        assert_relative_eq!(w.get(0, 0), 0.75);
        assert_relative_eq!(w.get(0, 1), 0.25);
        assert!(w.get(0, 2).is_nan());
    }

    #[test]
    fn dollar_volume_weight_no_eligible_is_undefined() {
        let signals = frame(&[vec![0.0, 0.0]]);
        let w = DollarVolumeWeight::new(1)
            .allocate(&signals, &panel(&[vec![1.0, 2.0]], &[vec![5.0, 5.0]]))
            .unwrap();
        assert!(w.row(0).iter().all(|v| v.is_nan()));
        assert!(w.row(0).iter().all(|v| !v.is_infinite()));
    }

    #[test]
    fn dollar_volume_weight_uses_rolling_window() {
        // S0 dollar volumes 10, 30 -> avg 20; S1 20, 20 -> avg 20
        let closes = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        let volumes = vec![vec![10.0, 20.0], vec![30.0, 20.0]];
        let signals = frame(&[vec![0.0, 0.0], vec![1.0, 1.0]]);
        let w = DollarVolumeWeight::new(2)
            .allocate(&signals, &panel(&closes, &volumes))
            .unwrap();
        assert_eq!(w.row(1), &[0.5, 0.5]);
    }

    #[test]
    fn allocator_for_follows_config() {
        let mut config = IndexConfig::new("x", "db", Weighting::Equal);
        assert_eq!(allocator_for(&config).name(), "equal");
        config.weighting = Weighting::DollarVolume;
        assert_eq!(allocator_for(&config).name(), "dollar_volume");
    }
}
