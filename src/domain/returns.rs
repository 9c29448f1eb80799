//! Position → gross return conversion.
//!
//! CHANGE[t] = CLOSE[t] / CLOSE[t-1] - 1, with interior gaps padded from
//! the last defined close. Changes outside (-0.98, 50) are treated as bad
//! ticks and zeroed. GROSS[t] = CHANGE[t] * POSITION[t-1].

use crate::domain::error::IndexError;
use crate::domain::frame::Frame;
use crate::domain::panel::PricePanel;

/// A single-period change at or below this is a data error.
pub const MIN_PLAUSIBLE_CHANGE: f64 = -0.98;
/// A single-period change at or above this is a data error.
pub const MAX_PLAUSIBLE_CHANGE: f64 = 50.0;

pub fn pct_change(series: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; series.len()];
    let mut last: Option<f64> = None;
    for (i, &value) in series.iter().enumerate() {
        let current = if value.is_nan() { last } else { Some(value) };
        if let (Some(prev), Some(cur)) = (last, current) {
            out[i] = cur / prev - 1.0;
        }
        if current.is_some() {
            last = current;
        }
    }
    out
}

/// Keeps a change only when it lies strictly inside the plausible band.
/// NaN is not inside the band and becomes 0 as well.
pub fn sanitize_change(change: f64) -> f64 {
    if change > MIN_PLAUSIBLE_CHANGE && change < MAX_PLAUSIBLE_CHANGE {
        change
    } else {
        0.0
    }
}

pub fn sanitized_changes(closes: &Frame) -> Frame {
    closes.map_columns(pct_change).map(sanitize_change)
}

pub fn positions_to_gross_returns(
    positions: &Frame,
    panel: &PricePanel,
) -> Result<Frame, IndexError> {
    let changes = sanitized_changes(panel.close()?);
    changes.zip_with(&positions.shift(1), |change, held| change * held)
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
                NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + chrono::Duration::days(i as i64)
            })
            .collect()
    }

    fn single(values: &[f64]) -> Frame {
        let rows: Vec<Vec<f64>> = values.iter().map(|v| vec![*v]).collect();
        Frame::from_rows(dates(values.len()), vec!["A".into()], &rows).unwrap()
    }

    fn panel_with_closes(closes: &[f64]) -> PricePanel {
        let close = single(closes);
        let volume = close.map(|_| 1.0);
        PricePanel::new(vec![(CLOSE.into(), close), (VOLUME.into(), volume)]).unwrap()
    }

    #[test]
    fn pct_change_basic() {
        let out = pct_change(&[100.0, 110.0, 99.0]);
        assert!(out[0].is_nan());
        assert_relative_eq!(out[1], 0.1, epsilon = 1e-12);
        assert_relative_eq!(out[2], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn pct_change_pads_interior_gaps() {
        let out = pct_change(&[f64::NAN, 10.0, f64::NAN, 12.0]);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_eq!(out[2], 0.0);
        assert_relative_eq!(out[3], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn sanitize_bounds() {
        assert_eq!(sanitize_change(-0.98), 0.0);
        assert_eq!(sanitize_change(-0.985), 0.0);
        assert_eq!(sanitize_change(50.0), 0.0);
        assert_eq!(sanitize_change(59.0), 0.0);
        assert_eq!(sanitize_change(f64::NAN), 0.0);
        assert_eq!(sanitize_change(-0.5), -0.5);
        assert_eq!(sanitize_change(49.0), 49.0);
    }

    #[test]
    fn crash_from_100_to_1_5_contributes_nothing() {
        let panel = panel_with_closes(&[100.0, 100.0, 1.5]);
        let positions = single(&[f64::NAN, 1.0, 1.0]);
        let gross = positions_to_gross_returns(&positions, &panel).unwrap();
        assert_eq!(gross.get(2, 0), 0.0);
    }

    #[test]
    fn spike_from_1_to_60_contributes_nothing() {
        let panel = panel_with_closes(&[1.0, 1.0, 60.0]);
        let positions = single(&[f64::NAN, 1.0, 1.0]);
        let gross = positions_to_gross_returns(&positions, &panel).unwrap();
        assert_eq!(gross.get(2, 0), 0.0);
    }

    #[test]
    fn gross_returns_use_previous_position() {
        let panel = panel_with_closes(&[10.0, 10.0, 11.0, 22.0]);
        let positions = single(&[f64::NAN, 0.5, 0.25, 1.0]);
        let gross = positions_to_gross_returns(&positions, &panel).unwrap();

        assert!(gross.get(0, 0).is_nan());
        assert!(gross.get(1, 0).is_nan());
        // change 0.1 held at position from date 1 (0.5)
        assert_relative_eq!(gross.get(2, 0), 0.05, epsilon = 1e-12);
        // change 1.0 held at position from date 2 (0.25)
        assert_relative_eq!(gross.get(3, 0), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn missing_close_field_is_an_error() {
        let volume = single(&[1.0]);
        let panel = PricePanel::new(vec![(VOLUME.into(), volume.clone())]).unwrap();
        let err = positions_to_gross_returns(&volume, &panel).unwrap_err();
        assert!(matches!(err, IndexError::MissingField { .. }));
    }
}
