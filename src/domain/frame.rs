//! Date × instrument matrix shared by every pipeline stage.
//!
//! Values are stored row-major (one row per date, one column per
//! instrument). `NaN` marks an undefined cell: a warm-up rolling value,
//! a missing observation, or "no position".

use crate::domain::error::IndexError;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct Frame {
    dates: Vec<NaiveDate>,
    instruments: Vec<String>,
    values: Vec<f64>,
}

impl Frame {
    pub fn new(
        dates: Vec<NaiveDate>,
        instruments: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self, IndexError> {
        let expected = dates.len() * instruments.len();
        if values.len() != expected {
            return Err(IndexError::misaligned("frame cells", expected, values.len()));
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IndexError::misaligned(
                "dates",
                "strictly ascending",
                "unordered or duplicate dates",
            ));
        }
        Ok(Self {
            dates,
            instruments,
            values,
        })
    }

    pub fn from_rows(
        dates: Vec<NaiveDate>,
        instruments: Vec<String>,
        rows: &[Vec<f64>],
    ) -> Result<Self, IndexError> {
        if rows.len() != dates.len() {
            return Err(IndexError::misaligned("rows", dates.len(), rows.len()));
        }
        let mut values = Vec::with_capacity(dates.len() * instruments.len());
        for row in rows {
            if row.len() != instruments.len() {
                return Err(IndexError::misaligned("row width", instruments.len(), row.len()));
            }
            values.extend_from_slice(row);
        }
        Self::new(dates, instruments, values)
    }

    pub fn filled(dates: Vec<NaiveDate>, instruments: Vec<String>, value: f64) -> Self {
        let values = vec![value; dates.len() * instruments.len()];
        Self {
            dates,
            instruments,
            values,
        }
    }

    /// A frame with the same axes as `self`, every cell set to `value`.
    pub fn like(&self, value: f64) -> Self {
        Self::filled(self.dates.clone(), self.instruments.clone(), value)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    pub fn n_instruments(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.instruments.len() + col]
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        let width = self.instruments.len();
        self.values[row * width + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let width = self.instruments.len();
        &self.values[row * width..(row + 1) * width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics, so zero-width frames yield no rows.
        let width = self.instruments.len().max(1);
        self.values.chunks_exact(width)
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.dates.len()).map(|row| self.get(row, col)).collect()
    }

    pub fn instrument_index(&self, instrument: &str) -> Option<usize> {
        self.instruments.iter().position(|i| i == instrument)
    }

    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Cell lookup by labels.
    pub fn value_at(&self, date: NaiveDate, instrument: &str) -> Option<f64> {
        let row = self.date_index(date)?;
        let col = self.instrument_index(instrument)?;
        Some(self.get(row, col))
    }

    pub fn ensure_aligned(&self, other: &Frame) -> Result<(), IndexError> {
        if self.dates != other.dates {
            return Err(IndexError::misaligned(
                "dates",
                format!("{} dates", self.dates.len()),
                format!("{} dates", other.dates.len()),
            ));
        }
        if self.instruments != other.instruments {
            return Err(IndexError::misaligned(
                "instruments",
                format!("{:?}", self.instruments),
                format!("{:?}", other.instruments),
            ));
        }
        Ok(())
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Frame {
        Frame {
            dates: self.dates.clone(),
            instruments: self.instruments.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    pub fn zip_with(&self, other: &Frame, f: impl Fn(f64, f64) -> f64) -> Result<Frame, IndexError> {
        self.ensure_aligned(other)?;
        Ok(Frame {
            dates: self.dates.clone(),
            instruments: self.instruments.clone(),
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Applies `f` to every column independently. `f` must return a
    /// vector the same length as its input.
    pub fn map_columns(&self, f: impl Fn(&[f64]) -> Vec<f64>) -> Frame {
        let mut out = self.like(f64::NAN);
        for col in 0..self.n_instruments() {
            let input = self.column(col);
            let output = f(&input);
            debug_assert_eq!(output.len(), input.len());
            for (row, value) in output.into_iter().enumerate().take(self.n_dates()) {
                out.set(row, col, value);
            }
        }
        out
    }

    /// Applies `f` to every row independently.
    pub fn map_rows(&self, f: impl Fn(&[f64]) -> Vec<f64>) -> Frame {
        let mut values = Vec::with_capacity(self.values.len());
        for row in 0..self.n_dates() {
            let input = self.row(row);
            let output = f(input);
            debug_assert_eq!(output.len(), input.len());
            values.extend(output);
        }
        Frame {
            dates: self.dates.clone(),
            instruments: self.instruments.clone(),
            values,
        }
    }

    /// Moves every value `periods` dates later. The first `periods` rows
    /// become NaN.
    pub fn shift(&self, periods: usize) -> Frame {
        let mut out = self.like(f64::NAN);
        let width = self.n_instruments();
        let n = self.n_dates();
        if periods < n {
            let src = &self.values[..(n - periods) * width];
            out.values[periods * width..].copy_from_slice(src);
        }
        out
    }

    /// Trailing mean over `window` rows. A value is defined only when all
    /// `window` observations are present and defined.
    pub fn rolling_mean(&self, window: usize) -> Frame {
        self.map_columns(|col| rolling_mean(col, window))
    }

    /// Cross-sectional sum per date, skipping NaN. A row with no defined
    /// value sums to 0.
    pub fn row_sums(&self) -> Vec<f64> {
        self.rows()
            .map(|row| row.iter().filter(|v| !v.is_nan()).fold(0.0, |acc, v| acc + v))
            .collect()
    }

    /// Number of defined, non-zero cells per date.
    pub fn row_counts(&self) -> Vec<usize> {
        self.rows()
            .map(|row| row.iter().filter(|v| !v.is_nan() && **v != 0.0).count())
            .collect()
    }
}

pub fn rolling_mean(series: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; series.len()];
    if window == 0 || series.len() < window {
        return out;
    }
    for end in window - 1..series.len() {
        let slice = &series[end + 1 - window..=end];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[end] = slice.iter().sum::<f64>() / window as f64;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
            })
            .collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Frame {
        Frame::from_rows(
            dates(3),
            names(&["A", "B"]),
            &[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_wrong_cell_count() {
        let result = Frame::new(dates(2), names(&["A"]), vec![1.0]);
        assert!(matches!(result, Err(IndexError::Misaligned { .. })));
    }

    #[test]
    fn new_rejects_unordered_dates() {
        let mut d = dates(2);
        d.reverse();
        let result = Frame::new(d, names(&["A"]), vec![1.0, 2.0]);
        assert!(matches!(result, Err(IndexError::Misaligned { .. })));
    }

    #[test]
    fn row_and_column_access() {
        let f = sample();
        assert_eq!(f.row(1), &[3.0, 4.0]);
        assert_eq!(f.column(1), vec![2.0, 4.0, 6.0]);
        assert_eq!(f.value_at(dates(3)[2], "A"), Some(5.0));
        assert_eq!(f.value_at(dates(3)[2], "Z"), None);
    }

    #[test]
    fn shift_one_moves_rows_down() {
        let s = sample().shift(1);
        assert!(s.row(0).iter().all(|v| v.is_nan()));
        assert_eq!(s.row(1), &[1.0, 2.0]);
        assert_eq!(s.row(2), &[3.0, 4.0]);
    }

    #[test]
    fn shift_past_end_is_all_nan() {
        let s = sample().shift(5);
        assert!(s.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_mean_warmup_and_values() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(out[0].is_nan());
        assert_eq!(&out[1..], &[1.5, 2.5, 3.5]);
    }

    #[test]
    fn rolling_mean_nan_in_window() {
        let out = rolling_mean(&[1.0, f64::NAN, 3.0, 4.0], 2);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_eq!(out[3], 3.5);
    }

    #[test]
    fn rolling_mean_short_series() {
        let out = rolling_mean(&[1.0, 2.0], 3);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn row_sums_skip_nan() {
        let f = Frame::from_rows(
            dates(2),
            names(&["A", "B"]),
            &[vec![f64::NAN, f64::NAN], vec![1.0, f64::NAN]],
        )
        .unwrap();
        assert_eq!(f.row_sums(), vec![0.0, 1.0]);
    }

    #[test]
    fn zip_with_rejects_misaligned() {
        let a = sample();
        let b = Frame::filled(dates(3), names(&["A"]), 1.0);
        assert!(a.zip_with(&b, |x, y| x * y).is_err());
    }

    #[test]
    fn zero_width_frame_has_no_rows() {
        let f = Frame::filled(dates(3), vec![], 0.0);
        assert_eq!(f.rows().count(), 0);
        assert!(f.is_empty());
    }
}
