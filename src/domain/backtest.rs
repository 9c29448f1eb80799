//! Run parameters for one backtest: date range, data location and the
//! risk-free rate used in the summary.

use chrono::NaiveDate;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub data_path: PathBuf,
    pub risk_free_rate: f64,
}
