//! Aggregate returns and summary statistics for an index run.

use crate::domain::frame::Frame;
use chrono::NaiveDate;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub daily_return: f64,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub avg_holdings: f64,
    pub trading_days: usize,
}

/// Per-date portfolio return: the cross-sectional sum of gross returns,
/// undefined cells contributing nothing.
pub fn aggregate_returns(gross_returns: &Frame) -> Vec<f64> {
    gross_returns.row_sums()
}

/// Compounds aggregate returns into an equity curve starting at 1.0.
pub fn equity_curve(gross_returns: &Frame) -> Vec<EquityPoint> {
    let mut equity = 1.0;
    gross_returns
        .dates()
        .iter()
        .zip(aggregate_returns(gross_returns))
        .map(|(&date, daily_return)| {
            equity *= 1.0 + daily_return;
            EquityPoint {
                date,
                daily_return,
                equity,
            }
        })
        .collect()
}

impl Performance {
    pub fn compute(gross_returns: &Frame, positions: &Frame, risk_free_rate: f64) -> Self {
        let curve = equity_curve(gross_returns);
        let final_equity = curve.last().map(|p| p.equity).unwrap_or(1.0);
        let total_return = final_equity - 1.0;

        let trading_days = curve.len();
        let years = trading_days as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() && final_equity > 0.0 {
            final_equity.powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&curve);
        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let returns: Vec<f64> = curve.iter().map(|p| p.daily_return).collect();
        let sharpe_ratio = compute_sharpe(&returns, daily_rf);

        let counts = positions.row_counts();
        let avg_holdings = if counts.is_empty() {
            0.0
        } else {
            counts.iter().sum::<usize>() as f64 / counts.len() as f64
        };

        Performance {
            total_return,
            annualized_return,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
            avg_holdings,
            trading_days,
        }
    }
}

fn compute_drawdown(curve: &[EquityPoint]) -> (f64, i64) {
    if curve.is_empty() {
        return (0.0, 0);
    }

    let mut peak = curve[0].equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in curve {
        if point.equity > peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 && point.equity < peak {
            let dd = (peak - point.equity) / peak;
            max_dd = max_dd.max(dd);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_sharpe(returns: &[f64], daily_rf: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        ((mean - daily_rf) / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
