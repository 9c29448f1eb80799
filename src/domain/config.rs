//! Index configuration record.
//!
//! Built once from the INI file and handed to the pipeline at
//! construction; nothing mutates it afterwards.

use crate::domain::panel::{CLOSE, VOLUME};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_DOLLAR_VOLUME_WINDOW: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    Equal,
    DollarVolume,
}

impl FromStr for Weighting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equal" => Ok(Weighting::Equal),
            "dollar_volume" => Ok(Weighting::DollarVolume),
            other => Err(format!(
                "unknown weighting '{other}' (expected equal or dollar_volume)"
            )),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weighting::Equal => write!(f, "equal"),
            Weighting::DollarVolume => write!(f, "dollar_volume"),
        }
    }
}

/// Inclusion rule applied to the rolling average dollar volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eligibility {
    /// Keep instruments whose descending percentile rank is at most
    /// `pct / 100`.
    TopPercent(f64),
    /// Keep instruments whose average is at least this amount.
    MinDollarVolume(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    pub code: String,
    pub db: String,
    pub fields: Vec<String>,
    pub universes: Vec<String>,
    pub exclude_universes: Vec<String>,
    pub weighting: Weighting,
    pub min_dollar_volume: f64,
    pub dollar_volume_top_n_pct: Option<f64>,
    pub dollar_volume_window: usize,
}

impl IndexConfig {
    pub fn new(code: impl Into<String>, db: impl Into<String>, weighting: Weighting) -> Self {
        Self {
            code: code.into(),
            db: db.into(),
            fields: vec![CLOSE.to_string(), VOLUME.to_string()],
            universes: Vec::new(),
            exclude_universes: Vec::new(),
            weighting,
            min_dollar_volume: 0.0,
            dollar_volume_top_n_pct: None,
            dollar_volume_window: DEFAULT_DOLLAR_VOLUME_WINDOW,
        }
    }

    /// The rank rule wins whenever a non-zero top-N percentage is set;
    /// zero counts as unset.
    pub fn eligibility(&self) -> Eligibility {
        match self.dollar_volume_top_n_pct {
            Some(pct) if pct != 0.0 => Eligibility::TopPercent(pct),
            _ => Eligibility::MinDollarVolume(self.min_dollar_volume),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = IndexConfig::new("canada-benchmark", "canada-stk-1d", Weighting::Equal);
        assert_eq!(c.fields, vec!["Close", "Volume"]);
        assert_eq!(c.dollar_volume_window, 30);
        assert_eq!(c.min_dollar_volume, 0.0);
        assert!(c.dollar_volume_top_n_pct.is_none());
        assert_eq!(c.eligibility(), Eligibility::MinDollarVolume(0.0));
    }

    #[test]
    fn top_n_pct_takes_precedence() {
        let c = IndexConfig {
            min_dollar_volume: 1e6,
            dollar_volume_top_n_pct: Some(50.0),
            ..IndexConfig::new("x", "db", Weighting::DollarVolume)
        };
        assert_eq!(c.eligibility(), Eligibility::TopPercent(50.0));
    }

    #[test]
    fn zero_top_n_pct_falls_back_to_threshold() {
        let c = IndexConfig {
            min_dollar_volume: 1e6,
            dollar_volume_top_n_pct: Some(0.0),
            ..IndexConfig::new("x", "db", Weighting::Equal)
        };
        assert_eq!(c.eligibility(), Eligibility::MinDollarVolume(1e6));
    }

    #[test]
    fn weighting_parse_and_display() {
        assert_eq!("equal".parse::<Weighting>(), Ok(Weighting::Equal));
        assert_eq!(
            " Dollar_Volume ".parse::<Weighting>(),
            Ok(Weighting::DollarVolume)
        );
        assert!("market_cap".parse::<Weighting>().is_err());
        assert_eq!(Weighting::DollarVolume.to_string(), "dollar_volume");
    }
}
