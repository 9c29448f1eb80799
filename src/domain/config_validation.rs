//! Configuration validation.
//!
//! Checks every key before any data is loaded.

use crate::domain::config::Weighting;
use crate::domain::error::IndexError;
use crate::domain::panel::{CLOSE, VOLUME};
use crate::domain::universe::{parse_codes, parse_names, universe_section};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Fields the data loader builds into every panel.
const LOADED_FIELDS: [&str; 2] = [CLOSE, VOLUME];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), IndexError> {
    validate_dates(config)?;
    validate_risk_free_rate(config)?;
    validate_data_path(config)?;
    Ok(())
}

pub fn validate_index_config(config: &dyn ConfigPort) -> Result<(), IndexError> {
    validate_required(config, "code")?;
    validate_required(config, "db")?;
    validate_weighting(config)?;
    validate_fields(config)?;
    validate_window(config)?;
    validate_min_dollar_volume(config)?;
    validate_top_n_pct(config)?;
    validate_universes(config, "universes")?;
    validate_universes(config, "exclude_universes")?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> IndexError {
    IndexError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_required(config: &dyn ConfigPort, key: &str) -> Result<(), IndexError> {
    match config.get_string("index", key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(IndexError::ConfigMissing {
            section: "index".to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_weighting(config: &dyn ConfigPort) -> Result<(), IndexError> {
    match config.get_string("index", "weighting") {
        None => Ok(()),
        Some(s) => s
            .parse::<Weighting>()
            .map(|_| ())
            .map_err(|reason| invalid("index", "weighting", reason)),
    }
}

fn validate_fields(config: &dyn ConfigPort) -> Result<(), IndexError> {
    let Some(raw) = config.get_string("index", "fields") else {
        return Ok(());
    };
    let fields = parse_names(&raw);
    if let Some(unknown) = fields.iter().find(|f| !LOADED_FIELDS.contains(&f.as_str())) {
        return Err(invalid(
            "index",
            "fields",
            format!(
                "unsupported field {} (price files provide {})",
                unknown,
                LOADED_FIELDS.join(", ")
            ),
        ));
    }
    for required in LOADED_FIELDS {
        if !fields.iter().any(|f| f == required) {
            return Err(invalid(
                "index",
                "fields",
                format!("fields must include {}", required),
            ));
        }
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), IndexError> {
    if let Some(raw) = config.get_string("index", "dollar_volume_window") {
        match raw.trim().parse::<i64>() {
            Ok(n) if n >= 1 => {}
            _ => {
                return Err(invalid(
                    "index",
                    "dollar_volume_window",
                    "dollar_volume_window must be a whole number of at least 1",
                ));
            }
        }
    }
    Ok(())
}

fn validate_min_dollar_volume(config: &dyn ConfigPort) -> Result<(), IndexError> {
    match config.get_opt_double("index", "min_dollar_volume") {
        Ok(None) => Ok(()),
        Ok(Some(v)) if v >= 0.0 && v.is_finite() => Ok(()),
        _ => Err(invalid(
            "index",
            "min_dollar_volume",
            "min_dollar_volume must be a non-negative number",
        )),
    }
}

fn validate_top_n_pct(config: &dyn ConfigPort) -> Result<(), IndexError> {
    match config.get_opt_double("index", "dollar_volume_top_n_pct") {
        Ok(None) => Ok(()),
        // zero is accepted and means "unset"
        Ok(Some(v)) if (0.0..=100.0).contains(&v) => Ok(()),
        _ => Err(invalid(
            "index",
            "dollar_volume_top_n_pct",
            "dollar_volume_top_n_pct must be between 0 and 100",
        )),
    }
}

fn validate_universes(config: &dyn ConfigPort, key: &str) -> Result<(), IndexError> {
    let Some(raw) = config.get_string("index", key) else {
        return Ok(());
    };
    for name in parse_names(&raw) {
        let section = universe_section(&name);
        let codes = config
            .get_string(&section, "codes")
            .ok_or_else(|| IndexError::ConfigMissing {
                section: section.clone(),
                key: "codes".to_string(),
            })?;
        parse_codes(&codes).map_err(|e| invalid(&section, "codes", e.to_string()))?;
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), IndexError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), IndexError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, IndexError> {
    match value {
        None => Err(IndexError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), IndexError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(IndexError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}
