//! Universe resolution and panel loading.
//!
//! The universe is the union of the configured universe sections (or every
//! symbol the data source lists when none is configured), minus the codes
//! of every excluded universe. Codes without data, or whose fetch fails,
//! are skipped with a warning. Malformed data aborts the load, and so does
//! ending up with nothing.

use crate::domain::bar::DailyBar;
use crate::domain::config::IndexConfig;
use crate::domain::error::IndexError;
use crate::domain::panel::PricePanel;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    pub codes: Vec<String>,
    pub db: String,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.codes.len()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),

    #[error("every code in the universe is excluded")]
    AllExcluded,
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// Comma-separated list of names; blanks are dropped, case is kept.
pub fn parse_names(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn universe_section(name: &str) -> String {
    format!("universe.{name}")
}

/// Codes listed under `[universe.<name>] codes`.
pub fn universe_codes(config: &dyn ConfigPort, name: &str) -> Result<Vec<String>, IndexError> {
    let section = universe_section(name);
    let codes = config
        .get_string(&section, "codes")
        .ok_or_else(|| IndexError::ConfigMissing {
            section: section.clone(),
            key: "codes".into(),
        })?;
    Ok(parse_codes(&codes)?)
}

pub fn resolve_universe(
    index: &IndexConfig,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Universe, IndexError> {
    let mut included: BTreeSet<String> = BTreeSet::new();
    if index.universes.is_empty() {
        included.extend(data_port.list_symbols(&index.db)?);
    } else {
        for name in &index.universes {
            included.extend(universe_codes(config, name)?);
        }
    }

    let mut excluded: HashSet<String> = HashSet::new();
    for name in &index.exclude_universes {
        excluded.extend(universe_codes(config, name)?);
    }

    let before = included.len();
    let codes: Vec<String> = included
        .into_iter()
        .filter(|code| !excluded.contains(code))
        .collect();

    if codes.is_empty() {
        return Err(UniverseError::AllExcluded.into());
    }
    if codes.len() < before {
        info!(
            excluded = before - codes.len(),
            remaining = codes.len(),
            "applied universe exclusions"
        );
    }

    Ok(Universe {
        codes,
        db: index.db.clone(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    FetchFailed(String),
}

pub struct LoadedPanel {
    pub panel: PricePanel,
    pub skipped: Vec<SkippedCode>,
}

/// Fetches every code's bars and aligns them into one panel.
pub fn load_panel(
    data_port: &dyn DataPort,
    universe: &Universe,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<LoadedPanel, IndexError> {
    let mut series: Vec<(String, Vec<DailyBar>)> = Vec::with_capacity(universe.count());
    let mut skipped = Vec::new();

    for code in &universe.codes {
        match data_port.fetch_bars(code, &universe.db, start_date, end_date) {
            Ok(bars) if bars.is_empty() => {
                warn!(code = %code, db = %universe.db, "skipping: no data in range");
                skipped.push(SkippedCode {
                    code: code.clone(),
                    reason: SkipReason::NoData,
                });
            }
            Ok(bars) => series.push((code.clone(), bars)),
            Err(e @ IndexError::MalformedData { .. }) => return Err(e),
            Err(e) => {
                warn!(code = %code, db = %universe.db, error = %e, "skipping: fetch failed");
                skipped.push(SkippedCode {
                    code: code.clone(),
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
            }
        }
    }

    if series.is_empty() {
        return Err(IndexError::NoData {
            db: universe.db.clone(),
        });
    }

    info!(
        loaded = series.len(),
        skipped = skipped.len(),
        db = %universe.db,
        "loaded price data"
    );

    Ok(LoadedPanel {
        panel: PricePanel::from_bars(&series)?,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes_basic() {
        let result = parse_codes("RY,TD,ENB,CNQ").unwrap();
        assert_eq!(result, vec!["RY", "TD", "ENB", "CNQ"]);
    }

    #[test]
    fn test_parse_codes_trims_and_uppercases() {
        let result = parse_codes("  ry , td ,Enb").unwrap();
        assert_eq!(result, vec!["RY", "TD", "ENB"]);
    }

    #[test]
    fn test_parse_codes_empty_token() {
        let result = parse_codes("RY,,TD");
        assert!(matches!(result, Err(UniverseError::EmptyToken)));
    }

    #[test]
    fn test_parse_codes_duplicate_after_case_folding() {
        let result = parse_codes("RY,TD,ry");
        assert!(matches!(result, Err(UniverseError::DuplicateCode(s)) if s == "RY"));
    }

    #[test]
    fn test_parse_names_drops_blanks() {
        assert_eq!(
            parse_names("tsx-large, ,tsx-small,"),
            vec!["tsx-large", "tsx-small"]
        );
        assert!(parse_names("").is_empty());
    }

    #[test]
    fn test_universe_section_name() {
        assert_eq!(universe_section("tsx"), "universe.tsx");
    }

    #[test]
    fn test_universe_count() {
        let universe = Universe {
            codes: vec!["RY".to_string(), "TD".to_string()],
            db: "canada-stk-1d".to_string(),
        };
        assert_eq!(universe.count(), 2);
    }
}
