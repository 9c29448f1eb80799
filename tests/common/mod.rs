#![allow(dead_code)]

use chrono::NaiveDate;
pub use idxbench::domain::bar::DailyBar;
use idxbench::domain::error::IndexError;
use idxbench::domain::frame::Frame;
use idxbench::domain::panel::{CLOSE, PricePanel, VOLUME};
use idxbench::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<DailyBar>>,
    pub errors: HashMap<String, String>,
    pub malformed: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            malformed: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<DailyBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }

    pub fn with_malformed(mut self, code: &str, reason: &str) -> Self {
        self.malformed.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        code: &str,
        _db: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, IndexError> {
        if let Some(reason) = self.malformed.get(code) {
            return Err(IndexError::MalformedData {
                code: code.to_string(),
                reason: reason.clone(),
            });
        }
        if let Some(reason) = self.errors.get(code) {
            return Err(IndexError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self, _db: &str) -> Result<Vec<String>, IndexError> {
        let mut codes: Vec<String> = self
            .data
            .keys()
            .chain(self.errors.keys())
            .chain(self.malformed.keys())
            .cloned()
            .collect();
        codes.sort();
        codes.dedup();
        Ok(codes)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn dates(n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|i| date(2024, 1, 1) + chrono::Duration::days(i as i64))
        .collect()
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn frame(instruments: &[&str], rows: &[Vec<f64>]) -> Frame {
    Frame::from_rows(dates(rows.len()), names(instruments), rows).unwrap()
}

pub fn panel(instruments: &[&str], closes: &[Vec<f64>], volumes: &[Vec<f64>]) -> PricePanel {
    PricePanel::new(vec![
        (CLOSE.to_string(), frame(instruments, closes)),
        (VOLUME.to_string(), frame(instruments, volumes)),
    ])
    .unwrap()
}

/// Bars starting 2024-01-01 on consecutive days.
pub fn generate_bars(closes: &[f64], volume: f64) -> Vec<DailyBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| DailyBar {
            date: date(2024, 1, 1) + chrono::Duration::days(i as i64),
            close,
            volume,
        })
        .collect()
}

/// True when both frames hold the same bits in every cell.
pub fn bit_identical(a: &Frame, b: &Frame) -> bool {
    a.dates() == b.dates()
        && a.instruments() == b.instruments()
        && a.values().len() == b.values().len()
        && a.values()
            .iter()
            .zip(b.values())
            .all(|(x, y)| x.to_bits() == y.to_bits())
}
