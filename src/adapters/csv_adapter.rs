//! CSV file data adapter.
//!
//! One file per instrument, named `<CODE>_<DB>.csv`, with a header row.
//! Columns are located by header name (`date`, `close`, `volume`,
//! case-insensitive); any other columns are ignored. File names are
//! matched case-insensitively and symbols are reported upper-cased, the
//! same way universe code lists are normalised.
//!
//! A missing file is a `DataSource` error. A file that exists but cannot
//! be parsed is `MalformedData`.

use crate::domain::bar::DailyBar;
use crate::domain::error::IndexError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    close: usize,
    volume: usize,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn file_name(code: &str, db: &str) -> String {
        format!("{}_{}.csv", code, db)
    }

    fn read_base_dir(&self) -> Result<fs::ReadDir, IndexError> {
        fs::read_dir(&self.base_path).map_err(|e| IndexError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })
    }

    /// The exact file name first, then any file whose name matches
    /// ignoring ASCII case.
    fn locate_file(&self, code: &str, db: &str) -> Result<PathBuf, IndexError> {
        let wanted = Self::file_name(code, db);
        let exact = self.base_path.join(&wanted);
        if exact.is_file() {
            return Ok(exact);
        }
        for entry in self.read_base_dir()?.flatten() {
            if entry.file_name().to_string_lossy().eq_ignore_ascii_case(&wanted) {
                return Ok(entry.path());
            }
        }
        Err(IndexError::DataSource {
            reason: format!("no price file {} in {}", wanted, self.base_path.display()),
        })
    }

    fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, String> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| format!("missing {} column", name))
        };
        Ok(Columns {
            date: find("date")?,
            close: find("close")?,
            volume: find("volume")?,
        })
    }

    /// Empty cells read as NaN so gaps survive into the panel.
    fn parse_number(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, String> {
        let raw = record.get(idx).unwrap_or("").trim();
        if raw.is_empty() {
            return Ok(f64::NAN);
        }
        raw.parse()
            .map_err(|e| format!("invalid {} value '{}': {}", name, raw, e))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        code: &str,
        db: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, IndexError> {
        let path = self.locate_file(code, db)?;
        let content = fs::read_to_string(&path).map_err(|e| IndexError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let malformed = |reason: String| IndexError::MalformedData {
            code: code.to_string(),
            reason: format!("{}: {}", path.display(), reason),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| malformed(format!("CSV header error: {}", e)))?;
        let columns = Self::locate_columns(headers).map_err(malformed)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| malformed(format!("CSV parse error: {}", e)))?;

            let date_str = record.get(columns.date).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| malformed(format!("invalid date '{}': {}", date_str, e)))?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(DailyBar {
                date,
                close: Self::parse_number(&record, columns.close, "close").map_err(malformed)?,
                volume: Self::parse_number(&record, columns.volume, "volume")
                    .map_err(malformed)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self, db: &str) -> Result<Vec<String>, IndexError> {
        let suffix = format!("_{}.csv", db).to_ascii_lowercase();
        let mut symbols = Vec::new();

        for entry in self.read_base_dir()? {
            let entry = entry.map_err(|e| IndexError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if name_str.to_ascii_lowercase().ends_with(&suffix) {
                let code = &name_str[..name_str.len() - suffix.len()];
                if !code.is_empty() {
                    symbols.push(code.to_ascii_uppercase());
                }
            }
        }

        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}
