//! CSV export of an index run.
//!
//! One row per date: `date,return,equity` followed by each instrument's
//! gross return. Undefined cells are written empty.

use crate::domain::config::IndexConfig;
use crate::domain::error::IndexError;
use crate::domain::performance::equity_curve;
use crate::domain::pipeline::PipelineOutput;
use crate::ports::report_port::ReportPort;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportAdapter;

fn cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn csv_error(e: csv::Error) -> IndexError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => IndexError::Io(io),
        other => IndexError::Io(std::io::Error::other(format!("{other:?}"))),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        output: &PipelineOutput,
        config: &IndexConfig,
        path: &Path,
    ) -> Result<(), IndexError> {
        let gross = &output.gross_returns;
        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;

        let mut header = vec!["date".to_string(), "return".to_string(), "equity".to_string()];
        header.extend(gross.instruments().iter().cloned());
        writer.write_record(&header).map_err(csv_error)?;

        for (row, point) in equity_curve(gross).iter().enumerate() {
            let mut record = vec![
                point.date.format("%Y-%m-%d").to_string(),
                point.daily_return.to_string(),
                point.equity.to_string(),
            ];
            record.extend(gross.row(row).iter().map(|v| cell(*v)));
            writer.write_record(&record).map_err(csv_error)?;
        }
        writer.flush()?;

        info!(code = %config.code, path = %path.display(), "wrote returns report");
        Ok(())
    }
}
