//! Result export port.

use crate::domain::config::IndexConfig;
use crate::domain::error::IndexError;
use crate::domain::pipeline::PipelineOutput;
use std::path::Path;

/// Port for writing the outcome of one index run.
pub trait ReportPort {
    fn write(
        &self,
        output: &PipelineOutput,
        config: &IndexConfig,
        path: &Path,
    ) -> Result<(), IndexError>;
}
