//! Domain error types.

/// Top-level error type for idxbench.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("malformed price data for {code}: {reason}")]
    MalformedData { code: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid universe: {0}")]
    Universe(#[from] crate::domain::universe::UniverseError),

    #[error("price panel is missing required field {field}")]
    MissingField { field: String },

    #[error("misaligned {what}: expected {expected}, found {found}")]
    Misaligned {
        what: String,
        expected: String,
        found: String,
    },

    #[error("price panel is empty")]
    EmptyPanel,

    #[error("no data for any instrument on {db}")]
    NoData { db: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IndexError {
    pub(crate) fn misaligned(what: &str, expected: impl ToString, found: impl ToString) -> Self {
        IndexError::Misaligned {
            what: what.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

impl From<&IndexError> for std::process::ExitCode {
    fn from(err: &IndexError) -> Self {
        let code: u8 = match err {
            IndexError::Io(_) => 1,
            IndexError::ConfigParse { .. }
            | IndexError::ConfigMissing { .. }
            | IndexError::ConfigInvalid { .. }
            | IndexError::Universe(_) => 2,
            IndexError::DataSource { .. } => 3,
            IndexError::MissingField { .. }
            | IndexError::Misaligned { .. }
            | IndexError::EmptyPanel
            | IndexError::MalformedData { .. }
            | IndexError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
