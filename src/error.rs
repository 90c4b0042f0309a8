use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors: bad input files, bad configuration, invalid legacy values.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid legacy value at {field}: {value:?}")]
    InvalidLegacyValue { field: String, value: String },

    #[error("unknown schema version: {0}")]
    UnknownSchema(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal conditions. Every degraded result carries one of these instead of
/// silently omitting data.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("insufficient sample data for {scope}")]
    InsufficientSampleData { scope: String },

    #[error("structural fit failure in {scope}: {detail}")]
    StructuralFitFailure { scope: String, detail: String },

    #[error("link graph incomplete: {reason}")]
    GraphIncomplete { reason: String },

    #[error("lossy schema conversion (dropped: {dropped:?}, defaulted: {defaulted:?})")]
    SchemaBridgeLossy {
        dropped: Vec<String>,
        defaulted: Vec<String>,
    },

    #[error("collector fault on {url}: {reason}")]
    CollectorFault { url: String, reason: String },

    #[error("rejected {count} malformed samples on {url}")]
    RejectedSamples { url: String, count: usize },
}

impl Diagnostic {
    pub fn insufficient(scope: impl Into<String>) -> Self {
        Diagnostic::InsufficientSampleData {
            scope: scope.into(),
        }
    }
}
