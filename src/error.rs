//! Classified pipeline failures
//!
//! Stages return [`eyre::Result`], but raise one of these variants so a
//! caller can tell which stage failed with `report.downcast_ref::<EtlError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    /// Page unreachable, no table body, or no usable columns
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Malformed or incomplete rate table, or an unparseable market cap
    #[error("transformation failed: {0}")]
    Transform(String),

    /// A flat file could not be written
    #[error("failed to write {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("database write failed: {0}")]
    Storage(#[source] rusqlite::Error),

    #[error("query failed: {0}")]
    Query(#[source] rusqlite::Error),
}

impl EtlError {
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform(message.into())
    }

    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Short stage name, used in log output
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Extraction(_) => "extract",
            Self::Transform(_) => "transform",
            Self::Io { .. } => "csv",
            Self::Storage(_) => "database",
            Self::Query(_) => "query",
        }
    }
}
