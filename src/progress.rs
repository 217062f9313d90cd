//! Milestone log file
//!
//! Every pipeline stage appends one `<YYYY-MM-DD HH:MM:SS> : <message>` line
//! to a plain text file. The file is opened and closed on each call and is
//! never truncated.

use chrono::Local;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Named points in a run, in the order they are reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Preliminaries,
    Extracted,
    Transformed,
    CsvSaved,
    Connected,
    DatabaseLoaded,
    Complete,
}

impl Milestone {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Preliminaries => "Preliminaries complete. Initiating ETL process",
            Self::Extracted => "Data extraction complete. Initiating Transformation process",
            Self::Transformed => "Data transformation complete. Initiating loading process",
            Self::CsvSaved => "Data saved to CSV file",
            Self::Connected => "SQL Connection initiated.",
            Self::DatabaseLoaded => "Data loaded to Database as table. Running the query",
            Self::Complete => "Process Complete.",
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Append-only progress log
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a milestone
    pub fn milestone(&self, milestone: Milestone) {
        self.log_progress(milestone.message());
    }

    /// Append `message` to the log file and echo it to the process log
    ///
    /// Best-effort: a file that cannot be opened or written produces a
    /// warning and the run carries on.
    pub fn log_progress(&self, message: &str) {
        log::info!("{}", message);
        if let Err(e) = self.append(message) {
            log::warn!(
                "Failed to write progress log {}: {}",
                self.path.display(),
                e
            );
        }
    }

    fn append(&self, message: &str) -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            file,
            "{} : {}",
            Local::now().format(TIMESTAMP_FORMAT),
            message
        )
    }
}
