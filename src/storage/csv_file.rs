//! CSV snapshot files

use crate::banks::{BankRecord, ColumnLabels};
use crate::error::EtlError;
use crate::etl::{Extractor, Loader};

use eyre::{Context, Result};
use std::path::{Path, PathBuf};

/// Write bank records to a CSV file, replacing any previous content
pub struct CsvWriter {
    path: PathBuf,
    labels: ColumnLabels,
}

impl CsvWriter {
    pub fn new(path: impl AsRef<Path>, labels: ColumnLabels) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            labels,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a header row followed by one row per record
    ///
    /// # Errors
    /// Fails with [`EtlError::Io`] when the destination cannot be written.
    pub fn write(&self, records: &[BankRecord]) -> Result<()> {
        let io_err = |e: csv::Error| EtlError::io(&self.path, std::io::Error::from(e));

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .map_err(io_err)?;

        wtr.write_record(self.labels.header()).map_err(io_err)?;
        for record in records {
            wtr.serialize(record).map_err(io_err)?;
        }
        wtr.flush().map_err(|e| EtlError::io(&self.path, e))?;

        log::debug!("Wrote {} rows to {}", records.len(), self.path.display());
        Ok(())
    }
}

impl Loader for CsvWriter {
    type Item = BankRecord;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        self.write(&items)?;
        Ok(items.len())
    }
}

/// Read bank records back from a CSV file written by [`CsvWriter`]
///
/// Columns are matched by position, so any header labels are accepted.
pub struct CsvReader {
    path: PathBuf,
}

impl CsvReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn read(&self) -> Result<Vec<BankRecord>> {
        let mut rdr = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open CSV file: {}", self.path.display()))?;

        rdr.records()
            .map(|row| -> Result<BankRecord> {
                let row = row
                    .with_context(|| format!("Failed to read CSV file: {}", self.path.display()))?;
                row.deserialize(None)
                    .with_context(|| format!("Failed to parse CSV row: {:?}", row))
            })
            .collect()
    }
}

impl Extractor for CsvReader {
    type Item = BankRecord;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        self.read()
    }
}
