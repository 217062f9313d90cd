//! bankcap
//!
//! A small ETL tool that snapshots the largest banks by market
//! capitalization, converts their valuations to GBP, EUR and INR, and saves
//! the result to a CSV file and a SQLite table.

pub mod banks;
pub mod cli;
pub mod config;
pub mod error;
pub mod etl;
pub mod progress;
pub mod storage;
pub mod transform;

// Re-exports for convenience
pub use banks::{BankRecord, BankRow, BankTableExtractor, ColumnLabels, HtmlSource};
pub use config::EtlConfig;
pub use error::EtlError;
pub use etl::{Extractor, Loader, Transformer};
pub use progress::{Milestone, ProgressLog};
pub use storage::{CsvReader, CsvWriter, QueryOutput, SqliteStore};
pub use transform::{CurrencyConverter, CurrencyRates};
