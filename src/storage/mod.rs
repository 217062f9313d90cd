//! File and database storage
//!
//! This module handles the two sinks of a run:
//! - CSV snapshot files (write, and read back)
//! - A SQLite table that is replaced on every load, plus ad-hoc queries

mod csv_file;
mod sqlite;

pub use csv_file::{CsvReader, CsvWriter};
pub use sqlite::{QueryOutput, SqliteStore};
pub(crate) use sqlite::quote_ident;
