//! Largest-banks table: row types and the HTML extractor

mod extractor;
mod record;

pub use extractor::{BankTableExtractor, HtmlSource, parse_bank_table};
pub use record::{BankRecord, BankRow, ColumnLabels, EUR_LABEL, GBP_LABEL, INR_LABEL};
