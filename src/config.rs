//! Run configuration
//!
//! Defaults reproduce the historical snapshot; each field can be overridden
//! through a `BANKCAP_*` environment variable (usually from a `.env` file).

use crate::storage::quote_ident;
use std::path::PathBuf;

pub const DEFAULT_SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";

/// Everything a run needs to know about its inputs and outputs
#[derive(Debug, Clone, PartialEq)]
pub struct EtlConfig {
    /// HTTP(S) URL, `file://` URL or local path of the page to scrape
    pub source_url: String,
    /// Output names for the name and USD market cap columns
    pub column_labels: Vec<String>,
    pub csv_output_path: PathBuf,
    /// `Currency,Rate` CSV
    pub rates_path: PathBuf,
    pub database_path: PathBuf,
    pub table_name: String,
    pub log_path: PathBuf,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            column_labels: vec!["Name".to_string(), "MC_USD_Billion".to_string()],
            csv_output_path: PathBuf::from("./Largest_banks_data.csv"),
            rates_path: PathBuf::from("./exchange_rate.csv"),
            database_path: PathBuf::from("Banks.db"),
            table_name: "Largest_banks".to_string(),
            log_path: PathBuf::from("code_log.txt"),
        }
    }
}

impl EtlConfig {
    /// Defaults overlaid with the process environment
    ///
    /// Recognised variables:
    /// - BANKCAP_SOURCE_URL
    /// - BANKCAP_COLUMN_LABELS: comma-separated, e.g. `Name,MC_USD_Billion`
    /// - BANKCAP_CSV_PATH
    /// - BANKCAP_RATES_PATH
    /// - BANKCAP_DB_PATH
    /// - BANKCAP_TABLE
    /// - BANKCAP_LOG_PATH
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; blank values are ignored
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("BANKCAP_SOURCE_URL") {
            self.source_url = url;
        }
        if let Some(labels) = get("BANKCAP_COLUMN_LABELS") {
            self.column_labels = labels.split(',').map(|l| l.trim().to_string()).collect();
        }
        if let Some(path) = get("BANKCAP_CSV_PATH") {
            self.csv_output_path = path.into();
        }
        if let Some(path) = get("BANKCAP_RATES_PATH") {
            self.rates_path = path.into();
        }
        if let Some(path) = get("BANKCAP_DB_PATH") {
            self.database_path = path.into();
        }
        if let Some(table) = get("BANKCAP_TABLE") {
            self.table_name = table;
        }
        if let Some(path) = get("BANKCAP_LOG_PATH") {
            self.log_path = path.into();
        }
        self
    }

    /// Queries printed at the end of a run
    pub fn demo_queries(&self) -> Vec<String> {
        let name = self
            .column_labels
            .first()
            .map(String::as_str)
            .unwrap_or("Name");
        let table = quote_ident(&self.table_name);
        vec![
            format!("SELECT * FROM {}", table),
            format!("SELECT AVG(MC_GBP_Billion) FROM {}", table),
            format!("SELECT {} FROM {} LIMIT 5", quote_ident(name), table),
        ]
    }
}
