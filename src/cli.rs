//! CLI helper functions

use crate::{
    banks::{BankTableExtractor, ColumnLabels, HtmlSource},
    config::EtlConfig,
    etl::{Extractor, Loader, Transformer},
    progress::{Milestone, ProgressLog},
    storage::{CsvWriter, QueryOutput, SqliteStore},
    transform::CurrencyConverter,
};
use eyre::Result;
use std::path::PathBuf;

/// What a completed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    pub csv_path: PathBuf,
    pub database_path: PathBuf,
    pub table: String,
}

/// Run the whole pipeline once
///
/// Pipeline: BankTableExtractor → CurrencyConverter → CsvWriter → SqliteStore,
/// followed by the configured demo queries. A milestone is written to the
/// progress log after every stage, so the log shows how far a failed run got.
/// Any stage error aborts the run; outputs already written stay in place.
pub async fn run_etl(config: &EtlConfig) -> Result<RunSummary> {
    let progress = ProgressLog::new(&config.log_path);

    let labels = ColumnLabels::from_list(&config.column_labels)?;
    let source = HtmlSource::parse(&config.source_url)?;
    progress.milestone(Milestone::Preliminaries);

    let extractor = BankTableExtractor::new(source, labels);
    log::info!("Extracting bank table from {}", extractor.source());
    let rows = extractor.extract().await?;
    progress.milestone(Milestone::Extracted);

    log::info!("Converting with rates from {}", config.rates_path.display());
    let converter = CurrencyConverter::from_rates_file(&config.rates_path)?;
    let records = converter.transform_many(rows)?;
    progress.milestone(Milestone::Transformed);

    let labels = extractor.labels().clone();
    let csv = CsvWriter::new(&config.csv_output_path, labels.clone());
    let written = csv.load(records.clone()).await?;
    log::info!("✓ Saved {} record(s) to {}", written, csv.path().display());
    progress.milestone(Milestone::CsvSaved);

    let store = SqliteStore::open(&config.database_path, &config.table_name, labels)?;
    progress.milestone(Milestone::Connected);

    let loaded = store.load(records).await?;
    log::info!(
        "✓ Loaded {} record(s) into table {}",
        loaded,
        store.table()
    );
    progress.milestone(Milestone::DatabaseLoaded);

    for query in config.demo_queries() {
        print_query(&store, &query)?;
    }

    store.close()?;
    progress.milestone(Milestone::Complete);

    Ok(RunSummary {
        records: loaded,
        csv_path: config.csv_output_path.clone(),
        database_path: config.database_path.clone(),
        table: config.table_name.clone(),
    })
}

/// Run ad-hoc queries against the database of a previous run
pub fn run_queries(config: &EtlConfig, queries: &[String]) -> Result<Vec<QueryOutput>> {
    let labels = ColumnLabels::from_list(&config.column_labels)?;
    let store = SqliteStore::open(&config.database_path, &config.table_name, labels)?;

    let outputs = queries
        .iter()
        .map(|query| print_query(&store, query))
        .collect::<Result<Vec<_>>>()?;

    store.close()?;
    Ok(outputs)
}

/// Print the query text, run it, then print the result table
pub fn print_query(store: &SqliteStore, query: &str) -> Result<QueryOutput> {
    println!("{}", query);
    let output = store.run_query(query)?;
    if output.is_empty() {
        log::debug!("Query returned no rows: {}", query);
    }
    println!("{}", output);
    Ok(output)
}
