//! Integration tests for the bank snapshot pipeline
//!
//! These tests drive complete runs offline: the page is a local HTML file
//! reached through a `file://` URL, and every output lands in a temp dir.

use bankcap::cli::{run_etl, run_queries};
use bankcap::etl::{Extractor, Loader};
use bankcap::progress::Milestone;
use bankcap::storage::{CsvReader, SqliteStore};
use bankcap::{ColumnLabels, EtlConfig, EtlError};
use eyre::Result;
use rusqlite::types::Value;
use std::path::Path;
use tempfile::TempDir;
use url::Url;

const RATES: &str = "Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n";

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
<h2>By market capitalization</h2>
<table class="wikitable">
<tbody>
<tr><th>Rank</th><th>Bank name</th><th>Market cap<br/>(US$ billion)</th></tr>
<tr><td>1</td><td><span class="flagicon"></span> <a href="/wiki/JPMorgan_Chase">JPMorgan Chase</a>
</td><td>432.92
</td></tr>
<tr><td>2</td><td><a href="/wiki/Bank_of_America">Bank of America</a>
</td><td>231.52
</td></tr>
<tr><td colspan="2">Footnote row</td></tr>
<tr><td>3</td><td>Bank A</td><td>100.00</td></tr>
</tbody>
</table>
<table>
<tbody>
<tr><td>1</td><td>Not this table</td><td>1.0</td></tr>
</tbody>
</table>
</body>
</html>
"#;

fn page_with(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .enumerate()
        .map(|(i, (name, cap))| format!("<tr><td>{}</td><td>{}</td><td>{}</td></tr>", i + 1, name, cap))
        .collect();
    format!("<html><body><table><tbody>{}</tbody></table></body></html>", body)
}

/// Lay out a page, a rate table and output paths inside `dir`
fn setup(dir: &Path, page: &str, rates: &str) -> Result<EtlConfig> {
    let page_path = dir.join("banks.html");
    std::fs::write(&page_path, page)?;
    std::fs::write(dir.join("exchange_rate.csv"), rates)?;

    let source = Url::from_file_path(&page_path).map_err(|_| eyre::eyre!("bad temp path"))?;

    Ok(EtlConfig {
        source_url: source.to_string(),
        rates_path: dir.join("exchange_rate.csv"),
        csv_output_path: dir.join("Largest_banks_data.csv"),
        database_path: dir.join("Banks.db"),
        log_path: dir.join("code_log.txt"),
        ..EtlConfig::default()
    })
}

fn logged_messages(config: &EtlConfig) -> Vec<String> {
    std::fs::read_to_string(&config.log_path)
        .unwrap_or_default()
        .lines()
        .map(|line| line.split_once(" : ").unwrap().1.to_string())
        .collect()
}

fn stage_error(err: &eyre::Report) -> &EtlError {
    err.downcast_ref::<EtlError>()
        .unwrap_or_else(|| panic!("expected a classified error, got {:?}", err))
}

#[tokio::test]
async fn test_full_run_writes_csv_database_and_log() -> Result<()> {
    let temp = TempDir::new()?;
    let config = setup(temp.path(), PAGE, RATES)?;

    let summary = run_etl(&config).await?;
    assert_eq!(summary.records, 3);
    assert_eq!(summary.table, "Largest_banks");

    // CSV
    let content = std::fs::read_to_string(&config.csv_output_path)?;
    assert_eq!(
        content.lines().next(),
        Some("Name,MC_USD_Billion,MC_GBP_Billion,MC_EUR_Billion,MC_INR_Billion")
    );
    let records = CsvReader::new(&config.csv_output_path).read()?;
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["JPMorgan Chase", "Bank of America", "Bank A"]);
    assert_eq!(records[0].mc_usd_billion, 432.92);
    assert_eq!(records[0].mc_gbp_billion, 346.34);
    assert_eq!(records[2].mc_gbp_billion, 80.0);
    assert_eq!(records[2].mc_eur_billion, 93.0);
    assert_eq!(records[2].mc_inr_billion, 8295.0);

    // Database
    let store = SqliteStore::open(&config.database_path, "Largest_banks", ColumnLabels::default())?;
    let output = store.run_query("SELECT Name, MC_INR_Billion FROM Largest_banks WHERE Name = 'Bank A'")?;
    assert_eq!(
        output.rows,
        vec![vec![Value::Text("Bank A".to_string()), Value::Real(8295.0)]]
    );
    store.close()?;

    // Milestones, in order
    let expected: Vec<String> = [
        Milestone::Preliminaries,
        Milestone::Extracted,
        Milestone::Transformed,
        Milestone::CsvSaved,
        Milestone::Connected,
        Milestone::DatabaseLoaded,
        Milestone::Complete,
    ]
    .iter()
    .map(|m| m.message().to_string())
    .collect();
    assert_eq!(logged_messages(&config), expected);

    Ok(())
}

#[tokio::test]
async fn test_missing_inr_rate_stops_before_any_write() -> Result<()> {
    let temp = TempDir::new()?;
    let config = setup(temp.path(), PAGE, "Currency,Rate\nEUR,0.93\nGBP,0.8\n")?;

    let err = run_etl(&config).await.unwrap_err();
    assert!(matches!(stage_error(&err), EtlError::Transform(_)));

    assert!(!config.csv_output_path.exists());
    assert!(!config.database_path.exists());
    assert_eq!(
        logged_messages(&config),
        vec![
            Milestone::Preliminaries.message(),
            Milestone::Extracted.message()
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_page_without_table_body_fails_extraction() -> Result<()> {
    let temp = TempDir::new()?;
    let config = setup(temp.path(), "<html><body><p>Page moved</p></body></html>", RATES)?;

    let err = run_etl(&config).await.unwrap_err();
    assert!(matches!(stage_error(&err), EtlError::Extraction(_)));
    assert_eq!(
        logged_messages(&config),
        vec![Milestone::Preliminaries.message()]
    );
    assert!(!config.csv_output_path.exists());

    Ok(())
}

#[tokio::test]
async fn test_wrong_label_count_fails_before_fetching() -> Result<()> {
    let temp = TempDir::new()?;
    let mut config = setup(temp.path(), PAGE, RATES)?;
    config.column_labels = vec!["Name".to_string()];

    let err = run_etl(&config).await.unwrap_err();
    assert!(matches!(stage_error(&err), EtlError::Extraction(_)));
    assert!(logged_messages(&config).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_second_run_replaces_table() -> Result<()> {
    let temp = TempDir::new()?;
    let config = setup(
        temp.path(),
        &page_with(&[("Bank A", "100.00"), ("Bank B", "50.00")]),
        RATES,
    )?;
    run_etl(&config).await?;

    std::fs::write(temp.path().join("banks.html"), page_with(&[("Bank C", "10.00")]))?;
    run_etl(&config).await?;

    let outputs = run_queries(
        &config,
        &["SELECT Name FROM Largest_banks".to_string()],
    )?;
    assert_eq!(
        outputs[0].rows,
        vec![vec![Value::Text("Bank C".to_string())]]
    );
    assert_eq!(CsvReader::new(&config.csv_output_path).read()?.len(), 1);

    // The log keeps both runs
    assert_eq!(logged_messages(&config).len(), 14);

    Ok(())
}

#[tokio::test]
async fn test_custom_labels_name_the_output_columns() -> Result<()> {
    let temp = TempDir::new()?;
    let mut config = setup(temp.path(), PAGE, RATES)?;
    config.column_labels = vec!["Bank".to_string(), "USD_Billion".to_string()];
    config.table_name = "banks".to_string();

    run_etl(&config).await?;

    let content = std::fs::read_to_string(&config.csv_output_path)?;
    assert!(content.starts_with("Bank,USD_Billion,MC_GBP_Billion,"));

    let outputs = run_queries(&config, &["SELECT Bank FROM banks LIMIT 1".to_string()])?;
    assert_eq!(
        outputs[0].rows,
        vec![vec![Value::Text("JPMorgan Chase".to_string())]]
    );

    Ok(())
}

#[tokio::test]
async fn test_table_and_label_names_with_spaces() -> Result<()> {
    let temp = TempDir::new()?;
    let mut config = setup(temp.path(), PAGE, RATES)?;
    config.table_name = "largest banks".to_string();
    config.column_labels = vec!["Bank Name".to_string(), "MC_USD_Billion".to_string()];

    let summary = run_etl(&config).await?;
    assert_eq!(summary.records, 3);
    assert_eq!(
        logged_messages(&config).last().map(String::as_str),
        Some(Milestone::Complete.message())
    );

    let outputs = run_queries(
        &config,
        &[r#"SELECT "Bank Name" FROM "largest banks" LIMIT 1"#.to_string()],
    )?;
    assert_eq!(
        outputs[0].rows,
        vec![vec![Value::Text("JPMorgan Chase".to_string())]]
    );

    Ok(())
}

#[tokio::test]
async fn test_reload_database_from_csv_snapshot() -> Result<()> {
    let temp = TempDir::new()?;
    let config = setup(temp.path(), PAGE, RATES)?;
    run_etl(&config).await?;

    // CSV snapshot → fresh database, without touching the page again
    let reader = CsvReader::new(&config.csv_output_path);
    let store = SqliteStore::open_in_memory("snapshot", ColumnLabels::default())?;
    let count = store.load(reader.extract().await?).await?;
    assert_eq!(count, 3);

    let output = store.run_query("SELECT AVG(MC_USD_Billion) FROM snapshot")?;
    match &output.rows[0][0] {
        Value::Real(avg) => assert!((avg - (432.92 + 231.52 + 100.0) / 3.0).abs() < 1e-9),
        other => panic!("unexpected value {:?}", other),
    }

    Ok(())
}
